//! Content fingerprint integration tests
//!
//! Tests the pipeline: file → padded segments → segment roots → content root → proofs
//!
//! Run with: cargo test --package shardflow-core --test fingerprint_test

use shardflow_core::{
    merkle_tree, merkle_tree_with, num_segments_padded, read_at, segment_root, DataInMemory,
    FileData, IterableData, ParallelExecutor, ShardflowError, CHUNK_SIZE, SEGMENT_SIZE,
};
use std::io::Write;
use tempfile::NamedTempFile;

/// Generate test file data of specified size
fn generate_file(size: usize) -> Vec<u8> {
    (0..size).map(|i| (i % 256) as u8).collect()
}

fn write_temp(data: &[u8]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(data).unwrap();
    file.flush().unwrap();
    file
}

#[test]
fn test_file_and_memory_roots_match() {
    for size in [1, CHUNK_SIZE, SEGMENT_SIZE, 3 * SEGMENT_SIZE + 777] {
        let raw = generate_file(size);
        let file = write_temp(&raw);

        let from_file = FileData::open(file.path()).unwrap();
        let from_memory = DataInMemory::new(raw).unwrap();

        assert_eq!(from_file.padded_size(), from_memory.padded_size());
        let file_root = merkle_tree(&from_file).unwrap().root();
        let memory_root = merkle_tree(&from_memory).unwrap().root();
        assert_eq!(file_root, memory_root, "size {}", size);
    }
}

#[test]
fn test_parallel_file_root() {
    let raw = generate_file(7 * SEGMENT_SIZE + 1);
    let file = write_temp(&raw);
    let data = FileData::open(file.path()).unwrap();

    let executor = ParallelExecutor::with_threads(3, 4).unwrap();
    let parallel = merkle_tree_with(&data, &executor).unwrap();
    let serial = merkle_tree(&data).unwrap();
    assert_eq!(parallel.root(), serial.root());
}

#[test]
fn test_segment_proofs_verify_against_root() {
    let raw = generate_file(4 * SEGMENT_SIZE + 5000);
    let data = DataInMemory::new(raw).unwrap();
    let tree = merkle_tree(&data).unwrap();
    let segments = num_segments_padded(&data);
    assert_eq!(tree.leaf_count() as u64, segments);

    for index in 0..segments {
        let offset = index * SEGMENT_SIZE as u64;
        let segment = read_at(&data, SEGMENT_SIZE, offset, data.padded_size()).unwrap();
        let root = segment_root(&segment, 0);

        let proof = tree.proof_at(index as usize).unwrap();
        proof
            .validate(&tree.root(), &root, index as usize, tree.leaf_count())
            .unwrap();
    }
}

#[test]
fn test_last_segment_padding_equivalence() {
    // a short final segment hashes the same whether its zero tail is real
    // bytes or phantom chunks
    let raw = generate_file(10 * CHUNK_SIZE);
    let mut zero_filled = raw.clone();
    zero_filled.resize(16 * CHUNK_SIZE, 0);

    assert_eq!(segment_root(&zero_filled, 0), segment_root(&raw, 6));
}

#[test]
fn test_read_at_logical_end() {
    let raw = generate_file(1000);
    let file = write_temp(&raw);
    let data = FileData::open(file.path()).unwrap();
    assert_eq!(data.padded_size(), 4 * CHUNK_SIZE as u64);

    let tail = read_at(&data, 100, 1000, data.padded_size()).unwrap();
    assert_eq!(tail, vec![0u8; 24]);

    let result = read_at(&data, 1, data.padded_size(), data.padded_size());
    assert!(matches!(result, Err(ShardflowError::InvalidOffset { .. })));
}

#[test]
fn test_empty_sources_rejected() {
    let file = write_temp(&[]);
    assert!(matches!(FileData::open(file.path()), Err(ShardflowError::EmptyData)));
    assert!(matches!(DataInMemory::new(Vec::new()), Err(ShardflowError::EmptyData)));
}
