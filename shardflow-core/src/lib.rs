//! Shardflow Core Library
//!
//! Client-side data model for a content-addressed storage network.
//! This crate provides:
//! - Fixed chunk/segment sizing and flow padding
//! - Keccak-256 content hashes and the canonical empty-chunk hash
//! - A Merkle tree builder with inclusion proofs
//! - Data sources (`IterableData`) with zero-filled padded reads
//! - Segment-iteration executors (serial and rayon-backed)
//! - Content fingerprinting (`segment_root`, `merkle_tree`)

pub mod chunk;
pub mod data;
pub mod dataflow;
pub mod error;
pub mod executor;
pub mod hash;
pub mod merkle;

pub use chunk::{compute_padded_chunks, num_splits, next_pow2};
pub use data::{DataInMemory, FileData, IterableData};
pub use dataflow::{merkle_tree, merkle_tree_with, num_segments_padded, read_at, segment_root};
pub use error::{Result, ShardflowError};
pub use executor::{ParallelExecutor, SegmentExecutor, SegmentTask, SerialExecutor};
pub use hash::{keccak256, H256, EMPTY_CHUNK_HASH};
pub use merkle::{Proof, Tree, TreeBuilder};

/// Size of a single chunk in bytes
pub const CHUNK_SIZE: usize = 256;

/// Number of chunks grouped into one segment
pub const SEGMENT_MAX_CHUNKS: usize = 1024;

/// Size of a full segment in bytes (256 KB)
pub const SEGMENT_SIZE: usize = CHUNK_SIZE * SEGMENT_MAX_CHUNKS;
