//! Content fingerprinting
//!
//! Computes the Merkle root of a data source. Each padded segment is read
//! (with zero fill past the logical end), reduced to a segment root, and the
//! segment roots are appended to a shared tree builder in index order.
//! Because a full segment is a power-of-two number of chunks, the result is
//! identical to building one tree over every padded chunk.

use crate::chunk::num_splits;
use crate::data::IterableData;
use crate::error::{Result, ShardflowError};
use crate::executor::{SegmentExecutor, SegmentTask, SerialExecutor};
use crate::hash::{H256, EMPTY_CHUNK_HASH};
use crate::merkle::{Tree, TreeBuilder};
use crate::{CHUNK_SIZE, SEGMENT_MAX_CHUNKS, SEGMENT_SIZE};
use tracing::{debug, info, instrument};

/// Merkle root of the given chunks followed by `padding_chunks` empty chunks.
///
/// `chunks` should be a whole number of 256-byte chunks; a short trailing
/// chunk is hashed as if zero-filled to full size. Returns the zero hash when
/// there are no chunks at all.
pub fn segment_root(chunks: &[u8], padding_chunks: u64) -> H256 {
    let real_chunks = chunks.len().div_ceil(CHUNK_SIZE);
    let mut builder = TreeBuilder::with_capacity(leaf_capacity(real_chunks, padding_chunks));

    for chunk in chunks.chunks(CHUNK_SIZE) {
        if chunk.len() == CHUNK_SIZE {
            builder.append(chunk);
        } else {
            let mut padded = [0u8; CHUNK_SIZE];
            padded[..chunk.len()].copy_from_slice(chunk);
            builder.append(&padded);
        }
    }

    for _ in 0..padding_chunks {
        builder.append_hash(*EMPTY_CHUNK_HASH);
    }

    builder.build().map(|tree| tree.root()).unwrap_or_default()
}

/// Leaves to pre-allocate for a segment, at most one full segment
fn leaf_capacity(real_chunks: usize, padding_chunks: u64) -> usize {
    let padding = usize::try_from(padding_chunks).unwrap_or(usize::MAX);
    real_chunks.saturating_add(padding).min(SEGMENT_MAX_CHUNKS)
}

/// Read up to `read_size` bytes at `offset`, treating everything between the
/// logical size and `padded_size` as zeros.
pub fn read_at<D: IterableData + ?Sized>(
    data: &D,
    read_size: usize,
    offset: u64,
    padded_size: u64,
) -> Result<Vec<u8>> {
    if offset >= padded_size {
        return Err(ShardflowError::InvalidOffset {
            offset,
            padded_size,
        });
    }

    let available = padded_size - offset;
    let len = (read_size as u64).min(available) as usize;
    let mut buf = vec![0u8; len];

    // entirely inside the padding
    if offset >= data.size() {
        return Ok(buf);
    }

    data.read(&mut buf, offset)?;
    Ok(buf)
}

/// Number of segments in the padded data
pub fn num_segments_padded<D: IterableData + ?Sized>(data: &D) -> u64 {
    num_splits(data.padded_size(), SEGMENT_SIZE as u64)
}

/// Build the Merkle tree of a data source, one segment at a time
pub fn merkle_tree<D: IterableData + ?Sized>(data: &D) -> Result<Tree> {
    merkle_tree_with(data, &SerialExecutor)
}

/// Build the Merkle tree of a data source using the given executor
#[instrument(skip_all, fields(size = data.size()))]
pub fn merkle_tree_with<D, E>(data: &D, executor: &E) -> Result<Tree>
where
    D: IterableData + ?Sized,
    E: SegmentExecutor,
{
    let segments = num_segments_padded(data);
    let mut task = TreeBuilderTask {
        data,
        padded_size: data.padded_size(),
        builder: TreeBuilder::with_capacity(segments as usize),
    };

    executor.run(&mut task, segments)?;

    let tree = task.builder.build().ok_or(ShardflowError::EmptyData)?;
    info!(segments, root = %tree.root(), "Computed content root");
    Ok(tree)
}

/// Reads each segment and appends its root to the shared builder
struct TreeBuilderTask<'a, D: ?Sized> {
    data: &'a D,
    padded_size: u64,
    builder: TreeBuilder,
}

impl<D: IterableData + ?Sized> SegmentTask for TreeBuilderTask<'_, D> {
    type Output = H256;

    fn process(&self, index: u64) -> Result<H256> {
        let offset = index * SEGMENT_SIZE as u64;
        let buf = read_at(self.data, SEGMENT_SIZE, offset, self.padded_size)?;
        let root = segment_root(&buf, 0);
        debug!(index, chunks = buf.len() / CHUNK_SIZE, "Hashed segment");
        Ok(root)
    }

    fn collect(&mut self, _index: u64, root: H256) -> Result<()> {
        self.builder.append_hash(root);
        Ok(())
    }
}
