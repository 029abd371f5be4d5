//! Chunk and segment arithmetic
//!
//! Data is split into fixed 256-byte chunks, grouped into segments of 1024
//! chunks. Before hashing, the chunk count is padded ("flow padding") so the
//! resulting Merkle tree has a bounded number of odd levels.

use crate::{CHUNK_SIZE, SEGMENT_SIZE};

/// Number of `unit`-sized pieces needed to hold `total` bytes (ceiling division)
pub fn num_splits(total: u64, unit: u64) -> u64 {
    debug_assert!(unit > 0, "unit must be positive");
    total.div_ceil(unit)
}

/// Smallest power of two greater than or equal to `n` (1 for `n == 0`)
pub fn next_pow2(n: u64) -> u64 {
    n.next_power_of_two()
}

/// Pad a chunk count for the flow tree.
///
/// Returns `(padded_chunks, chunks_next_pow2)`. A power-of-two count is kept
/// as is; otherwise the count is rounded up to a multiple of
/// `chunks_next_pow2 / 16` (at least 1).
pub fn compute_padded_chunks(chunks: u64) -> (u64, u64) {
    if chunks == 0 {
        return (0, 0);
    }

    let chunks_next_pow2 = next_pow2(chunks);
    if chunks_next_pow2 == chunks {
        return (chunks, chunks_next_pow2);
    }

    let min_chunk = if chunks_next_pow2 >= 16 {
        chunks_next_pow2 / 16
    } else {
        1
    };
    let padded = num_splits(chunks, min_chunk) * min_chunk;

    (padded, chunks_next_pow2)
}

/// Number of chunks needed to hold `size` bytes
pub fn chunks_for_size(size: u64) -> u64 {
    num_splits(size, CHUNK_SIZE as u64)
}

/// Number of segments needed to hold `size` bytes
pub fn segments_for_size(size: u64) -> u64 {
    num_splits(size, SEGMENT_SIZE as u64)
}

/// Padded byte size of `size` bytes of content under flow padding
pub fn padded_size_for(size: u64) -> u64 {
    let (padded_chunks, _) = compute_padded_chunks(chunks_for_size(size));
    padded_chunks * CHUNK_SIZE as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_num_splits() {
        assert_eq!(num_splits(0, 256), 0);
        assert_eq!(num_splits(1, 256), 1);
        assert_eq!(num_splits(256, 256), 1);
        assert_eq!(num_splits(257, 256), 2);
        assert_eq!(num_splits(u64::MAX, 1), u64::MAX);
    }

    #[test]
    fn test_compute_padded_chunks_power_of_two() {
        assert_eq!(compute_padded_chunks(1), (1, 1));
        assert_eq!(compute_padded_chunks(1024), (1024, 1024));
    }

    #[test]
    fn test_compute_padded_chunks_small() {
        // below 16 chunks every count is its own multiple
        assert_eq!(compute_padded_chunks(3), (3, 4));
        assert_eq!(compute_padded_chunks(9), (9, 16));
    }

    #[test]
    fn test_compute_padded_chunks_rounds_to_sixteenth() {
        // next pow2 = 2048, min chunk = 128
        assert_eq!(compute_padded_chunks(1025), (1152, 2048));
        assert_eq!(compute_padded_chunks(17), (18, 32));
    }

    #[test]
    fn test_padded_size_for() {
        assert_eq!(padded_size_for(0), 0);
        assert_eq!(padded_size_for(1), CHUNK_SIZE as u64);
        assert_eq!(padded_size_for(3 * 256 - 10), 3 * 256);
        assert_eq!(
            padded_size_for(SEGMENT_SIZE as u64 + 1),
            1152 * CHUNK_SIZE as u64
        );
    }

    #[test]
    fn test_segments_for_size() {
        assert_eq!(segments_for_size(SEGMENT_SIZE as u64), 1);
        assert_eq!(segments_for_size(SEGMENT_SIZE as u64 + 1), 2);
    }

    proptest! {
        #[test]
        fn prop_padding_bounds(chunks in 1u64..(1 << 40)) {
            let (padded, pow2) = compute_padded_chunks(chunks);
            prop_assert!(padded >= chunks);
            prop_assert!(padded <= pow2);
            prop_assert_eq!(padded % (pow2 / 16).max(1), 0);
        }
    }
}
