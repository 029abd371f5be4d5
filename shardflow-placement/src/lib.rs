//! Shardflow Placement Library
//!
//! Decides which storage nodes an upload must use so every segment is
//! replicated a given number of times.
//!
//! Each node owns one shard: the residue class `shard_id mod num_shard` of
//! segment indices. This crate provides:
//! - Shard and node records (`ShardConfig`, `ShardedNode`)
//! - A lazily built coverage trie over the shard address space
//! - Node selection (`select`, `select_seeded`) and layout feasibility
//!   (`check_replica`)

pub mod coverage;
pub mod selector;
pub mod shard;

// Re-export main types
pub use coverage::{SegmentCoverage, ShardCoverage};
pub use selector::{check_replica, select, select_seeded, CoveragePath, Selection};
pub use shard::{ShardConfig, ShardConfigError, ShardedNode};
