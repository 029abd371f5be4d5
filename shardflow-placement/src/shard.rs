//! Shard configuration and candidate storage nodes
//!
//! A node owning shard `(shard_id, num_shard)` stores every segment whose
//! index is congruent to `shard_id` modulo `num_shard`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Errors parsing a shard configuration from text
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ShardConfigError {
    #[error("Expected <shardId>/<numShard>, got {0:?}")]
    Format(String),

    #[error("Invalid number {0:?}")]
    Number(String),

    #[error("Invalid shard config {0}: numShard must be a power of two and shardId < numShard")]
    Invalid(ShardConfig),
}

/// Ownership of the residue class `shard_id mod num_shard`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShardConfig {
    pub shard_id: u64,
    pub num_shard: u64,
}

impl ShardConfig {
    pub fn new(shard_id: u64, num_shard: u64) -> Self {
        Self {
            shard_id,
            num_shard,
        }
    }

    /// Whether the segment at `index` belongs to this shard.
    ///
    /// `num_shard` of 0 or 1 owns every segment.
    pub fn has_segment(&self, index: u64) -> bool {
        self.num_shard < 2 || index % self.num_shard == self.shard_id
    }

    /// `num_shard` is a nonzero power of two and `shard_id < num_shard`
    pub fn is_valid(&self) -> bool {
        self.num_shard.is_power_of_two() && self.shard_id < self.num_shard
    }

    /// Trie granularity this shard lives at; 0 is treated like 1
    pub fn granularity(&self) -> u64 {
        self.num_shard.max(1)
    }
}

impl fmt::Display for ShardConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.shard_id, self.num_shard)
    }
}

impl FromStr for ShardConfig {
    type Err = ShardConfigError;

    /// Parse `<shardId>/<numShard>`, e.g. `3/8`. The result must be valid.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (id, num) = s
            .trim()
            .split_once('/')
            .ok_or_else(|| ShardConfigError::Format(s.to_string()))?;

        let parse = |v: &str| {
            v.trim()
                .parse::<u64>()
                .map_err(|_| ShardConfigError::Number(v.to_string()))
        };

        let config = ShardConfig::new(parse(id)?, parse(num)?);
        if !config.is_valid() {
            return Err(ShardConfigError::Invalid(config));
        }
        Ok(config)
    }
}

/// A candidate storage node as reported by the node directory
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShardedNode {
    pub url: String,
    pub config: ShardConfig,
    /// RPC latency in milliseconds
    pub latency: i64,
    /// Last updated timestamp
    pub since: i64,
}

impl ShardedNode {
    /// Create a node with no latency/liveness information
    pub fn new(url: impl Into<String>, config: ShardConfig) -> Self {
        Self {
            url: url.into(),
            config,
            latency: 0,
            since: 0,
        }
    }

    /// Set the measured latency
    pub fn with_latency(mut self, latency_ms: i64) -> Self {
        self.latency = latency_ms;
        self
    }

    /// Set the last-seen timestamp
    pub fn with_since(mut self, since: i64) -> Self {
        self.since = since;
        self
    }
}
