//! Check-Replica Command
//!
//! Tells whether a shard layout can replicate every segment the requested
//! number of times.

use anyhow::{bail, Result};
use console::style;
use shardflow_placement::{check_replica, ShardConfig};

use crate::symbols;

/// Check-replica configuration
pub struct CheckConfig {
    pub shards: Vec<ShardConfig>,
    pub expected_replica: u32,
    pub segments: u64,
}

/// Run check-replica command
pub fn run(config: CheckConfig) -> Result<()> {
    let layout = config
        .shards
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ");

    if check_replica(config.segments, &config.shards, config.expected_replica) {
        println!(
            "{} [{}] replicates every segment {} times",
            style(symbols::CHECK).green(),
            layout,
            config.expected_replica
        );
        return Ok(());
    }

    println!(
        "{} [{}] cannot replicate every segment {} times",
        style(symbols::CROSS).red(),
        layout,
        config.expected_replica
    );
    bail!("insufficient replicas")
}
