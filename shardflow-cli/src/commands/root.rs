//! Root Command
//!
//! Computes the content root of a local file: the Merkle root over its
//! flow-padded segments.

use anyhow::{Context, Result};
use console::style;
use serde::Serialize;
use shardflow_core::{
    merkle_tree, merkle_tree_with, num_segments_padded, FileData, IterableData, ParallelExecutor,
};
use std::path::PathBuf;

use crate::symbols;

/// Root configuration
pub struct RootConfig {
    pub path: PathBuf,
    pub parallel: bool,
    pub batch: usize,
    pub json: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RootReport {
    root: String,
    size: u64,
    padded_size: u64,
    chunks: u64,
    segments: u64,
}

/// Run root command
pub fn run(config: RootConfig) -> Result<()> {
    let data = FileData::open(&config.path)
        .with_context(|| format!("Failed to open {}", config.path.display()))?;

    let tree = if config.parallel {
        merkle_tree_with(&data, &ParallelExecutor::new(config.batch))?
    } else {
        merkle_tree(&data)?
    };

    let report = RootReport {
        root: tree.root().to_hex(),
        size: data.size(),
        padded_size: data.padded_size(),
        chunks: data.num_chunks(),
        segments: num_segments_padded(&data),
    };

    if config.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!(
        "{} {}",
        style(symbols::CHECK).green(),
        style(config.path.display()).bold()
    );
    println!("{}", symbols::HLINE_SHORT);
    println!("  Root:        {}", style(&report.root).cyan());
    println!("  Size:        {} bytes", report.size);
    println!("  Padded size: {} bytes", report.padded_size);
    println!("  Chunks:      {}", report.chunks);
    println!("  Segments:    {}", report.segments);

    Ok(())
}
