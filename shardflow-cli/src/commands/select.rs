//! Select Command
//!
//! Chooses storage nodes for an upload from a JSON list of candidates.

use anyhow::{bail, Context, Result};
use console::style;
use serde::Serialize;
use shardflow_core::{FileData, IterableData};
use shardflow_placement::{select, select_seeded, CoveragePath, ShardedNode};
use std::fs;
use std::path::PathBuf;

use crate::symbols;

/// Select configuration
pub struct SelectConfig {
    /// JSON array of `ShardedNode`
    pub nodes: PathBuf,
    pub expected_replica: u32,
    pub segments: u64,
    /// Derive the segment count from this file instead
    pub file: Option<PathBuf>,
    pub random: bool,
    pub seed: Option<u64>,
    pub json: bool,
}

#[derive(Serialize)]
struct SelectReport<'a> {
    path: &'a str,
    nodes: &'a [ShardedNode],
}

/// Run select command
pub fn run(config: SelectConfig) -> Result<()> {
    let content = fs::read_to_string(&config.nodes)
        .with_context(|| format!("Failed to read {}", config.nodes.display()))?;
    let mut nodes: Vec<ShardedNode> = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse nodes from {}", config.nodes.display()))?;

    let segments = match &config.file {
        Some(path) => FileData::open(path)
            .with_context(|| format!("Failed to open {}", path.display()))?
            .num_segments(),
        None => config.segments,
    };

    let selection = match config.seed {
        Some(seed) if config.random => {
            select_seeded(segments, &mut nodes, config.expected_replica, seed)
        }
        _ => select(segments, &mut nodes, config.expected_replica, config.random),
    };

    let Some(path) = selection.path else {
        bail!(
            "{} candidate nodes cannot replicate every segment {} times",
            nodes.len(),
            config.expected_replica
        );
    };

    let path_name = match path {
        CoveragePath::Trivial => "trivial",
        CoveragePath::Logical => "logical",
        CoveragePath::Bounded { .. } => "bounded",
    };

    if config.json {
        let report = SelectReport {
            path: path_name,
            nodes: &selection.nodes,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!(
        "{} Selected {} of {} nodes ({} coverage)",
        style(symbols::CHECK).green(),
        style(selection.nodes.len()).bold(),
        nodes.len(),
        path_name
    );
    if let CoveragePath::Bounded { hits } = path {
        println!("  Segment replicas assigned: {}", hits);
    }
    println!("{}", symbols::HLINE_SHORT);
    for node in &selection.nodes {
        println!("  {:<8} {}", style(node.config).cyan(), node.url);
    }

    Ok(())
}
