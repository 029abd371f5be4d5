//! Shard coverage trie
//!
//! A binary trie over the shard address space. The root covers the whole
//! space at granularity 1; a node at depth `d` has granularity `2^d` and
//! stands for one residue class modulo `2^d`. Inserting shard
//! `(shard_id, num_shard)` walks the low bits of `shard_id` down to depth
//! `log2(num_shard)` and bumps the replica count there.
//!
//! Children are only created when an insertion needs to go below a node.
//! Replica increments applied to a childless node are kept in `pending` and
//! pushed to both children when they are needed, so a node's `min_replica`
//! is always `pending + min(children)`.
//!
//! Nodes live in an arena and refer to each other by index.
//!
//! `SegmentCoverage` is the bounded counterpart: it counts replicas per
//! concrete segment index when the total segment count is known.

use crate::shard::ShardConfig;
use std::collections::HashMap;

const ROOT: usize = 0;

#[derive(Debug, Clone)]
struct CoverageNode {
    children: Option<[usize; 2]>,
    granularity: u64,
    pending: u32,
    min_replica: u32,
}

impl CoverageNode {
    fn new(granularity: u64) -> Self {
        Self {
            children: None,
            granularity,
            pending: 0,
            min_replica: 0,
        }
    }
}

/// Tracks the minimum replica count reached over the shard address space
#[derive(Debug, Clone)]
pub struct ShardCoverage {
    nodes: Vec<CoverageNode>,
    max_granularity: u64,
}

impl Default for ShardCoverage {
    fn default() -> Self {
        Self::new()
    }
}

impl ShardCoverage {
    /// Create a trie covering the whole space with no replicas
    pub fn new() -> Self {
        Self {
            nodes: vec![CoverageNode::new(1)],
            max_granularity: 1,
        }
    }

    /// Insert a shard if it raises coverage below `expected_replica`.
    ///
    /// Returns `false` without touching the trie when the shard's position is
    /// already covered `expected_replica` times. A `num_shard` of 0 is treated
    /// as 1. A `num_shard` that is not a power of two is never inserted.
    pub fn insert(&mut self, num_shard: u64, shard_id: u64, expected_replica: u32) -> bool {
        let target = num_shard.max(1);
        if !target.is_power_of_two() {
            return false;
        }

        let inserted = self.insert_at(ROOT, target, shard_id, expected_replica);
        if inserted {
            self.max_granularity = self.max_granularity.max(target);
        }
        inserted
    }

    fn insert_at(&mut self, index: usize, target: u64, shard_id: u64, expected: u32) -> bool {
        let node = &mut self.nodes[index];
        if node.min_replica >= expected {
            return false;
        }

        if node.granularity == target {
            node.min_replica += 1;
            node.pending += 1;
            return true;
        }

        let [left, right] = self.push_down(index);
        let child = if shard_id % 2 == 0 { left } else { right };
        let inserted = self.insert_at(child, target, shard_id >> 1, expected);

        let min = self.nodes[left].min_replica.min(self.nodes[right].min_replica);
        self.nodes[index].min_replica = min;
        inserted
    }

    /// Materialize children if needed and hand them any pending increment
    fn push_down(&mut self, index: usize) -> [usize; 2] {
        let children = match self.nodes[index].children {
            Some(children) => children,
            None => {
                let granularity = self.nodes[index].granularity << 1;
                let left = self.nodes.len();
                self.nodes.push(CoverageNode::new(granularity));
                self.nodes.push(CoverageNode::new(granularity));
                let children = [left, left + 1];
                self.nodes[index].children = Some(children);
                children
            }
        };

        let pending = std::mem::take(&mut self.nodes[index].pending);
        if pending > 0 {
            for child in children {
                self.nodes[child].min_replica += pending;
                self.nodes[child].pending += pending;
            }
        }

        children
    }

    /// Minimum replica count reached anywhere in the space
    pub fn min_replica(&self) -> u32 {
        self.nodes[ROOT].min_replica
    }

    /// Whether every position is covered at least `expected_replica` times
    pub fn is_covered(&self, expected_replica: u32) -> bool {
        self.min_replica() >= expected_replica
    }

    /// Finest granularity inserted so far
    pub fn max_granularity(&self) -> u64 {
        self.max_granularity
    }

    /// Depth of the finest inserted shard, `log2(max_granularity)`
    pub fn depth(&self) -> u32 {
        self.max_granularity.trailing_zeros()
    }

    /// Number of trie nodes materialized so far
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Drop every insertion, keeping the allocated arena
    pub fn reset(&mut self) {
        self.nodes.clear();
        self.nodes.push(CoverageNode::new(1));
        self.max_granularity = 1;
    }
}

/// Replica counts for concrete segment indices `0..total_segments`
#[derive(Debug, Clone)]
pub struct SegmentCoverage {
    total_segments: u64,
    expected_replica: u32,
    occupied: HashMap<u64, u32>,
    hits: u64,
    /// `None` when the target overflows and can never be reached
    target_hits: Option<u64>,
}

impl SegmentCoverage {
    pub fn new(total_segments: u64, expected_replica: u32) -> Self {
        Self {
            total_segments,
            expected_replica,
            occupied: HashMap::new(),
            hits: 0,
            target_hits: total_segments.checked_mul(expected_replica as u64),
        }
    }

    /// Count every segment of the shard that is still below target.
    /// Returns whether any segment was counted.
    pub fn add(&mut self, config: &ShardConfig) -> bool {
        let stride = config.granularity();
        let mut chosen = false;
        let mut index = config.shard_id;

        while index < self.total_segments {
            let count = self.occupied.entry(index).or_insert(0);
            if *count < self.expected_replica {
                *count += 1;
                self.hits += 1;
                chosen = true;
            }

            index = match index.checked_add(stride) {
                Some(next) => next,
                None => break,
            };
        }

        chosen
    }

    /// Segment replicas counted so far
    pub fn hits(&self) -> u64 {
        self.hits
    }

    /// Replica count of one segment
    pub fn replica(&self, index: u64) -> u32 {
        self.occupied.get(&index).copied().unwrap_or(0)
    }

    /// Every segment reached the expected replica
    pub fn is_saturated(&self) -> bool {
        Some(self.hits) == self.target_hits
    }
}
