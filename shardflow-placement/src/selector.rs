//! Storage node selection
//!
//! Picks a subset of candidate nodes whose shards replicate every segment at
//! least `expected_replica` times. Candidates are visited either in a random
//! order or sorted from coarse to fine shards, and two checks run per node:
//! - Logical: the node's shard goes into a `ShardCoverage` trie; the call
//!   succeeds once the whole (unbounded) address space is covered.
//! - Bounded: when the segment count is known, each concrete segment index
//!   owned by the node is counted until it reaches the target; the call
//!   succeeds once every index has.
//!
//! This is a greedy feasibility search; it stops at the first covering set
//! and does not minimize the node count.

use crate::coverage::{SegmentCoverage, ShardCoverage};
use crate::shard::{ShardConfig, ShardedNode};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use tracing::{debug, info, instrument, warn};

/// Which check completed a successful selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoveragePath {
    /// No replicas were requested
    Trivial,
    /// The shard coverage trie reached the target over the whole space
    Logical,
    /// Every concrete segment index reached the target; `hits` counts the
    /// segment replicas assigned
    Bounded { hits: u64 },
}

/// Outcome of a selection
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    /// Chosen nodes; empty on failure
    pub nodes: Vec<ShardedNode>,
    /// `None` when no covering set was found
    pub path: Option<CoveragePath>,
}

impl Selection {
    fn success(nodes: Vec<ShardedNode>, path: CoveragePath) -> Self {
        Self {
            nodes,
            path: Some(path),
        }
    }

    fn failure() -> Self {
        Self::default()
    }

    pub fn is_success(&self) -> bool {
        self.path.is_some()
    }

    /// Split into `(nodes, success)`
    pub fn into_parts(self) -> (Vec<ShardedNode>, bool) {
        let success = self.is_success();
        (self.nodes, success)
    }
}

/// Select nodes so every segment is replicated `expected_replica` times.
///
/// `total_segments` of 0 disables the bounded check. With `random`, the
/// candidates are shuffled with an entropy-seeded RNG; otherwise they are
/// sorted by `(num_shard, shard_id)`. Either way `nodes` is reordered in place.
#[instrument(skip(nodes), fields(candidates = nodes.len()))]
pub fn select(
    total_segments: u64,
    nodes: &mut [ShardedNode],
    expected_replica: u32,
    random: bool,
) -> Selection {
    if expected_replica == 0 {
        return Selection::success(Vec::new(), CoveragePath::Trivial);
    }

    if random {
        nodes.shuffle(&mut StdRng::from_entropy());
    } else {
        sort_by_shard(nodes);
    }

    select_ordered(total_segments, nodes, expected_replica)
}

/// Like `select` in random mode, but shuffles with an explicit seed so the
/// result is reproducible.
#[instrument(skip(nodes), fields(candidates = nodes.len()))]
pub fn select_seeded(
    total_segments: u64,
    nodes: &mut [ShardedNode],
    expected_replica: u32,
    seed: u64,
) -> Selection {
    if expected_replica == 0 {
        return Selection::success(Vec::new(), CoveragePath::Trivial);
    }

    nodes.shuffle(&mut StdRng::seed_from_u64(seed));
    select_ordered(total_segments, nodes, expected_replica)
}

/// Whether the given shard layout can replicate every segment
/// `expected_replica` times.
pub fn check_replica(total_segments: u64, configs: &[ShardConfig], expected_replica: u32) -> bool {
    let mut nodes: Vec<ShardedNode> = configs
        .iter()
        .map(|config| ShardedNode {
            config: *config,
            ..Default::default()
        })
        .collect();

    select(total_segments, &mut nodes, expected_replica, false).is_success()
}

/// Coarser shards first, then by shard id
fn sort_by_shard(nodes: &mut [ShardedNode]) {
    nodes.sort_by_key(|node| (node.config.num_shard, node.config.shard_id));
}

fn select_ordered(total_segments: u64, nodes: &[ShardedNode], expected_replica: u32) -> Selection {
    let mut coverage = ShardCoverage::new();
    let mut logical = Vec::new();

    let mut bounded =
        (total_segments > 0).then(|| SegmentCoverage::new(total_segments, expected_replica));
    let mut bounded_nodes = Vec::new();

    for node in nodes {
        let config = node.config;

        if coverage.insert(config.num_shard, config.shard_id, expected_replica) {
            debug!(url = %node.url, shard = %config, "Node raises logical coverage");
            logical.push(node.clone());
        }

        if coverage.is_covered(expected_replica) {
            info!(
                selected = logical.len(),
                depth = coverage.depth(),
                "Shard coverage reached expected replica"
            );
            return Selection::success(logical, CoveragePath::Logical);
        }

        if let Some(counter) = bounded.as_mut() {
            if counter.add(&config) {
                debug!(
                    url = %node.url,
                    shard = %config,
                    hits = counter.hits(),
                    "Node covers segments"
                );
                bounded_nodes.push(node.clone());
            }

            if counter.is_saturated() {
                info!(
                    selected = bounded_nodes.len(),
                    hits = counter.hits(),
                    "Every segment reached expected replica"
                );
                return Selection::success(
                    bounded_nodes,
                    CoveragePath::Bounded { hits: counter.hits() },
                );
            }
        }
    }

    warn!(
        min_replica = coverage.min_replica(),
        expected_replica,
        "Not enough nodes to reach expected replica"
    );
    Selection::failure()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_node(shard_id: u64, num_shard: u64) -> ShardedNode {
        ShardedNode::new(
            format!("http://node-{}-{}:5678", shard_id, num_shard),
            ShardConfig::new(shard_id, num_shard),
        )
    }

    #[test]
    fn test_zero_replica_is_trivial() {
        let mut nodes = vec![make_node(0, 2)];
        let selection = select(0, &mut nodes, 0, false);
        assert_eq!(selection.path, Some(CoveragePath::Trivial));
        assert!(selection.nodes.is_empty());

        let mut empty: Vec<ShardedNode> = Vec::new();
        let (chosen, ok) = select(0, &mut empty, 0, true).into_parts();
        assert!(ok);
        assert!(chosen.is_empty());
    }

    #[test]
    fn test_four_quarters_logical() {
        let mut nodes: Vec<_> = (0..4).rev().map(|id| make_node(id, 4)).collect();
        let selection = select(0, &mut nodes, 1, false);
        assert_eq!(selection.path, Some(CoveragePath::Logical));
        assert_eq!(selection.nodes.len(), 4);

        // input is sorted in place
        let ids: Vec<u64> = nodes.iter().map(|n| n.config.shard_id).collect();
        assert_eq!(ids, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_sort_prefers_coarse_shards() {
        let mut nodes = vec![make_node(1, 4), make_node(0, 1), make_node(0, 4), make_node(1, 2)];
        let selection = select(0, &mut nodes, 1, false);
        assert_eq!(selection.path, Some(CoveragePath::Logical));
        assert_eq!(selection.nodes, vec![make_node(0, 1)]);
    }

    #[test]
    fn test_skips_non_contributing_nodes() {
        let mut nodes = vec![make_node(1, 2), make_node(0, 2), make_node(0, 2)];
        let selection = select(0, &mut nodes, 1, false);
        // the second 0/2 adds nothing
        assert_eq!(selection.nodes, vec![make_node(0, 2), make_node(1, 2)]);
    }

    #[test]
    fn test_failure_returns_empty() {
        let mut nodes = vec![make_node(0, 2), make_node(1, 4)];
        let selection = select(0, &mut nodes, 1, false);
        assert!(!selection.is_success());
        assert!(selection.nodes.is_empty());
    }

    #[test]
    fn test_bounded_path_small_segment_count() {
        // segment 0 is owned by 0/2 and segment 1 by 1/4
        let mut nodes = vec![make_node(0, 2), make_node(1, 4)];
        let selection = select(2, &mut nodes, 1, false);
        assert_eq!(selection.path, Some(CoveragePath::Bounded { hits: 2 }));
        assert_eq!(selection.nodes.len(), 2);
    }

    #[test]
    fn test_bounded_path_ignores_saturated_segments() {
        // one segment, two replicas wanted
        let mut nodes = vec![make_node(0, 2), make_node(0, 4), make_node(0, 8)];
        let selection = select(1, &mut nodes, 2, false);
        assert_eq!(selection.path, Some(CoveragePath::Bounded { hits: 2 }));
        assert_eq!(selection.nodes, vec![make_node(0, 2), make_node(0, 4)]);
    }

    #[test]
    fn test_seeded_selection_is_reproducible() {
        let candidates: Vec<_> = (0..8).map(|id| make_node(id, 8)).collect();

        let mut a = candidates.clone();
        let mut b = candidates.clone();
        let first = select_seeded(0, &mut a, 1, 42);
        let second = select_seeded(0, &mut b, 1, 42);

        assert_eq!(a, b);
        assert_eq!(first, second);
        assert_eq!(first.nodes.len(), 8);
    }

    #[test]
    fn test_random_order_still_covers() {
        let mut nodes: Vec<_> = (0..16).map(|id| make_node(id % 4, 4)).collect();
        let (chosen, ok) = select(0, &mut nodes, 2, true).into_parts();
        assert!(ok);
        assert_eq!(chosen.len(), 8);
    }

    #[test]
    fn test_check_replica() {
        let half = ShardConfig::new(0, 2);
        let other = ShardConfig::new(1, 2);
        assert!(!check_replica(0, &[half], 2));
        assert!(!check_replica(0, &[half, other], 2));
        assert!(check_replica(0, &[half, other, half, other], 2));
        assert!(check_replica(0, &[], 0));
    }

    /// Records the names of spans opened while it is the default subscriber
    #[derive(Clone, Default)]
    struct SpanNames(std::sync::Arc<std::sync::Mutex<Vec<&'static str>>>);

    impl<S: tracing::Subscriber> tracing_subscriber::Layer<S> for SpanNames {
        fn on_new_span(
            &self,
            attrs: &tracing::span::Attributes<'_>,
            _id: &tracing::span::Id,
            _ctx: tracing_subscriber::layer::Context<'_, S>,
        ) {
            self.0.lock().unwrap().push(attrs.metadata().name());
        }
    }

    #[test]
    fn test_public_entry_points_open_spans() {
        use tracing_subscriber::layer::SubscriberExt;

        let names = SpanNames::default();
        let subscriber = tracing_subscriber::registry().with(names.clone());

        tracing::subscriber::with_default(subscriber, || {
            let mut nodes = vec![make_node(1, 2), make_node(0, 2)];
            select(0, &mut nodes, 1, false);
            select_seeded(0, &mut nodes, 1, 7);
        });

        let names = names.0.lock().unwrap();
        assert_eq!(*names, vec!["select", "select_seeded"]);
    }
}
