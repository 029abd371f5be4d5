//! Merkle tree over chunk hashes
//!
//! Leaves are Keccak-256 hashes of 256-byte chunks (or precomputed hashes,
//! e.g. the empty-chunk hash or a segment root). Interior nodes hash the
//! concatenation of their two children. When a level has an odd number of
//! nodes, the trailing node is promoted unchanged to the next level.

use crate::error::{Result, ShardflowError};
use crate::hash::{keccak256, keccak256_pair, H256};

/// Accumulates leaves in left-to-right order
#[derive(Debug, Clone, Default)]
pub struct TreeBuilder {
    leaves: Vec<H256>,
}

impl TreeBuilder {
    /// Create an empty builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a builder with room for `capacity` leaves
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            leaves: Vec::with_capacity(capacity),
        }
    }

    /// Append a leaf by hashing its content
    pub fn append(&mut self, content: &[u8]) {
        self.leaves.push(keccak256(content));
    }

    /// Append a precomputed leaf hash
    pub fn append_hash(&mut self, hash: H256) {
        self.leaves.push(hash);
    }

    /// Number of leaves appended so far
    pub fn len(&self) -> usize {
        self.leaves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.leaves.is_empty()
    }

    /// Build the tree. Returns `None` if no leaves were appended.
    pub fn build(self) -> Option<Tree> {
        if self.leaves.is_empty() {
            return None;
        }

        let mut layers = vec![self.leaves];
        while let Some(current) = layers.last().filter(|layer| layer.len() > 1) {
            let mut next = Vec::with_capacity(current.len().div_ceil(2));
            for pair in current.chunks(2) {
                match pair {
                    [left, right] => next.push(keccak256_pair(left, right)),
                    [single] => next.push(*single),
                    _ => unreachable!("chunks(2) yields one or two items"),
                }
            }
            layers.push(next);
        }

        Some(Tree { layers })
    }
}

/// A built Merkle tree, keeping every level for proof generation
#[derive(Debug, Clone)]
pub struct Tree {
    /// `layers[0]` holds the leaves, the last layer holds only the root
    layers: Vec<Vec<H256>>,
}

impl Tree {
    /// Root hash
    pub fn root(&self) -> H256 {
        self.layers
            .last()
            .and_then(|layer| layer.first())
            .copied()
            .unwrap_or_default()
    }

    /// Number of leaves
    pub fn leaf_count(&self) -> usize {
        self.layers.first().map_or(0, Vec::len)
    }

    /// Leaf hash at `position`
    pub fn leaf(&self, position: usize) -> Option<H256> {
        self.layers.first().and_then(|leaves| leaves.get(position)).copied()
    }

    /// Number of levels, counting the leaf level and the root level
    pub fn height(&self) -> usize {
        self.layers.len()
    }

    /// Build an inclusion proof for the leaf at `position`
    pub fn proof_at(&self, position: usize) -> Result<Proof> {
        let leaf_count = self.leaf_count();
        if position >= leaf_count {
            return Err(ShardflowError::InvalidProof(format!(
                "position {} out of range (leaf count: {})",
                position, leaf_count
            )));
        }

        let mut lemma = vec![self.layers[0][position]];
        let mut path = Vec::new();
        let mut index = position;

        for layer in &self.layers[..self.layers.len() - 1] {
            let sibling = index ^ 1;
            // promoted nodes have no sibling at this level
            if sibling < layer.len() {
                lemma.push(layer[sibling]);
                path.push(index % 2 == 0);
            }
            index /= 2;
        }

        lemma.push(self.root());
        Ok(Proof { lemma, path })
    }
}

/// Merkle inclusion proof.
///
/// `lemma` is `[leaf, sibling..., root]`; `path[i]` is true when the node
/// being proven sits on the left of `lemma[i + 1]`.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Proof {
    pub lemma: Vec<H256>,
    pub path: Vec<bool>,
}

impl Proof {
    /// Validate the proof against a root, the proven leaf hash and its position
    pub fn validate(
        &self,
        root: &H256,
        leaf: &H256,
        position: usize,
        leaf_count: usize,
    ) -> Result<()> {
        if self.lemma.len() != self.path.len() + 2 {
            return Err(ShardflowError::InvalidProof(format!(
                "lemma length {} does not match path length {}",
                self.lemma.len(),
                self.path.len()
            )));
        }

        if self.lemma.first() != Some(leaf) {
            return Err(ShardflowError::InvalidProof("leaf mismatch".to_string()));
        }

        if self.lemma.last() != Some(root) {
            return Err(ShardflowError::InvalidProof("root mismatch".to_string()));
        }

        if self.path != expected_path(position, leaf_count)? {
            return Err(ShardflowError::InvalidProof(
                "path does not match position".to_string(),
            ));
        }

        let mut current = *leaf;
        for (sibling, is_left) in self.lemma[1..self.lemma.len() - 1].iter().zip(&self.path) {
            current = if *is_left {
                keccak256_pair(&current, sibling)
            } else {
                keccak256_pair(sibling, &current)
            };
        }

        if current != *root {
            return Err(ShardflowError::InvalidProof(
                "computed root mismatch".to_string(),
            ));
        }

        Ok(())
    }
}

fn expected_path(position: usize, leaf_count: usize) -> Result<Vec<bool>> {
    if position >= leaf_count {
        return Err(ShardflowError::InvalidProof(format!(
            "position {} out of range (leaf count: {})",
            position, leaf_count
        )));
    }

    let mut path = Vec::new();
    let mut index = position;
    let mut width = leaf_count;
    while width > 1 {
        if index ^ 1 < width {
            path.push(index % 2 == 0);
        }
        index /= 2;
        width = width.div_ceil(2);
    }
    Ok(path)
}
