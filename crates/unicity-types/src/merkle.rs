//! Plain binary Merkle tree over pre-hashed leaves
//!
//! Used for the per-unit log tree. A tree of `n > 1` leaves splits at the
//! largest power of two below `n`: the left subtree is always perfect and the
//! right subtree takes the remainder. Interior nodes are `H(left || right)`
//! over raw digests. A single leaf is its own root.

use serde::{Deserialize, Serialize};

use unicity_core::crypto::hash::{sum_hashes, Digest, HashAlgorithm};
use unicity_core::{Result, UnicityError};

/// One step of a Merkle path
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathItem {
    /// Sibling hash at this level
    #[serde(with = "serde_bytes")]
    pub hash: Vec<u8>,
    /// True when the running hash is the left operand at this level
    pub direction_left: bool,
}

#[derive(Debug, Clone)]
enum Node {
    Leaf(Digest),
    Branch {
        hash: Digest,
        left: Box<Node>,
        right: Box<Node>,
    },
}

impl Node {
    fn hash(&self) -> &Digest {
        match self {
            Node::Leaf(hash) | Node::Branch { hash, .. } => hash,
        }
    }
}

/// Immutable plain Merkle tree
#[derive(Debug, Clone)]
pub struct MerkleTree {
    root: Option<Node>,
    leaf_count: usize,
}

/// Largest power of two strictly below `n`, for `n > 1`
pub(crate) fn split_point(n: usize) -> usize {
    let mut k = 1;
    while k * 2 < n {
        k *= 2;
    }
    k
}

fn build(algorithm: &dyn HashAlgorithm, leaves: &[Digest]) -> Node {
    if leaves.len() == 1 {
        return Node::Leaf(leaves[0]);
    }
    let k = split_point(leaves.len());
    let left = build(algorithm, &leaves[..k]);
    let right = build(algorithm, &leaves[k..]);
    Node::Branch {
        hash: sum_hashes(algorithm, left.hash(), right.hash()),
        left: Box::new(left),
        right: Box::new(right),
    }
}

impl MerkleTree {
    /// Build the tree over leaf digests in the given order
    pub fn new(algorithm: &dyn HashAlgorithm, leaves: &[Digest]) -> Self {
        let root = (!leaves.is_empty()).then(|| build(algorithm, leaves));
        Self {
            root,
            leaf_count: leaves.len(),
        }
    }

    /// Root digest; `None` for an empty tree
    pub fn root_hash(&self) -> Option<Digest> {
        self.root.as_ref().map(|node| *node.hash())
    }

    /// Number of leaves
    pub fn len(&self) -> usize {
        self.leaf_count
    }

    /// True when the tree has no leaves
    pub fn is_empty(&self) -> bool {
        self.leaf_count == 0
    }

    /// Path from leaf `index` to the root, leaf end first
    pub fn path(&self, index: usize) -> Result<Vec<PathItem>> {
        let Some(mut node) = self.root.as_ref() else {
            return Err(UnicityError::invalid("merkle tree is empty"));
        };
        if index >= self.leaf_count {
            return Err(UnicityError::invalid(format!(
                "leaf index {index} out of range for {} leaves",
                self.leaf_count
            )));
        }
        let mut items = Vec::new();
        let (mut offset, mut size) = (0, self.leaf_count);
        while let Node::Branch { left, right, .. } = node {
            let k = split_point(size);
            if index - offset < k {
                items.push(PathItem {
                    hash: right.hash().to_vec(),
                    direction_left: true,
                });
                node = left.as_ref();
                size = k;
            } else {
                items.push(PathItem {
                    hash: left.hash().to_vec(),
                    direction_left: false,
                });
                node = right.as_ref();
                offset += k;
                size -= k;
            }
        }
        items.reverse();
        Ok(items)
    }
}

/// Fold a leaf digest up a Merkle path
///
/// An empty path returns the leaf itself.
pub fn plain_tree_output(path: &[PathItem], leaf: &[u8], algorithm: &dyn HashAlgorithm) -> Vec<u8> {
    let mut h = leaf.to_vec();
    for item in path {
        let next = if item.direction_left {
            sum_hashes(algorithm, &h, &item.hash)
        } else {
            sum_hashes(algorithm, &item.hash, &h)
        };
        h = next.to_vec();
    }
    h
}
