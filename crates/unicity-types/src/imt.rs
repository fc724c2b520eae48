//! Indexed Merkle tree over fixed-width keys
//!
//! Leaves are sorted by key. A range of `n > 1` leaves splits at the largest
//! power of two below `n`, and the branch is labelled with the largest key of
//! its left half, so every key at or below the label lives on the left.
//!
//! Hash recipes, all raw writes:
//!
//! - leaf: `H(0x00 || key || data hash)`
//! - branch: `H(0x01 || label || left || right)`
//!
//! All keys of one tree must have the same width. Lookup is by exact key; a
//! key of another width is an input error, never a prefix match.

use serde::{Deserialize, Serialize};

use unicity_core::crypto::hash::{Digest, HashAlgorithm};
use unicity_core::{CanonicalHasher, Hashable, Result, UnicityError};

use crate::merkle::split_point;

const TAG_LEAF: u8 = 0x00;
const TAG_BRANCH: u8 = 0x01;

/// Leaf data of an indexed tree
pub trait IndexedLeaf: Hashable {
    /// Fixed-width key of the leaf
    fn key(&self) -> Vec<u8>;
}

/// One step of an indexed tree path
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImtPathItem {
    /// Leaf key for the first step, branch label for the rest
    #[serde(with = "serde_bytes")]
    pub key: Vec<u8>,
    /// Data hash for the first step, sibling hash for the rest
    #[serde(with = "serde_bytes")]
    pub hash: Vec<u8>,
}

impl ImtPathItem {
    /// Create a path item
    pub fn new(key: impl Into<Vec<u8>>, hash: impl Into<Vec<u8>>) -> Self {
        Self {
            key: key.into(),
            hash: hash.into(),
        }
    }
}

fn leaf_hash(algorithm: &dyn HashAlgorithm, key: &[u8], data_hash: &[u8]) -> Result<Digest> {
    let mut hasher = CanonicalHasher::new(algorithm);
    hasher.write_raw(&[TAG_LEAF]).write_raw(key).write_raw(data_hash);
    hasher.sum()
}

fn branch_hash(
    algorithm: &dyn HashAlgorithm,
    label: &[u8],
    left: &[u8],
    right: &[u8],
) -> Result<Digest> {
    let mut hasher = CanonicalHasher::new(algorithm);
    hasher
        .write_raw(&[TAG_BRANCH])
        .write_raw(label)
        .write_raw(left)
        .write_raw(right);
    hasher.sum()
}

#[derive(Debug, Clone)]
enum Node {
    Leaf {
        key: Vec<u8>,
        data_hash: Digest,
        hash: Digest,
    },
    Branch {
        label: Vec<u8>,
        hash: Digest,
        left: Box<Node>,
        right: Box<Node>,
    },
}

impl Node {
    fn hash(&self) -> &Digest {
        match self {
            Node::Leaf { hash, .. } | Node::Branch { hash, .. } => hash,
        }
    }
}

fn build(algorithm: &dyn HashAlgorithm, leaves: &[(Vec<u8>, Digest)]) -> Result<Node> {
    if let [(key, data_hash)] = leaves {
        return Ok(Node::Leaf {
            hash: leaf_hash(algorithm, key, data_hash)?,
            key: key.clone(),
            data_hash: *data_hash,
        });
    }
    let k = split_point(leaves.len());
    let label = leaves[k - 1].0.clone();
    let left = build(algorithm, &leaves[..k])?;
    let right = build(algorithm, &leaves[k..])?;
    Ok(Node::Branch {
        hash: branch_hash(algorithm, &label, left.hash(), right.hash())?,
        label,
        left: Box::new(left),
        right: Box::new(right),
    })
}

/// Immutable indexed Merkle tree
#[derive(Debug, Clone)]
pub struct IndexedMerkleTree {
    root: Option<Node>,
    key_len: usize,
}

impl IndexedMerkleTree {
    /// Build the tree; leaves may come in any order
    pub fn new<L: IndexedLeaf>(algorithm: &dyn HashAlgorithm, leaves: &[L]) -> Result<Self> {
        let mut entries = leaves
            .iter()
            .map(|leaf| Ok((leaf.key(), leaf.hash(algorithm)?)))
            .collect::<Result<Vec<_>>>()?;
        entries.sort_by(|a, b| a.0.cmp(&b.0));

        let key_len = entries.first().map_or(0, |(key, _)| key.len());
        if key_len == 0 && !entries.is_empty() {
            return Err(UnicityError::invalid("indexed tree key is empty"));
        }
        if let Some((key, _)) = entries.iter().find(|(key, _)| key.len() != key_len) {
            return Err(UnicityError::invalid(format!(
                "indexed tree keys must be {key_len} bytes, got {} for key {}",
                key.len(),
                hex::encode(key)
            )));
        }
        if let Some(pair) = entries.windows(2).find(|w| w[0].0 == w[1].0) {
            return Err(UnicityError::invalid(format!(
                "duplicate key {}",
                hex::encode(&pair[0].0)
            )));
        }
        let root = if entries.is_empty() {
            None
        } else {
            Some(build(algorithm, &entries)?)
        };
        Ok(Self { root, key_len })
    }

    /// Root hash; `None` for an empty tree
    pub fn root_hash(&self) -> Option<Digest> {
        self.root.as_ref().map(|node| *node.hash())
    }

    /// Path of `key`: its leaf item first, then one sibling per level
    pub fn path(&self, key: &[u8]) -> Result<Vec<ImtPathItem>> {
        if self.root.is_some() && key.len() != self.key_len {
            return Err(UnicityError::invalid(format!(
                "invalid key length: expected {} bytes, got {}",
                self.key_len,
                key.len()
            )));
        }
        let not_found = || UnicityError::not_found(format!("key {} not found", hex::encode(key)));
        let mut node = self.root.as_ref().ok_or_else(not_found)?;
        let mut siblings = Vec::new();
        loop {
            match node {
                Node::Branch {
                    label, left, right, ..
                } => {
                    if key <= label.as_slice() {
                        siblings.push(ImtPathItem::new(label.clone(), right.hash().to_vec()));
                        node = left.as_ref();
                    } else {
                        siblings.push(ImtPathItem::new(label.clone(), left.hash().to_vec()));
                        node = right.as_ref();
                    }
                }
                Node::Leaf {
                    key: leaf_key,
                    data_hash,
                    ..
                } => {
                    if leaf_key.as_slice() != key {
                        return Err(not_found());
                    }
                    let mut path = vec![ImtPathItem::new(leaf_key.clone(), data_hash.to_vec())];
                    path.extend(siblings.into_iter().rev());
                    return Ok(path);
                }
            }
        }
    }
}

/// Recompute the root from a path produced by [`IndexedMerkleTree::path`]
///
/// At each branch the running hash is the left operand when `key` is less
/// than or equal to the branch label.
pub fn index_tree_output(
    path: &[ImtPathItem],
    key: &[u8],
    algorithm: &dyn HashAlgorithm,
) -> Result<Digest> {
    let (leaf, siblings) = path
        .split_first()
        .ok_or_else(|| UnicityError::invalid("indexed tree path is empty"))?;
    if leaf.key != key {
        return Err(UnicityError::hex_mismatch("path leaf key", key, &leaf.key));
    }
    let mut h = leaf_hash(algorithm, &leaf.key, &leaf.hash)?;
    for item in siblings {
        h = if key <= item.key.as_slice() {
            branch_hash(algorithm, &item.key, &h, &item.hash)?
        } else {
            branch_hash(algorithm, &item.key, &item.hash, &h)?
        };
    }
    Ok(h)
}
