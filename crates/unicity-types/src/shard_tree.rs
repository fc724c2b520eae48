//! Shard tree of one partition
//!
//! Each shard contributes a leaf `H(input record, transaction-round hash)`,
//! written through the canonical hasher. Interior nodes are `H(left || right)`
//! over raw digests, with the left child under bit `0` of the shard id. An
//! unsharded partition has a single root shard and its leaf is the root.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use unicity_core::crypto::hash::{sum_hashes, Digest, HashAlgorithm};
use unicity_core::identifiers::ShardId;
use unicity_core::serialization::{Tagged, TypeTag};
use unicity_core::{CanonicalHasher, Result, UnicityError};

use crate::input_record::InputRecord;

/// Shards of a partition
///
/// Empty means the single root shard. Otherwise the ids must be prefix-free
/// and cover the whole id space.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShardingScheme(pub Vec<ShardId>);

impl ShardingScheme {
    /// Shard ids of the scheme, the root shard for an empty scheme
    pub fn shards(&self) -> Vec<ShardId> {
        if self.0.is_empty() {
            vec![ShardId::root()]
        } else {
            self.0.clone()
        }
    }

    /// Check that the shard ids are unique, prefix-free and complete
    pub fn validate(&self) -> Result<()> {
        let shards: BTreeSet<ShardId> = self.shards().into_iter().collect();
        if shards.len() != self.shards().len() {
            return Err(UnicityError::invalid("sharding scheme has duplicate shards"));
        }
        check_cover(&shards, &ShardId::root())
    }
}

fn check_cover(shards: &BTreeSet<ShardId>, prefix: &ShardId) -> Result<()> {
    let extends = shards
        .iter()
        .any(|s| s.len() > prefix.len() && prefix.is_prefix_of(s));
    match (shards.contains(prefix), extends) {
        (true, false) => Ok(()),
        (true, true) => Err(UnicityError::invalid(format!(
            "shard {prefix} is a prefix of another shard"
        ))),
        (false, false) => Err(UnicityError::invalid(format!(
            "sharding scheme does not cover {prefix}"
        ))),
        (false, true) => {
            let (left, right) = prefix.split();
            check_cover(shards, &left)?;
            check_cover(shards, &right)
        }
    }
}

/// Round result of one shard
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShardTreeInput {
    /// Shard the input belongs to
    pub shard: ShardId,
    /// Shard's input record
    pub ir: InputRecord,
    /// Transaction-round hash
    pub tr_hash: Vec<u8>,
}

/// Leaf hash of one shard
pub fn shard_leaf_hash(
    ir: &InputRecord,
    tr_hash: &[u8],
    algorithm: &dyn HashAlgorithm,
) -> Result<Digest> {
    let mut hasher = CanonicalHasher::new(algorithm);
    hasher.write_hashable(ir).write_bytes(tr_hash);
    hasher.sum()
}

/// Sibling path of one shard
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShardTreeCertificate {
    /// Shard the certificate is for
    pub shard: ShardId,
    /// Sibling hashes, deepest first; one per shard id bit
    pub sibling_hashes: Vec<Vec<u8>>,
}

impl ShardTreeCertificate {
    /// Recompute the shard tree root from the shard's inputs
    pub fn compute_root(
        &self,
        ir: &InputRecord,
        tr_hash: &[u8],
        algorithm: &dyn HashAlgorithm,
    ) -> Result<Digest> {
        if self.sibling_hashes.len() != self.shard.len() {
            return Err(UnicityError::invalid(format!(
                "shard tree certificate for {} has {} sibling hashes",
                self.shard,
                self.sibling_hashes.len()
            )));
        }
        let mut h = shard_leaf_hash(ir, tr_hash, algorithm)?;
        for (depth, sibling) in (0..self.shard.len()).rev().zip(&self.sibling_hashes) {
            h = match self.shard.bit(depth) {
                Some(true) => sum_hashes(algorithm, sibling, &h),
                _ => sum_hashes(algorithm, &h, sibling),
            };
        }
        Ok(h)
    }
}

impl Tagged for ShardTreeCertificate {
    const TAG: TypeTag = TypeTag::ShardTreeCertificate;
    const TYPE_NAME: &'static str = "ShardTreeCertificate";

    // unversioned on the wire
    fn version(&self) -> u32 {
        1
    }
}

/// Immutable shard tree
#[derive(Debug, Clone)]
pub struct ShardTree {
    nodes: BTreeMap<ShardId, Digest>,
}

fn fill(
    nodes: &mut BTreeMap<ShardId, Digest>,
    leaves: &BTreeMap<ShardId, Digest>,
    prefix: ShardId,
    algorithm: &dyn HashAlgorithm,
) -> Digest {
    if let Some(leaf) = leaves.get(&prefix) {
        nodes.insert(prefix, *leaf);
        return *leaf;
    }
    let (left, right) = prefix.split();
    let l = fill(nodes, leaves, left, algorithm);
    let r = fill(nodes, leaves, right, algorithm);
    let h = sum_hashes(algorithm, &l, &r);
    nodes.insert(prefix, h);
    h
}

impl ShardTree {
    /// Build the tree; every shard of `scheme` needs exactly one input
    pub fn new(
        scheme: &ShardingScheme,
        inputs: &[ShardTreeInput],
        algorithm: &dyn HashAlgorithm,
    ) -> Result<Self> {
        scheme.validate()?;
        let expected: BTreeSet<ShardId> = scheme.shards().into_iter().collect();
        let mut leaves = BTreeMap::new();
        for input in inputs {
            if !expected.contains(&input.shard) {
                return Err(UnicityError::invalid(format!(
                    "shard {} is not in the sharding scheme",
                    input.shard
                )));
            }
            let leaf = shard_leaf_hash(&input.ir, &input.tr_hash, algorithm)?;
            if leaves.insert(input.shard.clone(), leaf).is_some() {
                return Err(UnicityError::invalid(format!(
                    "duplicate input for shard {}",
                    input.shard
                )));
            }
        }
        if let Some(missing) = expected.iter().find(|s| !leaves.contains_key(*s)) {
            return Err(UnicityError::missing(format!("input for shard {missing}")));
        }
        let mut nodes = BTreeMap::new();
        fill(&mut nodes, &leaves, ShardId::root(), algorithm);
        tracing::debug!(shards = leaves.len(), "built shard tree");
        Ok(Self { nodes })
    }

    /// Root hash
    pub fn root_hash(&self) -> Digest {
        self.nodes
            .get(&ShardId::root())
            .copied()
            .unwrap_or_default()
    }

    /// Sibling path of `shard`
    pub fn certificate(&self, shard: &ShardId) -> Result<ShardTreeCertificate> {
        let is_leaf = self.nodes.contains_key(shard) && !self.nodes.contains_key(&shard.split().0);
        if !is_leaf {
            return Err(UnicityError::not_found(format!(
                "shard {shard} not found in shard tree"
            )));
        }
        let mut sibling_hashes = Vec::with_capacity(shard.len());
        for depth in (0..shard.len()).rev() {
            let mut sibling = shard.bits()[..=depth].to_vec();
            sibling[depth] = !sibling[depth];
            let hash = self.nodes.get(&ShardId::from_bits(&sibling)).ok_or_else(|| {
                UnicityError::invalid(format!("shard tree has no node for sibling of {shard}"))
            })?;
            sibling_hashes.push(hash.to_vec());
        }
        Ok(ShardTreeCertificate {
            shard: shard.clone(),
            sibling_hashes,
        })
    }
}
