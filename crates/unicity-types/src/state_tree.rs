//! Value-summing state tree
//!
//! A binary search tree over units ordered by [`UnitId`]. Every node carries a
//! unit (its id, log root and own value) and commits to the hash and total
//! value of both of its subtrees. A node's committed total is its own value
//! plus both subtree totals, so the root total is the sum over all units.
//!
//! Node hash recipe, in write order:
//!
//! | field | write |
//! |---|---|
//! | unit id | bytes |
//! | log root | bytes |
//! | subtree total | u64 |
//! | left subtree hash | optional bytes |
//! | left subtree total | u64 |
//! | right subtree hash | optional bytes |
//! | right subtree total | u64 |
//!
//! An empty subtree contributes an absent hash and a zero total.

use serde::{Deserialize, Serialize};

use unicity_core::crypto::hash::{Digest, HashAlgorithm};
use unicity_core::identifiers::UnitId;
use unicity_core::{CanonicalHasher, Result, UnicityError};

/// A unit as committed by the state tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateUnit {
    /// Unit identifier
    pub unit_id: UnitId,
    /// Root of the unit's log tree
    pub log_root: Vec<u8>,
    /// Unit's own value
    pub value: u64,
}

/// Ancestor step of a state tree path
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateTreePathItem {
    /// Ancestor unit id
    pub unit_id: UnitId,
    /// Ancestor log root
    #[serde(with = "serde_bytes")]
    pub logs_hash: Vec<u8>,
    /// Ancestor's own value
    pub value: u64,
    /// Hash of the ancestor's other subtree
    #[serde(with = "serde_bytes")]
    pub sibling_summary_hash: Option<Vec<u8>>,
    /// Total of the ancestor's other subtree
    pub sibling_summary_value: u64,
}

/// Inclusion path of one unit in the state tree
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateTreeCert {
    /// Hash of the unit's left subtree
    #[serde(with = "serde_bytes")]
    pub left_summary_hash: Option<Vec<u8>>,
    /// Total of the unit's left subtree
    pub left_summary_value: u64,
    /// Hash of the unit's right subtree
    #[serde(with = "serde_bytes")]
    pub right_summary_hash: Option<Vec<u8>>,
    /// Total of the unit's right subtree
    pub right_summary_value: u64,
    /// Ancestors, nearest first
    pub path: Vec<StateTreePathItem>,
}

#[allow(clippy::too_many_arguments)]
fn node_hash(
    algorithm: &dyn HashAlgorithm,
    unit_id: &UnitId,
    log_root: &[u8],
    total: u64,
    left_hash: Option<&[u8]>,
    left_total: u64,
    right_hash: Option<&[u8]>,
    right_total: u64,
) -> Result<Digest> {
    let mut hasher = CanonicalHasher::new(algorithm);
    hasher
        .write_bytes(unit_id.as_bytes())
        .write_bytes(log_root)
        .write_u64(total)
        .write_opt_bytes(left_hash)
        .write_u64(left_total)
        .write_opt_bytes(right_hash)
        .write_u64(right_total);
    hasher.sum()
}

fn add(values: &[u64]) -> Result<u64> {
    values
        .iter()
        .try_fold(0u64, |acc, v| acc.checked_add(*v))
        .ok_or_else(|| UnicityError::invalid("summary value overflow"))
}

impl StateTreeCert {
    /// Recompute the root hash and total value from one unit
    ///
    /// At each ancestor the running subtree takes the left slot when the
    /// unit's id is strictly less than the ancestor's id, and the right slot
    /// otherwise.
    pub fn compute_output(
        &self,
        unit_id: &UnitId,
        log_root: &[u8],
        unit_value: u64,
        algorithm: &dyn HashAlgorithm,
    ) -> Result<(Digest, u64)> {
        let mut v = add(&[unit_value, self.left_summary_value, self.right_summary_value])?;
        let mut h = node_hash(
            algorithm,
            unit_id,
            log_root,
            v,
            self.left_summary_hash.as_deref(),
            self.left_summary_value,
            self.right_summary_hash.as_deref(),
            self.right_summary_value,
        )?;
        for p in &self.path {
            let vv = add(&[p.value, v, p.sibling_summary_value])?;
            h = if unit_id < &p.unit_id {
                node_hash(
                    algorithm,
                    &p.unit_id,
                    &p.logs_hash,
                    vv,
                    Some(h.as_slice()),
                    v,
                    p.sibling_summary_hash.as_deref(),
                    p.sibling_summary_value,
                )?
            } else {
                node_hash(
                    algorithm,
                    &p.unit_id,
                    &p.logs_hash,
                    vv,
                    p.sibling_summary_hash.as_deref(),
                    p.sibling_summary_value,
                    Some(h.as_slice()),
                    v,
                )?
            };
            v = vv;
        }
        Ok((h, v))
    }
}

#[derive(Debug, Clone)]
struct Node {
    unit: StateUnit,
    total: u64,
    hash: Digest,
    left: Option<Box<Node>>,
    right: Option<Box<Node>>,
}

fn summary(child: &Option<Box<Node>>) -> (Option<Vec<u8>>, u64) {
    match child {
        Some(node) => (Some(node.hash.to_vec()), node.total),
        None => (None, 0),
    }
}

fn build(algorithm: &dyn HashAlgorithm, units: &[StateUnit]) -> Result<Option<Box<Node>>> {
    if units.is_empty() {
        return Ok(None);
    }
    let mid = units.len() / 2;
    let left = build(algorithm, &units[..mid])?;
    let right = build(algorithm, &units[mid + 1..])?;
    let unit = units[mid].clone();
    let (lh, lv) = summary(&left);
    let (rh, rv) = summary(&right);
    let total = add(&[unit.value, lv, rv])?;
    let hash = node_hash(
        algorithm,
        &unit.unit_id,
        &unit.log_root,
        total,
        lh.as_deref(),
        lv,
        rh.as_deref(),
        rv,
    )?;
    Ok(Some(Box::new(Node {
        unit,
        total,
        hash,
        left,
        right,
    })))
}

/// Immutable state tree of one round
#[derive(Debug, Clone)]
pub struct StateTree {
    root: Option<Box<Node>>,
}

impl StateTree {
    /// Build a balanced tree over `units`
    ///
    /// Units may come in any order. Empty and duplicate unit ids are rejected.
    pub fn new(algorithm: &dyn HashAlgorithm, mut units: Vec<StateUnit>) -> Result<Self> {
        units.sort_by(|a, b| a.unit_id.cmp(&b.unit_id));
        if units.iter().any(|u| u.unit_id.is_empty()) {
            return Err(UnicityError::invalid("state tree unit id is empty"));
        }
        if let Some(pair) = units.windows(2).find(|w| w[0].unit_id == w[1].unit_id) {
            return Err(UnicityError::invalid(format!(
                "duplicate unit id {}",
                pair[0].unit_id
            )));
        }
        let root = build(algorithm, &units)?;
        tracing::debug!(
            units = units.len(),
            algorithm = algorithm.name(),
            "built state tree"
        );
        Ok(Self { root })
    }

    /// Root hash; `None` for an empty tree
    pub fn root_hash(&self) -> Option<Digest> {
        self.root.as_ref().map(|node| node.hash)
    }

    /// Sum of all unit values
    pub fn root_summary_value(&self) -> u64 {
        self.root.as_ref().map_or(0, |node| node.total)
    }

    /// Inclusion path of `unit_id`
    pub fn certificate(&self, unit_id: &UnitId) -> Result<StateTreeCert> {
        let mut ancestors: Vec<StateTreePathItem> = Vec::new();
        let mut current = self.root.as_ref();
        while let Some(node) = current {
            let (next, sibling) = match unit_id.cmp(&node.unit.unit_id) {
                std::cmp::Ordering::Equal => {
                    let (lh, lv) = summary(&node.left);
                    let (rh, rv) = summary(&node.right);
                    ancestors.reverse();
                    return Ok(StateTreeCert {
                        left_summary_hash: lh,
                        left_summary_value: lv,
                        right_summary_hash: rh,
                        right_summary_value: rv,
                        path: ancestors,
                    });
                }
                std::cmp::Ordering::Less => (&node.left, &node.right),
                std::cmp::Ordering::Greater => (&node.right, &node.left),
            };
            let (sibling_hash, sibling_value) = summary(sibling);
            ancestors.push(StateTreePathItem {
                unit_id: node.unit.unit_id.clone(),
                logs_hash: node.unit.log_root.clone(),
                value: node.unit.value,
                sibling_summary_hash: sibling_hash,
                sibling_summary_value: sibling_value,
            });
            current = next.as_ref();
        }
        Err(UnicityError::not_found(format!(
            "unit {unit_id} not found in state tree"
        )))
    }
}
