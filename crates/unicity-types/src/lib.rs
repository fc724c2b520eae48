//! Unicity Types - commitment trees and certificates
//!
//! The nested commitment scheme, leaves first:
//!
//! - **Unit log tree**: plain Merkle tree over a unit's log digests ([`merkle`])
//! - **State tree**: value-summing tree over units ([`state_tree`])
//! - **Shard tree**: per-partition tree over shard input records ([`shard_tree`])
//! - **Unicity tree**: indexed tree over partitions ([`unicity_tree`], [`imt`])
//! - **Seal and certificate**: the signed root and the portable proof of a
//!   partition round ([`unicity_seal`], [`unicity_certificate`])
//!
//! Trees are built once from a finalized leaf set and never mutated.
//! Certificates are plain values; verifying one recomputes the same hash
//! recipes from the leaf upwards.

#![forbid(unsafe_code)]

/// Indexed Merkle tree over fixed-width keys
pub mod imt;

/// Per-round partition state commitment
pub mod input_record;

/// Plain Merkle tree
pub mod merkle;

/// Partition description record
pub mod partition;

/// Shard tree and sharding scheme
pub mod shard_tree;

/// Value-summing state tree
pub mod state_tree;

/// Root-chain trust base
pub mod trust_base;

/// Unicity certificate
pub mod unicity_certificate;

/// Root-chain seal
pub mod unicity_seal;

/// Unicity tree over partitions
pub mod unicity_tree;

pub use imt::{index_tree_output, ImtPathItem, IndexedLeaf, IndexedMerkleTree};
pub use input_record::{
    assert_equal, assert_equal_except_round, is_equal, InputRecord, INPUT_RECORD_VERSION,
};
pub use merkle::{plain_tree_output, MerkleTree, PathItem};
pub use partition::PartitionDescriptionRecord;
pub use shard_tree::{
    shard_leaf_hash, ShardTree, ShardTreeCertificate, ShardTreeInput, ShardingScheme,
};
pub use state_tree::{StateTree, StateTreeCert, StateTreePathItem, StateUnit};
pub use trust_base::{RootNode, RootTrustBase};
pub use unicity_certificate::UnicityCertificate;
pub use unicity_seal::UnicitySeal;
pub use unicity_tree::{UnicityTree, UnicityTreeCertificate, UnicityTreeData};
