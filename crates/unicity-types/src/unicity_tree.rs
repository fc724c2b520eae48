//! Unicity tree: indexed tree over partitions
//!
//! One leaf per partition, keyed by the 4-byte big-endian partition id. The
//! leaf data is the partition's shard tree root and descriptor hash. The root
//! of this tree is what the unicity seal signs.

use serde::{Deserialize, Serialize};

use unicity_core::crypto::hash::{Digest, HashAlgorithm};
use unicity_core::identifiers::PartitionId;
use unicity_core::serialization::{Tagged, TypeTag};
use unicity_core::{CanonicalHasher, Hashable, Result, UnicityError};

use crate::imt::{index_tree_output, ImtPathItem, IndexedLeaf, IndexedMerkleTree};

/// Leaf of the unicity tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnicityTreeData {
    /// Partition the leaf belongs to
    pub partition: PartitionId,
    /// Root of the partition's shard tree
    pub shard_tree_root: Vec<u8>,
    /// Partition description record hash
    pub pdr_hash: Vec<u8>,
}

impl Hashable for UnicityTreeData {
    fn add_to_hasher(&self, hasher: &mut CanonicalHasher) {
        hasher
            .write_raw(&self.partition.to_bytes())
            .write_raw(&self.shard_tree_root)
            .write_raw(&self.pdr_hash);
    }
}

impl IndexedLeaf for UnicityTreeData {
    fn key(&self) -> Vec<u8> {
        self.partition.to_bytes().to_vec()
    }
}

/// Unicity tree of one root round
#[derive(Debug, Clone)]
pub struct UnicityTree {
    tree: IndexedMerkleTree,
    leaves: Vec<UnicityTreeData>,
}

impl UnicityTree {
    /// Build the tree; duplicate partitions are rejected
    pub fn new(algorithm: &dyn HashAlgorithm, mut leaves: Vec<UnicityTreeData>) -> Result<Self> {
        let tree = IndexedMerkleTree::new(algorithm, &leaves)?;
        leaves.sort_by_key(|leaf| leaf.partition);
        tracing::debug!(partitions = leaves.len(), "built unicity tree");
        Ok(Self { tree, leaves })
    }

    /// Root hash signed into the seal; `None` for an empty tree
    pub fn root_hash(&self) -> Option<Digest> {
        self.tree.root_hash()
    }

    /// Leaf data of `partition`
    pub fn leaf(&self, partition: PartitionId) -> Option<&UnicityTreeData> {
        self.leaves
            .binary_search_by_key(&partition, |leaf| leaf.partition)
            .ok()
            .map(|i| &self.leaves[i])
    }

    /// Certificate of `partition`
    ///
    /// Fails naming the queried partition when it has no leaf.
    pub fn certificate(&self, partition: PartitionId) -> Result<UnicityTreeCertificate> {
        let leaf = self.leaf(partition).ok_or_else(|| {
            UnicityError::not_found(format!("certificate for partition {partition} not found"))
        })?;
        let mut path = self.tree.path(&partition.to_bytes())?;
        // the verifier rebuilds the leaf step from its own data
        path.remove(0);
        Ok(UnicityTreeCertificate {
            version: 1,
            partition,
            hash_steps: path,
            pdr_hash: leaf.pdr_hash.clone(),
        })
    }
}

/// Path of one partition in the unicity tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnicityTreeCertificate {
    /// Certificate format version
    pub version: u32,
    /// Partition the certificate is for
    pub partition: PartitionId,
    /// Sibling steps, nearest the leaf first
    pub hash_steps: Vec<ImtPathItem>,
    /// Partition description record hash committed in the leaf
    #[serde(with = "serde_bytes")]
    pub pdr_hash: Vec<u8>,
}

impl UnicityTreeCertificate {
    /// Check the certificate is for `partition` with descriptor `pdr_hash`
    pub fn is_valid(&self, partition: PartitionId, pdr_hash: &[u8]) -> Result<()> {
        if self.partition != partition {
            return Err(UnicityError::hex_mismatch(
                "partition identifier",
                &partition.to_bytes(),
                &self.partition.to_bytes(),
            ));
        }
        if self.pdr_hash != pdr_hash {
            return Err(UnicityError::hex_mismatch(
                "partition description hash",
                pdr_hash,
                &self.pdr_hash,
            ));
        }
        Ok(())
    }

    /// Recompute the unicity tree root from the partition's shard tree root
    pub fn eval_auth_path(
        &self,
        shard_tree_root: &[u8],
        algorithm: &dyn HashAlgorithm,
    ) -> Result<Digest> {
        let leaf = UnicityTreeData {
            partition: self.partition,
            shard_tree_root: shard_tree_root.to_vec(),
            pdr_hash: self.pdr_hash.clone(),
        };
        let key = leaf.key();
        let mut path = Vec::with_capacity(self.hash_steps.len() + 1);
        path.push(ImtPathItem::new(key.clone(), leaf.hash(algorithm)?.to_vec()));
        path.extend(self.hash_steps.iter().cloned());
        index_tree_output(&path, &key, algorithm)
    }
}

impl Hashable for UnicityTreeCertificate {
    fn add_to_hasher(&self, hasher: &mut CanonicalHasher) {
        hasher.write_raw(&self.partition.to_bytes());
        for step in &self.hash_steps {
            hasher.write_raw(&step.key).write_raw(&step.hash);
        }
        hasher.write_raw(&self.pdr_hash);
    }
}

impl Tagged for UnicityTreeCertificate {
    const TAG: TypeTag = TypeTag::UnicityTreeCertificate;
    const TYPE_NAME: &'static str = "UnicityTreeCertificate";

    fn version(&self) -> u32 {
        self.version
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use unicity_core::HashAlgorithmKind;

    fn data(partition: u32, root: u8) -> UnicityTreeData {
        UnicityTreeData {
            partition: PartitionId::new(partition),
            shard_tree_root: vec![root; 32],
            pdr_hash: vec![0xaa; 32],
        }
    }

    #[test]
    fn test_three_partitions() {
        let algo = HashAlgorithmKind::Sha256.algorithm();
        let tree = UnicityTree::new(algo, vec![data(3, 3), data(1, 1), data(2, 2)]).unwrap();
        let cert = tree.certificate(PartitionId::new(1)).unwrap();
        assert_eq!(cert.hash_steps.len(), 2);
        assert_eq!(
            Some(cert.eval_auth_path(&[1; 32], algo).unwrap()),
            tree.root_hash()
        );

        let err = tree.certificate(PartitionId::new(4)).unwrap_err();
        assert_eq!(err.to_string(), "certificate for partition 00000004 not found");
    }

    #[test]
    fn test_absent_partitions_named_exactly() {
        let algo = HashAlgorithmKind::Sha256.algorithm();
        let tree = UnicityTree::new(algo, vec![data(0x0102_0301, 9)]).unwrap();
        assert_eq!(
            tree.certificate(PartitionId::new(0x0102))
                .unwrap_err()
                .to_string(),
            "certificate for partition 00000102 not found"
        );
        assert_eq!(
            tree.certificate(PartitionId::new(1)).unwrap_err().to_string(),
            "certificate for partition 00000001 not found"
        );
    }

    #[test]
    fn test_duplicate_partition_rejected() {
        let algo = HashAlgorithmKind::Sha256.algorithm();
        assert!(UnicityTree::new(algo, vec![data(1, 1), data(1, 2)]).is_err());
    }

    #[test]
    fn test_wrong_shard_root_changes_output() {
        let algo = HashAlgorithmKind::Sha256.algorithm();
        let tree = UnicityTree::new(algo, vec![data(1, 1), data(2, 2)]).unwrap();
        let cert = tree.certificate(PartitionId::new(2)).unwrap();
        assert_ne!(
            Some(cert.eval_auth_path(&[1; 32], algo).unwrap()),
            tree.root_hash()
        );
    }

    #[test]
    fn test_is_valid_messages() {
        let partition = PartitionId::new(0x0101_0101);
        let cert = UnicityTreeCertificate {
            version: 1,
            partition,
            hash_steps: vec![ImtPathItem::new(partition.to_bytes(), vec![1; 32])],
            pdr_hash: vec![1, 1, 1, 1],
        };
        assert_eq!(
            cert.is_valid(PartitionId::new(0x0101_0100), &[1, 1, 1, 1])
                .unwrap_err()
                .to_string(),
            "invalid partition identifier: expected 01010100, got 01010101"
        );
        assert_eq!(
            cert.is_valid(partition, &[1, 1, 1, 2]).unwrap_err().to_string(),
            "invalid partition description hash: expected 01010102, got 01010101"
        );
        cert.is_valid(partition, &[1, 1, 1, 1]).unwrap();
    }

    #[test]
    fn test_certificate_hash_vector() {
        let partition = PartitionId::new(0x0101_0101);
        let cert = UnicityTreeCertificate {
            version: 1,
            partition,
            hash_steps: vec![ImtPathItem::new(partition.to_bytes(), vec![1, 2, 3])],
            pdr_hash: vec![1, 2, 3, 4],
        };
        let algo = HashAlgorithmKind::Sha256.algorithm();
        let expected = algo.hash(&[1, 1, 1, 1, 1, 1, 1, 1, 1, 2, 3, 1, 2, 3, 4]);
        assert_eq!(cert.hash(algo).unwrap(), expected);
    }
}
