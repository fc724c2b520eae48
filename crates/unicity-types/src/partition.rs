//! Partition description record

use serde::{Deserialize, Serialize};

use unicity_core::crypto::hash::{Digest, HashAlgorithm};
use unicity_core::identifiers::{PartitionId, PartitionTypeId};
use unicity_core::serialization::{ensure_version, Tagged, TypeTag};
use unicity_core::{CanonicalHasher, Hashable, Result, UnicityError};

use crate::shard_tree::ShardingScheme;

/// Static description of a partition
///
/// Its hash is the descriptor hash committed in the partition's unicity tree
/// leaf, so every certificate of the partition is bound to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartitionDescriptionRecord {
    /// Record format version
    pub version: u32,
    /// Network the partition belongs to
    pub network_id: u16,
    /// Partition identifier
    pub partition_id: PartitionId,
    /// Partition class
    pub partition_type_id: PartitionTypeId,
    /// Length of the unit type part of unit ids, in bytes
    pub type_id_len: u32,
    /// Length of the unit id, in bytes
    pub unit_id_len: u32,
    /// Shards of the partition
    pub shards: ShardingScheme,
    /// Time without a certified block after which the root chain issues a
    /// repeat certificate, milliseconds
    pub t2_timeout_ms: u64,
}

impl PartitionDescriptionRecord {
    /// Check the record before it is hashed or used to build trees
    pub fn is_valid(&self) -> Result<()> {
        ensure_version(self)?;
        if self.unit_id_len == 0 {
            return Err(UnicityError::invalid("unit id length must be positive"));
        }
        if self.type_id_len > self.unit_id_len {
            return Err(UnicityError::invalid(format!(
                "type id length {} exceeds unit id length {}",
                self.type_id_len, self.unit_id_len
            )));
        }
        if self.t2_timeout_ms == 0 {
            return Err(UnicityError::invalid("T2 timeout must be positive"));
        }
        self.shards.validate()
    }

    /// Descriptor hash under `algorithm`
    pub fn descriptor_hash(&self, algorithm: &dyn HashAlgorithm) -> Result<Digest> {
        self.hash(algorithm)
    }
}

impl Hashable for PartitionDescriptionRecord {
    fn add_to_hasher(&self, hasher: &mut CanonicalHasher) {
        hasher.write(self);
    }
}

impl Tagged for PartitionDescriptionRecord {
    const TAG: TypeTag = TypeTag::PartitionDescriptionRecord;
    const TYPE_NAME: &'static str = "PartitionDescriptionRecord";

    fn version(&self) -> u32 {
        self.version
    }
}
