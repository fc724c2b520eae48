//! Unit state proof and the data it proves

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_bytes::ByteBuf;

use unicity_core::crypto::hash::{sum_hashes, Digest, HashAlgorithm};
use unicity_core::identifiers::UnitId;
use unicity_core::serialization::{decode_tagged, from_slice, Tagged, TypeTag};
use unicity_core::{CanonicalHasher, Result, UnicityError};
use unicity_types::{plain_tree_output, PathItem, StateTreeCert, UnicityCertificate};

/// Path of a unit's latest log entry in its log tree
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitTreeCert {
    /// Transaction record of the entry; absent when the unit did not change
    #[serde(with = "serde_bytes")]
    pub transaction_record_hash: Option<Vec<u8>>,
    /// Hash of the unit's data after the entry
    #[serde(with = "serde_bytes")]
    pub unit_data_hash: Vec<u8>,
    /// Log tree path, leaf end first
    pub path: Vec<PathItem>,
}

/// Digest of one unit log entry
///
/// `H(ledger || data)` without a transaction record, otherwise
/// `H(H(ledger || record) || data)`.
pub fn log_entry_digest(
    unit_ledger_hash: &[u8],
    transaction_record_hash: Option<&[u8]>,
    unit_data_hash: &[u8],
    algorithm: &dyn HashAlgorithm,
) -> Digest {
    match transaction_record_hash {
        None => sum_hashes(algorithm, unit_ledger_hash, unit_data_hash),
        Some(txr) => sum_hashes(
            algorithm,
            &sum_hashes(algorithm, unit_ledger_hash, txr),
            unit_data_hash,
        ),
    }
}

impl UnitTreeCert {
    /// Root of the unit's log tree, recomputed from the entry
    pub fn log_root(&self, unit_ledger_hash: &[u8], algorithm: &dyn HashAlgorithm) -> Vec<u8> {
        let z = log_entry_digest(
            unit_ledger_hash,
            self.transaction_record_hash.as_deref(),
            &self.unit_data_hash,
            algorithm,
        );
        plain_tree_output(&self.path, &z, algorithm)
    }
}

/// Canonically encoded unit data, opaque to the proof
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StateUnitData {
    /// Canonical encoding of the unit's data
    #[serde(with = "serde_bytes")]
    pub data: Vec<u8>,
}

impl StateUnitData {
    /// Wrap an already encoded payload
    pub fn new(data: impl Into<Vec<u8>>) -> Self {
        Self { data: data.into() }
    }

    /// Encode a typed payload
    pub fn encode<T: Serialize>(value: &T) -> Result<Self> {
        Ok(Self::new(unicity_core::serialization::to_vec(value)?))
    }

    /// Unit data hash: the encoded bytes, unframed
    pub fn hash(&self, algorithm: &dyn HashAlgorithm) -> Result<Digest> {
        let mut hasher = CanonicalHasher::new(algorithm);
        hasher.write_raw(&self.data);
        hasher.sum()
    }

    /// Decode the payload into a typed value
    pub fn decode_data<T: DeserializeOwned>(&self) -> Result<T> {
        if self.data.is_empty() {
            return Err(UnicityError::missing("state unit data"));
        }
        from_slice(&self.data)
    }
}

/// Everything needed to prove one unit's state against a unicity certificate
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitStateProof {
    /// Proof format version
    pub version: u32,
    /// Unit the proof is for
    pub unit_id: UnitId,
    /// Unit's own value
    pub unit_value: u64,
    /// Unit ledger hash preceding the latest log entry
    #[serde(with = "serde_bytes")]
    pub unit_ledger_hash: Vec<u8>,
    /// Log tree path
    pub unit_tree_cert: Option<UnitTreeCert>,
    /// State tree path
    pub state_tree_cert: Option<StateTreeCert>,
    /// Tagged encoding of the unicity certificate
    pub unicity_certificate: Option<ByteBuf>,
}

impl UnitStateProof {
    /// Log tree path
    pub fn unit_tree_cert(&self) -> Result<&UnitTreeCert> {
        self.unit_tree_cert
            .as_ref()
            .ok_or_else(|| UnicityError::missing("unit tree cert"))
    }

    /// State tree path
    pub fn state_tree_cert(&self) -> Result<&StateTreeCert> {
        self.state_tree_cert
            .as_ref()
            .ok_or_else(|| UnicityError::missing("state tree cert"))
    }

    /// Decode the embedded unicity certificate
    pub fn unicity_certificate(&self) -> Result<UnicityCertificate> {
        let bytes = self
            .unicity_certificate
            .as_ref()
            .ok_or_else(|| UnicityError::missing("unicity certificate"))?;
        decode_tagged(bytes)
    }

    /// State tree root hash and total value recomputed from the unit
    pub fn calculate_state_tree_output(
        &self,
        algorithm: &dyn HashAlgorithm,
    ) -> Result<(Digest, u64)> {
        let log_root = self
            .unit_tree_cert()?
            .log_root(&self.unit_ledger_hash, algorithm);
        self.state_tree_cert()?
            .compute_output(&self.unit_id, &log_root, self.unit_value, algorithm)
    }
}

impl Tagged for UnitStateProof {
    const TAG: TypeTag = TypeTag::UnitStateProof;
    const TYPE_NAME: &'static str = "UnitStateProof";

    fn version(&self) -> u32 {
        self.version
    }
}

/// Unit data travelling together with its proof
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitDataAndProof {
    /// Unit data
    pub unit_data: Option<StateUnitData>,
    /// Proof of the data
    pub proof: Option<UnitStateProof>,
}

impl UnitDataAndProof {
    /// Decode the unit data into a typed value
    pub fn decode_unit_data<T: DeserializeOwned>(&self) -> Result<T> {
        self.unit_data
            .as_ref()
            .ok_or_else(|| UnicityError::missing("unit data"))?
            .decode_data()
    }
}
