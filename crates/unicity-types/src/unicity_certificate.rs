//! Unicity certificate: portable proof that a partition round was certified

use serde::{Deserialize, Serialize};

use unicity_core::crypto::hash::HashAlgorithm;
use unicity_core::identifiers::PartitionId;
use unicity_core::serialization::{ensure_version, Tagged, TypeTag};
use unicity_core::{CanonicalHasher, Hashable, Result, SignatureVerifier, UnicityError};

use crate::input_record::{assert_equal_except_round, InputRecord};
use crate::shard_tree::ShardTreeCertificate;
use crate::trust_base::RootTrustBase;
use crate::unicity_seal::UnicitySeal;
use crate::unicity_tree::UnicityTreeCertificate;

/// Certificate binding a partition's input record to a signed root
///
/// The commitment chain is input record → shard tree certificate → unicity
/// tree certificate → seal root hash.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnicityCertificate {
    /// Certificate format version
    pub version: u32,
    /// Certified state of the partition (shard)
    pub input_record: Option<InputRecord>,
    /// Transaction-round hash
    #[serde(with = "serde_bytes")]
    pub tr_hash: Vec<u8>,
    /// Path of the shard in its partition's shard tree
    pub shard_tree_certificate: ShardTreeCertificate,
    /// Path of the partition in the unicity tree
    pub unicity_tree_certificate: Option<UnicityTreeCertificate>,
    /// Root-chain seal
    pub unicity_seal: Option<UnicitySeal>,
}

impl UnicityCertificate {
    /// Certified input record
    pub fn input_record(&self) -> Result<&InputRecord> {
        self.input_record
            .as_ref()
            .ok_or_else(|| UnicityError::missing("input record"))
    }

    /// Unicity tree certificate
    pub fn unicity_tree_certificate(&self) -> Result<&UnicityTreeCertificate> {
        self.unicity_tree_certificate
            .as_ref()
            .ok_or_else(|| UnicityError::missing("unicity tree certificate"))
    }

    /// Root-chain seal
    pub fn unicity_seal(&self) -> Result<&UnicitySeal> {
        self.unicity_seal
            .as_ref()
            .ok_or_else(|| UnicityError::missing("unicity seal"))
    }

    /// Partition the certificate is for
    pub fn partition_id(&self) -> Result<PartitionId> {
        Ok(self.unicity_tree_certificate()?.partition)
    }

    /// Root-chain round that sealed the certificate
    pub fn root_round(&self) -> Result<u64> {
        Ok(self.unicity_seal()?.root_chain_round_number)
    }

    /// Structural validity for `partition` with descriptor `pdr_hash`
    ///
    /// Recomputes the unicity tree root from the input record and requires it
    /// to equal the root the seal commits to. Signatures are not checked.
    pub fn is_valid(
        &self,
        algorithm: &dyn HashAlgorithm,
        partition: PartitionId,
        pdr_hash: &[u8],
    ) -> Result<()> {
        ensure_version(self)?;
        let seal = self.unicity_seal()?;
        seal.is_valid()?;
        let ir = self.input_record()?;
        ir.is_valid()?;
        let utc = self.unicity_tree_certificate()?;
        utc.is_valid(partition, pdr_hash)?;

        let shard_root = self
            .shard_tree_certificate
            .compute_root(ir, &self.tr_hash, algorithm)?;
        let root = utc.eval_auth_path(&shard_root, algorithm)?;
        if seal.hash != root {
            return Err(UnicityError::hex_mismatch(
                "unicity tree root hash",
                &seal.hash,
                &root,
            ));
        }
        Ok(())
    }

    /// Structural validity plus a quorum of valid seal signatures
    pub fn verify(
        &self,
        algorithm: &dyn HashAlgorithm,
        partition: PartitionId,
        pdr_hash: &[u8],
        trust_base: &RootTrustBase,
        verifier: &dyn SignatureVerifier,
    ) -> Result<()> {
        self.is_valid(algorithm, partition, pdr_hash)?;
        self.unicity_seal()?.verify(trust_base, verifier, algorithm)
    }

    /// Check that `self` repeats `previous` without a state change
    ///
    /// The input record must equal the previous one in every field but the
    /// round number, and both the partition and root rounds must advance.
    pub fn check_repeat(&self, previous: &UnicityCertificate) -> Result<()> {
        let ir = self.input_record()?;
        let prev_ir = previous.input_record()?;
        assert_equal_except_round(prev_ir, ir)?;
        if ir.round_number <= prev_ir.round_number {
            return Err(UnicityError::invalid(format!(
                "repeat round number {} does not follow {}",
                ir.round_number, prev_ir.round_number
            )));
        }
        let (root_round, prev_root_round) = (self.root_round()?, previous.root_round()?);
        if root_round <= prev_root_round {
            return Err(UnicityError::invalid(format!(
                "repeat root round {root_round} does not follow {prev_root_round}"
            )));
        }
        Ok(())
    }

    /// True when `self` is a valid repeat of `previous`
    pub fn is_repeat(&self, previous: &UnicityCertificate) -> bool {
        self.check_repeat(previous).is_ok()
    }
}

impl Hashable for UnicityCertificate {
    fn add_to_hasher(&self, hasher: &mut CanonicalHasher) {
        hasher.write(self);
    }
}

impl Tagged for UnicityCertificate {
    const TAG: TypeTag = TypeTag::UnicityCertificate;
    const TYPE_NAME: &'static str = "UnicityCertificate";

    fn version(&self) -> u32 {
        self.version
    }
}
