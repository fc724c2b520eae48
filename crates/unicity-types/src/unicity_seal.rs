//! Root-chain seal over the unicity tree root
//!
//! Root validators sign the digest of the canonical encoding of the tuple
//! `(round, timestamp, previous hash, root hash)`. Seals form a hash chain:
//! each seal's `previous_hash` is the hash of the seal of the round before.
//! The chain hash covers the seal's content but not its signatures, so the
//! set of signers collected for a round never changes the chain.

use serde::{Deserialize, Serialize};
use serde_bytes::{ByteBuf, Bytes};
use std::collections::BTreeMap;

use unicity_core::crypto::hash::{Digest, HashAlgorithm};
use unicity_core::serialization::{ensure_version, hash_canonical, to_vec, Tagged, TypeTag};
use unicity_core::{CanonicalHasher, Hashable, Result, SignatureVerifier, Signer, UnicityError};

use crate::trust_base::RootTrustBase;

/// The root chain's signed attestation of one round
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnicitySeal {
    /// Seal format version
    pub version: u32,
    /// Root-chain round
    pub root_chain_round_number: u64,
    /// Root-chain epoch
    pub epoch: u64,
    /// Round timestamp, seconds
    pub timestamp: u64,
    /// Hash of the previous round's seal
    #[serde(with = "serde_bytes")]
    pub previous_hash: Vec<u8>,
    /// Unicity tree root hash
    #[serde(with = "serde_bytes")]
    pub hash: Vec<u8>,
    /// Signatures by root node id
    pub signatures: BTreeMap<String, ByteBuf>,
}

impl UnicitySeal {
    /// Structural checks, signatures excluded
    pub fn is_valid(&self) -> Result<()> {
        ensure_version(self)?;
        if self.root_chain_round_number == 0 {
            return Err(UnicityError::invalid("root chain round number is unassigned"));
        }
        if self.timestamp == 0 {
            return Err(UnicityError::invalid("timestamp is unassigned"));
        }
        if self.previous_hash.is_empty() {
            return Err(UnicityError::missing("previous hash"));
        }
        if self.hash.is_empty() {
            return Err(UnicityError::missing("hash"));
        }
        if self.signatures.is_empty() {
            return Err(UnicityError::missing("signatures"));
        }
        Ok(())
    }

    fn signed_tuple(&self) -> (u64, u64, &Bytes, &Bytes) {
        (
            self.root_chain_round_number,
            self.timestamp,
            Bytes::new(&self.previous_hash),
            Bytes::new(&self.hash),
        )
    }

    /// Canonical encoding of the signed tuple
    pub fn signing_bytes(&self) -> Result<Vec<u8>> {
        to_vec(&self.signed_tuple())
    }

    /// Digest the root validators sign
    pub fn signing_digest(&self, algorithm: &dyn HashAlgorithm) -> Result<Digest> {
        hash_canonical(algorithm, &self.signed_tuple())
    }

    /// Add the signature of `node_id`
    pub fn sign(
        &mut self,
        node_id: &str,
        signer: &dyn Signer,
        algorithm: &dyn HashAlgorithm,
    ) -> Result<()> {
        if self.hash.is_empty() {
            return Err(UnicityError::missing("hash"));
        }
        let digest = self.signing_digest(algorithm)?;
        let signature = signer.sign_hash(&digest)?;
        self.signatures
            .insert(node_id.to_string(), ByteBuf::from(signature));
        Ok(())
    }

    /// Structural checks plus quorum of valid signatures
    pub fn verify(
        &self,
        trust_base: &RootTrustBase,
        verifier: &dyn SignatureVerifier,
        algorithm: &dyn HashAlgorithm,
    ) -> Result<()> {
        self.is_valid()?;
        let digest = self.signing_digest(algorithm)?;
        trust_base.verify_quorum_signatures(&digest, &self.signatures, verifier)
    }

    /// Check that `self` directly extends `previous` in the seal chain
    pub fn verify_successor(
        &self,
        previous: &UnicitySeal,
        algorithm: &dyn HashAlgorithm,
    ) -> Result<()> {
        let expected = previous.hash(algorithm)?;
        if self.previous_hash != expected {
            return Err(UnicityError::hex_mismatch(
                "previous seal hash",
                &expected,
                &self.previous_hash,
            ));
        }
        if self.root_chain_round_number <= previous.root_chain_round_number {
            return Err(UnicityError::invalid(format!(
                "root chain round {} does not follow {}",
                self.root_chain_round_number, previous.root_chain_round_number
            )));
        }
        Ok(())
    }
}

impl Hashable for UnicitySeal {
    fn add_to_hasher(&self, hasher: &mut CanonicalHasher) {
        hasher
            .write(&self.version)
            .write_u64(self.root_chain_round_number)
            .write_u64(self.epoch)
            .write_u64(self.timestamp)
            .write_bytes(&self.previous_hash)
            .write_bytes(&self.hash);
    }
}

impl Tagged for UnicitySeal {
    const TAG: TypeTag = TypeTag::UnicitySeal;
    const TYPE_NAME: &'static str = "UnicitySeal";

    fn version(&self) -> u32 {
        self.version
    }
}
