//! Certificate validator capability
//!
//! Proof verification delegates the question "is this certificate signed by
//! the root chain and linked to what we already trust" to a
//! [`UnicityCertificateValidator`]. Implementations may do I/O, for example
//! fetch the current trust base, which makes this the one async step of
//! verification.

use async_trait::async_trait;
use std::sync::Arc;

use unicity_core::config::{ConfigValidation, VerifierConfig};
use unicity_core::{HashAlgorithmKind, Hashable, PartitionId, Result, SignatureVerifier};
use unicity_types::{RootTrustBase, UnicityCertificate, UnicitySeal};

/// Checks a unicity certificate's signatures and chain linkage
#[async_trait]
pub trait UnicityCertificateValidator: Send + Sync {
    /// Accept or reject `certificate`
    async fn validate(&self, certificate: &UnicityCertificate) -> Result<()>;
}

/// Validator backed by a static root trust base
pub struct TrustBaseValidator {
    trust_base: RootTrustBase,
    verifier: Arc<dyn SignatureVerifier>,
    algorithm: HashAlgorithmKind,
    partition: PartitionId,
    pdr_hash: Vec<u8>,
    previous_seal: Option<UnicitySeal>,
}

impl TrustBaseValidator {
    /// Create a validator for certificates of `partition`
    pub fn new(
        trust_base: RootTrustBase,
        verifier: Arc<dyn SignatureVerifier>,
        algorithm: HashAlgorithmKind,
        partition: PartitionId,
        pdr_hash: Vec<u8>,
    ) -> Self {
        Self {
            trust_base,
            verifier,
            algorithm,
            partition,
            pdr_hash,
            previous_seal: None,
        }
    }

    /// Build from verifier configuration, checking signatures with the configured scheme
    pub fn from_config(config: &VerifierConfig) -> Result<Self> {
        config.validate()?;
        let trust_base = RootTrustBase::from_config(&config.trust_base)?;
        Ok(Self::new(
            trust_base,
            config.signature_scheme.verifier(),
            config.hash_algorithm,
            config.partition_id,
            config.pdr_hash_bytes()?,
        ))
    }

    /// Require certificates to be sealed by `seal` or by its direct successor
    pub fn with_previous_seal(mut self, seal: UnicitySeal) -> Self {
        self.previous_seal = Some(seal);
        self
    }

    /// Trust base in use
    pub fn trust_base(&self) -> &RootTrustBase {
        &self.trust_base
    }
}

#[async_trait]
impl UnicityCertificateValidator for TrustBaseValidator {
    async fn validate(&self, certificate: &UnicityCertificate) -> Result<()> {
        let algorithm = self.algorithm.algorithm();
        certificate.verify(
            algorithm,
            self.partition,
            &self.pdr_hash,
            &self.trust_base,
            self.verifier.as_ref(),
        )?;
        if let Some(previous) = &self.previous_seal {
            let seal = certificate.unicity_seal()?;
            let same_round = seal.root_chain_round_number == previous.root_chain_round_number
                && seal.hash(algorithm)? == previous.hash(algorithm)?;
            if !same_round {
                seal.verify_successor(previous, algorithm)?;
            }
        }
        tracing::debug!(
            partition = %self.partition,
            root_round = certificate.root_round()?,
            "unicity certificate accepted"
        );
        Ok(())
    }
}
