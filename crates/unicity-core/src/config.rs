//! Verifier configuration
//!
//! Configuration is read once from TOML, optionally overridden from
//! `UNICITY_`-prefixed environment variables, validated, and then shared
//! immutably. Nothing mutates it after start-up.
//!
//! ```toml
//! hash_algorithm = "sha256"
//! signature_scheme = "ed25519"
//! validator_timeout_ms = 5000
//! partition_id = 1
//! pdr_hash = "9f0c…"
//!
//! [trust_base]
//! quorum_threshold = 1
//!
//! [[trust_base.nodes]]
//! node_id = "root-1"
//! public_key = "8a88…"
//! stake = 1
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;
use std::time::Duration;

use crate::crypto::hash::HashAlgorithmKind;
use crate::crypto::signer::SignatureScheme;
use crate::identifiers::PartitionId;
use crate::{Result, UnicityError};

/// Environment variable prefix for overrides
pub const ENV_PREFIX: &str = "UNICITY_";

/// Default time budget for the certificate validator call
pub const DEFAULT_VALIDATOR_TIMEOUT_MS: u64 = 5_000;

/// Trait for configuration validation
pub trait ConfigValidation {
    /// Validate this configuration
    fn validate(&self) -> Result<()>;
}

/// Settings a client needs to verify unit state proofs of one partition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VerifierConfig {
    /// Hash algorithm used by every tree of the partition
    pub hash_algorithm: HashAlgorithmKind,
    /// Signature scheme of the root-chain nodes
    pub signature_scheme: SignatureScheme,
    /// Time budget for the certificate validator, in milliseconds
    pub validator_timeout_ms: u64,
    /// Partition the proofs must belong to
    pub partition_id: PartitionId,
    /// Expected partition description record hash, hex encoded
    pub pdr_hash: String,
    /// Root-chain signers
    pub trust_base: TrustBaseConfig,
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            hash_algorithm: HashAlgorithmKind::default(),
            signature_scheme: SignatureScheme::default(),
            validator_timeout_ms: DEFAULT_VALIDATOR_TIMEOUT_MS,
            partition_id: PartitionId::default(),
            pdr_hash: String::new(),
            trust_base: TrustBaseConfig::default(),
        }
    }
}

/// Root-chain trust base as configured
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrustBaseConfig {
    /// Minimum total stake of valid root signatures on a seal
    pub quorum_threshold: u64,
    /// Root-chain nodes
    #[serde(default)]
    pub nodes: Vec<RootNodeConfig>,
}

/// One root-chain node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RootNodeConfig {
    /// Node identifier used as the signature map key
    pub node_id: String,
    /// Public key, hex encoded
    pub public_key: String,
    /// Stake of the node
    #[serde(default = "default_stake")]
    pub stake: u64,
}

fn default_stake() -> u64 {
    1
}

impl VerifierConfig {
    /// Parse from a TOML document
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| UnicityError::config(format!("invalid TOML: {e}")))
    }

    /// Render as a TOML document
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| UnicityError::config(format!("failed to render TOML: {e}")))
    }

    /// Load from a TOML file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            UnicityError::config(format!(
                "failed to read config file {}: {e}",
                path.display()
            ))
        })?;
        Self::from_toml_str(&content)
    }

    /// Apply `UNICITY_*` overrides from the process environment
    pub fn merge_with_env(&mut self) -> Result<()> {
        self.merge_with_vars(std::env::vars())
    }

    /// Apply `UNICITY_*` overrides from the given variables
    pub fn merge_with_vars<I, K, V>(&mut self, vars: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        for (key, value) in vars {
            let Some(name) = key.as_ref().strip_prefix(ENV_PREFIX) else {
                continue;
            };
            let value = value.as_ref();
            match name {
                "HASH_ALGORITHM" => self.hash_algorithm = value.parse()?,
                "SIGNATURE_SCHEME" => self.signature_scheme = value.parse()?,
                "VALIDATOR_TIMEOUT_MS" => {
                    self.validator_timeout_ms = value.parse().map_err(|_| {
                        UnicityError::config(format!(
                            "{ENV_PREFIX}VALIDATOR_TIMEOUT_MS is not a number: '{value}'"
                        ))
                    })?;
                }
                "PARTITION_ID" => {
                    let raw = value.trim_start_matches("0x");
                    self.partition_id = u32::from_str_radix(raw, 16)
                        .map(PartitionId::new)
                        .map_err(|_| {
                            UnicityError::config(format!(
                                "{ENV_PREFIX}PARTITION_ID is not a hex partition id: '{value}'"
                            ))
                        })?;
                }
                "PDR_HASH" => self.pdr_hash = value.to_string(),
                _ => tracing::debug!(variable = name, "ignoring unknown override"),
            }
        }
        Ok(())
    }

    /// Decoded partition description record hash
    pub fn pdr_hash_bytes(&self) -> Result<Vec<u8>> {
        hex::decode(&self.pdr_hash)
            .map_err(|e| UnicityError::config(format!("pdr_hash is not valid hex: {e}")))
    }

    /// Validator time budget
    pub fn validator_timeout(&self) -> Duration {
        Duration::from_millis(self.validator_timeout_ms)
    }
}

impl ConfigValidation for VerifierConfig {
    fn validate(&self) -> Result<()> {
        if self.validator_timeout_ms == 0 {
            return Err(UnicityError::config("validator_timeout_ms must be positive"));
        }
        if self.pdr_hash_bytes()?.is_empty() {
            return Err(UnicityError::config("pdr_hash is required"));
        }
        self.trust_base.validate()
    }
}

impl ConfigValidation for TrustBaseConfig {
    fn validate(&self) -> Result<()> {
        if self.nodes.is_empty() {
            return Err(UnicityError::config("trust base has no root nodes"));
        }
        let mut seen = BTreeSet::new();
        for node in &self.nodes {
            if node.node_id.is_empty() {
                return Err(UnicityError::config("root node id is empty"));
            }
            if !seen.insert(node.node_id.as_str()) {
                return Err(UnicityError::config(format!(
                    "duplicate root node '{}'",
                    node.node_id
                )));
            }
            hex::decode(&node.public_key).map_err(|e| {
                UnicityError::config(format!(
                    "public key of root node '{}' is not valid hex: {e}",
                    node.node_id
                ))
            })?;
        }
        let total = self
            .nodes
            .iter()
            .try_fold(0u64, |acc, node| acc.checked_add(node.stake))
            .ok_or_else(|| UnicityError::config("total root node stake overflows"))?;
        if self.quorum_threshold == 0 || self.quorum_threshold > total {
            return Err(UnicityError::config(format!(
                "quorum threshold {} must be between 1 and {total}",
                self.quorum_threshold
            )));
        }
        Ok(())
    }
}
