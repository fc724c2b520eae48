//! Root-chain trust base

use serde::{Deserialize, Serialize};
use serde_bytes::ByteBuf;
use std::collections::BTreeMap;

use unicity_core::config::{ConfigValidation, TrustBaseConfig};
use unicity_core::serialization::{Tagged, TypeTag};
use unicity_core::{Result, SignatureVerifier, UnicityError};

/// A root-chain validator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RootNode {
    /// Node identifier; key of the seal signature map
    pub node_id: String,
    /// Signature verification key
    #[serde(with = "serde_bytes")]
    pub public_key: Vec<u8>,
    /// Voting stake
    pub stake: u64,
}

/// Root-chain validators and the stake a seal needs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RootTrustBase {
    /// Trust base format version
    pub version: u32,
    /// Validators by node id
    pub nodes: BTreeMap<String, RootNode>,
    /// Minimum total stake of valid signatures
    pub quorum_threshold: u64,
}

impl RootTrustBase {
    /// Create a trust base; node ids must be unique
    pub fn new(nodes: Vec<RootNode>, quorum_threshold: u64) -> Result<Self> {
        let mut by_id = BTreeMap::new();
        for node in nodes {
            if let Some(dup) = by_id.insert(node.node_id.clone(), node) {
                return Err(UnicityError::invalid(format!(
                    "duplicate root node '{}'",
                    dup.node_id
                )));
            }
        }
        let total = by_id.values().try_fold(0u64, |acc, n| acc.checked_add(n.stake));
        match total {
            Some(total) if quorum_threshold > 0 && quorum_threshold <= total => {}
            _ => {
                return Err(UnicityError::invalid(format!(
                    "quorum threshold {quorum_threshold} is not reachable by the root nodes"
                )))
            }
        }
        Ok(Self {
            version: 1,
            nodes: by_id,
            quorum_threshold,
        })
    }

    /// Build from validated configuration
    pub fn from_config(config: &TrustBaseConfig) -> Result<Self> {
        config.validate()?;
        let nodes = config
            .nodes
            .iter()
            .map(|node| {
                Ok(RootNode {
                    node_id: node.node_id.clone(),
                    public_key: hex::decode(&node.public_key).map_err(|e| {
                        UnicityError::config(format!("public key of '{}': {e}", node.node_id))
                    })?,
                    stake: node.stake,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Self::new(nodes, config.quorum_threshold)
    }

    /// Check that `signatures` over `digest` carry quorum stake
    ///
    /// Every signature must come from a known node and verify; a single bad
    /// signature rejects the whole set.
    pub fn verify_quorum_signatures(
        &self,
        digest: &[u8],
        signatures: &BTreeMap<String, ByteBuf>,
        verifier: &dyn SignatureVerifier,
    ) -> Result<()> {
        let mut signed_stake: u64 = 0;
        for (node_id, signature) in signatures {
            let node = self.nodes.get(node_id).ok_or_else(|| {
                UnicityError::crypto(format!("signature from unknown root node '{node_id}'"))
            })?;
            verifier
                .verify_hash(digest, signature, &node.public_key)
                .map_err(|e| {
                    UnicityError::crypto(format!("invalid signature of root node '{node_id}': {e}"))
                })?;
            signed_stake = signed_stake.saturating_add(node.stake);
        }
        if signed_stake < self.quorum_threshold {
            return Err(UnicityError::crypto(format!(
                "quorum not reached: signed stake {signed_stake}, required {}",
                self.quorum_threshold
            )));
        }
        tracing::debug!(signers = signatures.len(), signed_stake, "quorum reached");
        Ok(())
    }
}

impl Tagged for RootTrustBase {
    const TAG: TypeTag = TypeTag::RootTrustBase;
    const TYPE_NAME: &'static str = "RootTrustBase";

    fn version(&self) -> u32 {
        self.version
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use unicity_core::config::RootNodeConfig;
    use unicity_core::crypto::hash::hash;
    use unicity_core::{Ed25519Signer, Ed25519Verifier, Signer};

    fn signers() -> Vec<(String, Ed25519Signer)> {
        (1..=3u8)
            .map(|i| {
                (
                    format!("root-{i}"),
                    Ed25519Signer::from_bytes(&[i; 32]).unwrap(),
                )
            })
            .collect()
    }

    fn trust_base(quorum: u64) -> RootTrustBase {
        let nodes = signers()
            .iter()
            .map(|(id, s)| RootNode {
                node_id: id.clone(),
                public_key: s.public_key(),
                stake: 1,
            })
            .collect();
        RootTrustBase::new(nodes, quorum).unwrap()
    }

    fn sign_with(count: usize, digest: &[u8]) -> BTreeMap<String, ByteBuf> {
        signers()
            .into_iter()
            .take(count)
            .map(|(id, s)| (id, ByteBuf::from(s.sign_hash(digest).unwrap())))
            .collect()
    }

    #[test]
    fn test_quorum_reached() {
        let digest = hash(b"root");
        trust_base(2)
            .verify_quorum_signatures(&digest, &sign_with(2, &digest), &Ed25519Verifier)
            .unwrap();
    }

    #[test]
    fn test_quorum_not_reached() {
        let digest = hash(b"root");
        let err = trust_base(3)
            .verify_quorum_signatures(&digest, &sign_with(2, &digest), &Ed25519Verifier)
            .unwrap_err();
        assert!(err.to_string().contains("quorum not reached"));
    }

    #[test]
    fn test_unknown_signer_named() {
        let digest = hash(b"root");
        let mut sigs = sign_with(1, &digest);
        sigs.insert("stranger".to_string(), ByteBuf::from(vec![0u8; 64]));
        let err = trust_base(1)
            .verify_quorum_signatures(&digest, &sigs, &Ed25519Verifier)
            .unwrap_err();
        assert!(err.to_string().contains("'stranger'"));
    }

    #[test]
    fn test_bad_signature_named() {
        let digest = hash(b"root");
        let mut sigs = sign_with(2, &digest);
        if let Some(sig) = sigs.get_mut("root-2") {
            sig[0] ^= 0xff;
        }
        let err = trust_base(1)
            .verify_quorum_signatures(&digest, &sigs, &Ed25519Verifier)
            .unwrap_err();
        assert!(err.to_string().contains("'root-2'"));
    }

    #[test]
    fn test_unreachable_quorum_rejected() {
        assert!(RootTrustBase::new(vec![], 1).is_err());
        let node = RootNode {
            node_id: "a".into(),
            public_key: vec![1; 32],
            stake: 2,
        };
        assert!(RootTrustBase::new(vec![node.clone()], 3).is_err());
        assert!(RootTrustBase::new(vec![node.clone(), node], 1).is_err());
    }

    #[test]
    fn test_from_config() {
        let signer = Ed25519Signer::from_bytes(&[1; 32]).unwrap();
        let config = TrustBaseConfig {
            quorum_threshold: 1,
            nodes: vec![RootNodeConfig {
                node_id: "root-1".into(),
                public_key: hex::encode(signer.public_key()),
                stake: 1,
            }],
        };
        let tb = RootTrustBase::from_config(&config).unwrap();
        assert_eq!(tb.nodes["root-1"].public_key, signer.public_key());
    }
}
