//! Signing capability and its Ed25519 implementation
//!
//! The certification core only ever signs and verifies 32-byte digests. It
//! depends on the [`Signer`] and [`SignatureVerifier`] traits, never on a
//! concrete curve. [`Ed25519Signer`] and [`Ed25519Verifier`] are the default
//! implementation; recoverable secp256k1 lives in [`super::secp256k1`].

use ed25519_dalek::{Signature, Signer as _, SigningKey, Verifier as _, VerifyingKey};
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use super::secp256k1::{Secp256k1Signer, Secp256k1Verifier};
use crate::{Result, UnicityError};

/// Ed25519 private key length
pub const PRIVATE_KEY_LEN: usize = 32;
/// Ed25519 public key length
pub const PUBLIC_KEY_LEN: usize = 32;
/// Ed25519 signature length
pub const SIGNATURE_LEN: usize = 64;

/// Produces signatures over digests
pub trait Signer: Send + Sync {
    /// Sign a digest
    fn sign_hash(&self, hash: &[u8]) -> Result<Vec<u8>>;

    /// Public key matching this signer
    fn public_key(&self) -> Vec<u8>;
}

/// Checks signatures over digests against a public key
pub trait SignatureVerifier: Send + Sync {
    /// Verify `signature` over `hash` for `public_key`
    fn verify_hash(&self, hash: &[u8], signature: &[u8], public_key: &[u8]) -> Result<()>;
}

/// Configuration-level selector for the root-chain signature scheme
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignatureScheme {
    /// Ed25519, 64-byte signatures
    #[default]
    Ed25519,
    /// Recoverable secp256k1 ECDSA, 65-byte signatures
    Secp256k1,
}

impl SignatureScheme {
    /// Verifier for this scheme
    pub fn verifier(self) -> Arc<dyn SignatureVerifier> {
        match self {
            SignatureScheme::Ed25519 => Arc::new(Ed25519Verifier),
            SignatureScheme::Secp256k1 => Arc::new(Secp256k1Verifier),
        }
    }

    /// Fresh random signer for this scheme
    pub fn generate_signer(self) -> Box<dyn Signer> {
        match self {
            SignatureScheme::Ed25519 => Box::new(Ed25519Signer::generate()),
            SignatureScheme::Secp256k1 => Box::new(Secp256k1Signer::generate()),
        }
    }
}

impl fmt::Display for SignatureScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignatureScheme::Ed25519 => f.write_str("ed25519"),
            SignatureScheme::Secp256k1 => f.write_str("secp256k1"),
        }
    }
}

impl FromStr for SignatureScheme {
    type Err = UnicityError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "ed25519" => Ok(SignatureScheme::Ed25519),
            "secp256k1" => Ok(SignatureScheme::Secp256k1),
            other => Err(UnicityError::config(format!(
                "unknown signature scheme '{other}'"
            ))),
        }
    }
}

/// In-memory Ed25519 signer
pub struct Ed25519Signer {
    key: SigningKey,
}

impl Ed25519Signer {
    /// Generate a fresh key pair from the OS random source
    #[allow(clippy::disallowed_types)]
    pub fn generate() -> Self {
        Self {
            key: SigningKey::generate(&mut OsRng),
        }
    }

    /// Build a signer from raw private key bytes
    pub fn from_bytes(private_key: &[u8]) -> Result<Self> {
        let bytes: [u8; PRIVATE_KEY_LEN] = private_key.try_into().map_err(|_| {
            UnicityError::crypto(format!(
                "invalid private key length. Is {} (expected {})",
                private_key.len(),
                PRIVATE_KEY_LEN
            ))
        })?;
        Ok(Self {
            key: SigningKey::from_bytes(&bytes),
        })
    }

    /// Raw private key bytes
    pub fn private_key(&self) -> [u8; PRIVATE_KEY_LEN] {
        self.key.to_bytes()
    }
}

impl fmt::Debug for Ed25519Signer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ed25519Signer")
            .field("public_key", &hex::encode(self.public_key()))
            .finish_non_exhaustive()
    }
}

impl Signer for Ed25519Signer {
    fn sign_hash(&self, hash: &[u8]) -> Result<Vec<u8>> {
        if hash.is_empty() {
            return Err(UnicityError::missing("hash"));
        }
        Ok(self.key.sign(hash).to_bytes().to_vec())
    }

    fn public_key(&self) -> Vec<u8> {
        self.key.verifying_key().to_bytes().to_vec()
    }
}

/// Ed25519 signature verification
#[derive(Debug, Clone, Copy, Default)]
pub struct Ed25519Verifier;

impl SignatureVerifier for Ed25519Verifier {
    fn verify_hash(&self, hash: &[u8], signature: &[u8], public_key: &[u8]) -> Result<()> {
        let key_bytes: [u8; PUBLIC_KEY_LEN] = public_key.try_into().map_err(|_| {
            UnicityError::crypto(format!(
                "invalid public key length: expected {PUBLIC_KEY_LEN} bytes, got {}",
                public_key.len()
            ))
        })?;
        let key = VerifyingKey::from_bytes(&key_bytes)
            .map_err(|e| UnicityError::crypto(format!("invalid public key: {e}")))?;
        let signature = Signature::from_slice(signature).map_err(|_| {
            UnicityError::crypto(format!(
                "invalid signature length: expected {SIGNATURE_LEN} bytes, got {}",
                signature.len()
            ))
        })?;
        key.verify(hash, &signature)
            .map_err(|e| UnicityError::crypto(format!("signature verification failed: {e}")))
    }
}
