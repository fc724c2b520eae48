//! Recoverable secp256k1 ECDSA signing
//!
//! Signatures are 65 bytes, `R || S || V`, where `V` is the recovery id (0 or
//! 1). Public keys are 33-byte compressed SEC1 points. Signing works on the
//! digest directly; callers hash first.

use k256::ecdsa::{RecoveryId, Signature, SigningKey, VerifyingKey};
use rand::rngs::OsRng;
use std::fmt;

use super::signer::{SignatureVerifier, Signer};
use crate::{Result, UnicityError};

/// secp256k1 private key length
pub const SECP256K1_PRIVATE_KEY_LEN: usize = 32;
/// Compressed secp256k1 public key length
pub const SECP256K1_PUBLIC_KEY_LEN: usize = 33;
/// Recoverable signature length
pub const SECP256K1_SIGNATURE_LEN: usize = 65;

/// In-memory secp256k1 signer
pub struct Secp256k1Signer {
    key: SigningKey,
}

impl Secp256k1Signer {
    /// Generate a fresh key pair from the OS random source
    pub fn generate() -> Self {
        Self {
            key: SigningKey::random(&mut OsRng),
        }
    }

    /// Build a signer from a raw 32-byte scalar
    pub fn from_bytes(private_key: &[u8]) -> Result<Self> {
        if private_key.len() != SECP256K1_PRIVATE_KEY_LEN {
            return Err(UnicityError::crypto(format!(
                "invalid private key length. Is {} (expected {})",
                private_key.len(),
                SECP256K1_PRIVATE_KEY_LEN
            )));
        }
        let key = SigningKey::from_slice(private_key)
            .map_err(|e| UnicityError::crypto(format!("invalid private key: {e}")))?;
        Ok(Self { key })
    }

    /// Raw private key bytes
    pub fn private_key(&self) -> [u8; SECP256K1_PRIVATE_KEY_LEN] {
        let mut out = [0u8; SECP256K1_PRIVATE_KEY_LEN];
        out.copy_from_slice(&self.key.to_bytes());
        out
    }
}

impl fmt::Debug for Secp256k1Signer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Secp256k1Signer")
            .field("public_key", &hex::encode(self.public_key()))
            .finish_non_exhaustive()
    }
}

impl Signer for Secp256k1Signer {
    fn sign_hash(&self, hash: &[u8]) -> Result<Vec<u8>> {
        if hash.is_empty() {
            return Err(UnicityError::missing("hash"));
        }
        let (signature, recovery_id) = self
            .key
            .sign_prehash_recoverable(hash)
            .map_err(|e| UnicityError::crypto(format!("signing failed: {e}")))?;
        let mut out = Vec::with_capacity(SECP256K1_SIGNATURE_LEN);
        out.extend_from_slice(&signature.to_bytes());
        out.push(recovery_id.to_byte());
        Ok(out)
    }

    fn public_key(&self) -> Vec<u8> {
        self.key
            .verifying_key()
            .to_encoded_point(true)
            .as_bytes()
            .to_vec()
    }
}

/// Recovers the signer's key from a recoverable signature and compares it
/// with the expected public key
#[derive(Debug, Clone, Copy, Default)]
pub struct Secp256k1Verifier;

impl SignatureVerifier for Secp256k1Verifier {
    fn verify_hash(&self, hash: &[u8], signature: &[u8], public_key: &[u8]) -> Result<()> {
        if signature.len() != SECP256K1_SIGNATURE_LEN {
            return Err(UnicityError::crypto(format!(
                "invalid signature length: expected {SECP256K1_SIGNATURE_LEN} bytes, got {}",
                signature.len()
            )));
        }
        let expected = VerifyingKey::from_sec1_bytes(public_key)
            .map_err(|e| UnicityError::crypto(format!("invalid public key: {e}")))?;
        let (rs, v) = signature.split_at(SECP256K1_SIGNATURE_LEN - 1);
        let recovery_id = RecoveryId::from_byte(v[0])
            .ok_or_else(|| UnicityError::crypto(format!("invalid recovery id {}", v[0])))?;
        let signature = Signature::from_slice(rs)
            .map_err(|e| UnicityError::crypto(format!("invalid signature: {e}")))?;
        let recovered = VerifyingKey::recover_from_prehash(hash, &signature, recovery_id)
            .map_err(|e| UnicityError::crypto(format!("signature verification failed: {e}")))?;
        if recovered != expected {
            return Err(UnicityError::crypto(
                "signature verification failed: signer does not match public key",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::hash::hash;

    fn signer() -> Secp256k1Signer {
        Secp256k1Signer::from_bytes(&[7u8; 32]).unwrap()
    }

    #[test]
    fn test_sign_and_verify() {
        let signer = signer();
        let digest = hash(b"seal");
        let sig = signer.sign_hash(&digest).unwrap();
        assert_eq!(sig.len(), SECP256K1_SIGNATURE_LEN);
        assert!(sig[64] <= 1);
        assert_eq!(signer.public_key().len(), SECP256K1_PUBLIC_KEY_LEN);
        Secp256k1Verifier
            .verify_hash(&digest, &sig, &signer.public_key())
            .unwrap();
    }

    #[test]
    fn test_private_key_roundtrip() {
        let signer = signer();
        let again = Secp256k1Signer::from_bytes(&signer.private_key()).unwrap();
        assert_eq!(again.public_key(), signer.public_key());
    }

    #[test]
    fn test_other_digest_rejected() {
        let signer = signer();
        let sig = signer.sign_hash(&hash(b"seal")).unwrap();
        assert!(Secp256k1Verifier
            .verify_hash(&hash(b"other"), &sig, &signer.public_key())
            .is_err());
    }

    #[test]
    fn test_wrong_key_rejected() {
        let signer = signer();
        let other = Secp256k1Signer::generate();
        let digest = hash(b"seal");
        let sig = signer.sign_hash(&digest).unwrap();
        let err = Secp256k1Verifier
            .verify_hash(&digest, &sig, &other.public_key())
            .unwrap_err();
        assert!(matches!(err, UnicityError::Crypto { .. }));
    }

    #[test]
    fn test_malformed_signature_rejected() {
        let signer = signer();
        let digest = hash(b"seal");
        let mut sig = signer.sign_hash(&digest).unwrap();
        assert!(Secp256k1Verifier
            .verify_hash(&digest, &sig[..64], &signer.public_key())
            .is_err());
        sig[64] = 7;
        let err = Secp256k1Verifier
            .verify_hash(&digest, &sig, &signer.public_key())
            .unwrap_err();
        assert_eq!(err.to_string(), "crypto error: invalid recovery id 7");
    }

    #[test]
    fn test_private_key_checked() {
        let err = Secp256k1Signer::from_bytes(&[1u8; 31]).unwrap_err();
        assert_eq!(
            err.to_string(),
            "crypto error: invalid private key length. Is 31 (expected 32)"
        );
        assert!(Secp256k1Signer::from_bytes(&[0u8; 32]).is_err());
    }

    #[test]
    fn test_ed25519_signature_rejected() {
        let ed = crate::crypto::signer::Ed25519Signer::from_bytes(&[7u8; 32]).unwrap();
        let digest = hash(b"seal");
        let sig = ed.sign_hash(&digest).unwrap();
        assert!(Secp256k1Verifier
            .verify_hash(&digest, &sig, &signer().public_key())
            .is_err());
    }
}
