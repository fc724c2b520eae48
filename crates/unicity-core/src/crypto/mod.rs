pub mod canonical;
pub mod hash;
pub mod secp256k1;
pub mod signer;

pub use canonical::{CanonicalHasher, Hashable};
pub use hash::{
    sum_hashes, Blake3Algorithm, Digest, HashAlgorithm, HashAlgorithmKind, Hasher,
    Sha256Algorithm, DIGEST_LEN,
};
pub use secp256k1::{Secp256k1Signer, Secp256k1Verifier};
pub use signer::{Ed25519Signer, Ed25519Verifier, SignatureScheme, SignatureVerifier, Signer};
