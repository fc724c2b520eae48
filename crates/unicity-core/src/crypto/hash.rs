//! Pure synchronous hash algorithms
//!
//! Every tree node and certificate digest in the system is computed through the
//! [`HashAlgorithm`] trait. Hashing is deterministic and side-effect free, so it
//! is modelled as a plain trait rather than an async capability.
//!
//! Two algorithms are available, both with 32-byte output:
//!
//! - **SHA-256** (`sha2`), the default
//! - **BLAKE3** (`blake3`)
//!
//! The algorithm is chosen per call site (verification takes it as an argument)
//! and can be selected from configuration through [`HashAlgorithmKind`].
//!
//! ```ignore
//! use unicity_core::crypto::hash::{hasher, hash};
//!
//! let mut h = hasher();
//! h.update(b"hello");
//! h.update(b" world");
//! assert_eq!(h.finalize(), hash(b"hello world"));
//! ```

use serde::{Deserialize, Serialize};
use sha2::{Digest as _, Sha256};
use std::fmt;
use std::str::FromStr;

use crate::UnicityError;

/// Digest length shared by every supported algorithm
pub const DIGEST_LEN: usize = 32;

/// 32-byte digest
pub type Digest = [u8; DIGEST_LEN];

/// Synchronous trait for cryptographic hashing
pub trait HashAlgorithm: Send + Sync + fmt::Debug {
    /// Short algorithm name used in logs and configuration
    fn name(&self) -> &'static str;

    /// Hash arbitrary bytes to a 32-byte digest
    fn hash(&self, data: &[u8]) -> Digest;

    /// Create an incremental hasher for multi-part hashing
    fn hasher(&self) -> Box<dyn Hasher>;
}

/// Trait for incremental hashing of multi-part data
pub trait Hasher: Send {
    /// Update the hasher with more data
    fn update(&mut self, data: &[u8]);

    /// Finalize the hasher and return the 32-byte digest
    fn finalize(self: Box<Self>) -> Digest;
}

/// SHA-256 (NIST FIPS 180-4)
#[derive(Debug, Clone, Copy)]
pub struct Sha256Algorithm;

impl HashAlgorithm for Sha256Algorithm {
    fn name(&self) -> &'static str {
        "sha256"
    }

    fn hash(&self, data: &[u8]) -> Digest {
        let mut hasher = Sha256::new();
        hasher.update(data);
        let mut output = [0u8; DIGEST_LEN];
        output.copy_from_slice(&hasher.finalize());
        output
    }

    fn hasher(&self) -> Box<dyn Hasher> {
        Box::new(Sha256Hasher(Sha256::new()))
    }
}

struct Sha256Hasher(Sha256);

impl Hasher for Sha256Hasher {
    fn update(&mut self, data: &[u8]) {
        self.0.update(data);
    }

    fn finalize(self: Box<Self>) -> Digest {
        let mut output = [0u8; DIGEST_LEN];
        output.copy_from_slice(&self.0.finalize());
        output
    }
}

/// BLAKE3 in its default 32-byte output mode
#[derive(Debug, Clone, Copy)]
pub struct Blake3Algorithm;

impl HashAlgorithm for Blake3Algorithm {
    fn name(&self) -> &'static str {
        "blake3"
    }

    fn hash(&self, data: &[u8]) -> Digest {
        *blake3::hash(data).as_bytes()
    }

    fn hasher(&self) -> Box<dyn Hasher> {
        Box::new(Blake3Hasher(blake3::Hasher::new()))
    }
}

struct Blake3Hasher(blake3::Hasher);

impl Hasher for Blake3Hasher {
    fn update(&mut self, data: &[u8]) {
        self.0.update(data);
    }

    fn finalize(self: Box<Self>) -> Digest {
        *self.0.finalize().as_bytes()
    }
}

/// Default algorithm used when none is configured.
pub const ALGORITHM: Sha256Algorithm = Sha256Algorithm;

static SHA256: Sha256Algorithm = Sha256Algorithm;
static BLAKE3: Blake3Algorithm = Blake3Algorithm;

/// Configuration-level selector for a [`HashAlgorithm`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithmKind {
    /// SHA-256
    #[default]
    Sha256,
    /// BLAKE3
    Blake3,
}

impl HashAlgorithmKind {
    /// Resolve to the shared algorithm instance
    pub fn algorithm(self) -> &'static dyn HashAlgorithm {
        match self {
            HashAlgorithmKind::Sha256 => &SHA256,
            HashAlgorithmKind::Blake3 => &BLAKE3,
        }
    }
}

impl fmt::Display for HashAlgorithmKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.algorithm().name())
    }
}

impl FromStr for HashAlgorithmKind {
    type Err = UnicityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sha256" | "sha-256" => Ok(HashAlgorithmKind::Sha256),
            "blake3" => Ok(HashAlgorithmKind::Blake3),
            other => Err(UnicityError::config(format!(
                "unknown hash algorithm '{other}'"
            ))),
        }
    }
}

/// Hash with the default algorithm
#[inline]
pub fn hash(data: &[u8]) -> Digest {
    ALGORITHM.hash(data)
}

/// Incremental hasher for the default algorithm
#[inline]
pub fn hasher() -> Box<dyn Hasher> {
    ALGORITHM.hasher()
}

/// `H(a || b)` over raw bytes
///
/// Used for plain Merkle nodes and unit log digests.
pub fn sum_hashes(algorithm: &dyn HashAlgorithm, a: &[u8], b: &[u8]) -> Digest {
    let mut h = algorithm.hasher();
    h.update(a);
    h.update(b);
    h.finalize()
}
