//! Canonical hash accumulator
//!
//! Every digest in the system is an ordered sequence of writes into a
//! [`CanonicalHasher`]. Framed writes absorb the canonical DAG-CBOR encoding of
//! a value, so a byte string, an integer and an absent field can never be
//! confused with each other. [`CanonicalHasher::write_raw`] absorbs bytes
//! without framing and is reserved for recipes that concatenate fixed-width
//! values.
//!
//! Encoding failures do not abort the write sequence. The first one is kept and
//! returned from [`CanonicalHasher::sum`], so a recipe can be written as a flat
//! list of writes.

use serde::Serialize;

use super::hash::{Digest, HashAlgorithm, Hasher};
use crate::serialization;
use crate::{Result, UnicityError};

/// Incremental hasher that frames every value with its canonical encoding
pub struct CanonicalHasher {
    inner: Box<dyn Hasher>,
    error: Option<UnicityError>,
}

impl CanonicalHasher {
    /// Start a new accumulator for `algorithm`
    pub fn new(algorithm: &dyn HashAlgorithm) -> Self {
        Self {
            inner: algorithm.hasher(),
            error: None,
        }
    }

    /// Absorb the canonical encoding of `value`
    pub fn write<T: Serialize + ?Sized>(&mut self, value: &T) -> &mut Self {
        if self.error.is_some() {
            return self;
        }
        match serialization::to_vec(value) {
            Ok(bytes) => self.inner.update(&bytes),
            Err(err) => self.error = Some(err),
        }
        self
    }

    /// Absorb a byte string, framed as a CBOR byte string
    pub fn write_bytes(&mut self, bytes: &[u8]) -> &mut Self {
        self.write(serde_bytes::Bytes::new(bytes))
    }

    /// Absorb an optional byte string; `None` is framed as CBOR null
    pub fn write_opt_bytes(&mut self, bytes: Option<&[u8]>) -> &mut Self {
        self.write(&bytes.map(serde_bytes::Bytes::new))
    }

    /// Absorb an unsigned integer
    pub fn write_u64(&mut self, value: u64) -> &mut Self {
        self.write(&value)
    }

    /// Absorb bytes without framing
    pub fn write_raw(&mut self, bytes: &[u8]) -> &mut Self {
        if self.error.is_none() {
            self.inner.update(bytes);
        }
        self
    }

    /// Absorb a value through its own hash recipe
    pub fn write_hashable<H: Hashable + ?Sized>(&mut self, value: &H) -> &mut Self {
        value.add_to_hasher(self);
        self
    }

    /// Finish and return the digest, or the first encoding failure
    pub fn sum(self) -> Result<Digest> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(self.inner.finalize()),
        }
    }
}

/// Types with a defined hash recipe
pub trait Hashable {
    /// Write this value's fields into `hasher`, in recipe order
    fn add_to_hasher(&self, hasher: &mut CanonicalHasher);

    /// Digest of this value under `algorithm`
    fn hash(&self, algorithm: &dyn HashAlgorithm) -> Result<Digest> {
        let mut hasher = CanonicalHasher::new(algorithm);
        self.add_to_hasher(&mut hasher);
        hasher.sum()
    }
}
