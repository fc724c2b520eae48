//! Unicity Core - canonical building blocks of the certification layer
//!
//! Everything the trees and certificates hash, sign or transmit goes through
//! this crate:
//!
//! - **Hashing**: [`crypto::hash`] algorithms and the [`CanonicalHasher`]
//!   accumulator every hash recipe is written against
//! - **Encoding**: deterministic DAG-CBOR and tagged envelopes in
//!   [`serialization`]
//! - **Identifiers**: [`UnitId`], [`PartitionId`], [`PartitionTypeId`],
//!   [`ShardId`]
//! - **Signing capability**: [`Signer`] / [`SignatureVerifier`] with an Ed25519
//!   reference implementation
//! - **Configuration**: [`VerifierConfig`]

#![forbid(unsafe_code)]

/// Verifier configuration
pub mod config;

/// Hash algorithms, canonical hasher and signing capability
pub mod crypto;

/// Unified error handling
pub mod errors;

/// Unit, partition and shard identifiers
pub mod identifiers;

/// DAG-CBOR serialization (canonical format)
pub mod serialization;

pub use config::{ConfigValidation, RootNodeConfig, TrustBaseConfig, VerifierConfig};
pub use crypto::{
    CanonicalHasher, Digest, Ed25519Signer, Ed25519Verifier, HashAlgorithm, HashAlgorithmKind,
    Hashable, Secp256k1Signer, Secp256k1Verifier, SignatureScheme, SignatureVerifier, Signer,
};
pub use errors::{Result, UnicityError};
pub use identifiers::{PartitionId, PartitionTypeId, ShardId, UnitId, PARTITION_ID_LEN};
pub use serialization::{decode_tagged, encode_tagged, Tagged, TaggedEnvelope, TypeTag};
