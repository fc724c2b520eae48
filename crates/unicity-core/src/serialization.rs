//! DAG-CBOR serialization for certification types
//!
//! DAG-CBOR is the canonical format for every hashed, signed or transmitted
//! value. Its deterministic mode (sorted map keys, shortest integer forms, no
//! indefinite lengths) gives each logical value exactly one byte string, which
//! is what every hash recipe in the system relies on.
//!
//! Absent optional fields encode as CBOR `null`; a present but empty byte
//! string encodes as a zero-length CBOR byte string. The two never collide.
//!
//! Top-level wire values travel inside a [`TaggedEnvelope`]: a small integer
//! [`TypeTag`] plus the canonical encoding of the value. Decoding checks the tag
//! before touching the body and checks the declared version after.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::crypto::hash::{Digest, HashAlgorithm};
use crate::{Result, UnicityError};

/// Serialize any serde-compatible type to canonical DAG-CBOR bytes
pub fn to_vec<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>> {
    serde_ipld_dagcbor::to_vec(value).map_err(|e| {
        UnicityError::serialization(format!("failed to serialize to DAG-CBOR: {e}"))
    })
}

/// Deserialize canonical DAG-CBOR bytes
pub fn from_slice<T: for<'de> Deserialize<'de>>(bytes: &[u8]) -> Result<T> {
    serde_ipld_dagcbor::from_slice(bytes).map_err(|e| {
        UnicityError::serialization(format!("failed to deserialize DAG-CBOR: {e}"))
    })
}

/// Serialize canonically and hash the result
pub fn hash_canonical<T: Serialize>(algorithm: &dyn HashAlgorithm, value: &T) -> Result<Digest> {
    let bytes = to_vec(value)?;
    Ok(algorithm.hash(&bytes))
}

/// Integer type tags of top-level wire values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u16)]
pub enum TypeTag {
    /// Root-chain seal
    UnicitySeal = 1001,
    /// Root trust base
    RootTrustBase = 1002,
    /// Partition description record
    PartitionDescriptionRecord = 1003,
    /// Unicity certificate
    UnicityCertificate = 1007,
    /// Input record
    InputRecord = 1008,
    /// Unicity tree certificate
    UnicityTreeCertificate = 1009,
    /// Shard tree certificate
    ShardTreeCertificate = 1010,
    /// Unit state proof
    UnitStateProof = 1011,
}

impl TypeTag {
    /// Every known tag, in numeric order
    pub const ALL: [TypeTag; 8] = [
        TypeTag::UnicitySeal,
        TypeTag::RootTrustBase,
        TypeTag::PartitionDescriptionRecord,
        TypeTag::UnicityCertificate,
        TypeTag::InputRecord,
        TypeTag::UnicityTreeCertificate,
        TypeTag::ShardTreeCertificate,
        TypeTag::UnitStateProof,
    ];

    /// Numeric wire value
    pub fn value(self) -> u16 {
        self as u16
    }

    /// Map a wire value back to a known tag
    pub fn from_value(value: u16) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|tag| tag.value() == value)
            .ok_or_else(|| UnicityError::serialization(format!("unknown type tag: {value}")))
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}({})", self, self.value())
    }
}

/// Values that travel inside a tagged envelope
pub trait Tagged: Serialize + for<'de> Deserialize<'de> {
    /// Envelope tag of this type
    const TAG: TypeTag;
    /// The only version this build accepts
    const SUPPORTED_VERSION: u32 = 1;
    /// Type name reported in version errors
    const TYPE_NAME: &'static str;

    /// Version declared by the value
    fn version(&self) -> u32;
}

/// Wire wrapper: type tag plus canonical body bytes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaggedEnvelope {
    /// Numeric [`TypeTag`]
    pub tag: u16,
    /// Canonical encoding of the wrapped value
    #[serde(with = "serde_bytes")]
    pub body: Vec<u8>,
}

impl TaggedEnvelope {
    /// Decode only the envelope, leaving the body untouched
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        from_slice(bytes)
    }

    /// Resolve the envelope tag
    pub fn type_tag(&self) -> Result<TypeTag> {
        TypeTag::from_value(self.tag)
    }
}

/// Reject version zero and any version other than the supported one
pub fn ensure_version<T: Tagged>(value: &T) -> Result<()> {
    let version = value.version();
    if version == 0 {
        return Err(UnicityError::ZeroVersion {
            type_name: T::TYPE_NAME.to_string(),
        });
    }
    if version != T::SUPPORTED_VERSION {
        return Err(UnicityError::UnsupportedVersion {
            type_name: T::TYPE_NAME.to_string(),
            expected: T::SUPPORTED_VERSION,
            actual: version,
        });
    }
    Ok(())
}

/// Wrap a value in its tagged envelope
pub fn encode_tagged<T: Tagged>(value: &T) -> Result<Vec<u8>> {
    let envelope = TaggedEnvelope {
        tag: T::TAG.value(),
        body: to_vec(value)?,
    };
    to_vec(&envelope)
}

/// Unwrap a tagged envelope into `T`
///
/// Fails on a tag other than `T::TAG`, on a malformed body and on a declared
/// version that is zero or unsupported.
pub fn decode_tagged<T: Tagged>(bytes: &[u8]) -> Result<T> {
    let envelope = TaggedEnvelope::decode(bytes)?;
    decode_body(&envelope)
}

/// Decode the body of an already opened envelope into `T`
pub fn decode_body<T: Tagged>(envelope: &TaggedEnvelope) -> Result<T> {
    if envelope.tag != T::TAG.value() {
        return Err(UnicityError::TagMismatch {
            expected: T::TAG.value(),
            actual: envelope.tag,
        });
    }
    let value: T = from_slice(&envelope.body)?;
    ensure_version(&value)?;
    Ok(value)
}
