//! Identifier types for units, partitions and shards
//!
//! Ordering matters: unit identifiers decide left/right placement in the state
//! tree and partition identifiers key the unicity tree. Both order
//! byte-lexicographically. Partition identifiers are fixed 4-byte values
//! (big-endian on the wire and in hashes), so their numeric and byte orders
//! agree.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{Result, UnicityError};

/// Width of partition and partition-type identifiers in bytes
pub const PARTITION_ID_LEN: usize = 4;

/// Identifier of a unit within a partition
#[derive(Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UnitId(#[serde(with = "serde_bytes")] Vec<u8>);

impl UnitId {
    /// Create from raw bytes
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    /// Raw bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// True for the zero-length identifier, which never names a unit
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<u8>> for UnitId {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl From<&[u8]> for UnitId {
    fn from(bytes: &[u8]) -> Self {
        Self(bytes.to_vec())
    }
}

impl AsRef<[u8]> for UnitId {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(&self.0))
    }
}

impl fmt::Debug for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UnitId({self})")
    }
}

macro_rules! fixed_width_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub u32);

        impl $name {
            /// Create from the numeric value
            pub const fn new(value: u32) -> Self {
                Self(value)
            }

            /// Numeric value
            pub fn value(&self) -> u32 {
                self.0
            }

            /// Big-endian fixed-width encoding
            pub fn to_bytes(&self) -> [u8; PARTITION_ID_LEN] {
                self.0.to_be_bytes()
            }

            /// Parse the fixed-width encoding; any other width is rejected
            pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
                let bytes: [u8; PARTITION_ID_LEN] = bytes.try_into().map_err(|_| {
                    UnicityError::invalid(format!(
                        "{} must be {} bytes, got {}",
                        stringify!($name),
                        PARTITION_ID_LEN,
                        bytes.len()
                    ))
                })?;
                Ok(Self(u32::from_be_bytes(bytes)))
            }
        }

        impl From<u32> for $name {
            fn from(value: u32) -> Self {
                Self(value)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{:08x}", self.0)
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({:08x})", stringify!($name), self.0)
            }
        }
    };
}

fixed_width_id!(
    /// Identifier of a partition; key of the unicity tree
    PartitionId
);

fixed_width_id!(
    /// Identifier of a partition class
    PartitionTypeId
);

/// Position of a shard in the shard tree, as a string of bits
///
/// The empty string is the single shard of an unsharded partition. Each bit
/// selects the left (`0`) or right (`1`) child on the way down.
#[derive(Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "ShardIdRepr", try_from = "ShardIdRepr")]
pub struct ShardId {
    bits: Vec<bool>,
}

impl ShardId {
    /// The root shard (empty bit string)
    pub fn root() -> Self {
        Self::default()
    }

    /// Build from explicit bits, first bit nearest the root
    pub fn from_bits(bits: &[bool]) -> Self {
        Self {
            bits: bits.to_vec(),
        }
    }

    /// Number of bits
    pub fn len(&self) -> usize {
        self.bits.len()
    }

    /// True for the root shard
    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    /// Bit at `depth`, if the identifier is that long
    pub fn bit(&self, depth: usize) -> Option<bool> {
        self.bits.get(depth).copied()
    }

    /// All bits, first bit nearest the root
    pub fn bits(&self) -> &[bool] {
        &self.bits
    }

    /// The two children of this shard
    pub fn split(&self) -> (ShardId, ShardId) {
        let mut left = self.bits.clone();
        left.push(false);
        let mut right = self.bits.clone();
        right.push(true);
        (Self { bits: left }, Self { bits: right })
    }

    /// True when `self` is a prefix of (or equal to) `other`
    pub fn is_prefix_of(&self, other: &ShardId) -> bool {
        other.bits.starts_with(&self.bits)
    }
}

impl fmt::Display for ShardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.bits.is_empty() {
            return f.write_str("<root>");
        }
        for bit in &self.bits {
            f.write_str(if *bit { "1" } else { "0" })?;
        }
        Ok(())
    }
}

impl fmt::Debug for ShardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ShardId({self})")
    }
}

/// Packed wire form: bit count plus MSB-first bytes with zero padding
#[derive(Serialize, Deserialize)]
struct ShardIdRepr {
    length: u32,
    #[serde(with = "serde_bytes")]
    bits: Vec<u8>,
}

impl From<ShardId> for ShardIdRepr {
    fn from(id: ShardId) -> Self {
        let mut bits = vec![0u8; id.bits.len().div_ceil(8)];
        for (i, bit) in id.bits.iter().enumerate() {
            if *bit {
                bits[i / 8] |= 0x80 >> (i % 8);
            }
        }
        Self {
            length: id.bits.len() as u32,
            bits,
        }
    }
}

impl TryFrom<ShardIdRepr> for ShardId {
    type Error = UnicityError;

    fn try_from(repr: ShardIdRepr) -> Result<Self> {
        let length = repr.length as usize;
        if repr.bits.len() != length.div_ceil(8) {
            return Err(UnicityError::serialization(format!(
                "shard id of {length} bits carries {} bytes",
                repr.bits.len()
            )));
        }
        let bits: Vec<bool> = (0..length)
            .map(|i| repr.bits[i / 8] & (0x80 >> (i % 8)) != 0)
            .collect();
        let canonical = ShardIdRepr::from(ShardId { bits: bits.clone() });
        if canonical.bits != repr.bits {
            return Err(UnicityError::serialization(
                "shard id has non-zero padding bits",
            ));
        }
        Ok(Self { bits })
    }
}
