//! Decoding of any tagged wire value
//!
//! The envelope tag selects the body type; every known tag has a variant, so
//! adding a tag without a decoder fails to compile.

use serde::Serialize;

use unicity_core::serialization::{decode_body, Tagged, TaggedEnvelope, TypeTag};
use unicity_core::Result;
use unicity_types::{
    InputRecord, PartitionDescriptionRecord, RootTrustBase, ShardTreeCertificate,
    UnicityCertificate, UnicitySeal, UnicityTreeCertificate,
};

use crate::unit_proof::UnitStateProof;

/// A decoded top-level wire value
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "value")]
pub enum TaggedValue {
    /// Root-chain seal
    UnicitySeal(UnicitySeal),
    /// Root trust base
    RootTrustBase(RootTrustBase),
    /// Partition description record
    PartitionDescriptionRecord(PartitionDescriptionRecord),
    /// Unicity certificate
    UnicityCertificate(UnicityCertificate),
    /// Input record
    InputRecord(InputRecord),
    /// Unicity tree certificate
    UnicityTreeCertificate(UnicityTreeCertificate),
    /// Shard tree certificate
    ShardTreeCertificate(ShardTreeCertificate),
    /// Unit state proof
    UnitStateProof(UnitStateProof),
}

impl TaggedValue {
    /// Decode an envelope of any known type
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let envelope = TaggedEnvelope::decode(bytes)?;
        let value = match envelope.type_tag()? {
            TypeTag::UnicitySeal => Self::UnicitySeal(decode_body(&envelope)?),
            TypeTag::RootTrustBase => Self::RootTrustBase(decode_body(&envelope)?),
            TypeTag::PartitionDescriptionRecord => {
                Self::PartitionDescriptionRecord(decode_body(&envelope)?)
            }
            TypeTag::UnicityCertificate => Self::UnicityCertificate(decode_body(&envelope)?),
            TypeTag::InputRecord => Self::InputRecord(decode_body(&envelope)?),
            TypeTag::UnicityTreeCertificate => {
                Self::UnicityTreeCertificate(decode_body(&envelope)?)
            }
            TypeTag::ShardTreeCertificate => Self::ShardTreeCertificate(decode_body(&envelope)?),
            TypeTag::UnitStateProof => Self::UnitStateProof(decode_body(&envelope)?),
        };
        Ok(value)
    }

    /// Envelope tag of the value
    pub fn tag(&self) -> TypeTag {
        match self {
            Self::UnicitySeal(_) => UnicitySeal::TAG,
            Self::RootTrustBase(_) => RootTrustBase::TAG,
            Self::PartitionDescriptionRecord(_) => PartitionDescriptionRecord::TAG,
            Self::UnicityCertificate(_) => UnicityCertificate::TAG,
            Self::InputRecord(_) => InputRecord::TAG,
            Self::UnicityTreeCertificate(_) => UnicityTreeCertificate::TAG,
            Self::ShardTreeCertificate(_) => ShardTreeCertificate::TAG,
            Self::UnitStateProof(_) => UnitStateProof::TAG,
        }
    }
}
