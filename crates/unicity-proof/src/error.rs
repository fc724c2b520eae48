//! Verification failures
//!
//! Each variant names one check of unit state proof verification, so a caller
//! can tell a malformed proof from a rejected certificate or a hash mismatch.

use std::time::Duration;

use unicity_core::UnicityError;

/// Reason a unit state proof was rejected
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VerificationError {
    /// A required part of the proof or its input is absent
    #[error("{field} is nil")]
    Missing {
        /// Name of the absent part
        field: String,
    },

    /// Embedded certificate does not decode
    #[error("failed to get unicity certificate: {0}")]
    CertificateDecode(#[source] UnicityError),

    /// Certificate validator rejected the certificate
    #[error("invalid unicity certificate: {0}")]
    CertificateRejected(#[source] UnicityError),

    /// Certificate validator did not answer in time
    #[error("unicity certificate validation timed out after {}ms", .0.as_millis())]
    ValidatorTimeout(Duration),

    /// Unit data hash could not be computed
    #[error("failed to calculate unit data hash: {0}")]
    UnitDataHash(#[source] UnicityError),

    /// Supplied unit data is not the data the unit tree commits to
    #[error("unit data hash does not match hash in unit tree")]
    UnitDataMismatch {
        /// Hash in the unit tree certificate
        expected: Vec<u8>,
        /// Hash of the supplied data
        actual: Vec<u8>,
    },

    /// State tree output could not be computed
    #[error("failed to calculate state tree output: {0}")]
    StateTreeOutput(#[source] UnicityError),

    /// Recomputed total differs from the certified summary value
    #[error("invalid summary value: expected {}, got {}", hex::encode(expected), hex::encode(actual))]
    SummaryValueMismatch {
        /// Certified summary value
        expected: Vec<u8>,
        /// Recomputed summary value
        actual: Vec<u8>,
    },

    /// Recomputed root differs from the certified state hash
    #[error("invalid state root hash: expected {}, got {}", hex::encode(expected), hex::encode(actual))]
    StateRootMismatch {
        /// Certified state hash
        expected: Vec<u8>,
        /// Recomputed root hash
        actual: Vec<u8>,
    },
}

impl VerificationError {
    /// Create a missing-part error
    pub fn missing(field: impl Into<String>) -> Self {
        Self::Missing {
            field: field.into(),
        }
    }
}
