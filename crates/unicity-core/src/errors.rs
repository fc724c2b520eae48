//! Unified error system for the certification core
//!
//! A single error type covers every failure the trees, certificates and codecs
//! can report. Structured variants carry the values that failed a comparison so
//! callers can diagnose a rejected proof without re-running it.

use serde::{Deserialize, Serialize};

/// Unified error type for all certification operations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub enum UnicityError {
    /// A required field or argument is absent
    #[error("{field} is nil")]
    Missing {
        /// Name of the absent field
        field: String,
    },

    /// Invalid input or argument
    #[error("{message}")]
    Invalid {
        /// Error message describing the invalid input
        message: String,
    },

    /// Input record invariant violated
    #[error("{reason}")]
    InvalidRecord {
        /// Named reason of the violation
        reason: String,
    },

    /// Expected and actual values differ
    #[error("invalid {what}: expected {expected}, got {actual}")]
    Mismatch {
        /// What was compared
        what: String,
        /// Expected value, rendered for diagnosis
        expected: String,
        /// Actual value, rendered for diagnosis
        actual: String,
    },

    /// Key or record lookup failed
    #[error("{message}")]
    NotFound {
        /// Error message naming what was not found
        message: String,
    },

    /// Cryptographic operation failed
    #[error("crypto error: {message}")]
    Crypto {
        /// Error message describing the cryptographic failure
        message: String,
    },

    /// Canonical encoding or decoding failed
    #[error("serialization error: {message}")]
    Serialization {
        /// Error message describing the serialization failure
        message: String,
    },

    /// Envelope carries a different type tag than expected
    #[error("unexpected tag: {actual}, expected: {expected}")]
    TagMismatch {
        /// Tag the decoder was asked for
        expected: u16,
        /// Tag found in the envelope
        actual: u16,
    },

    /// Decoded value declares version zero
    #[error("version number cannot be zero (type {type_name})")]
    ZeroVersion {
        /// Name of the decoded type
        type_name: String,
    },

    /// Decoded value declares a version this build does not support
    #[error("invalid version (type {type_name}), expected {expected}, got {actual}")]
    UnsupportedVersion {
        /// Name of the decoded type
        type_name: String,
        /// Supported version
        expected: u32,
        /// Declared version
        actual: u32,
    },

    /// Configuration is unreadable or inconsistent
    #[error("config error: {message}")]
    Config {
        /// Error message describing the configuration problem
        message: String,
    },
}

impl UnicityError {
    /// Create a missing-field error
    pub fn missing(field: impl Into<String>) -> Self {
        Self::Missing {
            field: field.into(),
        }
    }

    /// Create an invalid input error
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid {
            message: message.into(),
        }
    }

    /// Create an input record invariant error
    pub fn invalid_record(reason: impl Into<String>) -> Self {
        Self::InvalidRecord {
            reason: reason.into(),
        }
    }

    /// Create a mismatch error from already rendered values
    pub fn mismatch(
        what: impl Into<String>,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        Self::Mismatch {
            what: what.into(),
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    /// Create a mismatch error rendering both byte strings as hex
    pub fn hex_mismatch(what: impl Into<String>, expected: &[u8], actual: &[u8]) -> Self {
        Self::mismatch(what, hex::encode(expected), hex::encode(actual))
    }

    /// Create a not found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    /// Create a crypto error
    pub fn crypto(message: impl Into<String>) -> Self {
        Self::Crypto {
            message: message.into(),
        }
    }

    /// Create a serialization error
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }
}

/// Standard Result type for certification operations
pub type Result<T> = std::result::Result<T, UnicityError>;

impl From<std::io::Error> for UnicityError {
    fn from(err: std::io::Error) -> Self {
        Self::config(err.to_string())
    }
}
