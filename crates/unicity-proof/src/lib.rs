//! Unicity Proof - unit state proofs, end to end
//!
//! ## Producer side
//!
//! - **unit_log**: per-unit log of a round and its log tree
//! - **round**: [`PartitionRound`] certifies one shard's round and hands out
//!   a [`UnitStateProof`] per unit
//!
//! ## Verifier side
//!
//! - **validator**: the async [`UnicityCertificateValidator`] capability and
//!   the trust-base backed [`TrustBaseValidator`]
//! - **verify**: [`verify_unit_state_proof`] and its timeout-bounded variant
//! - **tagged**: [`TaggedValue`] decoding of any wire value
//!
//! Verification is stateless: the same proof and inputs always give the same
//! outcome, and nothing is cached between calls.

#![forbid(unsafe_code)]

/// Verification failures
pub mod error;

/// Round certification
pub mod round;

/// Tagged wire value dispatch
pub mod tagged;

/// Unit logs
pub mod unit_log;

/// Unit state proof types
pub mod unit_proof;

/// Certificate validator capability
pub mod validator;

/// Proof verification
pub mod verify;

pub use error::VerificationError;
pub use round::{
    CertifiedRound, PartitionRound, RepeatParams, RootSigner, RoundParams, RoundUnit,
    UNIT_STATE_PROOF_VERSION,
};
pub use tagged::TaggedValue;
pub use unit_log::{UnitLog, UnitLogEntry};
pub use unit_proof::{log_entry_digest, StateUnitData, UnitDataAndProof, UnitStateProof, UnitTreeCert};
pub use validator::{TrustBaseValidator, UnicityCertificateValidator};
pub use verify::{verify_unit_data_and_proof, verify_unit_state_proof, verify_with_timeout};
