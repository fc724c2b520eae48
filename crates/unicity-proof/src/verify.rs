//! Unit state proof verification
//!
//! Verification recomputes the commitment chain of one unit, leaf upwards:
//!
//! 1. every required part of the proof and its input is present and non-empty
//! 2. the embedded unicity certificate decodes at a supported version
//! 3. the certificate validator accepts the certificate
//! 4. the supplied unit data hashes to the value in the unit tree certificate
//! 5. the state tree output recomputed from the proof equals the certified
//!    summary value and state hash
//!
//! Any failing check aborts with its own [`VerificationError`]. Verification
//! holds no state between calls; the validator call is the only suspension
//! point.

use std::time::Duration;

use unicity_core::crypto::hash::HashAlgorithm;
use unicity_types::UnicityCertificate;

use crate::error::VerificationError;
use crate::unit_proof::{StateUnitData, UnitDataAndProof, UnitStateProof};
use crate::validator::UnicityCertificateValidator;

/// Verify `proof` for `unit_data` against a validated unicity certificate
pub async fn verify_unit_state_proof(
    proof: &UnitStateProof,
    algorithm: &dyn HashAlgorithm,
    unit_data: Option<&StateUnitData>,
    validator: &dyn UnicityCertificateValidator,
) -> Result<(), VerificationError> {
    verify_inner(proof, algorithm, unit_data, validator, None).await
}

/// As [`verify_unit_state_proof`], with the validator call bounded by `timeout`
pub async fn verify_with_timeout(
    proof: &UnitStateProof,
    algorithm: &dyn HashAlgorithm,
    unit_data: Option<&StateUnitData>,
    validator: &dyn UnicityCertificateValidator,
    timeout: Duration,
) -> Result<(), VerificationError> {
    verify_inner(proof, algorithm, unit_data, validator, Some(timeout)).await
}

/// Verify a proof travelling together with its unit data
pub async fn verify_unit_data_and_proof(
    pair: &UnitDataAndProof,
    algorithm: &dyn HashAlgorithm,
    validator: &dyn UnicityCertificateValidator,
) -> Result<(), VerificationError> {
    let proof = pair
        .proof
        .as_ref()
        .ok_or_else(|| VerificationError::missing("unit state proof"))?;
    let unit_data = pair
        .unit_data
        .as_ref()
        .ok_or_else(|| VerificationError::missing("unit data"))?;
    verify_unit_state_proof(proof, algorithm, Some(unit_data), validator).await
}

async fn verify_inner(
    proof: &UnitStateProof,
    algorithm: &dyn HashAlgorithm,
    unit_data: Option<&StateUnitData>,
    validator: &dyn UnicityCertificateValidator,
    timeout: Option<Duration>,
) -> Result<(), VerificationError> {
    let result = run_checks(proof, algorithm, unit_data, validator, timeout).await;
    match &result {
        Ok(()) => tracing::debug!(unit = %proof.unit_id, "unit state proof verified"),
        Err(e) => tracing::warn!(unit = %proof.unit_id, error = %e, "unit state proof rejected"),
    }
    result
}

async fn run_checks(
    proof: &UnitStateProof,
    algorithm: &dyn HashAlgorithm,
    unit_data: Option<&StateUnitData>,
    validator: &dyn UnicityCertificateValidator,
    timeout: Option<Duration>,
) -> Result<(), VerificationError> {
    if proof.unit_id.is_empty() {
        return Err(VerificationError::missing("unit id"));
    }
    let unit_tree_cert = proof
        .unit_tree_cert
        .as_ref()
        .ok_or_else(|| VerificationError::missing("unit tree cert"))?;
    if proof.state_tree_cert.is_none() {
        return Err(VerificationError::missing("state tree cert"));
    }
    if proof
        .unicity_certificate
        .as_ref()
        .map_or(true, |bytes| bytes.is_empty())
    {
        return Err(VerificationError::missing("unicity certificate"));
    }
    let unit_data = unit_data
        .filter(|data| !data.data.is_empty())
        .ok_or_else(|| VerificationError::missing("unit data"))?;

    let certificate = proof
        .unicity_certificate()
        .map_err(VerificationError::CertificateDecode)?;

    validate_certificate(validator, &certificate, timeout).await?;

    let data_hash = unit_data
        .hash(algorithm)
        .map_err(VerificationError::UnitDataHash)?;
    if data_hash.as_slice() != unit_tree_cert.unit_data_hash.as_slice() {
        return Err(VerificationError::UnitDataMismatch {
            expected: unit_tree_cert.unit_data_hash.clone(),
            actual: data_hash.to_vec(),
        });
    }

    let (root, summary) = proof
        .calculate_state_tree_output(algorithm)
        .map_err(VerificationError::StateTreeOutput)?;
    let ir = certificate
        .input_record()
        .map_err(VerificationError::CertificateRejected)?;
    let summary_bytes = summary.to_be_bytes();
    if summary_bytes.as_slice() != ir.summary_value.as_slice() {
        return Err(VerificationError::SummaryValueMismatch {
            expected: ir.summary_value.clone(),
            actual: summary_bytes.to_vec(),
        });
    }
    if root.as_slice() != ir.hash.as_slice() {
        return Err(VerificationError::StateRootMismatch {
            expected: ir.hash.clone(),
            actual: root.to_vec(),
        });
    }
    Ok(())
}

async fn validate_certificate(
    validator: &dyn UnicityCertificateValidator,
    certificate: &UnicityCertificate,
    timeout: Option<Duration>,
) -> Result<(), VerificationError> {
    let outcome = match timeout {
        None => validator.validate(certificate).await,
        Some(limit) => tokio::time::timeout(limit, validator.validate(certificate))
            .await
            .map_err(|_| VerificationError::ValidatorTimeout(limit))?,
    };
    outcome.map_err(VerificationError::CertificateRejected)
}
