//! Verify a unit state proof file against unit data and a verifier config

use anyhow::Context;
use clap::Args;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use unicity_core::config::{ConfigValidation, VerifierConfig};
use unicity_core::decode_tagged;
use unicity_proof::{verify_with_timeout, StateUnitData, TrustBaseValidator, UnitStateProof};

/// Arguments for proof verification
#[derive(Args)]
pub struct VerifyArgs {
    /// Tagged unit state proof file
    #[arg(short, long)]
    pub proof: PathBuf,

    /// Unit data file (canonically encoded)
    #[arg(short, long)]
    pub data: PathBuf,
}

/// Load the verifier config, apply `UNICITY_*` overrides and validate it
pub fn load_config(path: &Path) -> anyhow::Result<VerifierConfig> {
    let mut config = VerifierConfig::load_from_file(path)?;
    config.merge_with_env()?;
    config.validate()?;
    debug!(
        config = %path.display(),
        algorithm = %config.hash_algorithm,
        partition = %config.partition_id,
        "loaded verifier config"
    );
    Ok(config)
}

pub async fn run(args: &VerifyArgs, config_path: &Path) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let proof_bytes = std::fs::read(&args.proof)
        .with_context(|| format!("failed to read {}", args.proof.display()))?;
    let data = std::fs::read(&args.data)
        .with_context(|| format!("failed to read {}", args.data.display()))?;

    let proof: UnitStateProof = decode_tagged(&proof_bytes)
        .with_context(|| format!("{} is not a unit state proof", args.proof.display()))?;
    let validator = TrustBaseValidator::from_config(&config)?;
    verify_with_timeout(
        &proof,
        config.hash_algorithm.algorithm(),
        Some(&StateUnitData::new(data)),
        &validator,
        config.validator_timeout(),
    )
    .await
    .with_context(|| format!("proof of unit {} rejected", proof.unit_id))?;

    info!(unit = %proof.unit_id, "unit state proof is valid");
    Ok(())
}
