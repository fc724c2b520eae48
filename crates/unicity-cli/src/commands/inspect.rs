//! Render any tagged wire value as JSON

use anyhow::Context;
use clap::Args;
use std::path::PathBuf;

use unicity_proof::TaggedValue;

/// Arguments for tagged value inspection
#[derive(Args)]
pub struct InspectArgs {
    /// File holding a tagged value
    pub path: PathBuf,

    /// Read the file as hex text instead of raw bytes
    #[arg(long)]
    pub hex: bool,
}

pub fn run(args: &InspectArgs) -> anyhow::Result<String> {
    let raw = std::fs::read(&args.path)
        .with_context(|| format!("failed to read {}", args.path.display()))?;
    let bytes = if args.hex {
        let text = String::from_utf8(raw).context("hex input is not UTF-8")?;
        hex::decode(text.trim()).context("invalid hex input")?
    } else {
        raw
    };
    let value = TaggedValue::decode(&bytes)?;
    tracing::debug!(tag = %value.tag(), "decoded tagged value");
    Ok(serde_json::to_string_pretty(&value)?)
}
