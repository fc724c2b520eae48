//! Command-line tooling for unit state proofs
//!
//! Writes signed demo rounds, verifies proofs against a verifier
//! configuration and renders any tagged wire value as JSON.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;

use commands::{demo, inspect, verify};

#[derive(Parser)]
#[command(name = "unicity")]
#[command(about = "Unicity - unit state proofs and certificates", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Verifier config file path
    #[arg(short, long, global = true, default_value = "unicity.toml")]
    config: PathBuf,
}

#[derive(Subcommand)]
enum Commands {
    /// Certify a demo round and write its proofs and verifier config
    Demo(demo::DemoArgs),

    /// Verify a unit state proof against unit data
    Verify(verify::VerifyArgs),

    /// Decode a tagged value and print it as JSON
    Inspect(inspect::InspectArgs),
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Demo(args) => {
            let output = demo::run(&args)?;
            println!("config:      {}", output.config.display());
            println!("certificate: {}", output.certificate.display());
            for (proof, data) in &output.units {
                println!("proof:       {} (data: {})", proof.display(), data.display());
            }
        }

        Commands::Verify(args) => {
            verify::run(&args, &cli.config).await?;
        }

        Commands::Inspect(args) => {
            println!("{}", inspect::run(&args)?);
        }
    }

    Ok(())
}
