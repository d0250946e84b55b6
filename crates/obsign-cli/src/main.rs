//! # obsign CLI entry point
//!
//! Parses command-line arguments and dispatches to subcommand handlers.

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use obsign_cli::keygen::{run_keygen, KeygenArgs};
use obsign_cli::signing::{run_sign, run_verify, SignArgs, VerifyArgs};
use obsign_cli::validate::{run_validate, ValidateArgs};

/// OB3 issuer signing tools: key generation, eddsa-jcs-2022 signing and
/// verification, and schema validation.
#[derive(Parser, Debug)]
#[command(name = "obsign", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate an Ed25519 Multikey file.
    Keygen(KeygenArgs),

    /// Add an eddsa-jcs-2022 proof to a credential.
    Sign(SignArgs),

    /// Verify every proof on a signed credential.
    Verify(VerifyArgs),

    /// Validate a document against an embedded schema.
    Validate(ValidateArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let result = match &cli.command {
        Commands::Keygen(args) => run_keygen(args),
        Commands::Sign(args) => run_sign(args),
        Commands::Verify(args) => run_verify(args),
        Commands::Validate(args) => run_validate(args),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            eprintln!("error: {e:#}");
            ExitCode::from(2)
        }
    }
}
