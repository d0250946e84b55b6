//! # Sign / Verify Subcommands
//!
//! Offline `eddsa-jcs-2022` signing with a key file, and verification
//! against the `did:key` in each proof. Both run the same engine the
//! service uses, including every schema check.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Args;
use obsign_core::Timestamp;
use obsign_crypto::multikey::decode_secret_key;
use obsign_schema::{load_document, SchemaValidator};
use obsign_vc::{KeyPairSigner, ProofEngine, Signer};

use crate::keygen::read_key_file;

#[derive(Args, Debug)]
pub struct SignArgs {
    /// Key file written by `obsign keygen`.
    #[arg(long)]
    pub key: PathBuf,

    /// Fix the proof's `created` (`YYYY-MM-DDTHH:MM:SSZ`) instead of now.
    #[arg(long)]
    pub created: Option<String>,

    /// Write the signed document here instead of stdout.
    #[arg(long, short)]
    pub out: Option<PathBuf>,

    /// Unsigned credential (JSON or YAML).
    pub document: PathBuf,
}

#[derive(Args, Debug)]
pub struct VerifyArgs {
    /// Signed credential (JSON or YAML).
    pub document: PathBuf,
}

fn engine() -> Result<ProofEngine> {
    Ok(ProofEngine::new(Arc::new(SchemaValidator::builtin()?)))
}

fn runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_current_thread()
        .build()
        .context("cannot start async runtime")
}

/// Load a signer from a key file, checking the file's id against the key.
pub fn load_signer(path: &Path) -> Result<Arc<dyn Signer>> {
    let file = read_key_file(path)?;
    let key = decode_secret_key(&file.secret_key_multibase)
        .with_context(|| format!("{} holds an invalid secret key", path.display()))?;
    let signer = KeyPairSigner::new(key)?;
    if signer.verification_method().as_str() != file.id {
        bail!(
            "{} id {} does not match its secret key ({})",
            path.display(),
            file.id,
            signer.verification_method()
        );
    }
    Ok(Arc::new(signer))
}

pub fn run_sign(args: &SignArgs) -> Result<u8> {
    let signer = load_signer(&args.key)?;
    let document = load_document(&args.document)?;
    let engine = engine()?;
    let signed = match &args.created {
        Some(raw) => {
            let created = Timestamp::parse(raw).context("--created")?;
            runtime()?.block_on(engine.create_proof_at(document, &signer, created))?
        }
        None => runtime()?.block_on(engine.create_proof(document, &signer))?,
    };
    let rendered = serde_json::to_string_pretty(&signed)?;

    match &args.out {
        Some(path) => {
            std::fs::write(path, rendered + "\n")
                .with_context(|| format!("cannot write {}", path.display()))?;
            tracing::info!(path = %path.display(), "signed credential written");
        }
        None => println!("{rendered}"),
    }
    Ok(0)
}

pub fn run_verify(args: &VerifyArgs) -> Result<u8> {
    let document = load_document(&args.document)?;
    let report = engine()?.verify_proof(&document)?;

    for result in &report.results {
        if result.ok {
            println!("ok    {}", result.verification_method);
        } else {
            println!("FAIL  {}: {}", result.verification_method, result.error);
        }
    }

    if report.verified {
        Ok(0)
    } else {
        if report.results.is_empty() {
            println!("FAIL  document has no proofs");
        }
        Ok(1)
    }
}
