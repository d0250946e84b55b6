//! # Keygen Subcommand
//!
//! Writes a key file holding the full key pair in multibase form:
//!
//! ```json
//! {"id": "did:key:z6Mk...", "publicKeyMultibase": "z6Mk...",
//!  "secretKeyMultibase": "zrv...", "seed": "z1..."}
//! ```
//!
//! The file is plaintext secret material; on unix it is created with mode
//! 0600.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Args;
use obsign_crypto::{Ed25519KeyPair, ExportedKeyPair};
use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

#[derive(Args, Debug)]
pub struct KeygenArgs {
    /// Derive the key from a fresh 32-byte seed and include the seed.
    #[arg(long)]
    pub seeded: bool,

    /// Directory to write the key file into.
    #[arg(long, short, default_value = ".")]
    pub output: PathBuf,

    /// File name prefix.
    #[arg(long, default_value = "issuer")]
    pub name: String,

    /// Overwrite an existing key file.
    #[arg(long)]
    pub force: bool,
}

/// On-disk key file. Zeroized on drop.
#[derive(Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
#[serde(rename_all = "camelCase")]
pub struct KeyFile {
    pub id: String,
    pub public_key_multibase: String,
    pub secret_key_multibase: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<String>,
}

impl From<&ExportedKeyPair> for KeyFile {
    fn from(exported: &ExportedKeyPair) -> Self {
        Self {
            id: exported.id.to_string(),
            public_key_multibase: exported.public_key_multibase.clone(),
            secret_key_multibase: exported.secret_key_multibase.to_string(),
            seed: exported.seed.as_ref().map(|s| s.to_string()),
        }
    }
}

impl std::fmt::Debug for KeyFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyFile")
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}

pub fn key_file_path(dir: &Path, name: &str) -> PathBuf {
    dir.join(format!("{name}.multikey.json"))
}

pub fn run_keygen(args: &KeygenArgs) -> Result<u8> {
    let key = if args.seeded {
        Ed25519KeyPair::from_seed(&Ed25519KeyPair::generate_seed())
    } else {
        Ed25519KeyPair::generate()
    };
    let file = KeyFile::from(&ExportedKeyPair::export(&key, args.seeded)?);

    let path = key_file_path(&args.output, &args.name);
    if path.exists() && !args.force {
        bail!("{} already exists; pass --force to overwrite", path.display());
    }
    std::fs::create_dir_all(&args.output)
        .with_context(|| format!("cannot create {}", args.output.display()))?;

    let json = Zeroizing::new(serde_json::to_string_pretty(&file)?);
    write_private(&path, json.as_bytes())?;

    tracing::info!(path = %path.display(), seeded = args.seeded, "key file written");
    println!("{}", file.id);
    Ok(0)
}

/// Read a key file written by [`run_keygen`].
pub fn read_key_file(path: &Path) -> Result<KeyFile> {
    let content = Zeroizing::new(
        std::fs::read_to_string(path)
            .with_context(|| format!("cannot read key file {}", path.display()))?,
    );
    serde_json::from_str(&content)
        .with_context(|| format!("{} is not a multikey file", path.display()))
}

fn write_private(path: &Path, contents: &[u8]) -> Result<()> {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let mut file = options
        .open(path)
        .with_context(|| format!("cannot create {}", path.display()))?;
    file.write_all(contents)
        .with_context(|| format!("cannot write {}", path.display()))?;
    Ok(())
}
