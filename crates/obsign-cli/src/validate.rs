//! # Validate Subcommand
//!
//! `obsign validate --schema <name> <document>` checks a JSON or YAML file
//! against one of the embedded schemas and prints each violation.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use obsign_schema::{SchemaName, SchemaValidationError, SchemaValidator};

#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Schema name, e.g. `create-credential` or `achievement-credential`.
    #[arg(long)]
    pub schema: SchemaName,

    /// Document to validate.
    pub document: PathBuf,
}

pub fn run_validate(args: &ValidateArgs) -> Result<u8> {
    let validator = SchemaValidator::builtin()?;
    match validator.validate_file(&args.document, args.schema) {
        Ok(()) => {
            println!("OK    {} ({})", args.document.display(), args.schema);
            Ok(0)
        }
        Err(SchemaValidationError::ValidationFailed { violations, .. }) => {
            println!("FAIL  {} ({})", args.document.display(), args.schema);
            for v in violations.violations() {
                let path = if v.instance_path.is_empty() {
                    "/"
                } else {
                    v.instance_path.as_str()
                };
                println!("      {path}: {}", v.message);
            }
            Ok(1)
        }
        Err(e) => Err(e.into()),
    }
}
