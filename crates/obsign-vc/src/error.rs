//! # Signing Error Taxonomy
//!
//! Every failure on the path from an inbound credential to a signed one
//! lands in [`SigningError`]. Lower crates keep their own error enums; the
//! key manager and secret origin convert into this one at their boundary.
//!
//! Messages never carry secret key material, seeds, the issuer secret or
//! temporary credentials.

use obsign_core::{CanonicalizationError, CryptoError};
use obsign_schema::SchemaValidationError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SigningError {
    /// Federated role assumption was denied, incomplete or expired.
    #[error("authentication failed: {0}")]
    Authentication(String),

    /// The remote secret store fetch failed or timed out.
    #[error("secret retrieval failed: {0}")]
    SecretRetrieval(String),

    /// KMS encrypt/decrypt failed or timed out, or no usable key exists.
    #[error("key management failed: {0}")]
    KeyManagement(String),

    /// Storage read or write failed.
    #[error("persistence failed: {0}")]
    Persistence(String),

    /// An input, output or record did not conform to its schema.
    #[error(transparent)]
    SchemaValidation(#[from] SchemaValidationError),

    /// A proof this process built failed its own schema, e.g. a signature
    /// whose base58btc form is 87 characters. Never the caller's fault.
    #[error("generated proof is invalid: {0}")]
    InvalidProof(SchemaValidationError),

    /// The caller broke the operation's contract (e.g. input already has a proof).
    #[error("contract violation: {0}")]
    ContractViolation(String),

    #[error("canonicalization failed: {0}")]
    Canonicalization(#[from] CanonicalizationError),

    #[error("cryptographic error: {0}")]
    Crypto(#[from] CryptoError),
}

impl SigningError {
    /// Stable machine-readable kind, used for log fields and metric labels.
    pub fn kind(&self) -> &'static str {
        match self {
            SigningError::Authentication(_) => "authentication",
            SigningError::SecretRetrieval(_) => "secret_retrieval",
            SigningError::KeyManagement(_) => "key_management",
            SigningError::Persistence(_) => "persistence",
            SigningError::SchemaValidation(_) => "schema_validation",
            SigningError::InvalidProof(_) => "invalid_proof",
            SigningError::ContractViolation(_) => "contract_violation",
            SigningError::Canonicalization(_) => "canonicalization",
            SigningError::Crypto(_) => "crypto",
        }
    }
}
