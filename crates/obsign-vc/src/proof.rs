//! # Data Integrity Proof Types
//!
//! The proof configuration hashed under `eddsa-jcs-2022` and the finished
//! proof object embedded into a signed credential.
//!
//! `created` is carried as the exact string that was hashed. Verification
//! must rebuild the configuration byte-for-byte, so the value is never
//! reparsed or reformatted once a proof exists.

use obsign_core::{DidKey, Timestamp};
use serde::{Deserialize, Serialize};

/// The proof `type` for Data Integrity proofs.
pub const DATA_INTEGRITY_PROOF: &str = "DataIntegrityProof";

/// The cryptosuite identifier.
pub const EDDSA_JCS_2022: &str = "eddsa-jcs-2022";

/// The purpose of a cryptographic proof.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ProofPurpose {
    /// The issuer asserts the credential claims are true.
    AssertionMethod,
    Authentication,
}

impl std::fmt::Display for ProofPurpose {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProofPurpose::AssertionMethod => write!(f, "assertionMethod"),
            ProofPurpose::Authentication => write!(f, "authentication"),
        }
    }
}

/// Proof options: the first input to the hash data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofConfig {
    #[serde(rename = "type")]
    pub proof_type: String,
    pub cryptosuite: String,
    pub created: String,
}

impl ProofConfig {
    /// An `eddsa-jcs-2022` configuration created at `created`.
    pub fn new(created: Timestamp) -> Self {
        Self {
            proof_type: DATA_INTEGRITY_PROOF.to_string(),
            cryptosuite: EDDSA_JCS_2022.to_string(),
            created: created.to_iso8601(),
        }
    }
}

/// A finished `eddsa-jcs-2022` Data Integrity proof.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataIntegrityProof {
    #[serde(rename = "type")]
    pub proof_type: String,
    pub cryptosuite: String,
    pub created: String,
    pub proof_purpose: ProofPurpose,
    /// Multibase base58btc signature (`z` prefix).
    pub proof_value: String,
    /// The signer's `did:key` identifier.
    pub verification_method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub challenge: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nonce: Option<String>,
}

impl DataIntegrityProof {
    /// Complete a configuration into an `assertionMethod` proof.
    pub fn assertion(
        config: ProofConfig,
        proof_value: String,
        verification_method: &DidKey,
    ) -> Self {
        Self {
            proof_type: config.proof_type,
            cryptosuite: config.cryptosuite,
            created: config.created,
            proof_purpose: ProofPurpose::AssertionMethod,
            proof_value,
            verification_method: verification_method.to_string(),
            challenge: None,
            domain: None,
            nonce: None,
        }
    }

    /// The configuration this proof was hashed with.
    pub fn config(&self) -> ProofConfig {
        ProofConfig {
            proof_type: self.proof_type.clone(),
            cryptosuite: self.cryptosuite.clone(),
            created: self.created.clone(),
        }
    }
}
