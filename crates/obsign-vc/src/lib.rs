//! # obsign-vc — Data Integrity Proofs
//!
//! Signs Open Badges 3.0 AchievementCredentials with `eddsa-jcs-2022` Data
//! Integrity proofs and verifies them.
//!
//! - [`proof`]: the proof configuration and proof object.
//! - [`signer`]: the [`Signer`] / [`SignerProvider`] seam between the engine
//!   and whoever holds the issuer key.
//! - [`engine`]: [`ProofEngine::create_proof`] and
//!   [`ProofEngine::verify_proof`].
//! - [`error`]: [`SigningError`], the taxonomy every layer maps into.
//!
//! ## Security Invariants
//!
//! - The signing input is always `SHA-256(JCS(config)) || SHA-256(JCS(doc))`,
//!   enforced by `HashData` being the only thing a [`Signer`] accepts.
//! - A document that already carries `proof` is rejected before schema
//!   validation, key access or any cryptography.

pub mod engine;
pub mod error;
pub mod proof;
pub mod signer;

pub use engine::{ProofEngine, ProofResult, VerificationReport};
pub use error::SigningError;
pub use proof::{
    DataIntegrityProof, ProofConfig, ProofPurpose, DATA_INTEGRITY_PROOF, EDDSA_JCS_2022,
};
pub use signer::{KeyPairSigner, Signer, SignerProvider};
