//! # obsign-core — Foundational Types for the Issuer Signing Stack
//!
//! Leaf crate of the workspace. Every other `obsign-*` crate depends on it;
//! it depends on nothing internal.
//!
//! ## Key Design Principles
//!
//! 1. **`CanonicalBytes` newtype.** Every byte sequence that gets hashed for
//!    a Data Integrity proof flows through `CanonicalBytes::new()`, which
//!    applies RFC 8785 (JSON Canonicalization Scheme). Signers and verifiers
//!    therefore agree on the exact input without coordination.
//!
//! 2. **`sha256_digest()` accepts only `&CanonicalBytes`.** A digest over
//!    non-canonical bytes cannot be expressed.
//!
//! 3. **UTC-only timestamps.** `Timestamp` renders `YYYY-MM-DDTHH:MM:SSZ`,
//!    the form used for the `created` field of proof configurations.
//!
//! 4. **`DidKey` newtype.** Verification method identifiers are validated
//!    at construction; no bare strings cross crate boundaries.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `obsign-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod canonical;
pub mod digest;
pub mod error;
pub mod identity;
pub mod temporal;

pub use canonical::CanonicalBytes;
pub use digest::{sha256_digest, Sha256Digest};
pub use error::{CanonicalizationError, CoreError, CryptoError};
pub use identity::DidKey;
pub use temporal::Timestamp;
