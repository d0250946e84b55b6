//! # Route Modules
//!
//! - [`proofs`]: proof creation and verification.
//! - [`issuer`]: the issuer's public key.

pub mod issuer;
pub mod proofs;
