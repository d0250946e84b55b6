//! # obsign-cli — Offline Tooling for the Issuer Signing Stack
//!
//! - `obsign keygen`: generate an Ed25519 Multikey and write it to a
//!   `<name>.multikey.json` file readable only by its owner.
//! - `obsign sign`: sign a credential with a key file.
//! - `obsign verify`: verify every proof on a signed credential.
//! - `obsign validate`: check a JSON or YAML document against an embedded
//!   schema.
//!
//! Handlers return the process exit code: `0` on success, `1` when the
//! document was checked and failed. Operational errors propagate as
//! `anyhow::Error`.

pub mod keygen;
pub mod signing;
pub mod validate;
