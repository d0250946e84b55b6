//! # obsign-keys — Issuer Key Lifecycle
//!
//! - [`origin`]: bootstraps the issuer secret once at startup, either through
//!   federated role assumption and a secret store (`aws` feature) or from a
//!   static development value.
//! - [`record`]: the persisted [`SigningKeyRecord`].
//! - [`store`]: single-slot [`KeyStore`] backends (in-memory and Postgres).
//! - [`manager`]: [`SigningKeyManager`], get-or-create of the envelope
//!   encrypted Ed25519 issuer key.
//!
//! ## Security Invariants
//!
//! - Secret key material and seeds are persisted only as envelope
//!   ciphertext. The public half is stored in the clear.
//! - At most one record is ever active. Concurrent creators converge on
//!   whichever insert the store accepted.
//! - No type in this crate prints secret material through `Debug`.

pub mod manager;
pub mod origin;
pub mod record;
pub mod store;

pub use manager::{
    IssuerSigner, KeyGeneration, KeyManagerConfig, KeyManagerError, SigningKeyManager,
};
pub use origin::{
    FederatedOriginConfig, FederatedSecretOrigin, IssuerSecret, OriginError, SecretOrigin,
    StaticSecretOrigin,
};
pub use record::SigningKeyRecord;
pub use store::{init_pool, InsertOutcome, KeyStore, MemoryKeyStore, PgKeyStore, StoreError};

#[cfg(feature = "aws")]
pub use origin::aws::{SecretsManagerSecretStore, StsRoleAssumer};
