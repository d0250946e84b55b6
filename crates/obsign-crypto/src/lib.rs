//! # obsign-crypto — Cryptographic Primitives
//!
//! - **Ed25519** key pairs, signatures, and verification.
//! - **Hash data** for the `eddsa-jcs-2022` cryptosuite: the 64-byte
//!   concatenation of two SHA-256 digests over canonical JSON.
//! - **Multikey** codecs: `z`-prefixed base58btc encodings of public keys,
//!   secret keys, seeds, and signatures, plus `did:key` derivation.
//! - **Envelope encryption** behind the [`EnvelopeCipher`] trait, with a
//!   local AES-256-GCM backend and an AWS KMS backend (`aws-kms` feature).
//!
//! ## Crate Policy
//!
//! - Depends only on `obsign-core` internally.
//! - Secret key material lives in types that zeroize on drop and whose
//!   `Debug` output is redacted.
//! - Tests use real Ed25519 and real AES-GCM; nothing is mocked.

pub mod ed25519;
pub mod envelope;
pub mod hash_data;
pub mod multikey;

pub use ed25519::{verify, Ed25519KeyPair, Ed25519PublicKey, Ed25519Signature};
pub use envelope::{
    decrypt_from_base64, encrypt_to_base64, EnvelopeCipher, EnvelopeError, LocalEnvelopeCipher,
};
pub use hash_data::{eddsa_jcs_hash_data, HashData};
pub use multikey::ExportedKeyPair;

#[cfg(feature = "aws-kms")]
pub use envelope::aws_kms::AwsKmsEnvelopeCipher;
