//! # Error Types
//!
//! Leaf error types shared by every crate in the workspace. All use
//! `thiserror`. None of them carry key material: messages describe what
//! failed, never the bytes involved.

use thiserror::Error;

/// Top-level error for core primitives.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Canonicalization failed.
    #[error("canonicalization error: {0}")]
    Canonicalization(#[from] CanonicalizationError),

    /// A `did:key` or multibase identifier was malformed.
    #[error("invalid identifier: {0}")]
    InvalidIdentifier(String),

    /// A timestamp string was not valid RFC 3339 / UTC.
    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(String),
}

/// Error during canonical serialization.
#[derive(Error, Debug)]
pub enum CanonicalizationError {
    /// JSON serialization failed.
    #[error("serialization failed: {0}")]
    SerializationFailed(#[from] serde_json::Error),
}

/// Error in cryptographic operations.
#[derive(Error, Debug)]
pub enum CryptoError {
    /// Signature verification failed.
    #[error("signature verification failed: {0}")]
    VerificationFailed(String),

    /// Key generation, parsing, or consistency check failed.
    #[error("key error: {0}")]
    KeyError(String),

    /// Multibase / multicodec decoding failed.
    #[error("encoding error: {0}")]
    Encoding(String),
}
