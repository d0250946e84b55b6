//! # Envelope Encryption
//!
//! The issuer's secret key is stored only in wrapped form. A master key that
//! never leaves its boundary (a KMS key in production) encrypts the secret
//! key's multibase string; the resulting ciphertext blob is base64-encoded
//! for storage.
//!
//! ## Backends
//!
//! | Backend                 | Where the master key lives | Feature   |
//! |-------------------------|----------------------------|-----------|
//! | [`LocalEnvelopeCipher`] | process memory (AES-256-GCM) | none    |
//! | `AwsKmsEnvelopeCipher`  | AWS KMS                    | `aws-kms` |
//!
//! Callers depend on the [`EnvelopeCipher`] trait only. Failures are never
//! retried here; a failed call is terminal for the operation that made it.

#[cfg(feature = "aws-kms")]
pub mod aws_kms;

use aes_gcm::aead::{Aead, KeyInit, OsRng, Payload};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use rand::RngCore;
use thiserror::Error;
use zeroize::Zeroizing;

/// Size of the local master key in bytes (AES-256).
pub const LOCAL_KEY_SIZE: usize = 32;

/// Size of the AES-GCM nonce prefixed to local ciphertexts.
pub const NONCE_SIZE: usize = 12;

/// Errors from envelope encryption backends.
///
/// Messages never contain plaintext.
#[derive(Error, Debug)]
pub enum EnvelopeError {
    /// The backend refused or failed to encrypt.
    #[error("{backend} encrypt failed: {reason}")]
    Encrypt { backend: String, reason: String },

    /// The backend refused or failed to decrypt.
    #[error("{backend} decrypt failed: {reason}")]
    Decrypt { backend: String, reason: String },

    /// A stored ciphertext was not valid base64.
    #[error("ciphertext encoding error: {0}")]
    Encoding(String),

    /// The backend is misconfigured (bad key length, missing region, ...).
    #[error("envelope configuration error: {0}")]
    Config(String),
}

/// Encrypts and decrypts secret key material under a master key.
#[async_trait]
pub trait EnvelopeCipher: Send + Sync {
    /// Wrap `plaintext` under the master key `key_id`.
    async fn encrypt(&self, plaintext: &[u8], key_id: &str) -> Result<Vec<u8>, EnvelopeError>;

    /// Unwrap a ciphertext blob produced by [`EnvelopeCipher::encrypt`].
    async fn decrypt(
        &self,
        ciphertext: &[u8],
        key_id: &str,
    ) -> Result<Zeroizing<Vec<u8>>, EnvelopeError>;

    /// Human-readable backend name for logs.
    fn backend_name(&self) -> &str;
}

/// Encrypt and base64-encode the ciphertext for storage.
pub async fn encrypt_to_base64(
    cipher: &dyn EnvelopeCipher,
    plaintext: &[u8],
    key_id: &str,
) -> Result<String, EnvelopeError> {
    let blob = cipher.encrypt(plaintext, key_id).await?;
    Ok(STANDARD.encode(blob))
}

/// Base64-decode a stored ciphertext and decrypt it.
pub async fn decrypt_from_base64(
    cipher: &dyn EnvelopeCipher,
    ciphertext_b64: &str,
    key_id: &str,
) -> Result<Zeroizing<Vec<u8>>, EnvelopeError> {
    let blob = STANDARD
        .decode(ciphertext_b64.trim())
        .map_err(|e| EnvelopeError::Encoding(format!("stored ciphertext is not base64: {e}")))?;
    cipher.decrypt(&blob, key_id).await
}

// ---------------------------------------------------------------------------
// Local AES-256-GCM backend
// ---------------------------------------------------------------------------

/// In-process envelope cipher for development and tests.
///
/// Output layout is `nonce (12) || AES-256-GCM ciphertext+tag`. The `key_id`
/// is bound as associated data, so a blob only decrypts under the key id it
/// was sealed with, mirroring how KMS ties a ciphertext to its key.
pub struct LocalEnvelopeCipher {
    key: Zeroizing<[u8; LOCAL_KEY_SIZE]>,
}

impl LocalEnvelopeCipher {
    pub fn new(key: [u8; LOCAL_KEY_SIZE]) -> Self {
        Self {
            key: Zeroizing::new(key),
        }
    }

    /// Build from a base64-encoded 32-byte key (the `LOCAL_ENVELOPE_KEY`
    /// format).
    pub fn from_base64(encoded: &str) -> Result<Self, EnvelopeError> {
        let bytes = Zeroizing::new(
            STANDARD
                .decode(encoded.trim())
                .map_err(|e| EnvelopeError::Config(format!("local key is not base64: {e}")))?,
        );
        if bytes.len() != LOCAL_KEY_SIZE {
            return Err(EnvelopeError::Config(format!(
                "local key must be {LOCAL_KEY_SIZE} bytes, got {}",
                bytes.len()
            )));
        }
        let mut key = [0u8; LOCAL_KEY_SIZE];
        key.copy_from_slice(&bytes);
        Ok(Self::new(key))
    }

    /// A cipher with a fresh random master key.
    pub fn generate() -> Self {
        let mut key = [0u8; LOCAL_KEY_SIZE];
        OsRng.fill_bytes(&mut key);
        Self::new(key)
    }

    fn cipher(&self) -> Aes256Gcm {
        Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&self.key[..]))
    }
}

#[async_trait]
impl EnvelopeCipher for LocalEnvelopeCipher {
    async fn encrypt(&self, plaintext: &[u8], key_id: &str) -> Result<Vec<u8>, EnvelopeError> {
        let mut nonce_bytes = [0u8; NONCE_SIZE];
        OsRng.fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = self
            .cipher()
            .encrypt(
                nonce,
                Payload {
                    msg: plaintext,
                    aad: key_id.as_bytes(),
                },
            )
            .map_err(|e| EnvelopeError::Encrypt {
                backend: self.backend_name().to_string(),
                reason: e.to_string(),
            })?;

        let mut out = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
        out.extend_from_slice(&nonce_bytes);
        out.extend_from_slice(&ciphertext);
        Ok(out)
    }

    async fn decrypt(
        &self,
        ciphertext: &[u8],
        key_id: &str,
    ) -> Result<Zeroizing<Vec<u8>>, EnvelopeError> {
        if ciphertext.len() <= NONCE_SIZE {
            return Err(EnvelopeError::Decrypt {
                backend: self.backend_name().to_string(),
                reason: format!("ciphertext too short ({} bytes)", ciphertext.len()),
            });
        }
        let (nonce_bytes, body) = ciphertext.split_at(NONCE_SIZE);
        let plaintext = self
            .cipher()
            .decrypt(
                Nonce::from_slice(nonce_bytes),
                Payload {
                    msg: body,
                    aad: key_id.as_bytes(),
                },
            )
            .map_err(|_| EnvelopeError::Decrypt {
                backend: self.backend_name().to_string(),
                reason: "authentication tag mismatch (wrong key or key id)".to_string(),
            })?;
        Ok(Zeroizing::new(plaintext))
    }

    fn backend_name(&self) -> &str {
        "local-aes-256-gcm"
    }
}

impl std::fmt::Debug for LocalEnvelopeCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "LocalEnvelopeCipher(<key>)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ed25519::Ed25519KeyPair;
    use crate::multikey::{decode_secret_key, encode_secret_key};

    const KEY_ID: &str = "alias/obsign-issuer";

    #[tokio::test]
    async fn round_trip_secret_key_multibase() {
        let cipher = LocalEnvelopeCipher::generate();
        let kp = Ed25519KeyPair::generate();
        let secret = encode_secret_key(&kp);

        let stored = encrypt_to_base64(&cipher, secret.as_bytes(), KEY_ID)
            .await
            .unwrap();
        assert!(!stored.contains(secret.as_str()));

        let plaintext = decrypt_from_base64(&cipher, &stored, KEY_ID).await.unwrap();
        assert_eq!(plaintext.as_slice(), secret.as_bytes());

        let restored = decode_secret_key(std::str::from_utf8(&plaintext).unwrap()).unwrap();
        assert_eq!(restored.public_key(), kp.public_key());
    }

    #[tokio::test]
    async fn ciphertexts_are_randomized() {
        let cipher = LocalEnvelopeCipher::generate();
        let a = cipher.encrypt(b"same", KEY_ID).await.unwrap();
        let b = cipher.encrypt(b"same", KEY_ID).await.unwrap();
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn wrong_key_id_fails() {
        let cipher = LocalEnvelopeCipher::generate();
        let blob = cipher.encrypt(b"secret", KEY_ID).await.unwrap();
        let err = cipher.decrypt(&blob, "alias/other").await.unwrap_err();
        assert!(matches!(err, EnvelopeError::Decrypt { .. }));
    }

    #[tokio::test]
    async fn wrong_master_key_fails() {
        let a = LocalEnvelopeCipher::generate();
        let b = LocalEnvelopeCipher::generate();
        let blob = a.encrypt(b"secret", KEY_ID).await.unwrap();
        assert!(b.decrypt(&blob, KEY_ID).await.is_err());
    }

    #[tokio::test]
    async fn invalid_base64_is_encoding_error() {
        let cipher = LocalEnvelopeCipher::generate();
        let err = decrypt_from_base64(&cipher, "not base64!!", KEY_ID)
            .await
            .unwrap_err();
        assert!(matches!(err, EnvelopeError::Encoding(_)));
    }

    #[test]
    fn from_base64_checks_length() {
        assert!(LocalEnvelopeCipher::from_base64(&STANDARD.encode([1u8; 32])).is_ok());
        assert!(matches!(
            LocalEnvelopeCipher::from_base64(&STANDARD.encode([1u8; 16])),
            Err(EnvelopeError::Config(_))
        ));
    }

    #[test]
    fn debug_redacts_key() {
        let cipher = LocalEnvelopeCipher::new([0x41; 32]);
        assert_eq!(format!("{cipher:?}"), "LocalEnvelopeCipher(<key>)");
    }
}
