//! # AWS KMS Envelope Cipher
//!
//! Wraps issuer secret key material under an AWS KMS customer master key.
//!
//! ## How It Works
//!
//! 1. On key creation the secret key multibase string is sent to KMS
//!    `Encrypt` under the configured key id; the returned ciphertext blob is
//!    base64-encoded and persisted.
//! 2. On every load the blob is sent to KMS `Decrypt` with the same key id;
//!    the plaintext is reparsed into a key pair in memory.
//!
//! The CMK never leaves KMS. Decrypt requires `kms:Decrypt` on the CMK,
//! which is auditable via CloudTrail.
//!
//! ## Prerequisites
//!
//! - A symmetric KMS key (`SYMMETRIC_DEFAULT`).
//! - Ambient AWS credentials with `kms:Encrypt` and `kms:Decrypt` on it.

use async_trait::async_trait;
use aws_sdk_kms::error::DisplayErrorContext;
use aws_sdk_kms::primitives::Blob;
use zeroize::Zeroizing;

use super::{EnvelopeCipher, EnvelopeError};

const BACKEND: &str = "aws-kms";

/// KMS-backed [`EnvelopeCipher`].
pub struct AwsKmsEnvelopeCipher {
    client: aws_sdk_kms::Client,
}

impl AwsKmsEnvelopeCipher {
    /// Build a client from the ambient AWS configuration.
    ///
    /// `region` overrides the region resolved from the environment.
    pub async fn new(region: Option<&str>) -> Self {
        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest());
        if let Some(r) = region {
            loader = loader.region(aws_config::Region::new(r.to_string()));
        }
        let sdk_config = loader.load().await;
        Self::from_client(aws_sdk_kms::Client::new(&sdk_config))
    }

    /// Wrap an already configured KMS client.
    pub fn from_client(client: aws_sdk_kms::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl EnvelopeCipher for AwsKmsEnvelopeCipher {
    async fn encrypt(&self, plaintext: &[u8], key_id: &str) -> Result<Vec<u8>, EnvelopeError> {
        let resp = self
            .client
            .encrypt()
            .key_id(key_id)
            .plaintext(Blob::new(plaintext.to_vec()))
            .send()
            .await
            .map_err(|e| EnvelopeError::Encrypt {
                backend: BACKEND.to_string(),
                reason: DisplayErrorContext(&e).to_string(),
            })?;

        let blob = resp.ciphertext_blob().ok_or_else(|| EnvelopeError::Encrypt {
            backend: BACKEND.to_string(),
            reason: "response missing CiphertextBlob".to_string(),
        })?;

        tracing::debug!(key_id, bytes = blob.as_ref().len(), "KMS encrypt succeeded");
        Ok(blob.as_ref().to_vec())
    }

    async fn decrypt(
        &self,
        ciphertext: &[u8],
        key_id: &str,
    ) -> Result<Zeroizing<Vec<u8>>, EnvelopeError> {
        let resp = self
            .client
            .decrypt()
            .ciphertext_blob(Blob::new(ciphertext.to_vec()))
            .key_id(key_id)
            .send()
            .await
            .map_err(|e| EnvelopeError::Decrypt {
                backend: BACKEND.to_string(),
                reason: DisplayErrorContext(&e).to_string(),
            })?;

        let plaintext = resp.plaintext().ok_or_else(|| EnvelopeError::Decrypt {
            backend: BACKEND.to_string(),
            reason: "response missing Plaintext".to_string(),
        })?;

        Ok(Zeroizing::new(plaintext.as_ref().to_vec()))
    }

    fn backend_name(&self) -> &str {
        BACKEND
    }
}

impl std::fmt::Debug for AwsKmsEnvelopeCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AwsKmsEnvelopeCipher").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn offline_client() -> aws_sdk_kms::Client {
        let config = aws_sdk_kms::Config::builder()
            .behavior_version(aws_sdk_kms::config::BehaviorVersion::latest())
            .region(aws_sdk_kms::config::Region::new("us-east-1"))
            .build();
        aws_sdk_kms::Client::from_conf(config)
    }

    #[test]
    fn backend_name_is_stable() {
        let cipher = AwsKmsEnvelopeCipher::from_client(offline_client());
        assert_eq!(cipher.backend_name(), "aws-kms");
    }

    #[tokio::test]
    async fn missing_credentials_surface_as_encrypt_error() {
        let cipher = AwsKmsEnvelopeCipher::from_client(offline_client());
        let err = cipher
            .encrypt(b"zsecret", "alias/obsign-issuer")
            .await
            .unwrap_err();
        match err {
            EnvelopeError::Encrypt { backend, reason } => {
                assert_eq!(backend, "aws-kms");
                assert!(!reason.contains("zsecret"));
            }
            other => panic!("expected Encrypt error, got {other:?}"),
        }
    }
}
