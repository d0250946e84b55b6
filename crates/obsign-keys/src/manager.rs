//! # Signing Key Lifecycle
//!
//! [`SigningKeyManager::get_or_create_signing_key`] returns the issuer's
//! signer, creating the key on first use.
//!
//! ## Load path
//!
//! 1. Read the active record from the [`KeyStore`] and validate it.
//! 2. Base64-decode and decrypt `secretKeyMultibase` under the configured
//!    master key id.
//! 3. Rebuild the key pair and check it against the stored public key and
//!    `did:key` id.
//!
//! ## Create path
//!
//! Taken only when the store is empty, under an in-process async mutex:
//!
//! 1. Re-read (another task may have created the key while we waited).
//! 2. Generate a key pair, randomly or from an escrowable seed.
//! 3. Encrypt the secret key multibase (and the seed multibase, if any).
//! 4. `insert_if_absent`. If another process won the slot, discard the local
//!    key and load the stored record instead.
//!
//! A decrypt failure is terminal. The manager never replaces a record it
//! cannot read.

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use obsign_core::{DidKey, Timestamp};
use obsign_crypto::multikey::{decode_secret_key, encode_public_key};
use obsign_crypto::{
    decrypt_from_base64, encrypt_to_base64, Ed25519KeyPair, Ed25519Signature, EnvelopeCipher,
    EnvelopeError, ExportedKeyPair, HashData,
};
use obsign_schema::{SchemaName, SchemaValidationError, SchemaValidator};
use obsign_vc::{KeyPairSigner, Signer, SignerProvider, SigningError};
use thiserror::Error;
use tokio::sync::Mutex;

use crate::record::SigningKeyRecord;
use crate::store::{InsertOutcome, KeyStore, StoreError};

/// How a new issuer key is generated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeyGeneration {
    /// Library randomness; no seed is kept.
    Random,
    /// A CSPRNG 32-byte seed, stored encrypted alongside the key for escrow.
    #[default]
    Seeded,
}

impl KeyGeneration {
    pub fn as_str(&self) -> &'static str {
        match self {
            KeyGeneration::Random => "random",
            KeyGeneration::Seeded => "seeded",
        }
    }
}

impl FromStr for KeyGeneration {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "random" => Ok(KeyGeneration::Random),
            "seeded" => Ok(KeyGeneration::Seeded),
            other => Err(format!(
                "unknown key generation mode '{other}' (expected 'random' or 'seeded')"
            )),
        }
    }
}

#[derive(Error, Debug)]
pub enum KeyManagerError {
    #[error(transparent)]
    Envelope(#[from] EnvelopeError),

    #[error("{op} timed out after {after:?}")]
    Timeout { op: &'static str, after: Duration },

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Schema(#[from] SchemaValidationError),

    /// Decrypted material is not a usable secret key.
    #[error("invalid key material: {0}")]
    KeyMaterial(String),

    /// Decrypted key does not match the stored public half.
    #[error("stored key mismatch: {0}")]
    Mismatch(String),
}

impl From<KeyManagerError> for SigningError {
    fn from(err: KeyManagerError) -> Self {
        match err {
            KeyManagerError::Store(e) => SigningError::Persistence(e.to_string()),
            KeyManagerError::Schema(e) => SigningError::SchemaValidation(e),
            other => SigningError::KeyManagement(other.to_string()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct KeyManagerConfig {
    /// Master key id passed to every encrypt and decrypt.
    pub kms_key_id: String,
    pub generation: KeyGeneration,
    /// Bound on each envelope call.
    pub timeout: Duration,
}

impl KeyManagerConfig {
    pub fn new(kms_key_id: impl Into<String>) -> Self {
        Self {
            kms_key_id: kms_key_id.into(),
            generation: KeyGeneration::default(),
            timeout: Duration::from_secs(10),
        }
    }
}

/// The issuer key, decrypted and bound to its stored record.
pub struct IssuerSigner {
    inner: KeyPairSigner,
    created_at: Option<Timestamp>,
}

impl IssuerSigner {
    pub fn did(&self) -> &DidKey {
        self.inner.verification_method()
    }

    pub fn public_key_multibase(&self) -> &str {
        self.did().public_key_multibase()
    }

    pub fn created_at(&self) -> Option<Timestamp> {
        self.created_at
    }
}

impl Signer for IssuerSigner {
    fn verification_method(&self) -> &DidKey {
        self.inner.verification_method()
    }

    fn sign(&self, data: &HashData) -> Ed25519Signature {
        self.inner.sign(data)
    }
}

impl std::fmt::Debug for IssuerSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IssuerSigner")
            .field("did", self.did())
            .field("created_at", &self.created_at)
            .finish_non_exhaustive()
    }
}

pub struct SigningKeyManager {
    store: Arc<dyn KeyStore>,
    cipher: Arc<dyn EnvelopeCipher>,
    validator: Arc<SchemaValidator>,
    config: KeyManagerConfig,
    create_lock: Mutex<()>,
}

impl SigningKeyManager {
    pub fn new(
        store: Arc<dyn KeyStore>,
        cipher: Arc<dyn EnvelopeCipher>,
        validator: Arc<SchemaValidator>,
        config: KeyManagerConfig,
    ) -> Self {
        Self {
            store,
            cipher,
            validator,
            config,
            create_lock: Mutex::new(()),
        }
    }

    pub fn config(&self) -> &KeyManagerConfig {
        &self.config
    }

    /// The active record, if any, without decrypting it.
    pub async fn active_record(&self) -> Result<Option<SigningKeyRecord>, KeyManagerError> {
        Ok(self.store.fetch_active().await?)
    }

    /// Load the issuer key, creating and persisting it if none exists.
    pub async fn get_or_create_signing_key(&self) -> Result<IssuerSigner, KeyManagerError> {
        if let Some(record) = self.store.fetch_active().await? {
            return self.load(&record).await;
        }

        let _guard = self.create_lock.lock().await;
        if let Some(record) = self.store.fetch_active().await? {
            return self.load(&record).await;
        }

        let key = match self.config.generation {
            KeyGeneration::Random => Ed25519KeyPair::generate(),
            KeyGeneration::Seeded => Ed25519KeyPair::from_seed(&Ed25519KeyPair::generate_seed()),
        };
        let exported = ExportedKeyPair::export(
            &key,
            self.config.generation == KeyGeneration::Seeded,
        )
        .map_err(|e| KeyManagerError::KeyMaterial(e.to_string()))?;

        let secret_key_multibase = self
            .encrypt("encrypt secret key", exported.secret_key_multibase.as_bytes())
            .await?;
        let seed = match &exported.seed {
            Some(seed) => Some(self.encrypt("encrypt seed", seed.as_bytes()).await?),
            None => None,
        };

        let record = SigningKeyRecord {
            id: exported.id.clone(),
            public_key_multibase: exported.public_key_multibase.clone(),
            secret_key_multibase,
            seed,
            created_at: None,
        };
        self.validator
            .validate_typed(&record, SchemaName::SigningKeyRecord)?;

        match self.store.insert_if_absent(&record).await? {
            InsertOutcome::Inserted(stored) => {
                metrics::counter!(
                    "obsign_signing_keys_created_total",
                    "generation" => self.config.generation.as_str()
                )
                .increment(1);
                tracing::info!(
                    did = %stored.id,
                    generation = self.config.generation.as_str(),
                    store = self.store.backend_name(),
                    cipher = self.cipher.backend_name(),
                    "created issuer signing key"
                );
                let inner = KeyPairSigner::new(key)
                    .map_err(|e| KeyManagerError::KeyMaterial(e.to_string()))?;
                Ok(IssuerSigner {
                    inner,
                    created_at: stored.created_at,
                })
            }
            InsertOutcome::AlreadyExists => {
                tracing::info!(
                    discarded = %record.id,
                    "lost signing key creation race; loading stored key"
                );
                drop(key);
                let stored = self.store.fetch_active().await?.ok_or_else(|| {
                    KeyManagerError::Store(StoreError::Corrupt(
                        "insert reported an existing key but none was found".to_string(),
                    ))
                })?;
                self.load(&stored).await
            }
        }
    }

    async fn load(&self, record: &SigningKeyRecord) -> Result<IssuerSigner, KeyManagerError> {
        self.validator
            .validate_typed(record, SchemaName::SigningKeyRecord)?;

        let plaintext = tokio::time::timeout(
            self.config.timeout,
            decrypt_from_base64(
                self.cipher.as_ref(),
                &record.secret_key_multibase,
                &self.config.kms_key_id,
            ),
        )
        .await
        .map_err(|_| KeyManagerError::Timeout {
            op: "decrypt secret key",
            after: self.config.timeout,
        })??;

        let multibase = std::str::from_utf8(&plaintext).map_err(|_| {
            KeyManagerError::KeyMaterial("decrypted secret key is not UTF-8".to_string())
        })?;
        let key = decode_secret_key(multibase.trim())
            .map_err(|e| KeyManagerError::KeyMaterial(e.to_string()))?;

        let public_key_multibase = encode_public_key(&key.public_key());
        if public_key_multibase != record.public_key_multibase {
            return Err(KeyManagerError::Mismatch(format!(
                "decrypted key has public key {public_key_multibase}, record has {}",
                record.public_key_multibase
            )));
        }

        let inner =
            KeyPairSigner::new(key).map_err(|e| KeyManagerError::KeyMaterial(e.to_string()))?;
        if inner.verification_method() != &record.id {
            return Err(KeyManagerError::Mismatch(format!(
                "record id {} does not match its public key",
                record.id
            )));
        }

        tracing::debug!(did = %record.id, "loaded issuer signing key");
        Ok(IssuerSigner {
            inner,
            created_at: record.created_at,
        })
    }

    async fn encrypt(&self, op: &'static str, plaintext: &[u8]) -> Result<String, KeyManagerError> {
        tokio::time::timeout(
            self.config.timeout,
            encrypt_to_base64(self.cipher.as_ref(), plaintext, &self.config.kms_key_id),
        )
        .await
        .map_err(|_| KeyManagerError::Timeout {
            op,
            after: self.config.timeout,
        })?
        .map_err(KeyManagerError::from)
    }
}

#[async_trait]
impl SignerProvider for SigningKeyManager {
    async fn signer(&self) -> Result<Arc<dyn Signer>, SigningError> {
        let signer = self.get_or_create_signing_key().await?;
        Ok(Arc::new(signer))
    }
}

impl std::fmt::Debug for SigningKeyManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningKeyManager")
            .field("store", &self.store.backend_name())
            .field("cipher", &self.cipher.backend_name())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
