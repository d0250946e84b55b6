//! # Signer Seam
//!
//! The proof engine never sees secret key material. It asks a
//! [`SignerProvider`] for a [`Signer`] only after the inbound document has
//! passed its contract and schema checks, so a rejected document never
//! causes a key load, a KMS call or a storage read.

use std::sync::Arc;

use async_trait::async_trait;
use obsign_core::{CryptoError, DidKey};
use obsign_crypto::multikey::did_key_for;
use obsign_crypto::{Ed25519KeyPair, Ed25519PublicKey, Ed25519Signature, HashData};

use crate::error::SigningError;

/// Signs `eddsa-jcs-2022` hash data with the issuer key.
pub trait Signer: Send + Sync {
    /// The `did:key` placed into `verificationMethod`.
    fn verification_method(&self) -> &DidKey;

    fn sign(&self, data: &HashData) -> Ed25519Signature;
}

/// Resolves the signer for one signing request.
#[async_trait]
pub trait SignerProvider: Send + Sync {
    async fn signer(&self) -> Result<Arc<dyn Signer>, SigningError>;
}

#[async_trait]
impl SignerProvider for Arc<dyn Signer> {
    async fn signer(&self) -> Result<Arc<dyn Signer>, SigningError> {
        Ok(Arc::clone(self))
    }
}

/// A [`Signer`] over an in-memory key pair.
pub struct KeyPairSigner {
    key: Ed25519KeyPair,
    did: DidKey,
}

impl KeyPairSigner {
    pub fn new(key: Ed25519KeyPair) -> Result<Self, CryptoError> {
        let did = did_key_for(&key.public_key())?;
        Ok(Self { key, did })
    }

    pub fn public_key(&self) -> Ed25519PublicKey {
        self.key.public_key()
    }
}

impl Signer for KeyPairSigner {
    fn verification_method(&self) -> &DidKey {
        &self.did
    }

    fn sign(&self, data: &HashData) -> Ed25519Signature {
        self.key.sign(data)
    }
}

impl std::fmt::Debug for KeyPairSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyPairSigner")
            .field("did", &self.did)
            .finish_non_exhaustive()
    }
}
