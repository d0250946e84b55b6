//! # eddsa-jcs-2022 Hash Data
//!
//! The signing input of the cryptosuite is not the document itself but
//! `SHA-256(JCS(proofConfig)) || SHA-256(JCS(document))`, 64 bytes in that
//! fixed order. [`HashData`] can only be built from two `CanonicalBytes`
//! values, so raw or non-canonical input cannot reach the signer.

use obsign_core::{sha256_digest, CanonicalBytes, Sha256Digest};

/// The 64-byte `eddsa-jcs-2022` signing input.
#[derive(Clone, PartialEq, Eq)]
pub struct HashData([u8; 64]);

impl HashData {
    /// Concatenate the proof-configuration digest and the document digest.
    pub fn from_digests(proof_config: &Sha256Digest, document: &Sha256Digest) -> Self {
        let mut bytes = [0u8; 64];
        bytes[..32].copy_from_slice(proof_config.as_bytes());
        bytes[32..].copy_from_slice(document.as_bytes());
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 64] {
        &self.0
    }
}

impl std::fmt::Debug for HashData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let hex: String = self.0[..4].iter().map(|b| format!("{b:02x}")).collect();
        write!(f, "HashData({hex}...)")
    }
}

/// Hash both canonical inputs and concatenate the digests.
pub fn eddsa_jcs_hash_data(proof_config: &CanonicalBytes, document: &CanonicalBytes) -> HashData {
    HashData::from_digests(&sha256_digest(proof_config), &sha256_digest(document))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_is_config_then_document() {
        let config = CanonicalBytes::from_value(&serde_json::json!({"type": "DataIntegrityProof"}))
            .unwrap();
        let doc = CanonicalBytes::from_value(&serde_json::json!({"id": "urn:uuid:abc"})).unwrap();

        let data = eddsa_jcs_hash_data(&config, &doc);
        assert_eq!(&data.as_bytes()[..32], sha256_digest(&config).as_bytes());
        assert_eq!(&data.as_bytes()[32..], sha256_digest(&doc).as_bytes());

        let swapped = eddsa_jcs_hash_data(&doc, &config);
        assert_ne!(data, swapped);
    }
}
