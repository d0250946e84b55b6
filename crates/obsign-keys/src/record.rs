//! The persisted signing key record.

use obsign_core::{DidKey, Timestamp};
use serde::{Deserialize, Serialize};

/// One issuer signing key, as stored.
///
/// `secret_key_multibase` and `seed` hold base64 envelope ciphertext, never
/// plaintext. The public half is stored in the clear.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SigningKeyRecord {
    /// `did:key:` + `public_key_multibase`.
    pub id: DidKey,
    pub public_key_multibase: String,
    pub secret_key_multibase: String,
    #[serde(default)]
    pub seed: Option<String>,
    /// Assigned by storage on insert.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<Timestamp>,
}

impl std::fmt::Debug for SigningKeyRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningKeyRecord")
            .field("id", &self.id)
            .field("secret_key_multibase", &"<ciphertext>")
            .field("seed", &self.seed.as_ref().map(|_| "<ciphertext>"))
            .field("created_at", &self.created_at)
            .finish()
    }
}
