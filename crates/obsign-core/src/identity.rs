//! # did:key Identifiers
//!
//! `DidKey` is the identifier of the issuer's signing key and the value of
//! every proof's `verificationMethod`. It is `did:key:` followed by the
//! public key's multibase string, so it is derived deterministically from
//! the key and resolves without any registry.
//!
//! Decoding the public key bytes out of the multibase lives in
//! `obsign-crypto::multikey`; this type only guarantees the textual shape.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::CoreError;

const DID_KEY_PREFIX: &str = "did:key:";
const BASE58BTC_ALPHABET: &str = "123456789ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnopqrstuvwxyz";

/// A `did:key:z...` identifier without fragment.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DidKey(String);

impl DidKey {
    /// Build the identifier for a public key multibase string.
    pub fn from_public_key_multibase(multibase: &str) -> Result<Self, CoreError> {
        validate_multibase(multibase)?;
        Ok(Self(format!("{DID_KEY_PREFIX}{multibase}")))
    }

    /// Parse a `did:key` URI. A `#fragment` (as in a verification method
    /// URL `did:key:z6Mk...#z6Mk...`) is accepted and dropped.
    pub fn parse(s: &str) -> Result<Self, CoreError> {
        let without_fragment = s.split('#').next().unwrap_or(s);
        let multibase = without_fragment.strip_prefix(DID_KEY_PREFIX).ok_or_else(|| {
            CoreError::InvalidIdentifier(format!("expected did:key URI, got {s:?}"))
        })?;
        Self::from_public_key_multibase(multibase)
    }

    /// The full `did:key:...` string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The multibase portion (starts with `z`).
    pub fn public_key_multibase(&self) -> &str {
        &self.0[DID_KEY_PREFIX.len()..]
    }
}

fn validate_multibase(multibase: &str) -> Result<(), CoreError> {
    let body = multibase.strip_prefix('z').ok_or_else(|| {
        CoreError::InvalidIdentifier(format!(
            "public key multibase must use base58btc ('z' prefix), got {multibase:?}"
        ))
    })?;
    if body.is_empty() || !body.chars().all(|c| BASE58BTC_ALPHABET.contains(c)) {
        return Err(CoreError::InvalidIdentifier(format!(
            "public key multibase is not base58btc: {multibase:?}"
        )));
    }
    Ok(())
}

impl std::fmt::Display for DidKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for DidKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for DidKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MB: &str = "z6MkhaXgBZDvotDkL5257faiztiGiC2QtKLGpbnnEGta2doK";

    #[test]
    fn test_from_multibase() {
        let did = DidKey::from_public_key_multibase(MB).unwrap();
        assert_eq!(did.as_str(), format!("did:key:{MB}"));
        assert_eq!(did.public_key_multibase(), MB);
    }

    #[test]
    fn test_parse_drops_fragment() {
        let did = DidKey::parse(&format!("did:key:{MB}#{MB}")).unwrap();
        assert_eq!(did.to_string(), format!("did:key:{MB}"));
    }

    #[test]
    fn test_rejects_other_methods_and_bases() {
        assert!(DidKey::parse("did:web:issuer.example").is_err());
        assert!(DidKey::parse("did:key:uAAAA").is_err());
        assert!(DidKey::parse("did:key:z").is_err());
        // '0' and 'l' are outside the base58btc alphabet
        assert!(DidKey::parse("did:key:z6Mk0l").is_err());
    }

    #[test]
    fn test_key_type_is_not_checked_here() {
        // An X25519 did:key has the right shape; Ed25519 decoding rejects it.
        let x25519 = "did:key:z6LSbysY2xFMRpGMhb7tFTLMpeuPRaqaWM1yECx2AtzE3KCc";
        assert_eq!(DidKey::parse(x25519).unwrap().as_str(), x25519);
    }

    #[test]
    fn test_serde_as_string() {
        let did = DidKey::from_public_key_multibase(MB).unwrap();
        let json = serde_json::to_string(&did).unwrap();
        assert_eq!(json, format!("\"did:key:{MB}\""));
        let back: DidKey = serde_json::from_str(&json).unwrap();
        assert_eq!(back, did);
    }
}
