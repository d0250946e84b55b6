//! # Canonical Serialization — RFC 8785 Byte Production
//!
//! `CanonicalBytes` is the only input accepted by the digest and signing
//! paths of the stack. Its inner buffer is private; the constructors run the
//! value through the JSON Canonicalization Scheme (RFC 8785) via `serde_jcs`:
//! object members sorted by UTF-16 code units, no insignificant whitespace,
//! ECMAScript number formatting.
//!
//! Both halves of an `eddsa-jcs-2022` hash input (the proof configuration
//! and the unsecured credential) are produced here, so a verifier that
//! canonicalizes the same JSON gets byte-identical input.
//!
//! Credentials carry fractional numbers (`creditsAvailable`,
//! `creditsEarned`), so floats are passed through and formatted by the JCS
//! number rules rather than rejected.

use serde::Serialize;
use serde_json::Value;

use crate::error::CanonicalizationError;

/// Bytes produced exclusively by JCS canonicalization.
///
/// # Invariants
///
/// - Object keys are sorted, separators are compact.
/// - The bytes are valid UTF-8 and valid JSON.
/// - Construction only through [`CanonicalBytes::new`] or
///   [`CanonicalBytes::from_value`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CanonicalBytes(Vec<u8>);

impl CanonicalBytes {
    /// Canonicalize any serializable value.
    ///
    /// # Errors
    ///
    /// Returns `CanonicalizationError::SerializationFailed` if the value
    /// cannot be represented as JSON (e.g. a map with non-string keys).
    pub fn new(obj: &impl Serialize) -> Result<Self, CanonicalizationError> {
        let value = serde_json::to_value(obj)?;
        Self::from_value(&value)
    }

    /// Canonicalize an already-parsed JSON value.
    pub fn from_value(value: &Value) -> Result<Self, CanonicalizationError> {
        let s = serde_jcs::to_string(value)?;
        Ok(Self(s.into_bytes()))
    }

    /// Access the canonical bytes for digest computation.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Returns the length of the canonical byte sequence.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the canonical byte sequence is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl AsRef<[u8]> for CanonicalBytes {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn canon(v: &Value) -> String {
        let cb = CanonicalBytes::from_value(v).expect("should canonicalize");
        String::from_utf8(cb.as_bytes().to_vec()).unwrap()
    }

    #[test]
    fn test_sorted_keys() {
        let data = serde_json::json!({"z": 1, "m": 2, "a": 3});
        assert_eq!(canon(&data), r#"{"a":3,"m":2,"z":1}"#);
    }

    #[test]
    fn test_nested_objects_sorted() {
        let data = serde_json::json!({
            "outer": {"b": 2, "a": 1},
            "list": [3, 2, 1]
        });
        // Array order is preserved; only object members are sorted.
        assert_eq!(canon(&data), r#"{"list":[3,2,1],"outer":{"a":1,"b":2}}"#);
    }

    #[test]
    fn test_proof_config_shape() {
        let config = serde_json::json!({
            "type": "DataIntegrityProof",
            "cryptosuite": "eddsa-jcs-2022",
            "created": "2024-01-01T00:00:00Z"
        });
        assert_eq!(
            canon(&config),
            r#"{"created":"2024-01-01T00:00:00Z","cryptosuite":"eddsa-jcs-2022","type":"DataIntegrityProof"}"#
        );
    }

    #[test]
    fn test_fractional_number_accepted() {
        let data = serde_json::json!({"creditsAvailable": 1.5});
        assert_eq!(canon(&data), r#"{"creditsAvailable":1.5}"#);
    }

    #[test]
    fn test_whitespace_is_insignificant() {
        let a: Value = serde_json::from_str(r#"{ "b" : [1, 2], "a" : "x" }"#).unwrap();
        let b: Value = serde_json::from_str(r#"{"a":"x","b":[1,2]}"#).unwrap();
        assert_eq!(
            CanonicalBytes::from_value(&a).unwrap(),
            CanonicalBytes::from_value(&b).unwrap()
        );
    }

    #[test]
    fn test_new_matches_from_value() {
        #[derive(Serialize)]
        struct Config {
            r#type: &'static str,
            created: &'static str,
        }
        let typed = CanonicalBytes::new(&Config {
            r#type: "DataIntegrityProof",
            created: "2024-01-01T00:00:00Z",
        })
        .unwrap();
        let untyped = CanonicalBytes::from_value(&serde_json::json!({
            "created": "2024-01-01T00:00:00Z",
            "type": "DataIntegrityProof",
        }))
        .unwrap();
        assert_eq!(typed, untyped);
    }

    #[test]
    fn test_unicode_passthrough() {
        let data = serde_json::json!({"name": "\u{00e9}cole"});
        assert!(canon(&data).contains('\u{00e9}'));
    }

    #[test]
    fn test_empty_object() {
        let cb = CanonicalBytes::from_value(&serde_json::json!({})).unwrap();
        assert_eq!(cb.as_bytes(), b"{}");
        assert_eq!(cb.len(), 2);
        assert!(!cb.is_empty());
    }
}
