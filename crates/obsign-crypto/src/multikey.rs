//! # Multikey / Multibase Codecs
//!
//! Every textual key form in the stack is multibase base58btc: a `z`
//! followed by the base58 (bitcoin alphabet) encoding of a two-byte
//! multicodec header and the raw bytes.
//!
//! | Value                | Header        | Payload               | Prefix  |
//! |----------------------|---------------|-----------------------|---------|
//! | public key           | `0xed 0x01`   | 32-byte public key    | `z6Mk`  |
//! | secret key           | `0x80 0x26`   | seed ‖ public key (64)| `zrv`   |
//! | escrow seed          | `0x00 0x20`   | 32-byte seed          | `z1`    |
//! | signature            | none          | 64-byte signature     | `z`     |
//!
//! The secret key form matches what common Ed25519 Multikey libraries
//! export; decoding also accepts the 32-byte (seed only) variant.

use obsign_core::{CryptoError, DidKey};
use zeroize::Zeroizing;

use crate::ed25519::{Ed25519KeyPair, Ed25519PublicKey, Ed25519Signature};

const MULTIBASE_BASE58BTC: char = 'z';
const ED25519_PUB_HEADER: [u8; 2] = [0xed, 0x01];
const ED25519_PRIV_HEADER: [u8; 2] = [0x80, 0x26];
const SEED_HEADER: [u8; 2] = [0x00, 0x20];

/// Encode a public key as `z6Mk...`.
pub fn encode_public_key(key: &Ed25519PublicKey) -> String {
    encode_with_header(&ED25519_PUB_HEADER, key.as_bytes())
}

/// Decode a `z6Mk...` public key multibase.
pub fn decode_public_key(multibase: &str) -> Result<Ed25519PublicKey, CryptoError> {
    let bytes = decode_base58btc(multibase)?;
    let payload = strip_header(&bytes, &ED25519_PUB_HEADER, "Ed25519 public key")?;
    Ed25519PublicKey::from_slice(payload)
}

/// Encode the secret half of a key pair (seed ‖ public key).
pub fn encode_secret_key(key: &Ed25519KeyPair) -> Zeroizing<String> {
    let mut payload = Zeroizing::new(Vec::with_capacity(64));
    payload.extend_from_slice(&key.seed()[..]);
    payload.extend_from_slice(key.public_key().as_bytes());
    Zeroizing::new(encode_with_header(&ED25519_PRIV_HEADER, &payload))
}

/// Decode a secret key multibase into a key pair.
///
/// When the 64-byte form carries a public half, it must match the key
/// derived from the seed.
pub fn decode_secret_key(multibase: &str) -> Result<Ed25519KeyPair, CryptoError> {
    let bytes = Zeroizing::new(decode_base58btc(multibase)?);
    let payload = strip_header(&bytes, &ED25519_PRIV_HEADER, "Ed25519 secret key")?;
    if payload.len() != 32 && payload.len() != 64 {
        return Err(CryptoError::KeyError(format!(
            "secret key payload must be 32 or 64 bytes, got {}",
            payload.len()
        )));
    }
    let mut seed = Zeroizing::new([0u8; 32]);
    seed.copy_from_slice(&payload[..32]);
    let key = Ed25519KeyPair::from_seed(&seed);
    if payload.len() == 64 && key.public_key().as_bytes()[..] != payload[32..] {
        return Err(CryptoError::KeyError(
            "secret key public half does not match derived public key".into(),
        ));
    }
    Ok(key)
}

/// Encode an escrow seed.
pub fn encode_seed(seed: &[u8; 32]) -> Zeroizing<String> {
    Zeroizing::new(encode_with_header(&SEED_HEADER, seed))
}

/// Decode an escrow seed.
pub fn decode_seed(multibase: &str) -> Result<Zeroizing<[u8; 32]>, CryptoError> {
    let bytes = Zeroizing::new(decode_base58btc(multibase)?);
    let payload = strip_header(&bytes, &SEED_HEADER, "seed")?;
    if payload.len() != 32 {
        return Err(CryptoError::KeyError(format!(
            "seed must be 32 bytes, got {}",
            payload.len()
        )));
    }
    let mut seed = Zeroizing::new([0u8; 32]);
    seed.copy_from_slice(payload);
    Ok(seed)
}

/// Encode a signature as a `proofValue`.
pub fn encode_signature(signature: &Ed25519Signature) -> String {
    format!(
        "{MULTIBASE_BASE58BTC}{}",
        bs58::encode(signature.as_bytes()).into_string()
    )
}

/// Decode a `proofValue` into a signature.
pub fn decode_signature(proof_value: &str) -> Result<Ed25519Signature, CryptoError> {
    let bytes = decode_base58btc(proof_value)?;
    Ed25519Signature::from_slice(&bytes)
}

/// The `did:key` identifier of a public key.
pub fn did_key_for(key: &Ed25519PublicKey) -> Result<DidKey, CryptoError> {
    DidKey::from_public_key_multibase(&encode_public_key(key))
        .map_err(|e| CryptoError::Encoding(e.to_string()))
}

/// Resolve a `did:key` to its Ed25519 public key.
pub fn public_key_from_did(did: &DidKey) -> Result<Ed25519PublicKey, CryptoError> {
    decode_public_key(did.public_key_multibase())
}

fn encode_with_header(header: &[u8; 2], payload: &[u8]) -> String {
    let mut buf = Zeroizing::new(Vec::with_capacity(2 + payload.len()));
    buf.extend_from_slice(header);
    buf.extend_from_slice(payload);
    format!("{MULTIBASE_BASE58BTC}{}", bs58::encode(buf.as_slice()).into_string())
}

fn decode_base58btc(multibase: &str) -> Result<Vec<u8>, CryptoError> {
    let body = multibase.strip_prefix(MULTIBASE_BASE58BTC).ok_or_else(|| {
        CryptoError::Encoding("multibase value must use base58btc ('z' prefix)".into())
    })?;
    bs58::decode(body)
        .into_vec()
        .map_err(|e| CryptoError::Encoding(format!("invalid base58btc: {e}")))
}

fn strip_header<'a>(
    bytes: &'a [u8],
    header: &[u8; 2],
    what: &str,
) -> Result<&'a [u8], CryptoError> {
    bytes.strip_prefix(&header[..]).ok_or_else(|| {
        CryptoError::Encoding(format!(
            "multicodec header mismatch for {what}: expected 0x{:02x}{:02x}",
            header[0], header[1]
        ))
    })
}

/// A key pair exported in multibase form.
///
/// This is the shape a freshly generated key takes before its secret half
/// is wrapped by the envelope cipher. `Debug` redacts the secret fields.
pub struct ExportedKeyPair {
    pub id: DidKey,
    pub public_key_multibase: String,
    pub secret_key_multibase: Zeroizing<String>,
    pub seed: Option<Zeroizing<String>>,
}

impl ExportedKeyPair {
    /// Export a key pair. `seed` is included only for keys generated on the
    /// seeded path.
    pub fn export(key: &Ed25519KeyPair, include_seed: bool) -> Result<Self, CryptoError> {
        let public_key_multibase = encode_public_key(&key.public_key());
        let id = DidKey::from_public_key_multibase(&public_key_multibase)
            .map_err(|e| CryptoError::Encoding(e.to_string()))?;
        Ok(Self {
            id,
            public_key_multibase,
            secret_key_multibase: encode_secret_key(key),
            seed: include_seed.then(|| encode_seed(&key.seed())),
        })
    }
}

impl std::fmt::Debug for ExportedKeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExportedKeyPair")
            .field("id", &self.id)
            .field("public_key_multibase", &self.public_key_multibase)
            .field("secret_key_multibase", &"[REDACTED]")
            .field("seed", &self.seed.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RFC8032_SEED: [u8; 32] = [
        0x9d, 0x61, 0xb1, 0x9d, 0xef, 0xfd, 0x5a, 0x60, 0xba, 0x84, 0x4a, 0xf4, 0x92, 0xec, 0x2c,
        0xc4, 0x44, 0x49, 0xc5, 0x69, 0x7b, 0x32, 0x69, 0x19, 0x70, 0x3b, 0xac, 0x03, 0x1c, 0xae,
        0x7f, 0x60,
    ];

    #[test]
    fn test_known_public_key_multibase() {
        let kp = Ed25519KeyPair::from_seed(&RFC8032_SEED);
        assert_eq!(
            encode_public_key(&kp.public_key()),
            "z6MktwupdmLXVVqTzCw4i46r4uGyosGXRnR3XjN4Zq7oMMsw"
        );
        assert_eq!(
            did_key_for(&kp.public_key()).unwrap().as_str(),
            "did:key:z6MktwupdmLXVVqTzCw4i46r4uGyosGXRnR3XjN4Zq7oMMsw"
        );
    }

    #[test]
    fn test_known_secret_key_multibase() {
        let kp = Ed25519KeyPair::from_seed(&RFC8032_SEED);
        let encoded = encode_secret_key(&kp);
        assert_eq!(
            encoded.as_str(),
            "zrv3nQ3vxUrShebtbJeB42niZe1oGRnFzGPusycqLLtiJEeSFbDjwS6rvt6uMYYkjGuZMTsqb6mzCgG19WbjcNNsvxq"
        );
        let decoded = decode_secret_key(&encoded).unwrap();
        assert_eq!(decoded.public_key(), kp.public_key());
    }

    #[test]
    fn test_known_seed_multibase() {
        let encoded = encode_seed(&RFC8032_SEED);
        assert_eq!(encoded.as_str(), "z1AgwVGdebmHLNMEXhGj8c1RxGkmA4maXummrTJWWBSr8KR");
        assert_eq!(*decode_seed(&encoded).unwrap(), RFC8032_SEED);
    }

    #[test]
    fn test_secret_key_with_mismatched_public_half_rejected() {
        let a = Ed25519KeyPair::from_seed(&[1u8; 32]);
        let b = Ed25519KeyPair::from_seed(&[2u8; 32]);
        let mut payload = ED25519_PRIV_HEADER.to_vec();
        payload.extend_from_slice(&a.seed()[..]);
        payload.extend_from_slice(b.public_key().as_bytes());
        let forged = format!("z{}", bs58::encode(payload).into_string());
        assert!(decode_secret_key(&forged).is_err());
    }

    #[test]
    fn test_seed_only_secret_key_accepted() {
        let mut payload = ED25519_PRIV_HEADER.to_vec();
        payload.extend_from_slice(&RFC8032_SEED);
        let encoded = format!("z{}", bs58::encode(payload).into_string());
        let kp = decode_secret_key(&encoded).unwrap();
        assert_eq!(*kp.seed(), RFC8032_SEED);
    }

    #[test]
    fn test_public_key_rejects_wrong_header() {
        let kp = Ed25519KeyPair::from_seed(&RFC8032_SEED);
        let secret = encode_secret_key(&kp);
        assert!(decode_public_key(&secret).is_err());
        assert!(decode_public_key("6MktwupdmLXVVqTzCw4i46r4uGyosGXRnR3XjN4Zq7oMMsw").is_err());
    }

    #[test]
    fn test_did_with_non_ed25519_key_rejected() {
        let did =
            DidKey::parse("did:key:z6LSbysY2xFMRpGMhb7tFTLMpeuPRaqaWM1yECx2AtzE3KCc").unwrap();
        assert!(public_key_from_did(&did).is_err());
    }

    #[test]
    fn test_export_includes_seed_only_when_asked() {
        let kp = Ed25519KeyPair::generate();
        let random = ExportedKeyPair::export(&kp, false).unwrap();
        assert!(random.seed.is_none());
        assert!(random.public_key_multibase.starts_with("z6Mk"));
        assert_eq!(
            random.id.as_str(),
            format!("did:key:{}", random.public_key_multibase)
        );

        let seeded = ExportedKeyPair::export(&kp, true).unwrap();
        assert!(seeded.seed.is_some());
    }

    #[test]
    fn test_export_debug_redacts_secrets() {
        let kp = Ed25519KeyPair::generate();
        let exported = ExportedKeyPair::export(&kp, true).unwrap();
        let debug = format!("{exported:?}");
        assert!(!debug.contains(exported.secret_key_multibase.as_str()));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn test_signature_multibase() {
        let sig = Ed25519Signature::from_bytes([0xab; 64]);
        let encoded = encode_signature(&sig);
        assert!(encoded.starts_with('z'));
        assert_eq!(decode_signature(&encoded).unwrap(), sig);
        assert!(decode_signature("zabc").is_err());
    }
}
