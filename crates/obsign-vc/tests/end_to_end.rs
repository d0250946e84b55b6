//! End-to-end: sign the reference AchievementCredential with a pinned key
//! and `created`, then verify the proof with an independent reconstruction of the
//! `eddsa-jcs-2022` hash data built directly on sha2, serde_jcs, bs58 and
//! ed25519-dalek.

use std::sync::Arc;

use ed25519_dalek::{Signature, Verifier, VerifyingKey};
use obsign_core::Timestamp;
use obsign_crypto::Ed25519KeyPair;
use obsign_schema::SchemaValidator;
use obsign_vc::{KeyPairSigner, ProofEngine, Signer, SigningError};
use serde_json::{json, Value};
use sha2::{Digest, Sha256};

const REFERENCE_CREDENTIAL: &str = r#"{"id":"urn:uuid:abc","type":["VerifiableCredential","AchievementCredential"],"credentialSubject":{"id":"did:example:1"},"issuer":"https://issuer.example/org","validFrom":"2024-01-01T00:00:00Z"}"#;

/// Seed 11 at this instant gives an 88-character proofValue.
const PINNED_CREATED: &str = "2024-06-01T12:00:00Z";

fn engine() -> ProofEngine {
    ProofEngine::new(Arc::new(SchemaValidator::builtin().unwrap()))
}

fn seeded_signer(seed: u8) -> Arc<dyn Signer> {
    Arc::new(KeyPairSigner::new(Ed25519KeyPair::from_seed(&[seed; 32])).unwrap())
}

fn at(created: &str) -> Timestamp {
    Timestamp::parse(created).unwrap()
}

fn jcs_sha256(value: &Value) -> [u8; 32] {
    let canonical = serde_jcs::to_string(value).unwrap();
    Sha256::digest(canonical.as_bytes()).into()
}

/// Resolve `did:key:z6Mk...` to the raw Ed25519 key without the crate's helpers.
fn resolve_did_key(did: &str) -> VerifyingKey {
    let multibase = did.strip_prefix("did:key:").unwrap().split('#').next().unwrap();
    let bytes = bs58::decode(multibase.strip_prefix('z').unwrap())
        .into_vec()
        .unwrap();
    assert_eq!(&bytes[..2], &[0xed, 0x01], "ed25519-pub multicodec header");
    let key: [u8; 32] = bytes[2..].try_into().unwrap();
    VerifyingKey::from_bytes(&key).unwrap()
}

#[tokio::test]
async fn reference_credential_signs_and_independently_verifies() {
    let input: Value = serde_json::from_str(REFERENCE_CREDENTIAL).unwrap();
    let engine = engine();
    let signer = seeded_signer(11);

    let signed = engine
        .create_proof_at(input.clone(), &signer, at(PINNED_CREATED))
        .await
        .unwrap();

    // Same object plus a single proof.
    let mut body = signed.as_object().unwrap().clone();
    let proofs = body.remove("proof").unwrap();
    assert_eq!(Value::Object(body.clone()), input);
    let proofs = proofs.as_array().unwrap();
    assert_eq!(proofs.len(), 1);
    let proof = &proofs[0];

    // Proof shape.
    let proof_value = proof["proofValue"].as_str().unwrap();
    assert!(proof_value.starts_with('z'));
    assert!(
        (88..=89).contains(&proof_value.len()),
        "proofValue length {}",
        proof_value.len()
    );
    assert!(proof_value[1..]
        .chars()
        .all(|c| c.is_ascii_alphanumeric() && !"0OIl".contains(c)));

    // Independent verifier: rebuild the config, hash, concatenate, verify.
    let config = json!({
        "type": proof["type"],
        "cryptosuite": proof["cryptosuite"],
        "created": proof["created"],
    });
    let mut hash_data = Vec::with_capacity(64);
    hash_data.extend_from_slice(&jcs_sha256(&config));
    hash_data.extend_from_slice(&jcs_sha256(&Value::Object(body)));

    let signature_bytes = bs58::decode(&proof_value[1..]).into_vec().unwrap();
    let signature = Signature::from_slice(&signature_bytes).unwrap();
    let verifying_key = resolve_did_key(proof["verificationMethod"].as_str().unwrap());
    verifying_key.verify(&hash_data, &signature).unwrap();

    // And the engine's own verifier agrees.
    let report = engine.verify_proof(&signed).unwrap();
    assert!(report.verified);
    assert_eq!(report.results.len(), 1);
}

#[tokio::test]
async fn digest_order_matters() {
    let input: Value = serde_json::from_str(REFERENCE_CREDENTIAL).unwrap();
    let signed = engine()
        .create_proof_at(input.clone(), &seeded_signer(11), at(PINNED_CREATED))
        .await
        .unwrap();
    let proof = &signed["proof"][0];

    let config = json!({
        "type": proof["type"],
        "cryptosuite": proof["cryptosuite"],
        "created": proof["created"],
    });
    // Document digest first: must not verify.
    let mut swapped = Vec::with_capacity(64);
    swapped.extend_from_slice(&jcs_sha256(&input));
    swapped.extend_from_slice(&jcs_sha256(&config));

    let proof_value = proof["proofValue"].as_str().unwrap();
    let signature =
        Signature::from_slice(&bs58::decode(&proof_value[1..]).into_vec().unwrap()).unwrap();
    let verifying_key = resolve_did_key(proof["verificationMethod"].as_str().unwrap());
    assert!(verifying_key.verify(&swapped, &signature).is_err());
}

/// Seed 7 signing the reference credential at 01:16:43 produces a signature
/// whose base58btc form is one digit short. That is the engine's failure,
/// not a schema violation in the caller's document.
#[tokio::test]
async fn short_signature_encoding_is_an_internal_proof_failure() {
    let input: Value = serde_json::from_str(REFERENCE_CREDENTIAL).unwrap();
    let engine = engine();
    let signer = seeded_signer(7);

    let err = engine
        .create_proof_at(input.clone(), &signer, at("2024-01-01T01:16:43Z"))
        .await
        .unwrap_err();
    match &err {
        SigningError::InvalidProof(e) => {
            let violations = e.violations().unwrap();
            assert!(violations
                .violations()
                .iter()
                .any(|v| v.instance_path == "/proofValue"));
        }
        other => panic!("expected InvalidProof, got {other:?}"),
    }

    // One second later the same key and document sign normally.
    let signed = engine
        .create_proof_at(input, &signer, at("2024-01-01T01:16:44Z"))
        .await
        .unwrap();
    assert_eq!(signed["proof"][0]["proofValue"].as_str().unwrap().len(), 89);
    assert!(engine.verify_proof(&signed).unwrap().verified);
}
