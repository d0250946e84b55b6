//! Integration test: validate documents loaded from disk, in JSON and YAML,
//! and confirm that a schema directory can override an embedded schema.

use std::fs;

use obsign_schema::{SchemaName, SchemaValidationError, SchemaValidator};

const CREDENTIAL_JSON: &str = r#"{
  "id": "urn:uuid:abc",
  "type": ["VerifiableCredential", "AchievementCredential"],
  "credentialSubject": {"id": "did:example:1"},
  "issuer": "https://issuer.example/org",
  "validFrom": "2024-01-01T00:00:00Z"
}"#;

const CREDENTIAL_YAML: &str = r#"
id: urn:uuid:abc
type:
  - VerifiableCredential
  - AchievementCredential
credentialSubject:
  id: did:example:1
issuer: https://issuer.example/org
validFrom: "2024-01-01T00:00:00Z"
"#;

#[test]
fn test_validate_json_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("credential.json");
    fs::write(&path, CREDENTIAL_JSON).unwrap();

    let validator = SchemaValidator::builtin().unwrap();
    validator
        .validate_file(&path, SchemaName::CreateCredential)
        .unwrap();
}

#[test]
fn test_validate_yaml_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("credential.yaml");
    fs::write(&path, CREDENTIAL_YAML).unwrap();

    let validator = SchemaValidator::builtin().unwrap();
    validator
        .validate_file(&path, SchemaName::CreateCredential)
        .unwrap();
}

#[test]
fn test_missing_file_is_document_load_error() {
    let dir = tempfile::tempdir().unwrap();
    let validator = SchemaValidator::builtin().unwrap();
    let err = validator
        .validate_file(&dir.path().join("absent.json"), SchemaName::CreateCredential)
        .unwrap_err();
    assert!(matches!(err, SchemaValidationError::DocumentLoadError { .. }));
}

#[test]
fn test_malformed_json_is_document_load_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.json");
    fs::write(&path, "{\"id\": ").unwrap();

    let validator = SchemaValidator::builtin().unwrap();
    let err = validator
        .validate_file(&path, SchemaName::CreateCredential)
        .unwrap_err();
    assert!(matches!(err, SchemaValidationError::DocumentLoadError { .. }));
}

#[test]
fn test_override_directory_replaces_embedded_schema() {
    let dir = tempfile::tempdir().unwrap();
    // A stricter proof config that also demands a nonce.
    fs::write(
        dir.path().join("proof-config.schema.json"),
        r#"{
          "$schema": "https://json-schema.org/draft/2020-12/schema",
          "$id": "https://schemas.obsign.dev/ob3/proof-config.schema.json",
          "type": "object",
          "required": ["type", "cryptosuite", "created", "nonce"]
        }"#,
    )
    .unwrap();
    fs::write(dir.path().join("README.md"), "ignored").unwrap();

    let validator = SchemaValidator::with_overrides(dir.path()).unwrap();
    let config = serde_json::json!({
        "type": "DataIntegrityProof",
        "cryptosuite": "eddsa-jcs-2022",
        "created": "2024-01-01T00:00:00Z"
    });
    assert!(validator.validate(&config, SchemaName::ProofConfig).is_err());
    assert_eq!(
        validator.schema_count(),
        SchemaValidator::builtin().unwrap().schema_count()
    );
}
