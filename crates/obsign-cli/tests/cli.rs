//! Drives the `obsign` binary end to end: keygen, sign, verify, validate.

use std::path::Path;
use std::process::{Command, Output};

use serde_json::{json, Value};

fn obsign(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_obsign"))
        .args(args)
        .output()
        .expect("obsign binary runs")
}

fn path(p: &Path) -> &str {
    p.to_str().unwrap()
}

#[test]
fn keygen_sign_verify_roundtrip() {
    let dir = tempfile::tempdir().unwrap();

    let out = obsign(&["keygen", "--seeded", "--output", path(dir.path())]);
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));
    let did = String::from_utf8(out.stdout).unwrap().trim().to_string();
    assert!(did.starts_with("did:key:z6Mk"));

    let credential = dir.path().join("credential.json");
    std::fs::write(
        &credential,
        json!({
            "id": "urn:uuid:5b7f1c2e-0d4a-4a8e-9b1a-2f0c3d4e5f60",
            "type": ["VerifiableCredential", "AchievementCredential"],
            "credentialSubject": {"id": "did:example:learner"},
            "issuer": "https://issuer.example/org",
            "validFrom": "2024-01-01T00:00:00Z"
        })
        .to_string(),
    )
    .unwrap();

    let key = dir.path().join("issuer.multikey.json");
    let signed = dir.path().join("signed.json");
    let out = obsign(&[
        "sign",
        "--key",
        path(&key),
        "--out",
        path(&signed),
        path(&credential),
    ]);
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));

    let doc: Value = serde_json::from_str(&std::fs::read_to_string(&signed).unwrap()).unwrap();
    assert_eq!(doc["proof"][0]["verificationMethod"], did.as_str());
    assert_eq!(doc["proof"][0]["cryptosuite"], "eddsa-jcs-2022");

    let out = obsign(&["verify", path(&signed)]);
    assert_eq!(out.status.code(), Some(0));
    assert!(String::from_utf8_lossy(&out.stdout).contains(&did));

    let out = obsign(&["validate", "--schema", "achievement-credential", path(&signed)]);
    assert_eq!(out.status.code(), Some(0));
}

#[test]
fn validate_reports_violations_with_exit_one() {
    let dir = tempfile::tempdir().unwrap();
    let doc = dir.path().join("credential.yaml");
    std::fs::write(
        &doc,
        "type: [AchievementCredential]\nissuer: https://issuer.example\n",
    )
    .unwrap();

    let out = obsign(&["validate", "--schema", "create-credential", path(&doc)]);
    assert_eq!(out.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&out.stdout).contains("FAIL"));
}

#[test]
fn sign_with_missing_key_exits_two() {
    let dir = tempfile::tempdir().unwrap();
    let doc = dir.path().join("credential.json");
    std::fs::write(&doc, "{}").unwrap();

    let missing = dir.path().join("absent.multikey.json");
    let out = obsign(&["sign", "--key", path(&missing), path(&doc)]);
    assert_eq!(out.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&out.stderr).contains("cannot read key file"));
}
