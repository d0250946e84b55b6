//! # Proof Construction Engine
//!
//! Turns an unsigned credential into a signed one under `eddsa-jcs-2022`,
//! and verifies such proofs.
//!
//! ## Signing steps (fixed order)
//!
//! 0. Reject a document that already has `proof` (contract violation), then
//!    validate it against `create-credential`.
//! 1. Build the proof configuration with `created` = now.
//! 2. JCS-canonicalize the configuration and the document separately.
//! 3. SHA-256 each.
//! 4. Concatenate `(config digest, document digest)` into 64 bytes.
//! 5. Sign with the issuer's Ed25519 key.
//! 6. Encode the signature as multibase base58btc.
//! 7. Assemble the proof (`assertionMethod`, `did:key` verification method)
//!    and validate it. A failure here is the engine's own fault
//!    ([`SigningError::InvalidProof`]), not the caller's.
//! 8. Append `proof: [proof]` and validate the result as a signed
//!    AchievementCredential.
//!
//! Every step is terminal on failure; nothing is retried.

use std::sync::Arc;

use obsign_core::{CanonicalBytes, DidKey, Timestamp};
use obsign_crypto::multikey::{decode_signature, encode_signature, public_key_from_did};
use obsign_crypto::{eddsa_jcs_hash_data, verify};
use obsign_schema::{SchemaName, SchemaValidator};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::SigningError;
use crate::proof::{DataIntegrityProof, ProofConfig, DATA_INTEGRITY_PROOF, EDDSA_JCS_2022};
use crate::signer::{Signer, SignerProvider};

/// The outcome of verifying one proof.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProofResult {
    pub verification_method: String,
    pub ok: bool,
    /// Why verification failed; empty when `ok`.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub error: String,
}

/// Per-proof verification results for one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VerificationReport {
    pub verified: bool,
    pub results: Vec<ProofResult>,
}

impl VerificationReport {
    fn from_results(results: Vec<ProofResult>) -> Self {
        // Zero proofs is a failure, not vacuous success.
        let verified = !results.is_empty() && results.iter().all(|r| r.ok);
        Self { verified, results }
    }
}

/// Creates and verifies `eddsa-jcs-2022` proofs.
#[derive(Debug, Clone)]
pub struct ProofEngine {
    validator: Arc<SchemaValidator>,
}

impl ProofEngine {
    pub fn new(validator: Arc<SchemaValidator>) -> Self {
        Self { validator }
    }

    pub fn validator(&self) -> &SchemaValidator {
        &self.validator
    }

    /// Sign `document` with a proof created now.
    ///
    /// If the signature has no 88-89 character encoding, the proof is
    /// re-signed once with `created` one second later.
    pub async fn create_proof(
        &self,
        document: Value,
        signers: &dyn SignerProvider,
    ) -> Result<Value, SigningError> {
        observe(self.sign_document(document, signers, Timestamp::now(), true).await)
    }

    /// Sign `document` with a proof whose `created` is fixed by the caller.
    ///
    /// `created` is never adjusted, so an unrepresentable signature surfaces
    /// as [`SigningError::InvalidProof`].
    pub async fn create_proof_at(
        &self,
        document: Value,
        signers: &dyn SignerProvider,
        created: Timestamp,
    ) -> Result<Value, SigningError> {
        observe(self.sign_document(document, signers, created, false).await)
    }

    async fn sign_document(
        &self,
        document: Value,
        signers: &dyn SignerProvider,
        created: Timestamp,
        reissue: bool,
    ) -> Result<Value, SigningError> {
        let mut document = into_unsigned_object(document)?;
        let unsigned = Value::Object(document.clone());
        self.validator.validate(&unsigned, SchemaName::CreateCredential)?;

        let signer = signers.signer().await?;

        let proof = match self.build_proof(&unsigned, signer.as_ref(), created) {
            Err(SigningError::InvalidProof(e)) if reissue => {
                let next = created
                    .checked_add_seconds(1)
                    .ok_or(SigningError::InvalidProof(e))?;
                tracing::debug!(%created, "short proofValue encoding, re-signing");
                self.build_proof(&unsigned, signer.as_ref(), next)?
            }
            other => other?,
        };

        let proof_json =
            serde_json::to_value(&proof).map_err(|e| SigningError::Canonicalization(e.into()))?;
        document.insert("proof".to_string(), Value::Array(vec![proof_json]));
        let signed = Value::Object(document);
        self.validator.validate(&signed, SchemaName::AchievementCredential)?;

        tracing::info!(
            verification_method = %signer.verification_method(),
            created = %proof.created,
            "proof created"
        );
        Ok(signed)
    }

    /// Steps 1-7 for an already validated unsigned document.
    fn build_proof(
        &self,
        unsigned: &Value,
        signer: &dyn Signer,
        created: Timestamp,
    ) -> Result<DataIntegrityProof, SigningError> {
        let config = ProofConfig::new(created);
        self.validator.validate_typed(&config, SchemaName::ProofConfig)?;

        let hash_data = eddsa_jcs_hash_data(
            &CanonicalBytes::new(&config)?,
            &CanonicalBytes::from_value(unsigned)?,
        );
        let signature = signer.sign(&hash_data);

        let proof = DataIntegrityProof::assertion(
            config,
            encode_signature(&signature),
            signer.verification_method(),
        );
        self.validator
            .validate_typed(&proof, SchemaName::DataIntegrityProof)
            .map_err(SigningError::InvalidProof)?;
        Ok(proof)
    }

    /// Verify every proof on a signed document.
    ///
    /// Structural problems with the document itself (not an object, no
    /// `proof`) are errors; problems with an individual proof are reported
    /// in its [`ProofResult`].
    pub fn verify_proof(&self, document: &Value) -> Result<VerificationReport, SigningError> {
        let obj = document.as_object().ok_or_else(|| {
            SigningError::ContractViolation("signed document must be a JSON object".into())
        })?;
        let proofs: Vec<Value> = match obj.get("proof") {
            Some(Value::Array(items)) => items.clone(),
            Some(single @ Value::Object(_)) => vec![single.clone()],
            Some(_) => {
                return Err(SigningError::ContractViolation(
                    "proof must be an object or an array of objects".into(),
                ))
            }
            None => {
                return Err(SigningError::ContractViolation(
                    "document has no proof to verify".into(),
                ))
            }
        };

        let mut unsecured = obj.clone();
        unsecured.remove("proof");
        let document_bytes = CanonicalBytes::from_value(&Value::Object(unsecured))?;

        let results = proofs
            .into_iter()
            .map(|raw| {
                let verification_method = raw
                    .get("verificationMethod")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string();
                match verify_single_proof(raw, &document_bytes) {
                    Ok(()) => ProofResult {
                        verification_method,
                        ok: true,
                        error: String::new(),
                    },
                    Err(e) => ProofResult {
                        verification_method,
                        ok: false,
                        error: e,
                    },
                }
            })
            .collect();

        let report = VerificationReport::from_results(results);
        tracing::debug!(
            verified = report.verified,
            proofs = report.results.len(),
            "proofs verified"
        );
        Ok(report)
    }
}

fn observe(result: Result<Value, SigningError>) -> Result<Value, SigningError> {
    match &result {
        Ok(_) => metrics::counter!("obsign_proofs_created_total").increment(1),
        Err(e) => {
            metrics::counter!("obsign_proof_failures_total", "kind" => e.kind()).increment(1);
            tracing::warn!(kind = e.kind(), error = %e, "proof creation failed");
        }
    }
    result
}

/// Accept only a JSON object without `proof`.
fn into_unsigned_object(document: Value) -> Result<Map<String, Value>, SigningError> {
    match document {
        Value::Object(map) if map.contains_key("proof") => Err(SigningError::ContractViolation(
            "credential already contains a proof".into(),
        )),
        Value::Object(map) => Ok(map),
        _ => Err(SigningError::ContractViolation(
            "credential document must be a JSON object".into(),
        )),
    }
}

fn verify_single_proof(raw: Value, document_bytes: &CanonicalBytes) -> Result<(), String> {
    let proof: DataIntegrityProof =
        serde_json::from_value(raw).map_err(|e| format!("malformed proof: {e}"))?;
    if proof.proof_type != DATA_INTEGRITY_PROOF {
        return Err(format!("unsupported proof type {:?}", proof.proof_type));
    }
    if proof.cryptosuite != EDDSA_JCS_2022 {
        return Err(format!("unsupported cryptosuite {:?}", proof.cryptosuite));
    }

    let config_bytes = CanonicalBytes::new(&proof.config()).map_err(|e| e.to_string())?;
    let hash_data = eddsa_jcs_hash_data(&config_bytes, document_bytes);

    let did = DidKey::parse(&proof.verification_method).map_err(|e| e.to_string())?;
    let public_key = public_key_from_did(&did).map_err(|e| e.to_string())?;
    let signature = decode_signature(&proof.proof_value).map_err(|e| e.to_string())?;
    verify(&hash_data, &signature, &public_key).map_err(|e| e.to_string())
}
