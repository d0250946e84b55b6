//! # Proof Routes
//!
//! - `POST /v1/proofs`: sign the body exactly as given.
//! - `POST /v1/credentials/sign`: ensure `VerifiableCredential` leads
//!   `type`, then sign.
//! - `POST /v1/proofs/verify`: verify every proof on a signed document.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use obsign_vc::VerificationReport;
use serde_json::Value;

use crate::error::AppError;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/proofs", post(create_proof))
        .route("/v1/credentials/sign", post(sign_credential))
        .route("/v1/proofs/verify", post(verify_proof))
}

async fn create_proof(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    let Json(document) = body?;
    let signed = state.engine.create_proof(document, state.keys.as_ref()).await?;
    Ok(Json(signed))
}

async fn sign_credential(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    let Json(mut document) = body?;
    ensure_verifiable_credential_type(&mut document);
    let signed = state.engine.create_proof(document, state.keys.as_ref()).await?;
    Ok(Json(signed))
}

async fn verify_proof(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<VerificationReport>, AppError> {
    let Json(document) = body?;
    let report = state.engine.verify_proof(&document)?;
    Ok(Json(report))
}

/// Prepend `VerifiableCredential` to `type` when it is an array lacking it.
/// Other shapes are left for schema validation to reject.
fn ensure_verifiable_credential_type(document: &mut Value) {
    if let Some(Value::Array(types)) = document.get_mut("type") {
        let present = types
            .iter()
            .any(|t| t.as_str() == Some("VerifiableCredential"));
        if !present {
            types.insert(0, Value::String("VerifiableCredential".into()));
        }
    }
}
