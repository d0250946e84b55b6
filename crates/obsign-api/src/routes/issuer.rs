//! `GET /v1/issuer/key`: the active issuer key's public half, created on
//! first request if none exists yet.

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use obsign_vc::SigningError;
use serde::Serialize;

use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IssuerKeyResponse {
    pub id: String,
    pub public_key_multibase: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/v1/issuer/key", get(issuer_key))
}

async fn issuer_key(State(state): State<AppState>) -> Result<Json<IssuerKeyResponse>, AppError> {
    let signer = state
        .keys
        .get_or_create_signing_key()
        .await
        .map_err(SigningError::from)?;
    Ok(Json(IssuerKeyResponse {
        id: signer.did().to_string(),
        public_key_multibase: signer.public_key_multibase().to_string(),
        created_at: signer.created_at().map(|t| t.to_iso8601()),
    }))
}
