//! # API Error Types
//!
//! Maps [`SigningError`] onto HTTP status codes and the JSON error envelope
//! `{"error": {"code", "message", "details"?}}`. Server-side failures are
//! logged with their cause and returned with a generic message.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use obsign_vc::SigningError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetail {
    /// Machine-readable code, e.g. `VALIDATION_ERROR`.
    pub code: String,
    pub message: String,
    /// Structured violations for 422 responses.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

#[derive(Error, Debug)]
pub enum AppError {
    /// The request broke the operation's contract (400).
    #[error("contract violation: {0}")]
    ContractViolation(String),

    /// The body was not valid JSON (400).
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Schema validation failed (422).
    #[error("{message}")]
    Validation {
        message: String,
        details: Option<serde_json::Value>,
    },

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// A dependency (KMS, storage) failed (503). Not shown to clients.
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),

    /// Anything else (500). Not shown to clients.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::ContractViolation(_) => (StatusCode::BAD_REQUEST, "CONTRACT_VIOLATION"),
            Self::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            Self::Validation { .. } => (StatusCode::UNPROCESSABLE_ENTITY, "VALIDATION_ERROR"),
            Self::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            Self::ServiceUnavailable(_) => {
                (StatusCode::SERVICE_UNAVAILABLE, "SERVICE_UNAVAILABLE")
            }
            Self::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        let message = match &self {
            Self::Internal(_) => "An internal error occurred".to_string(),
            Self::ServiceUnavailable(_) => "A signing dependency is unavailable".to_string(),
            other => other.to_string(),
        };

        match &self {
            Self::Internal(_) => tracing::error!(error = %self, "internal server error"),
            Self::ServiceUnavailable(_) => tracing::warn!(error = %self, "service unavailable"),
            _ => {}
        }

        let details = match self {
            Self::Validation { details, .. } => details,
            _ => None,
        };

        let body = ErrorBody {
            error: ErrorDetail {
                code: code.to_string(),
                message,
                details,
            },
        };
        (status, Json(body)).into_response()
    }
}

impl From<SigningError> for AppError {
    fn from(err: SigningError) -> Self {
        match err {
            SigningError::ContractViolation(m) => Self::ContractViolation(m),
            SigningError::SchemaValidation(e) => match e.violations() {
                Some(violations) => Self::Validation {
                    message: "document failed schema validation".to_string(),
                    details: serde_json::to_value(violations).ok(),
                },
                None => Self::Internal(e.to_string()),
            },
            e @ (SigningError::KeyManagement(_) | SigningError::Persistence(_)) => {
                Self::ServiceUnavailable(e.to_string())
            }
            other => Self::Internal(other.to_string()),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}
