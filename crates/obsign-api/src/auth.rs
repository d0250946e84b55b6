//! # Bearer Authentication
//!
//! Every `/v1/*` route requires `Authorization: Bearer <token>` when a token
//! is configured. Health checks and `/metrics` are mounted outside this
//! middleware.

use std::sync::Arc;

use axum::extract::Request;
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Extension;
use subtle::ConstantTimeEq;
use zeroize::Zeroizing;

use crate::error::AppError;

/// The configured bearer token, if any. `Debug` never prints it.
#[derive(Clone, Default)]
pub struct AuthConfig {
    token: Option<Arc<Zeroizing<String>>>,
}

impl AuthConfig {
    pub fn new(token: Option<Zeroizing<String>>) -> Self {
        Self {
            token: token.map(Arc::new),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.token.is_some()
    }

    /// Constant-time comparison against the configured token.
    fn accepts(&self, presented: &str) -> bool {
        match &self.token {
            None => true,
            Some(expected) => bool::from(expected.as_bytes().ct_eq(presented.as_bytes())),
        }
    }
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("enabled", &self.is_enabled())
            .finish()
    }
}

pub async fn auth_middleware(
    Extension(config): Extension<AuthConfig>,
    request: Request,
    next: Next,
) -> Response {
    if !config.is_enabled() {
        return next.run(request).await;
    }

    let presented = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));

    match presented {
        Some(token) if config.accepts(token.trim()) => next.run(request).await,
        Some(_) => AppError::Unauthorized("invalid bearer token".into()).into_response(),
        None => AppError::Unauthorized("missing bearer token".into()).into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_accepts_anything() {
        assert!(AuthConfig::default().accepts("whatever"));
    }

    #[test]
    fn compares_exactly() {
        let cfg = AuthConfig::new(Some(Zeroizing::new("s3cret".into())));
        assert!(cfg.accepts("s3cret"));
        assert!(!cfg.accepts("s3cre"));
        assert!(!cfg.accepts("s3cret2"));
        assert!(!cfg.accepts(""));
    }

    #[test]
    fn debug_is_redacted() {
        let cfg = AuthConfig::new(Some(Zeroizing::new("s3cret".into())));
        assert_eq!(format!("{cfg:?}"), "AuthConfig { enabled: true }");
    }
}
