//! # obsign-api — Issuer Signing Service
//!
//! A thin Axum layer over the proof engine and the issuer key manager. It
//! adds authentication, error mapping and observability, and no signing
//! semantics of its own.
//!
//! ## API Surface
//!
//! | Route                       | Module               | Auth |
//! |-----------------------------|----------------------|------|
//! | `POST /v1/proofs`           | [`routes::proofs`]   | yes  |
//! | `POST /v1/credentials/sign` | [`routes::proofs`]   | yes  |
//! | `POST /v1/proofs/verify`    | [`routes::proofs`]   | yes  |
//! | `GET /v1/issuer/key`        | [`routes::issuer`]   | yes  |
//! | `GET /health/liveness`      | this module          | no   |
//! | `GET /health/readiness`     | this module          | no   |
//! | `GET /metrics`              | this module          | no   |
//!
//! ## Middleware Stack (execution order)
//!
//! ```text
//! TraceLayer → AuthMiddleware → Handler
//! ```

pub mod auth;
pub mod bootstrap;
pub mod config;
pub mod error;
pub mod routes;
pub mod state;

use axum::extract::{DefaultBodyLimit, State};
use axum::http::StatusCode;
use axum::middleware::from_fn;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Extension, Router};
use tower_http::trace::TraceLayer;

use crate::auth::AuthConfig;

pub use config::{AppConfig, ConfigError};
pub use error::AppError;
pub use state::AppState;

/// Credentials are small; 1 MiB is generous.
const BODY_LIMIT: usize = 1024 * 1024;

/// Assemble the application router.
pub fn app(state: AppState, auth: AuthConfig) -> Router {
    let api = Router::new()
        .merge(routes::proofs::router())
        .merge(routes::issuer::router())
        .layer(DefaultBodyLimit::max(BODY_LIMIT))
        .layer(from_fn(auth::auth_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(Extension(auth))
        .with_state(state.clone());

    let unauthenticated = Router::new()
        .route("/health/liveness", get(liveness))
        .route("/health/readiness", get(readiness))
        .route("/metrics", get(prometheus_metrics))
        .with_state(state);

    Router::new().merge(unauthenticated).merge(api)
}

async fn liveness() -> &'static str {
    "ok"
}

/// 200 `ready` when the database answers, or always without one. An
/// [`AppState`] only exists after the issuer secret bootstrap succeeded, so
/// the secret's value is not inspected here.
async fn readiness(State(state): State<AppState>) -> impl IntoResponse {
    if let Some(pool) = &state.db_pool {
        if let Err(e) = sqlx::query("SELECT 1").execute(pool).await {
            tracing::warn!("Database health check failed: {e}");
            return (StatusCode::SERVICE_UNAVAILABLE, "database unreachable").into_response();
        }
    }

    (StatusCode::OK, "ready").into_response()
}

async fn prometheus_metrics(State(state): State<AppState>) -> impl IntoResponse {
    match &state.metrics {
        Some(handle) => (
            StatusCode::OK,
            [(
                axum::http::header::CONTENT_TYPE,
                "text/plain; version=0.0.4; charset=utf-8",
            )],
            handle.render(),
        )
            .into_response(),
        None => (StatusCode::NOT_FOUND, "metrics disabled").into_response(),
    }
}
