//! # Application State
//!
//! Shared state for the Axum application. Built once by
//! [`crate::bootstrap`] and cloned into every handler.

use std::sync::Arc;

use metrics_exporter_prometheus::PrometheusHandle;
use obsign_keys::{IssuerSecret, SigningKeyManager};
use obsign_vc::ProofEngine;
use sqlx::PgPool;

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<ProofEngine>,
    pub keys: Arc<SigningKeyManager>,
    /// Bootstrapped once at startup; lives for the process lifetime.
    pub issuer_secret: Arc<IssuerSecret>,
    /// Present when `METRICS_ENABLED` is set.
    pub metrics: Option<PrometheusHandle>,
    /// Present when the key store is Postgres.
    pub db_pool: Option<PgPool>,
}

impl AppState {
    pub fn new(
        engine: Arc<ProofEngine>,
        keys: Arc<SigningKeyManager>,
        issuer_secret: IssuerSecret,
    ) -> Self {
        Self {
            engine,
            keys,
            issuer_secret: Arc::new(issuer_secret),
            metrics: None,
            db_pool: None,
        }
    }

    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }

    pub fn with_db_pool(mut self, pool: PgPool) -> Self {
        self.db_pool = Some(pool);
        self
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("keys", &self.keys)
            .field("issuer_secret", &self.issuer_secret)
            .field("metrics", &self.metrics.is_some())
            .field("db_pool", &self.db_pool.is_some())
            .finish_non_exhaustive()
    }
}
