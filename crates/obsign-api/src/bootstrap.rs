//! # Startup Wiring
//!
//! Turns an [`AppConfig`] into an [`AppState`]:
//!
//! 1. Bootstrap the issuer secret from the configured origin. Failure here
//!    is fatal to the process.
//! 2. Build the envelope cipher (AWS KMS or local AES-256-GCM).
//! 3. Open the key store (Postgres when `DATABASE_URL` is set, otherwise
//!    in-memory).
//! 4. Assemble the schema validator (embedded schemas, overridden by
//!    `SCHEMA_DIR` when set), proof engine and key manager.

use std::sync::Arc;

use anyhow::{Context, Result};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use obsign_crypto::{EnvelopeCipher, LocalEnvelopeCipher};
use obsign_keys::{
    init_pool, IssuerSecret, KeyManagerConfig, KeyStore, MemoryKeyStore, PgKeyStore,
    SecretOrigin, SigningKeyManager, StaticSecretOrigin,
};
use obsign_schema::SchemaValidator;
use obsign_vc::ProofEngine;

use crate::config::{AppConfig, EnvelopeBackend, SecretOriginKind};
use crate::state::AppState;

pub async fn build_state(config: &AppConfig) -> Result<AppState> {
    let origin = secret_origin(config).await?;
    tracing::info!(origin = origin.name(), "bootstrapping issuer secret");
    let issuer_secret = origin
        .fetch_issuer_secret()
        .await
        .context("issuer secret bootstrap failed")?;

    let cipher = envelope_cipher(config).await?;

    let pool = match &config.database_url {
        Some(url) => Some(init_pool(url).await.context("key store initialization failed")?),
        None => None,
    };
    let store: Arc<dyn KeyStore> = match &pool {
        Some(pool) => Arc::new(PgKeyStore::new(pool.clone())),
        None => {
            tracing::warn!("DATABASE_URL not set; issuer key is held in memory only");
            Arc::new(MemoryKeyStore::new())
        }
    };

    let validator = Arc::new(schema_validator(config)?);
    let engine = Arc::new(ProofEngine::new(Arc::clone(&validator)));

    let mut key_config = KeyManagerConfig::new(config.kms_key_id.clone());
    key_config.generation = config.key_generation;
    key_config.timeout = config.remote_timeout;
    let keys = Arc::new(SigningKeyManager::new(store, cipher, validator, key_config));

    tracing::info!(keys = ?keys, "signing stack ready");

    let mut state = AppState::new(engine, keys, issuer_secret);
    if let Some(pool) = pool {
        state = state.with_db_pool(pool);
    }
    if config.metrics_enabled {
        state = state.with_metrics(install_metrics_recorder()?);
    }
    Ok(state)
}

fn schema_validator(config: &AppConfig) -> Result<SchemaValidator> {
    let validator = match &config.schema_dir {
        Some(dir) => SchemaValidator::with_overrides(dir)
            .with_context(|| format!("schema overrides in {} failed to load", dir.display()))?,
        None => SchemaValidator::builtin().context("embedded schemas failed to load")?,
    };
    tracing::info!(schemas = validator.schema_count(), "schema validator ready");
    Ok(validator)
}

/// Install the global Prometheus recorder. Call at most once per process.
pub fn install_metrics_recorder() -> Result<PrometheusHandle> {
    PrometheusBuilder::new()
        .install_recorder()
        .context("failed to install Prometheus recorder")
}

async fn secret_origin(config: &AppConfig) -> Result<Box<dyn SecretOrigin>> {
    match config.secret_origin {
        SecretOriginKind::Static => {
            let secret = config
                .static_secret
                .as_ref()
                .context("ISSUER_SECRET is required for the static origin")?;
            Ok(Box::new(StaticSecretOrigin::new(IssuerSecret::new(
                secret.as_str(),
            ))))
        }
        SecretOriginKind::Aws => federated_origin(config).await,
    }
}

#[cfg(feature = "aws")]
async fn federated_origin(config: &AppConfig) -> Result<Box<dyn SecretOrigin>> {
    use obsign_keys::{
        FederatedOriginConfig, FederatedSecretOrigin, SecretsManagerSecretStore, StsRoleAssumer,
    };

    let settings = config
        .federated
        .as_ref()
        .context("federated origin settings are missing")?;
    let region = config
        .aws_region
        .as_deref()
        .context("AWS_REGION is required for the aws origin")?;

    let mut origin_config =
        FederatedOriginConfig::new(settings.role_arn.clone(), settings.secret_name.clone());
    origin_config.duration_seconds = settings.session_seconds;
    origin_config.timeout = config.remote_timeout;

    Ok(Box::new(FederatedSecretOrigin::new(
        StsRoleAssumer::new(region).await,
        SecretsManagerSecretStore::new(region),
        origin_config,
    )))
}

#[cfg(not(feature = "aws"))]
async fn federated_origin(_config: &AppConfig) -> Result<Box<dyn SecretOrigin>> {
    anyhow::bail!("ISSUER_SECRET_ORIGIN=aws requires the `aws` feature")
}

async fn envelope_cipher(config: &AppConfig) -> Result<Arc<dyn EnvelopeCipher>> {
    match config.envelope_backend {
        EnvelopeBackend::Local => {
            let key = config
                .local_envelope_key
                .as_ref()
                .context("LOCAL_ENVELOPE_KEY is required for the local backend")?;
            tracing::warn!("using local envelope cipher; do not use in production");
            Ok(Arc::new(LocalEnvelopeCipher::from_base64(key)?))
        }
        EnvelopeBackend::AwsKms => kms_cipher(config).await,
    }
}

#[cfg(feature = "aws")]
async fn kms_cipher(config: &AppConfig) -> Result<Arc<dyn EnvelopeCipher>> {
    Ok(Arc::new(
        obsign_crypto::AwsKmsEnvelopeCipher::new(config.aws_region.as_deref()).await,
    ))
}

#[cfg(not(feature = "aws"))]
async fn kms_cipher(_config: &AppConfig) -> Result<Arc<dyn EnvelopeCipher>> {
    anyhow::bail!("ENVELOPE_BACKEND=aws-kms requires the `aws` feature")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn local_config() -> AppConfig {
        let vars: HashMap<String, String> = [
            ("AWS_KMS_KEY_ID", "alias/obsign-issuer"),
            ("ISSUER_SECRET_ORIGIN", "static"),
            ("ISSUER_SECRET", "dev-secret"),
            ("ENVELOPE_BACKEND", "local"),
            ("LOCAL_ENVELOPE_KEY", "AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA="),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
        AppConfig::from_vars(vars).unwrap()
    }

    #[tokio::test]
    async fn local_configuration_builds_state() {
        let state = build_state(&local_config()).await.unwrap();
        assert_eq!(state.issuer_secret.expose(), "dev-secret");
        assert!(state.db_pool.is_none());
        assert!(state.metrics.is_none());
        assert!(state.keys.active_record().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn schema_dir_overrides_embedded_schema() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("proof-config.schema.json"),
            r#"{
              "$schema": "https://json-schema.org/draft/2020-12/schema",
              "$id": "https://schemas.obsign.dev/ob3/proof-config.schema.json",
              "type": "object",
              "required": ["nonce"]
            }"#,
        )
        .unwrap();

        let mut config = local_config();
        config.schema_dir = Some(dir.path().to_path_buf());
        let validator = schema_validator(&config).unwrap();
        let proof_config = serde_json::json!({
            "type": "DataIntegrityProof",
            "cryptosuite": "eddsa-jcs-2022",
            "created": "2024-01-01T00:00:00Z"
        });
        assert!(validator
            .validate(&proof_config, obsign_schema::SchemaName::ProofConfig)
            .is_err());
    }

    #[tokio::test]
    async fn missing_schema_dir_fails_bootstrap() {
        let mut config = local_config();
        config.schema_dir = Some("/nonexistent/obsign-schemas".into());
        assert!(build_state(&config).await.is_err());
    }

    #[tokio::test]
    async fn bad_local_key_fails_bootstrap() {
        let mut config = local_config();
        config.local_envelope_key = Some(zeroize::Zeroizing::new("c2hvcnQ=".into()));
        assert!(build_state(&config).await.is_err());
    }
}
