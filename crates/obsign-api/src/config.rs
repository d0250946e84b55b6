//! # Service Configuration
//!
//! Read once from the environment in `main` and passed down. Nothing below
//! the binary reads environment variables itself.

use std::collections::HashMap;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use obsign_keys::KeyGeneration;
use thiserror::Error;
use zeroize::Zeroizing;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    #[error("invalid value for {var}: {reason}")]
    Invalid { var: &'static str, reason: String },
}

/// Where the issuer secret comes from at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecretOriginKind {
    /// STS assume-role, then Secrets Manager.
    Aws,
    /// `ISSUER_SECRET`, for local development.
    Static,
}

impl FromStr for SecretOriginKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "aws" => Ok(Self::Aws),
            "static" => Ok(Self::Static),
            other => Err(format!("expected 'aws' or 'static', got '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvelopeBackend {
    AwsKms,
    Local,
}

impl FromStr for EnvelopeBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "aws-kms" => Ok(Self::AwsKms),
            "local" => Ok(Self::Local),
            other => Err(format!("expected 'aws-kms' or 'local', got '{other}'")),
        }
    }
}

/// Settings for the federated secret origin.
#[derive(Debug, Clone)]
pub struct FederatedSettings {
    pub role_arn: String,
    pub secret_name: String,
    pub session_seconds: i32,
}

#[derive(Clone)]
pub struct AppConfig {
    pub port: u16,
    /// Bearer token for `/v1/*`. `None` disables auth.
    pub auth_token: Option<Zeroizing<String>>,
    pub database_url: Option<String>,
    pub aws_region: Option<String>,
    pub kms_key_id: String,
    pub secret_origin: SecretOriginKind,
    pub federated: Option<FederatedSettings>,
    pub static_secret: Option<Zeroizing<String>>,
    pub envelope_backend: EnvelopeBackend,
    pub local_envelope_key: Option<Zeroizing<String>>,
    pub key_generation: KeyGeneration,
    pub remote_timeout: Duration,
    pub metrics_enabled: bool,
    /// Directory of `*.schema.json` files replacing embedded schemas.
    pub schema_dir: Option<PathBuf>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(std::env::vars().collect())
    }

    /// Build from an explicit variable map.
    pub fn from_vars(vars: HashMap<String, String>) -> Result<Self, ConfigError> {
        let get = |name: &str| vars.get(name).map(|v| v.trim()).filter(|v| !v.is_empty());

        let port = parse_or(get("PORT"), "PORT", 8080u16)?;
        let secret_origin = parse_or(
            get("ISSUER_SECRET_ORIGIN"),
            "ISSUER_SECRET_ORIGIN",
            SecretOriginKind::Aws,
        )?;
        let envelope_backend =
            parse_or(get("ENVELOPE_BACKEND"), "ENVELOPE_BACKEND", EnvelopeBackend::AwsKms)?;
        let key_generation =
            parse_or(get("KEY_GENERATION"), "KEY_GENERATION", KeyGeneration::Seeded)?;
        let timeout_secs =
            parse_or(get("REMOTE_CALL_TIMEOUT_SECS"), "REMOTE_CALL_TIMEOUT_SECS", 10u64)?;
        let session_seconds =
            parse_or(get("ROLE_SESSION_SECONDS"), "ROLE_SESSION_SECONDS", 900i32)?;
        let metrics_enabled = get("METRICS_ENABLED")
            .map(|v| v.eq_ignore_ascii_case("true") || v == "1")
            .unwrap_or(false);

        if timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                var: "REMOTE_CALL_TIMEOUT_SECS",
                reason: "must be at least 1".into(),
            });
        }
        if !(900..=43_200).contains(&session_seconds) {
            return Err(ConfigError::Invalid {
                var: "ROLE_SESSION_SECONDS",
                reason: format!("{session_seconds} is outside 900..=43200"),
            });
        }

        let kms_key_id = get("AWS_KMS_KEY_ID")
            .ok_or(ConfigError::Missing("AWS_KMS_KEY_ID"))?
            .to_string();
        let aws_region = get("AWS_REGION").map(str::to_string);

        let (federated, static_secret) = match secret_origin {
            SecretOriginKind::Aws => {
                let settings = FederatedSettings {
                    role_arn: get("ISSUER_PRIVATE_KEY_READ_ROLE_ARN")
                        .ok_or(ConfigError::Missing("ISSUER_PRIVATE_KEY_READ_ROLE_ARN"))?
                        .to_string(),
                    secret_name: get("ISSUER_PRIVATE_KEY_SECRET_NAME")
                        .ok_or(ConfigError::Missing("ISSUER_PRIVATE_KEY_SECRET_NAME"))?
                        .to_string(),
                    session_seconds,
                };
                if aws_region.is_none() {
                    return Err(ConfigError::Missing("AWS_REGION"));
                }
                (Some(settings), None)
            }
            SecretOriginKind::Static => {
                let secret = get("ISSUER_SECRET").ok_or(ConfigError::Missing("ISSUER_SECRET"))?;
                (None, Some(Zeroizing::new(secret.to_string())))
            }
        };

        let local_envelope_key = match envelope_backend {
            EnvelopeBackend::Local => Some(Zeroizing::new(
                get("LOCAL_ENVELOPE_KEY")
                    .ok_or(ConfigError::Missing("LOCAL_ENVELOPE_KEY"))?
                    .to_string(),
            )),
            EnvelopeBackend::AwsKms => None,
        };

        Ok(Self {
            port,
            auth_token: get("AUTH_TOKEN").map(|t| Zeroizing::new(t.to_string())),
            database_url: get("DATABASE_URL").map(str::to_string),
            aws_region,
            kms_key_id,
            secret_origin,
            federated,
            static_secret,
            envelope_backend,
            local_envelope_key,
            key_generation,
            remote_timeout: Duration::from_secs(timeout_secs),
            metrics_enabled,
            schema_dir: get("SCHEMA_DIR").map(PathBuf::from),
        })
    }
}

fn parse_or<T>(raw: Option<&str>, var: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match raw {
        None => Ok(default),
        Some(v) => v.parse().map_err(|e: T::Err| ConfigError::Invalid {
            var,
            reason: e.to_string(),
        }),
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("port", &self.port)
            .field("auth_enabled", &self.auth_token.is_some())
            .field("database", &self.database_url.as_ref().map(|_| "<configured>"))
            .field("aws_region", &self.aws_region)
            .field("kms_key_id", &self.kms_key_id)
            .field("secret_origin", &self.secret_origin)
            .field("federated", &self.federated)
            .field("envelope_backend", &self.envelope_backend)
            .field("key_generation", &self.key_generation)
            .field("remote_timeout", &self.remote_timeout)
            .field("metrics_enabled", &self.metrics_enabled)
            .field("schema_dir", &self.schema_dir)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn dev() -> Vec<(&'static str, &'static str)> {
        vec![
            ("AWS_KMS_KEY_ID", "alias/obsign-issuer"),
            ("ISSUER_SECRET_ORIGIN", "static"),
            ("ISSUER_SECRET", "dev-secret"),
            ("ENVELOPE_BACKEND", "local"),
            ("LOCAL_ENVELOPE_KEY", "AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA="),
        ]
    }

    #[test]
    fn defaults_apply() {
        let cfg = AppConfig::from_vars(vars(&dev())).unwrap();
        assert_eq!(cfg.port, 8080);
        assert!(cfg.auth_token.is_none());
        assert!(cfg.database_url.is_none());
        assert_eq!(cfg.key_generation, KeyGeneration::Seeded);
        assert_eq!(cfg.remote_timeout, Duration::from_secs(10));
        assert!(!cfg.metrics_enabled);
        assert!(cfg.schema_dir.is_none());
    }

    #[test]
    fn schema_dir_is_read() {
        let mut v = dev();
        v.push(("SCHEMA_DIR", " /etc/obsign/schemas "));
        let cfg = AppConfig::from_vars(vars(&v)).unwrap();
        assert_eq!(cfg.schema_dir, Some(PathBuf::from("/etc/obsign/schemas")));
    }

    #[test]
    fn kms_key_id_is_required() {
        let mut v = dev();
        v.retain(|(k, _)| *k != "AWS_KMS_KEY_ID");
        assert!(matches!(
            AppConfig::from_vars(vars(&v)),
            Err(ConfigError::Missing("AWS_KMS_KEY_ID"))
        ));
    }

    #[test]
    fn aws_origin_requires_role_secret_and_region() {
        let base = vars(&[("AWS_KMS_KEY_ID", "k"), ("ISSUER_SECRET_ORIGIN", "aws")]);
        assert!(matches!(
            AppConfig::from_vars(base.clone()),
            Err(ConfigError::Missing("ISSUER_PRIVATE_KEY_READ_ROLE_ARN"))
        ));

        let mut full = base;
        full.insert("ISSUER_PRIVATE_KEY_READ_ROLE_ARN".into(), "arn:aws:iam::1:role/r".into());
        full.insert("ISSUER_PRIVATE_KEY_SECRET_NAME".into(), "issuer/key".into());
        full.insert("AWS_REGION".into(), "us-east-1".into());
        let cfg = AppConfig::from_vars(full).unwrap();
        assert_eq!(cfg.federated.unwrap().session_seconds, 900);
    }

    #[test]
    fn invalid_values_are_rejected() {
        let mut v = dev();
        v.push(("PORT", "eighty"));
        assert!(matches!(
            AppConfig::from_vars(vars(&v)),
            Err(ConfigError::Invalid { var: "PORT", .. })
        ));

        let mut v = dev();
        v.push(("KEY_GENERATION", "hsm"));
        assert!(AppConfig::from_vars(vars(&v)).is_err());

        let mut v = dev();
        v.push(("ROLE_SESSION_SECONDS", "60"));
        assert!(AppConfig::from_vars(vars(&v)).is_err());
    }

    #[test]
    fn debug_hides_secrets() {
        let mut v = dev();
        v.push(("AUTH_TOKEN", "tok-123"));
        let cfg = AppConfig::from_vars(vars(&v)).unwrap();
        let debug = format!("{cfg:?}");
        assert!(!debug.contains("tok-123"));
        assert!(!debug.contains("dev-secret"));
        assert!(!debug.contains("AAAAAAAA"));
    }
}
