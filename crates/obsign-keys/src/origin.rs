//! # Issuer Secret Bootstrap
//!
//! Fetches the issuer secret once at process start and hands it to the
//! caller as an [`IssuerSecret`] value. The secret is never written to the
//! environment or a global; whoever bootstraps it threads it through
//! application state explicitly.
//!
//! ## Federated flow
//!
//! 1. Assume the read role with the process's long-lived credentials
//!    (session `session-obsign-issuer`, 900 s by default).
//! 2. Check that the returned temporary credentials are complete and not
//!    already expired.
//! 3. Fetch the `AWSCURRENT` version of the named secret with them.
//!
//! There is no refresh: the temporary credentials are dropped (and zeroized)
//! as soon as the fetch returns. Every restart bootstraps again.
//!
//! The remote calls sit behind [`RoleAssumer`] and [`SecretStoreClient`];
//! the AWS implementations live in [`aws`] behind the `aws` feature.

#[cfg(feature = "aws")]
pub mod aws;

use std::time::Duration;

use async_trait::async_trait;
use obsign_core::Timestamp;
use obsign_vc::SigningError;
use thiserror::Error;
use zeroize::Zeroizing;

/// Default STS session name.
pub const DEFAULT_SESSION_NAME: &str = "session-obsign-issuer";

/// Default STS session duration in seconds (the STS minimum).
pub const DEFAULT_SESSION_SECONDS: i32 = 900;

/// Secrets Manager version stage that is always fetched.
pub const VERSION_STAGE_CURRENT: &str = "AWSCURRENT";

#[derive(Error, Debug)]
pub enum OriginError {
    /// Role assumption denied, incomplete, expired or timed out.
    #[error("authentication failed: {0}")]
    Authentication(String),

    /// Secret fetch failed, timed out or returned no `SecretString`.
    #[error("secret retrieval failed: {0}")]
    SecretRetrieval(String),
}

impl From<OriginError> for SigningError {
    fn from(err: OriginError) -> Self {
        match err {
            OriginError::Authentication(m) => SigningError::Authentication(m),
            OriginError::SecretRetrieval(m) => SigningError::SecretRetrieval(m),
        }
    }
}

/// The bootstrapped issuer secret. Zeroized on drop; `Debug` is redacted.
#[derive(Clone)]
pub struct IssuerSecret(Zeroizing<String>);

impl IssuerSecret {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(Zeroizing::new(secret.into()))
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for IssuerSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "IssuerSecret(<redacted>)")
    }
}

/// Credentials exactly as the role assumption returned them. Any part may be
/// missing; [`TemporaryCredentials::from_assumed`] decides whether they are
/// usable.
#[derive(Default)]
pub struct AssumedRoleCredentials {
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<Zeroizing<String>>,
    pub session_token: Option<Zeroizing<String>>,
    pub expiration: Option<Timestamp>,
}

/// Complete, unexpired temporary credentials.
pub struct TemporaryCredentials {
    pub access_key_id: String,
    pub secret_access_key: Zeroizing<String>,
    pub session_token: Zeroizing<String>,
    pub expiration: Option<Timestamp>,
}

impl TemporaryCredentials {
    /// Accept assumed-role credentials only if all three parts are present
    /// and non-empty, and the expiry (when given) is in the future.
    pub fn from_assumed(
        assumed: AssumedRoleCredentials,
        now: Timestamp,
    ) -> Result<Self, OriginError> {
        fn present<T: AsRef<str>>(value: Option<T>, part: &str) -> Result<T, OriginError> {
            value.filter(|v| !v.as_ref().is_empty()).ok_or_else(|| {
                OriginError::Authentication(format!("assumed-role response is missing {part}"))
            })
        }

        let access_key_id = present(assumed.access_key_id, "AccessKeyId")?;
        let secret_access_key = present(assumed.secret_access_key, "SecretAccessKey")?;
        let session_token = present(assumed.session_token, "SessionToken")?;

        if let Some(expiration) = assumed.expiration {
            if expiration <= now {
                return Err(OriginError::Authentication(format!(
                    "assumed-role credentials expired at {expiration}"
                )));
            }
        }

        Ok(Self {
            access_key_id,
            secret_access_key,
            session_token,
            expiration: assumed.expiration,
        })
    }
}

impl std::fmt::Debug for TemporaryCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TemporaryCredentials")
            .field("expiration", &self.expiration)
            .finish_non_exhaustive()
    }
}

/// Assumes an IAM role.
#[async_trait]
pub trait RoleAssumer: Send + Sync {
    async fn assume_role(
        &self,
        role_arn: &str,
        session_name: &str,
        duration_seconds: i32,
    ) -> Result<AssumedRoleCredentials, OriginError>;
}

/// Reads a secret with federated session credentials.
#[async_trait]
pub trait SecretStoreClient: Send + Sync {
    /// The `SecretString` of `secret_id` at `version_stage`, or `None` if the
    /// secret has no string value.
    async fn get_secret_string(
        &self,
        credentials: &TemporaryCredentials,
        secret_id: &str,
        version_stage: &str,
    ) -> Result<Option<Zeroizing<String>>, OriginError>;
}

/// Produces the issuer secret at startup.
#[async_trait]
pub trait SecretOrigin: Send + Sync {
    async fn fetch_issuer_secret(&self) -> Result<IssuerSecret, OriginError>;

    fn name(&self) -> &str;
}

/// Settings for [`FederatedSecretOrigin`].
#[derive(Debug, Clone)]
pub struct FederatedOriginConfig {
    pub role_arn: String,
    pub session_name: String,
    pub duration_seconds: i32,
    pub secret_name: String,
    /// Bound on each remote call.
    pub timeout: Duration,
}

impl FederatedOriginConfig {
    pub fn new(role_arn: impl Into<String>, secret_name: impl Into<String>) -> Self {
        Self {
            role_arn: role_arn.into(),
            session_name: DEFAULT_SESSION_NAME.to_string(),
            duration_seconds: DEFAULT_SESSION_SECONDS,
            secret_name: secret_name.into(),
            timeout: Duration::from_secs(10),
        }
    }
}

/// Assume-role, then fetch the secret with the temporary credentials.
pub struct FederatedSecretOrigin<R, S> {
    roles: R,
    secrets: S,
    config: FederatedOriginConfig,
}

impl<R: RoleAssumer, S: SecretStoreClient> FederatedSecretOrigin<R, S> {
    pub fn new(roles: R, secrets: S, config: FederatedOriginConfig) -> Self {
        Self {
            roles,
            secrets,
            config,
        }
    }
}

#[async_trait]
impl<R: RoleAssumer, S: SecretStoreClient> SecretOrigin for FederatedSecretOrigin<R, S> {
    async fn fetch_issuer_secret(&self) -> Result<IssuerSecret, OriginError> {
        let cfg = &self.config;

        let assumed = tokio::time::timeout(
            cfg.timeout,
            self.roles
                .assume_role(&cfg.role_arn, &cfg.session_name, cfg.duration_seconds),
        )
        .await
        .map_err(|_| {
            OriginError::Authentication(format!(
                "role assumption timed out after {:?}",
                cfg.timeout
            ))
        })??;
        let credentials = TemporaryCredentials::from_assumed(assumed, Timestamp::now())?;
        tracing::debug!(
            role_arn = %cfg.role_arn,
            expiration = ?credentials.expiration,
            "assumed issuer secret read role"
        );

        let secret = tokio::time::timeout(
            cfg.timeout,
            self.secrets
                .get_secret_string(&credentials, &cfg.secret_name, VERSION_STAGE_CURRENT),
        )
        .await
        .map_err(|_| {
            OriginError::SecretRetrieval(format!(
                "secret fetch timed out after {:?}",
                cfg.timeout
            ))
        })??
        .ok_or_else(|| {
            OriginError::SecretRetrieval(format!(
                "secret '{}' has no SecretString",
                cfg.secret_name
            ))
        })?;
        drop(credentials);

        tracing::info!(secret_name = %cfg.secret_name, "issuer secret retrieved");
        Ok(IssuerSecret(secret))
    }

    fn name(&self) -> &str {
        "federated"
    }
}

/// A fixed secret supplied by configuration. For local development only.
pub struct StaticSecretOrigin {
    secret: IssuerSecret,
}

impl StaticSecretOrigin {
    pub fn new(secret: IssuerSecret) -> Self {
        Self { secret }
    }
}

#[async_trait]
impl SecretOrigin for StaticSecretOrigin {
    async fn fetch_issuer_secret(&self) -> Result<IssuerSecret, OriginError> {
        tracing::warn!("using static issuer secret; do not use this origin in production");
        Ok(self.secret.clone())
    }

    fn name(&self) -> &str {
        "static"
    }
}
