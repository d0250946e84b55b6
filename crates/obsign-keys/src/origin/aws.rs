//! AWS STS and Secrets Manager clients for [`FederatedSecretOrigin`].
//!
//! [`FederatedSecretOrigin`]: super::FederatedSecretOrigin

use async_trait::async_trait;
use obsign_core::Timestamp;
use zeroize::Zeroizing;

use super::{
    AssumedRoleCredentials, OriginError, RoleAssumer, SecretStoreClient, TemporaryCredentials,
};

/// Assumes roles with the process's ambient AWS credentials.
pub struct StsRoleAssumer {
    client: aws_sdk_sts::Client,
}

impl StsRoleAssumer {
    pub async fn new(region: &str) -> Self {
        let sdk_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(aws_config::Region::new(region.to_string()))
            .load()
            .await;
        Self::from_client(aws_sdk_sts::Client::new(&sdk_config))
    }

    pub fn from_client(client: aws_sdk_sts::Client) -> Self {
        Self { client }
    }
}

fn non_empty(s: &str) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}

#[async_trait]
impl RoleAssumer for StsRoleAssumer {
    async fn assume_role(
        &self,
        role_arn: &str,
        session_name: &str,
        duration_seconds: i32,
    ) -> Result<AssumedRoleCredentials, OriginError> {
        let resp = self
            .client
            .assume_role()
            .role_arn(role_arn)
            .role_session_name(session_name)
            .duration_seconds(duration_seconds)
            .send()
            .await
            .map_err(|e| {
                OriginError::Authentication(
                    aws_sdk_sts::error::DisplayErrorContext(&e).to_string(),
                )
            })?;

        let Some(creds) = resp.credentials() else {
            return Ok(AssumedRoleCredentials::default());
        };

        let expiration = chrono::DateTime::from_timestamp(creds.expiration().secs(), 0)
            .map(Timestamp::from_utc);

        Ok(AssumedRoleCredentials {
            access_key_id: non_empty(creds.access_key_id()),
            secret_access_key: non_empty(creds.secret_access_key()).map(Zeroizing::new),
            session_token: non_empty(creds.session_token()).map(Zeroizing::new),
            expiration,
        })
    }
}

/// Reads secrets from Secrets Manager with a client built per call from the
/// supplied temporary credentials.
pub struct SecretsManagerSecretStore {
    region: String,
}

impl SecretsManagerSecretStore {
    pub fn new(region: impl Into<String>) -> Self {
        Self {
            region: region.into(),
        }
    }

    fn client(&self, credentials: &TemporaryCredentials) -> aws_sdk_secretsmanager::Client {
        use aws_sdk_secretsmanager::config::{BehaviorVersion, Credentials, Region};

        let provider = Credentials::new(
            credentials.access_key_id.clone(),
            credentials.secret_access_key.as_str(),
            Some(credentials.session_token.to_string()),
            None,
            "sts-assume-role",
        );
        let config = aws_sdk_secretsmanager::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new(self.region.clone()))
            .credentials_provider(provider)
            .build();
        aws_sdk_secretsmanager::Client::from_conf(config)
    }
}

#[async_trait]
impl SecretStoreClient for SecretsManagerSecretStore {
    async fn get_secret_string(
        &self,
        credentials: &TemporaryCredentials,
        secret_id: &str,
        version_stage: &str,
    ) -> Result<Option<Zeroizing<String>>, OriginError> {
        let resp = self
            .client(credentials)
            .get_secret_value()
            .secret_id(secret_id)
            .version_stage(version_stage)
            .send()
            .await
            .map_err(|e| {
                OriginError::SecretRetrieval(
                    aws_sdk_secretsmanager::error::DisplayErrorContext(&e).to_string(),
                )
            })?;

        Ok(resp
            .secret_string()
            .map(|s| Zeroizing::new(s.to_string())))
    }
}
