//! # Key Storage
//!
//! Storage holds at most one active [`SigningKeyRecord`]. The invariant is
//! enforced by the backend itself, not by callers: Postgres through a
//! single-value primary key (`slot = 1`), the in-memory store through a
//! single `Option` slot behind a lock. Inserting when a record already
//! exists is not an error; it reports [`InsertOutcome::AlreadyExists`] and
//! the caller re-reads.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use obsign_core::{DidKey, Timestamp};
use parking_lot::RwLock;
use sqlx::postgres::{PgPool, PgPoolOptions};
use thiserror::Error;

use crate::record::SigningKeyRecord;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("migration failed: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A stored row could not be mapped back into a record.
    #[error("corrupt signing key row: {0}")]
    Corrupt(String),
}

/// Result of [`KeyStore::insert_if_absent`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertOutcome {
    /// The record was stored; carries storage-assigned fields.
    Inserted(SigningKeyRecord),
    /// Another writer got there first. Nothing was written.
    AlreadyExists,
}

/// Single-slot storage for the issuer signing key.
#[async_trait]
pub trait KeyStore: Send + Sync {
    /// The active record, if one has been created.
    async fn fetch_active(&self) -> Result<Option<SigningKeyRecord>, StoreError>;

    /// Store `record` unless a record already exists.
    async fn insert_if_absent(
        &self,
        record: &SigningKeyRecord,
    ) -> Result<InsertOutcome, StoreError>;

    fn backend_name(&self) -> &str;
}

// ---------------------------------------------------------------------------
// In-memory
// ---------------------------------------------------------------------------

/// Process-local store for development and tests.
#[derive(Debug, Default)]
pub struct MemoryKeyStore {
    slot: RwLock<Option<SigningKeyRecord>>,
}

impl MemoryKeyStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyStore for MemoryKeyStore {
    async fn fetch_active(&self) -> Result<Option<SigningKeyRecord>, StoreError> {
        Ok(self.slot.read().clone())
    }

    async fn insert_if_absent(
        &self,
        record: &SigningKeyRecord,
    ) -> Result<InsertOutcome, StoreError> {
        let mut slot = self.slot.write();
        if slot.is_some() {
            return Ok(InsertOutcome::AlreadyExists);
        }
        let mut stored = record.clone();
        stored.created_at = Some(Timestamp::now());
        *slot = Some(stored.clone());
        Ok(InsertOutcome::Inserted(stored))
    }

    fn backend_name(&self) -> &str {
        "memory"
    }
}

// ---------------------------------------------------------------------------
// Postgres
// ---------------------------------------------------------------------------

/// Connect to Postgres and apply the embedded migrations.
pub async fn init_pool(database_url: &str) -> Result<PgPool, StoreError> {
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .min_connections(1)
        .acquire_timeout(std::time::Duration::from_secs(5))
        .connect(database_url)
        .await?;
    tracing::info!("Connected to PostgreSQL");

    sqlx::migrate!("./migrations").run(&pool).await?;
    tracing::info!("Database migrations applied");

    Ok(pool)
}

/// `signing_keys` table backend.
#[derive(Debug, Clone)]
pub struct PgKeyStore {
    pool: PgPool,
}

impl PgKeyStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl KeyStore for PgKeyStore {
    async fn fetch_active(&self) -> Result<Option<SigningKeyRecord>, StoreError> {
        let row = sqlx::query_as::<_, SigningKeyRow>(
            "SELECT id, public_key_multibase, secret_key_multibase, seed, created_at
             FROM signing_keys WHERE slot = 1",
        )
        .fetch_optional(&self.pool)
        .await?;

        row.map(SigningKeyRow::into_record).transpose()
    }

    async fn insert_if_absent(
        &self,
        record: &SigningKeyRecord,
    ) -> Result<InsertOutcome, StoreError> {
        let created_at: Option<DateTime<Utc>> = sqlx::query_scalar(
            "INSERT INTO signing_keys (slot, id, public_key_multibase, secret_key_multibase, seed)
             VALUES (1, $1, $2, $3, $4)
             ON CONFLICT DO NOTHING
             RETURNING created_at",
        )
        .bind(record.id.as_str())
        .bind(&record.public_key_multibase)
        .bind(&record.secret_key_multibase)
        .bind(record.seed.as_deref())
        .fetch_optional(&self.pool)
        .await?;

        Ok(match created_at {
            Some(ts) => {
                let mut stored = record.clone();
                stored.created_at = Some(Timestamp::from_utc(ts));
                InsertOutcome::Inserted(stored)
            }
            None => InsertOutcome::AlreadyExists,
        })
    }

    fn backend_name(&self) -> &str {
        "postgres"
    }
}

/// Internal row type for SQLx mapping.
#[derive(sqlx::FromRow)]
struct SigningKeyRow {
    id: String,
    public_key_multibase: String,
    secret_key_multibase: String,
    seed: Option<String>,
    created_at: DateTime<Utc>,
}

impl SigningKeyRow {
    fn into_record(self) -> Result<SigningKeyRecord, StoreError> {
        let id = DidKey::parse(&self.id).map_err(|e| StoreError::Corrupt(e.to_string()))?;
        Ok(SigningKeyRecord {
            id,
            public_key_multibase: self.public_key_multibase,
            secret_key_multibase: self.secret_key_multibase,
            seed: self.seed,
            created_at: Some(Timestamp::from_utc(self.created_at)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(mb: &str) -> SigningKeyRecord {
        SigningKeyRecord {
            id: DidKey::from_public_key_multibase(mb).unwrap(),
            public_key_multibase: mb.to_string(),
            secret_key_multibase: "AQID".to_string(),
            seed: None,
            created_at: None,
        }
    }

    #[tokio::test]
    async fn test_memory_store_starts_empty() {
        let store = MemoryKeyStore::new();
        assert!(store.fetch_active().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_memory_store_first_insert_wins() {
        let store = MemoryKeyStore::new();
        let first = record("z6MktwupdmLXVVqTzCw4i46r4uGyosGXRnR3XjN4Zq7oMMsw");
        let second = record("z6MkhaXgBZDvotDkL5257faiztiGiC2QtKLGpbnnEGta2doK");

        let outcome = store.insert_if_absent(&first).await.unwrap();
        let stored = match outcome {
            InsertOutcome::Inserted(r) => r,
            other => panic!("expected Inserted, got {other:?}"),
        };
        assert!(stored.created_at.is_some());

        assert_eq!(
            store.insert_if_absent(&second).await.unwrap(),
            InsertOutcome::AlreadyExists
        );
        assert_eq!(store.fetch_active().await.unwrap().unwrap().id, first.id);
    }

    #[test]
    fn test_row_with_bad_id_is_corrupt() {
        let row = SigningKeyRow {
            id: "not-a-did".into(),
            public_key_multibase: "z6Mk".into(),
            secret_key_multibase: "AQID".into(),
            seed: None,
            created_at: Utc::now(),
        };
        assert!(matches!(row.into_record(), Err(StoreError::Corrupt(_))));
    }
}
