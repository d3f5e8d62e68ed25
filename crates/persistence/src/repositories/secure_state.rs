//! Secure state repository backing the key/value store.

use async_trait::async_trait;
use chrono::Utc;
use domain::error::StorageError;
use domain::services::SecureStateStore;
use sqlx::SqlitePool;
use tracing::{debug, error};

use crate::entities::SecureEntryEntity;
use crate::metrics::QueryTimer;

/// Repository for secure state rows.
#[derive(Clone)]
pub struct SecureStateRepository {
    pool: SqlitePool,
}

impl SecureStateRepository {
    /// Creates a new SecureStateRepository with the given connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Returns a reference to the connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Find an entry by key.
    pub async fn find(&self, key: &str) -> Result<Option<SecureEntryEntity>, sqlx::Error> {
        let timer = QueryTimer::new("secure_state_find");
        let result = sqlx::query_as::<_, SecureEntryEntity>(
            r#"
            SELECT key, value, updated_at
            FROM secure_state
            WHERE key = ?1
            "#,
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Insert or replace the entry for `key`.
    pub async fn upsert(&self, key: &str, value: &str) -> Result<(), sqlx::Error> {
        let timer = QueryTimer::new("secure_state_upsert");
        let result = sqlx::query(
            r#"
            INSERT INTO secure_state (key, value, updated_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT (key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(key)
        .bind(value)
        .bind(Utc::now())
        .execute(&self.pool)
        .await;
        timer.record();
        result.map(|_| ())
    }

    /// Delete the entry for `key`.
    /// Returns the number of deleted rows.
    pub async fn remove(&self, key: &str) -> Result<u64, sqlx::Error> {
        let timer = QueryTimer::new("secure_state_remove");
        let result = sqlx::query("DELETE FROM secure_state WHERE key = ?1")
            .bind(key)
            .execute(&self.pool)
            .await;
        timer.record();
        Ok(result?.rows_affected())
    }
}

fn storage_error(operation: &'static str, key: &str, err: sqlx::Error) -> StorageError {
    error!(operation, key, error = %err, "Secure state query failed");
    StorageError::Io(err.to_string())
}

#[async_trait]
impl SecureStateStore for SecureStateRepository {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.find(key)
            .await
            .map(|entry| entry.map(|e| e.value))
            .map_err(|e| storage_error("get", key, e))
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.upsert(key, value)
            .await
            .map_err(|e| storage_error("set", key, e))
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        let removed = self
            .remove(key)
            .await
            .map_err(|e| storage_error("delete", key, e))?;
        debug!(key, removed, "Secure state entry removed");
        Ok(())
    }
}
