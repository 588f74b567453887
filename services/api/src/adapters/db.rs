//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the `StorageService` port from the `core` crate. It keeps every key in one
//! row of the `kv_store` table of a local SQLite file, using `sqlx`.

use async_trait::async_trait;
use medication_tracker_core::ports::{PortError, PortResult, StorageService};
use sqlx::SqlitePool;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the `StorageService` port.
#[derive(Clone)]
pub struct DbAdapter {
    pool: SqlitePool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

fn storage_error(e: sqlx::Error) -> PortError {
    PortError::Storage(e.to_string())
}

//=========================================================================================
// `StorageService` Trait Implementation
//=========================================================================================

#[async_trait]
impl StorageService for DbAdapter {
    async fn get(&self, key: &str) -> PortResult<Option<String>> {
        sqlx::query_scalar::<_, String>("SELECT value FROM kv_store WHERE key = ?1")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(storage_error)
    }

    async fn set(&self, key: &str, value: &str) -> PortResult<()> {
        sqlx::query(
            "INSERT INTO kv_store (key, value) VALUES (?1, ?2) \
             ON CONFLICT (key) DO UPDATE SET value = excluded.value, \
             updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')",
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await
        .map_err(storage_error)?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> PortResult<()> {
        sqlx::query("DELETE FROM kv_store WHERE key = ?1")
            .bind(key)
            .execute(&self.pool)
            .await
            .map_err(storage_error)?;
        Ok(())
    }
}
