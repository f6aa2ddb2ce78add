//! Persistent index store: opaque blobs keyed by caller-chosen strings.
//!
//! The [`IndexStore`] trait is the storage seam of the pipeline. The
//! SQLite backend writes each blob in a single upsert, so a rebuild is an
//! atomic replace: a query running concurrently always reads either the
//! old or the new complete index, never a partial one. The in-memory
//! backend exists for tests.

use std::collections::HashMap;
use std::sync::RwLock;

use anyhow::Result;
use async_trait::async_trait;
use sqlx::{Row, SqlitePool};

/// Blob storage keyed by index key (`<document>_<strategy>`).
#[async_trait]
pub trait IndexStore: Send + Sync {
    /// Store or atomically replace the blob at `key`.
    async fn put(&self, key: &str, blob: &[u8]) -> Result<()>;
    /// Fetch the blob at `key`, or `None` if absent.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;
}

/// SQLite-backed store.
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl IndexStore for SqliteStore {
    async fn put(&self, key: &str, blob: &[u8]) -> Result<()> {
        let now = chrono::Utc::now().timestamp();
        sqlx::query(
            r#"
            INSERT INTO indexes (key, blob, updated_at) VALUES (?, ?, ?)
            ON CONFLICT(key) DO UPDATE SET
                blob = excluded.blob,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(key)
        .bind(blob)
        .bind(now)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let row = sqlx::query("SELECT blob FROM indexes WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|r| r.get("blob")))
    }
}

/// In-memory store for tests.
#[derive(Default)]
pub struct MemoryStore {
    blobs: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl IndexStore for MemoryStore {
    async fn put(&self, key: &str, blob: &[u8]) -> Result<()> {
        self.blobs
            .write()
            .unwrap()
            .insert(key.to_string(), blob.to_vec());
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.blobs.read().unwrap().get(key).cloned())
    }
}
