//! Schema creation for the index store. Idempotent; `ask init` and the
//! tests both run it freely.

use anyhow::Result;
use sqlx::SqlitePool;

use crate::config::Config;
use crate::db;

pub async fn run_migrations(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;
    run_on(&pool).await?;
    pool.close().await;
    Ok(())
}

/// Apply the schema to an already-open pool.
pub async fn run_on(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS indexes (
            key TEXT PRIMARY KEY,
            blob BLOB NOT NULL,
            updated_at INTEGER NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_indexes_updated_at ON indexes(updated_at DESC)")
        .execute(pool)
        .await?;

    Ok(())
}
