use std::str::FromStr;

use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use tracing::{info, warn};

use crate::error::Result;
use crate::types::AnalysisResult;

/// Open (creating if missing) the SQLite file and run migrations.
pub async fn connect(db_path: &str) -> Result<sqlx::SqlitePool> {
    let opts = SqliteConnectOptions::from_str(&format!("sqlite:{db_path}"))?.create_if_missing(true);
    let pool = SqlitePoolOptions::new().connect_with(opts).await?;
    sqlx::migrate!("./migrations").run(&pool).await?;
    info!("Database ready at {db_path}");
    Ok(pool)
}

/// Persists the current `AnalysisResult` as one JSON blob under a fixed key.
/// Every save overwrites the previous value; no history is kept.
#[derive(Debug, Clone)]
pub struct ResultStore {
    pool: sqlx::SqlitePool,
    key: String,
}

impl ResultStore {
    pub fn new(pool: sqlx::SqlitePool, key: impl Into<String>) -> Self {
        Self {
            pool,
            key: key.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub async fn save(&self, result: &AnalysisResult) -> Result<()> {
        let blob = serde_json::to_string(result)?;
        sqlx::query(
            r#"
            INSERT INTO kv_store (key, value, updated_at) VALUES (?, ?, ?)
            ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&self.key)
        .bind(blob)
        .bind(Utc::now().timestamp_millis())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// `Ok(None)` when nothing is stored or the stored blob does not parse.
    pub async fn load(&self) -> Result<Option<AnalysisResult>> {
        let blob: Option<String> = sqlx::query_scalar("SELECT value FROM kv_store WHERE key = ?")
            .bind(&self.key)
            .fetch_optional(&self.pool)
            .await?;

        let Some(blob) = blob else {
            return Ok(None);
        };
        match serde_json::from_str(&blob) {
            Ok(result) => Ok(Some(result)),
            Err(e) => {
                warn!(key = %self.key, "Ignoring malformed stored analysis: {e}");
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
pub(crate) async fn memory_pool() -> sqlx::SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    sqlx::migrate!("./migrations").run(&pool).await.unwrap();
    pool
}
