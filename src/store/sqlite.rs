use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::Value;
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteSynchronous,
};
use tracing::{debug, info};

use super::{decode_record, merge_record, migrations, PostStore};
use crate::classifier::PostRecord;

/// SQLite-backed [`PostStore`].
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open (or create) the store at `path`, running migrations if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection fails or migrations fail.
    pub async fn new(path: &Path) -> Result<Self> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(Duration::from_secs(10));

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .with_context(|| format!("Failed to open SQLite store at {}", path.display()))?;

        migrations::run(&pool).await?;
        info!(path = %path.display(), "Post store ready");

        Ok(Self { pool })
    }

    /// Get a reference to the connection pool.
    #[must_use]
    pub const fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl PostStore for SqliteStore {
    async fn put(&self, record: &PostRecord) -> Result<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .context("Failed to begin transaction")?;

        let existing: Option<(String,)> =
            sqlx::query_as("SELECT record_json FROM saved_posts WHERE id = ?")
                .bind(&record.id)
                .fetch_optional(&mut *tx)
                .await
                .context("Failed to fetch stored post")?;

        let existing = existing
            .map(|(json,)| serde_json::from_str::<Value>(&json))
            .transpose()
            .with_context(|| format!("Stored post {} is not valid JSON", record.id))?;
        let merged = merge_record(existing, record)?;

        sqlx::query(
            r"
            INSERT INTO saved_posts (id, record_json, post_type, saved_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                record_json = excluded.record_json,
                post_type = excluded.post_type,
                saved_at = excluded.saved_at,
                updated_at = datetime('now')
            ",
        )
        .bind(&record.id)
        .bind(merged.to_string())
        .bind(record.post_type.as_str())
        .bind(&record.saved_at)
        .execute(&mut *tx)
        .await
        .context("Failed to save post")?;

        tx.commit().await.context("Failed to commit saved post")?;
        debug!(post_id = %record.id, post_type = %record.post_type, "Saved post");
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Option<PostRecord>> {
        let row: Option<(String,)> =
            sqlx::query_as("SELECT record_json FROM saved_posts WHERE id = ?")
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .context("Failed to fetch post")?;

        row.map(|(json,)| {
            let value = serde_json::from_str(&json)
                .with_context(|| format!("Stored post {id} is not valid JSON"))?;
            decode_record(id, value)
        })
        .transpose()
    }

    async fn get_all(&self) -> Result<BTreeMap<String, PostRecord>> {
        self.get_all_raw()
            .await?
            .into_iter()
            .map(|(id, value)| {
                let record = decode_record(&id, value)?;
                Ok((id, record))
            })
            .collect()
    }

    async fn get_all_raw(&self) -> Result<BTreeMap<String, Value>> {
        let rows: Vec<(String, String)> =
            sqlx::query_as("SELECT id, record_json FROM saved_posts ORDER BY id")
                .fetch_all(&self.pool)
                .await
                .context("Failed to fetch saved posts")?;

        rows.into_iter()
            .map(|(id, json)| {
                let value = serde_json::from_str(&json)
                    .with_context(|| format!("Stored post {id} is not valid JSON"))?;
                Ok((id, value))
            })
            .collect()
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM saved_posts WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to delete post")?;

        Ok(result.rows_affected() > 0)
    }

    async fn clear(&self) -> Result<bool> {
        let result = sqlx::query("DELETE FROM saved_posts")
            .execute(&self.pool)
            .await
            .context("Failed to clear saved posts")?;

        info!(removed = result.rows_affected(), "Cleared post store");
        Ok(true)
    }

    async fn usage_bytes(&self) -> Result<u64> {
        let (bytes,): (i64,) = sqlx::query_as(
            "SELECT COALESCE(SUM(LENGTH(CAST(record_json AS BLOB))), 0) FROM saved_posts",
        )
        .fetch_one(&self.pool)
        .await
        .context("Failed to compute storage usage")?;

        Ok(u64::try_from(bytes).unwrap_or(0))
    }

    async fn contains(&self, id: &str) -> Result<bool> {
        let row: Option<(i64,)> = sqlx::query_as("SELECT 1 FROM saved_posts WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to check saved post")?;

        Ok(row.is_some())
    }
}
