//! SQLite backend — durable conversation documents with optimistic locking.
//!
//! One row per identity: the conversation serialized as a JSON document
//! plus a version column. Saves are compare-and-swap:
//! `UPDATE ... WHERE user = ? AND version = ?` — zero affected rows means
//! either a brand-new identity (insert) or a stale writer (conflict).

use async_trait::async_trait;
use riad_core::adapter::ConversationStore;
use riad_core::conversation::{Conversation, UserId};
use riad_core::error::StoreError;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Row, SqlitePool};
use std::str::FromStr;
use tracing::{debug, info};

/// A durable SQLite conversation store.
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Create a new SQLite store from a file path.
    ///
    /// The database and schema are created automatically. Pass
    /// `":memory:"` for an in-process ephemeral database (useful for
    /// tests).
    pub async fn new(path: &str) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str(path)
            .map_err(|e| StoreError::Unavailable(format!("Invalid SQLite path: {e}")))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal);

        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(options)
            .await
            .map_err(|e| StoreError::Unavailable(format!("Failed to open SQLite: {e}")))?;

        let store = Self { pool };
        store.run_migrations().await?;
        info!("SQLite conversation store initialized at {path}");
        Ok(store)
    }

    async fn run_migrations(&self) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS conversations (
                user        TEXT PRIMARY KEY,
                doc         TEXT NOT NULL,
                version     INTEGER NOT NULL,
                updated_at  TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Unavailable(format!("conversations table: {e}")))?;

        debug!("SQLite migrations complete");
        Ok(())
    }
}

#[async_trait]
impl ConversationStore for SqliteStore {
    async fn load(&self, user: &UserId) -> Result<Option<Conversation>, StoreError> {
        let row = sqlx::query("SELECT doc FROM conversations WHERE user = ?")
            .bind(&user.0)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StoreError::Unavailable(format!("load: {e}")))?;

        let Some(row) = row else {
            return Ok(None);
        };

        let doc: String = row
            .try_get("doc")
            .map_err(|e| StoreError::Unavailable(format!("doc column: {e}")))?;

        let conversation: Conversation = serde_json::from_str(&doc)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        Ok(Some(conversation))
    }

    async fn save(&self, conversation: &Conversation) -> Result<(), StoreError> {
        let doc = serde_json::to_string(conversation)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        let expected = conversation.version.saturating_sub(1);

        let result = sqlx::query(
            "UPDATE conversations SET doc = ?, version = ?, updated_at = ? \
             WHERE user = ? AND version = ?",
        )
        .bind(&doc)
        .bind(conversation.version as i64)
        .bind(conversation.updated_at.to_rfc3339())
        .bind(&conversation.user.0)
        .bind(expected as i64)
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Unavailable(format!("save: {e}")))?;

        if result.rows_affected() == 1 {
            return Ok(());
        }

        // No matching row: new identity, or a stale writer.
        let stored: Option<i64> =
            sqlx::query_scalar("SELECT version FROM conversations WHERE user = ?")
                .bind(&conversation.user.0)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| StoreError::Unavailable(format!("version check: {e}")))?;

        match stored {
            Some(version) => Err(StoreError::Conflict {
                user: conversation.user.0.clone(),
                stored: version as u64,
                expected,
            }),
            None => {
                sqlx::query(
                    "INSERT INTO conversations (user, doc, version, updated_at) \
                     VALUES (?, ?, ?, ?)",
                )
                .bind(&conversation.user.0)
                .bind(&doc)
                .bind(conversation.version as i64)
                .bind(conversation.updated_at.to_rfc3339())
                .execute(&self.pool)
                .await
                .map_err(|e| StoreError::Unavailable(format!("insert: {e}")))?;
                Ok(())
            }
        }
    }
}
