use std::path::Path;

use chrono::{DateTime, Utc};
use sqlx::sqlite::SqlitePool;
use wren_core::MediaInfo;

use crate::error::DbError;
use crate::rows::format_ts;
use crate::schema::{FTS_TABLE, FTS_TRIGGERS, SCHEMA};
use crate::Result;

/// The embedded store: chats, messages and the full-text index.
pub struct WrenDb {
    pub(crate) pool: SqlitePool,
}

/// A message to persist, produced by the sync handlers.
#[derive(Debug, Clone)]
pub struct NewMessage {
    pub id: String,
    pub chat_jid: String,
    pub sender: String,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    pub is_from_me: bool,
    pub media: Option<MediaInfo>,
}

/// Download metadata for a stored message, all fields as persisted.
#[derive(Debug, sqlx::FromRow)]
pub struct MediaRecord {
    pub media_type: Option<String>,
    pub filename: Option<String>,
    pub url: Option<String>,
    pub media_key: Option<Vec<u8>>,
    pub file_sha256: Option<Vec<u8>>,
    pub file_enc_sha256: Option<Vec<u8>>,
    pub file_length: Option<i64>,
}

impl WrenDb {
    /// Opens (creating if needed) `messages.db` under `db_dir` and runs the
    /// schema migration. Fails fast when FTS5 is unavailable.
    pub async fn open(db_dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(db_dir)?;
        let db_path = db_dir.join("messages.db");
        let url = format!("sqlite:{}?mode=rwc", db_path.display());
        let pool = SqlitePool::connect(&url).await?;
        migrate(&pool).await?;
        tracing::info!(path = %db_path.display(), "message store ready");
        Ok(Self { pool })
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }

    /// Stored name for a chat: `None` when the row is absent,
    /// `Some(None)` when the row exists without a name.
    pub async fn chat_name(&self, jid: &str) -> Result<Option<Option<String>>> {
        let row = sqlx::query_scalar::<_, Option<String>>("SELECT name FROM chats WHERE jid = ?")
            .bind(jid)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|name| name.filter(|n| !n.is_empty())))
    }

    /// Inserts a chat row if none exists; an existing row is left untouched.
    pub async fn insert_chat_if_absent(&self, jid: &str, name: &str) -> Result<()> {
        sqlx::query("INSERT INTO chats (jid, name) VALUES (?, ?) ON CONFLICT(jid) DO NOTHING")
            .bind(jid)
            .bind(name)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn set_chat_name(&self, jid: &str, name: &str) -> Result<()> {
        sqlx::query("UPDATE chats SET name = ? WHERE jid = ?")
            .bind(name)
            .bind(jid)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Replaces the chat row. Re-applying the same event is a no-op in effect.
    pub async fn upsert_chat(
        &self,
        jid: &str,
        name: &str,
        last_message_time: &DateTime<Utc>,
    ) -> Result<()> {
        sqlx::query("INSERT OR REPLACE INTO chats (jid, name, last_message_time) VALUES (?, ?, ?)")
            .bind(jid)
            .bind(name)
            .bind(format_ts(last_message_time))
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Insert-or-replace on the `(id, chat_jid)` key; the FTS triggers keep
    /// the index in step within the same transaction.
    pub async fn insert_message(&self, msg: &NewMessage) -> Result<()> {
        let media = msg.media.as_ref();
        let content = if msg.content.is_empty() {
            None
        } else {
            Some(msg.content.as_str())
        };
        sqlx::query(
            r#"INSERT OR REPLACE INTO messages
               (id, chat_jid, sender, content, timestamp, is_from_me,
                media_type, filename, url, media_key, file_sha256, file_enc_sha256, file_length)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(&msg.id)
        .bind(&msg.chat_jid)
        .bind(&msg.sender)
        .bind(content)
        .bind(format_ts(&msg.timestamp))
        .bind(msg.is_from_me)
        .bind(media.map(|m| m.media_type))
        .bind(media.map(|m| m.filename.as_str()))
        .bind(media.map(|m| m.url.as_str()))
        .bind(media.map(|m| m.media_key.as_slice()))
        .bind(media.map(|m| m.file_sha256.as_slice()))
        .bind(media.map(|m| m.file_enc_sha256.as_slice()))
        .bind(media.map(|m| m.file_length as i64))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn media_record(&self, message_id: &str, chat_jid: &str) -> Result<Option<MediaRecord>> {
        let record = sqlx::query_as::<_, MediaRecord>(
            "SELECT media_type, filename, url, media_key, file_sha256, file_enc_sha256, file_length
             FROM messages WHERE id = ? AND chat_jid = ?",
        )
        .bind(message_id)
        .bind(chat_jid)
        .fetch_optional(&self.pool)
        .await?;
        Ok(record)
    }

    /// Every chat row, for the post-connect name backfill.
    pub async fn all_chats(&self) -> Result<Vec<(String, Option<String>)>> {
        let rows = sqlx::query_as::<_, (String, Option<String>)>("SELECT jid, name FROM chats")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    /// Case-insensitive substring match on chat names, for recipient lookup.
    pub async fn match_chats_by_name(&self, query: &str, limit: i64) -> Result<Vec<(String, String)>> {
        let rows = sqlx::query_as::<_, (String, String)>(
            "SELECT jid, name FROM chats
             WHERE name IS NOT NULL AND LOWER(name) LIKE LOWER(?)
             ORDER BY name LIMIT ?",
        )
        .bind(format!("%{query}%"))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn chat_count(&self) -> Result<i64> {
        Ok(sqlx::query_scalar("SELECT COUNT(*) FROM chats")
            .fetch_one(&self.pool)
            .await?)
    }

    pub async fn message_count(&self) -> Result<i64> {
        Ok(sqlx::query_scalar("SELECT COUNT(*) FROM messages")
            .fetch_one(&self.pool)
            .await?)
    }
}

async fn migrate(pool: &SqlitePool) -> Result<()> {
    sqlx::raw_sql(SCHEMA).execute(pool).await?;

    if let Err(err) = sqlx::raw_sql(FTS_TABLE).execute(pool).await {
        let msg = err.to_string();
        let lower = msg.to_lowercase();
        if lower.contains("fts5") || lower.contains("no such module") {
            return Err(DbError::FtsUnavailable(msg));
        }
        return Err(err.into());
    }

    sqlx::raw_sql(FTS_TRIGGERS).execute(pool).await?;

    let present: Option<String> = sqlx::query_scalar(
        "SELECT name FROM sqlite_master WHERE type = 'table' AND name = 'messages_fts'",
    )
    .fetch_optional(pool)
    .await?;
    if present.is_none() {
        return Err(DbError::FtsMissing);
    }

    // Backfill the index for rows that predate the triggers.
    let _ = sqlx::query("INSERT INTO messages_fts(messages_fts) VALUES ('rebuild')")
        .execute(pool)
        .await;

    Ok(())
}
