use chrono::{DateTime, Utc};
use wren_core::{ActiveChat, Chat, MediaSummary, MessageContext, MessageRecord, SearchHit};

use crate::error::DbError;
use crate::repository::WrenDb;
use crate::rows::{format_ts, ActiveChatRow, ChatRow, MessageRow};
use crate::Result;

/// Messages matching a search hit are expanded with this many neighbours on
/// each side.
const SEARCH_CONTEXT: i64 = 2;

const MESSAGE_SELECT: &str = "SELECT m.id AS id, m.chat_jid AS chat_jid, m.sender AS sender, \
     c.name AS chat_name, m.content AS content, m.timestamp AS timestamp, \
     m.is_from_me AS is_from_me, m.media_type AS media_type \
     FROM messages m JOIN chats c ON m.chat_jid = c.jid";

/// Filters for `list_messages`. Timestamp bounds are inclusive-exclusive.
#[derive(Debug, Default, Clone)]
pub struct MessageFilter {
    pub after: Option<DateTime<Utc>>,
    pub before: Option<DateTime<Utc>>,
    pub chat_jid: Option<String>,
    pub sender: Option<String>,
    pub limit: i64,
    pub page: i64,
}

#[derive(Debug)]
pub struct SearchResults {
    pub hits: Vec<SearchHit>,
    /// True when the full-text query could not be parsed and the substring
    /// fallback served the results.
    pub fallback_used: bool,
}

fn clamp_limit(limit: i64) -> i64 {
    if limit <= 0 {
        20
    } else {
        limit.min(200)
    }
}

fn clamp_page(page: i64) -> i64 {
    page.max(0)
}

impl WrenDb {
    pub async fn count_chats(&self, query: Option<&str>) -> Result<i64> {
        let count = match query.filter(|s| !s.is_empty()) {
            Some(term) => {
                let pattern = format!("%{term}%");
                sqlx::query_scalar::<_, i64>(
                    "SELECT COUNT(*) FROM chats WHERE (LOWER(name) LIKE LOWER(?) OR jid LIKE ?)",
                )
                .bind(&pattern)
                .bind(&pattern)
                .fetch_one(&self.pool)
                .await?
            }
            None => {
                sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM chats")
                    .fetch_one(&self.pool)
                    .await?
            }
        };
        Ok(count)
    }

    /// Chats sorted by recency, each with a preview of its latest message.
    pub async fn list_chats(
        &self,
        query: Option<&str>,
        only_groups: bool,
        limit: i64,
        page: i64,
    ) -> Result<Vec<Chat>> {
        let limit = clamp_limit(limit);
        let page = clamp_page(page);

        let mut sql = String::from(
            "SELECT chats.jid AS jid, chats.name AS name, \
             chats.last_message_time AS last_message_time, \
             m.content AS last_message, m.sender AS last_sender, \
             m.is_from_me AS last_is_from_me \
             FROM chats \
             LEFT JOIN messages m \
               ON chats.jid = m.chat_jid AND chats.last_message_time = m.timestamp",
        );
        let mut clauses: Vec<&str> = Vec::new();
        let mut args: Vec<String> = Vec::new();
        if let Some(term) = query.filter(|s| !s.is_empty()) {
            clauses.push("(LOWER(chats.name) LIKE LOWER(?) OR chats.jid LIKE ?)");
            args.push(format!("%{term}%"));
            args.push(format!("%{term}%"));
        }
        if only_groups {
            clauses.push("chats.jid LIKE '%@g.us'");
        }
        if !clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }
        sql.push_str(" ORDER BY datetime(chats.last_message_time) DESC LIMIT ? OFFSET ?");

        let mut q = sqlx::query_as::<_, ChatRow>(&sql);
        for arg in &args {
            q = q.bind(arg);
        }
        let rows = q
            .bind(limit)
            .bind(page * limit)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(ChatRow::into_chat).collect())
    }

    pub async fn get_chat(&self, jid: &str, include_last: bool) -> Result<Option<Chat>> {
        let row = sqlx::query_as::<_, (String, Option<String>, Option<String>)>(
            "SELECT jid, name, last_message_time FROM chats WHERE jid = ?",
        )
        .bind(jid)
        .fetch_optional(&self.pool)
        .await?;

        let Some((jid, name, last_message_time)) = row else {
            return Ok(None);
        };
        let mut chat = ChatRow {
            jid,
            name,
            last_message_time,
            last_message: None,
            last_sender: None,
            last_is_from_me: None,
        }
        .into_chat();

        if include_last {
            let preview = sqlx::query_as::<_, (Option<String>, Option<String>, Option<bool>)>(
                "SELECT content, sender, is_from_me FROM messages \
                 WHERE chat_jid = ? ORDER BY datetime(timestamp) DESC LIMIT 1",
            )
            .bind(&chat.jid)
            .fetch_optional(&self.pool)
            .await?;
            if let Some((content, sender, is_from_me)) = preview {
                chat.last_message = content;
                chat.last_sender = sender;
                chat.last_is_from_me = is_from_me;
            }
        }
        Ok(Some(chat))
    }

    pub async fn list_messages(&self, filter: &MessageFilter) -> Result<Vec<MessageRecord>> {
        let limit = clamp_limit(filter.limit);
        let page = clamp_page(filter.page);

        let mut sql = String::from(MESSAGE_SELECT);
        let mut clauses: Vec<&str> = Vec::new();
        let mut args: Vec<String> = Vec::new();
        if let Some(after) = &filter.after {
            clauses.push("datetime(m.timestamp) >= datetime(?)");
            args.push(format_ts(after));
        }
        if let Some(before) = &filter.before {
            clauses.push("datetime(m.timestamp) < datetime(?)");
            args.push(format_ts(before));
        }
        if let Some(sender) = filter.sender.as_deref().filter(|s| !s.is_empty()) {
            clauses.push("m.sender = ?");
            args.push(sender.to_string());
        }
        if let Some(chat_jid) = filter.chat_jid.as_deref().filter(|s| !s.is_empty()) {
            clauses.push("m.chat_jid = ?");
            args.push(chat_jid.to_string());
        }
        if !clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }
        sql.push_str(" ORDER BY datetime(m.timestamp) DESC LIMIT ? OFFSET ?");

        let mut q = sqlx::query_as::<_, MessageRow>(&sql);
        for arg in &args {
            q = q.bind(arg);
        }
        let rows = q
            .bind(limit)
            .bind(page * limit)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(MessageRow::into_record).collect())
    }

    /// Full-text search with ±2 context expansion per hit. A query the FTS
    /// engine cannot parse falls back to a substring search transparently.
    pub async fn search_messages(
        &self,
        query: &str,
        after: Option<DateTime<Utc>>,
        before: Option<DateTime<Utc>>,
        limit: i64,
        page: i64,
    ) -> Result<SearchResults> {
        let limit = clamp_limit(limit);
        let page = clamp_page(page);

        let mut bounds: Vec<&str> = Vec::new();
        let mut bound_args: Vec<String> = Vec::new();
        if let Some(after) = &after {
            bounds.push("datetime(m.timestamp) >= datetime(?)");
            bound_args.push(format_ts(after));
        }
        if let Some(before) = &before {
            bounds.push("datetime(m.timestamp) < datetime(?)");
            bound_args.push(format_ts(before));
        }

        let mut fts_sql = String::from(
            "SELECT m.id AS id, m.chat_jid AS chat_jid, m.sender AS sender, \
             c.name AS chat_name, m.content AS content, m.timestamp AS timestamp, \
             m.is_from_me AS is_from_me, m.media_type AS media_type \
             FROM messages_fts f \
             JOIN messages m ON m.rowid = f.rowid \
             JOIN chats c ON m.chat_jid = c.jid \
             WHERE messages_fts MATCH ?",
        );
        for clause in &bounds {
            fts_sql.push_str(" AND ");
            fts_sql.push_str(clause);
        }
        fts_sql.push_str(" ORDER BY datetime(m.timestamp) DESC LIMIT ? OFFSET ?");

        let mut q = sqlx::query_as::<_, MessageRow>(&fts_sql);
        q = q.bind(query);
        for arg in &bound_args {
            q = q.bind(arg);
        }
        let fts_result = q.bind(limit).bind(page * limit).fetch_all(&self.pool).await;

        let (rows, fallback_used) = match fts_result {
            Ok(rows) => (rows, false),
            Err(err) => {
                tracing::debug!(%err, "full-text query failed, using substring fallback");
                let mut like_sql = String::from(MESSAGE_SELECT);
                like_sql.push_str(" WHERE LOWER(m.content) LIKE LOWER(?)");
                for clause in &bounds {
                    like_sql.push_str(" AND ");
                    like_sql.push_str(clause);
                }
                like_sql.push_str(" ORDER BY datetime(m.timestamp) DESC LIMIT ? OFFSET ?");

                let mut q = sqlx::query_as::<_, MessageRow>(&like_sql);
                q = q.bind(format!("%{query}%"));
                for arg in &bound_args {
                    q = q.bind(arg);
                }
                let rows = q.bind(limit).bind(page * limit).fetch_all(&self.pool).await?;
                (rows, true)
            }
        };

        let mut hits = Vec::with_capacity(rows.len());
        for row in rows {
            let record = row.into_record();
            let context_before = self
                .neighbours(&record.chat_jid, &record.timestamp, SEARCH_CONTEXT, true)
                .await?;
            let context_after = self
                .neighbours(&record.chat_jid, &record.timestamp, SEARCH_CONTEXT, false)
                .await?;
            hits.push(SearchHit {
                message: record,
                context_before,
                context_after,
            });
        }

        Ok(SearchResults {
            hits,
            fallback_used,
        })
    }

    pub async fn get_message_context(
        &self,
        message_id: &str,
        before: i64,
        after: i64,
    ) -> Result<MessageContext> {
        let mut sql = String::from(MESSAGE_SELECT);
        sql.push_str(" WHERE m.id = ? LIMIT 1");
        let row = sqlx::query_as::<_, MessageRow>(&sql)
            .bind(message_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::MessageNotFound(message_id.to_string()))?;
        let message = row.into_record();

        let before_msgs = self
            .neighbours(&message.chat_jid, &message.timestamp, before, true)
            .await?;
        let after_msgs = self
            .neighbours(&message.chat_jid, &message.timestamp, after, false)
            .await?;

        Ok(MessageContext {
            message,
            before: before_msgs,
            after: after_msgs,
        })
    }

    /// Chats ranked by message volume inside a window.
    pub async fn get_active_chats(
        &self,
        after: DateTime<Utc>,
        before: DateTime<Utc>,
        only_groups: bool,
        limit: i64,
    ) -> Result<Vec<ActiveChat>> {
        let mut sql = String::from(
            "SELECT m.chat_jid AS chat_jid, c.name AS name, COUNT(*) AS message_count \
             FROM messages m JOIN chats c ON m.chat_jid = c.jid \
             WHERE datetime(m.timestamp) >= datetime(?) AND datetime(m.timestamp) < datetime(?)",
        );
        if only_groups {
            sql.push_str(" AND m.chat_jid LIKE '%@g.us'");
        }
        sql.push_str(" GROUP BY m.chat_jid ORDER BY message_count DESC LIMIT ?");

        let rows = sqlx::query_as::<_, ActiveChatRow>(&sql)
            .bind(format_ts(&after))
            .bind(format_ts(&before))
            .bind(clamp_limit(limit))
            .fetch_all(&self.pool)
            .await?;
        Ok(rows
            .into_iter()
            .map(|row| ActiveChat {
                jid: row.chat_jid,
                name: row.name.filter(|n| !n.is_empty()),
                message_count: row.message_count,
                recent_messages: Vec::new(),
            })
            .collect())
    }

    /// Incoming messages whose content ends with a question mark.
    pub async fn get_questions_for_me(
        &self,
        after: DateTime<Utc>,
        before: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<MessageRecord>> {
        let mut sql = String::from(MESSAGE_SELECT);
        sql.push_str(
            " WHERE m.is_from_me = 0 AND m.content IS NOT NULL AND m.content LIKE ? \
             AND datetime(m.timestamp) >= datetime(?) AND datetime(m.timestamp) < datetime(?) \
             ORDER BY datetime(m.timestamp) DESC LIMIT ?",
        );
        let rows = sqlx::query_as::<_, MessageRow>(&sql)
            .bind("%?")
            .bind(format_ts(&after))
            .bind(format_ts(&before))
            .bind(clamp_limit(limit))
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(MessageRow::into_record).collect())
    }

    /// Media counts inside a window, bucketed by carrier type.
    pub async fn get_media_summary(
        &self,
        after: DateTime<Utc>,
        before: DateTime<Utc>,
    ) -> Result<MediaSummary> {
        let rows = sqlx::query_as::<_, (String, i64)>(
            "SELECT media_type, COUNT(*) FROM messages \
             WHERE media_type IS NOT NULL AND media_type != '' \
             AND datetime(timestamp) >= datetime(?) AND datetime(timestamp) < datetime(?) \
             GROUP BY media_type",
        )
        .bind(format_ts(&after))
        .bind(format_ts(&before))
        .fetch_all(&self.pool)
        .await?;

        let mut summary = MediaSummary::default();
        for (media_type, count) in rows {
            if media_type.contains("image") {
                summary.images += count;
            } else if media_type.contains("video") {
                summary.videos += count;
            } else if media_type.contains("audio") {
                summary.audio += count;
            } else if media_type.contains("document") {
                summary.documents += count;
            }
        }
        Ok(summary)
    }

    pub async fn message_count_between(
        &self,
        after: DateTime<Utc>,
        before: DateTime<Utc>,
        only_groups: bool,
    ) -> Result<i64> {
        let mut sql = String::from(
            "SELECT COUNT(*) FROM messages \
             WHERE datetime(timestamp) >= datetime(?) AND datetime(timestamp) < datetime(?)",
        );
        if only_groups {
            sql.push_str(" AND chat_jid LIKE '%@g.us'");
        }
        let count = sqlx::query_scalar::<_, i64>(&sql)
            .bind(format_ts(&after))
            .bind(format_ts(&before))
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Fetches up to `count` messages adjacent to `pivot` in the same chat.
    /// Results come back in ascending timestamp order.
    async fn neighbours(
        &self,
        chat_jid: &str,
        pivot: &DateTime<Utc>,
        count: i64,
        earlier: bool,
    ) -> Result<Vec<MessageRecord>> {
        if count <= 0 {
            return Ok(Vec::new());
        }
        let mut sql = String::from(MESSAGE_SELECT);
        if earlier {
            sql.push_str(
                " WHERE m.chat_jid = ? AND datetime(m.timestamp) < datetime(?) \
                 ORDER BY datetime(m.timestamp) DESC LIMIT ?",
            );
        } else {
            sql.push_str(
                " WHERE m.chat_jid = ? AND datetime(m.timestamp) > datetime(?) \
                 ORDER BY datetime(m.timestamp) ASC LIMIT ?",
            );
        }
        let rows = sqlx::query_as::<_, MessageRow>(&sql)
            .bind(chat_jid)
            .bind(format_ts(pivot))
            .bind(count)
            .fetch_all(&self.pool)
            .await?;
        let mut records: Vec<MessageRecord> =
            rows.into_iter().map(MessageRow::into_record).collect();
        if earlier {
            records.reverse();
        }
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::NewMessage;
    use chrono::TimeZone;

    async fn temp_db() -> (tempfile::TempDir, WrenDb) {
        let dir = tempfile::tempdir().unwrap();
        let db = WrenDb::open(dir.path()).await.unwrap();
        (dir, db)
    }

    fn ts(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).single().unwrap()
    }

    async fn seed_message(
        db: &WrenDb,
        id: &str,
        chat: &str,
        sender: &str,
        body: &str,
        at: i64,
        from_me: bool,
    ) {
        db.insert_message(&NewMessage {
            id: id.to_string(),
            chat_jid: chat.to_string(),
            sender: sender.to_string(),
            content: body.to_string(),
            timestamp: ts(at),
            is_from_me: from_me,
            media: None,
        })
        .await
        .unwrap();
    }

    async fn seed_chat(db: &WrenDb, jid: &str, name: &str, at: i64) {
        db.upsert_chat(jid, name, &ts(at)).await.unwrap();
    }

    const BASE: i64 = 1_700_000_000;

    /// Two chats, five messages in C, one in D.
    async fn seeded() -> (tempfile::TempDir, WrenDb) {
        let (dir, db) = temp_db().await;
        seed_chat(&db, "C@g.us", "Crew", BASE + 400).await;
        seed_chat(&db, "D@s.whatsapp.net", "Dana", BASE + 50).await;
        seed_message(&db, "c1", "C@g.us", "111", "good morning", BASE, false).await;
        seed_message(&db, "c2", "C@g.us", "222", "anyone around", BASE + 100, false).await;
        seed_message(&db, "c3", "C@g.us", "111", "standup moved to noon", BASE + 200, false).await;
        seed_message(&db, "c4", "C@g.us", "333", "works for me", BASE + 300, true).await;
        seed_message(&db, "c5", "C@g.us", "222", "see you there", BASE + 400, false).await;
        seed_message(&db, "d1", "D@s.whatsapp.net", "444", "lunch today?", BASE + 50, false).await;
        (dir, db)
    }

    #[tokio::test]
    async fn list_chats_sorted_by_recency_with_preview() {
        let (_dir, db) = seeded().await;
        let chats = db.list_chats(None, false, 20, 0).await.unwrap();
        assert_eq!(chats.len(), 2);
        assert_eq!(chats[0].jid, "C@g.us");
        assert!(chats[0].is_group);
        assert_eq!(chats[0].last_message.as_deref(), Some("see you there"));
        assert_eq!(chats[0].last_sender.as_deref(), Some("222"));
        assert_eq!(chats[0].last_is_from_me, Some(false));
        assert_eq!(chats[1].jid, "D@s.whatsapp.net");
        assert!(!chats[1].is_group);
    }

    #[tokio::test]
    async fn list_chats_filters_by_query_and_groups() {
        let (_dir, db) = seeded().await;
        let named = db.list_chats(Some("dana"), false, 20, 0).await.unwrap();
        assert_eq!(named.len(), 1);
        assert_eq!(named[0].name.as_deref(), Some("Dana"));

        let groups = db.list_chats(None, true, 20, 0).await.unwrap();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].jid, "C@g.us");
    }

    #[tokio::test]
    async fn count_chats_matches_filter() {
        let (_dir, db) = seeded().await;
        assert_eq!(db.count_chats(None).await.unwrap(), 2);
        assert_eq!(db.count_chats(Some("crew")).await.unwrap(), 1);
        assert_eq!(db.count_chats(Some("nobody")).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn get_chat_preview_is_latest_message() {
        let (_dir, db) = seeded().await;
        let chat = db.get_chat("C@g.us", true).await.unwrap().unwrap();
        assert_eq!(chat.last_message.as_deref(), Some("see you there"));
        let bare = db.get_chat("C@g.us", false).await.unwrap().unwrap();
        assert!(bare.last_message.is_none());
        assert!(db.get_chat("missing@g.us", true).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn list_messages_orders_descending() {
        let (_dir, db) = seeded().await;
        let msgs = db
            .list_messages(&MessageFilter {
                chat_jid: Some("C@g.us".to_string()),
                limit: 20,
                ..Default::default()
            })
            .await
            .unwrap();
        let ids: Vec<&str> = msgs.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["c5", "c4", "c3", "c2", "c1"]);
        assert_eq!(msgs[0].chat_name.as_deref(), Some("Crew"));
    }

    #[tokio::test]
    async fn list_messages_filters_by_sender_and_bounds() {
        let (_dir, db) = seeded().await;
        let msgs = db
            .list_messages(&MessageFilter {
                sender: Some("111".to_string()),
                limit: 20,
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(msgs.len(), 2);

        let bounded = db
            .list_messages(&MessageFilter {
                after: Some(ts(BASE + 100)),
                before: Some(ts(BASE + 300)),
                chat_jid: Some("C@g.us".to_string()),
                limit: 20,
                ..Default::default()
            })
            .await
            .unwrap();
        // Inclusive lower bound, exclusive upper bound.
        let ids: Vec<&str> = bounded.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["c3", "c2"]);
    }

    #[tokio::test]
    async fn inverted_bounds_yield_empty() {
        let (_dir, db) = seeded().await;
        let msgs = db
            .list_messages(&MessageFilter {
                after: Some(ts(BASE + 300)),
                before: Some(ts(BASE + 100)),
                limit: 20,
                ..Default::default()
            })
            .await
            .unwrap();
        assert!(msgs.is_empty());
    }

    #[tokio::test]
    async fn pagination_concatenates_to_full_listing() {
        let (_dir, db) = seeded().await;
        let all = db
            .list_messages(&MessageFilter {
                limit: 6,
                ..Default::default()
            })
            .await
            .unwrap();
        let mut paged = Vec::new();
        for page in 0..3 {
            paged.extend(
                db.list_messages(&MessageFilter {
                    limit: 2,
                    page,
                    ..Default::default()
                })
                .await
                .unwrap(),
            );
        }
        let all_ids: Vec<&str> = all.iter().map(|m| m.id.as_str()).collect();
        let paged_ids: Vec<&str> = paged.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(all_ids, paged_ids);
    }

    #[tokio::test]
    async fn zero_and_negative_limits_default_to_twenty() {
        let (_dir, db) = seeded().await;
        for limit in [0, -5] {
            let msgs = db
                .list_messages(&MessageFilter {
                    limit,
                    ..Default::default()
                })
                .await
                .unwrap();
            assert_eq!(msgs.len(), 6);
        }
    }

    #[tokio::test]
    async fn search_expands_hits_with_context() {
        let (_dir, db) = seeded().await;
        let results = db
            .search_messages("standup", None, None, 20, 0)
            .await
            .unwrap();
        assert!(!results.fallback_used);
        assert_eq!(results.hits.len(), 1);
        let hit = &results.hits[0];
        assert_eq!(hit.message.id, "c3");
        let before: Vec<&str> = hit.context_before.iter().map(|m| m.id.as_str()).collect();
        let after: Vec<&str> = hit.context_after.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(before, vec!["c1", "c2"]);
        assert_eq!(after, vec!["c4", "c5"]);
    }

    #[tokio::test]
    async fn unparsable_fts_query_falls_back_to_substring() {
        let (_dir, db) = seeded().await;
        // An unterminated quote is not a valid FTS5 expression.
        let results = db
            .search_messages("\"standup", None, None, 20, 0)
            .await
            .unwrap();
        assert!(results.fallback_used);
        assert!(results.hits.is_empty() || results.hits[0].message.id == "c3");
    }

    #[tokio::test]
    async fn fts_covers_every_ingested_row() {
        let (_dir, db) = seeded().await;
        for (token, id) in [("morning", "c1"), ("noon", "c3"), ("lunch", "d1")] {
            let results = db.search_messages(token, None, None, 20, 0).await.unwrap();
            assert!(
                results.hits.iter().any(|h| h.message.id == id),
                "token {token} should find {id}"
            );
        }
    }

    #[tokio::test]
    async fn search_respects_window_bounds() {
        let (_dir, db) = seeded().await;
        let results = db
            .search_messages("morning", Some(ts(BASE + 50)), None, 20, 0)
            .await
            .unwrap();
        assert!(results.hits.is_empty());
    }

    #[tokio::test]
    async fn message_context_resolves_neighbours() {
        let (_dir, db) = seeded().await;
        let ctx = db.get_message_context("c3", 5, 5).await.unwrap();
        assert_eq!(ctx.message.id, "c3");
        let before: Vec<&str> = ctx.before.iter().map(|m| m.id.as_str()).collect();
        let after: Vec<&str> = ctx.after.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(before, vec!["c1", "c2"]);
        assert_eq!(after, vec!["c4", "c5"]);

        let missing = db.get_message_context("nope", 5, 5).await;
        assert!(matches!(missing, Err(DbError::MessageNotFound(_))));
    }

    #[tokio::test]
    async fn active_chats_rank_by_volume() {
        let (_dir, db) = seeded().await;
        let chats = db
            .get_active_chats(ts(BASE - 10), ts(BASE + 1000), false, 10)
            .await
            .unwrap();
        assert_eq!(chats.len(), 2);
        assert_eq!(chats[0].jid, "C@g.us");
        assert_eq!(chats[0].message_count, 5);
        assert_eq!(chats[1].message_count, 1);

        let groups_only = db
            .get_active_chats(ts(BASE - 10), ts(BASE + 1000), true, 10)
            .await
            .unwrap();
        assert_eq!(groups_only.len(), 1);
    }

    #[tokio::test]
    async fn questions_for_me_excludes_own_messages() {
        let (_dir, db) = seeded().await;
        seed_message(&db, "c6", "C@g.us", "me", "did I ask?", BASE + 500, true).await;
        let questions = db
            .get_questions_for_me(ts(BASE - 10), ts(BASE + 1000), 10)
            .await
            .unwrap();
        let ids: Vec<&str> = questions.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["d1"]);
    }

    #[tokio::test]
    async fn media_summary_buckets_by_type() {
        let (_dir, db) = temp_db().await;
        seed_chat(&db, "C@g.us", "Crew", BASE).await;
        for (id, media_type) in [("m1", "image"), ("m2", "image"), ("m3", "audio"), ("m4", "video")]
        {
            db.insert_message(&NewMessage {
                id: id.to_string(),
                chat_jid: "C@g.us".to_string(),
                sender: "111".to_string(),
                content: String::new(),
                timestamp: ts(BASE),
                is_from_me: false,
                media: Some(wren_core::MediaInfo {
                    media_type: match media_type {
                        "image" => "image",
                        "audio" => "audio",
                        _ => "video",
                    },
                    filename: format!("{id}.bin"),
                    url: "https://mmg.whatsapp.net/d/f/x.enc".to_string(),
                    media_key: vec![1],
                    file_sha256: vec![2],
                    file_enc_sha256: vec![3],
                    file_length: 10,
                }),
            })
            .await
            .unwrap();
        }
        let summary = db
            .get_media_summary(ts(BASE - 10), ts(BASE + 10))
            .await
            .unwrap();
        assert_eq!(summary.images, 2);
        assert_eq!(summary.audio, 1);
        assert_eq!(summary.videos, 1);
        assert_eq!(summary.documents, 0);
    }

    #[tokio::test]
    async fn match_chats_by_name_orders_and_limits() {
        let (_dir, db) = temp_db().await;
        seed_chat(&db, "2@s.whatsapp.net", "Alice W", BASE).await;
        seed_chat(&db, "1@s.whatsapp.net", "Alice", BASE).await;
        seed_chat(&db, "3@s.whatsapp.net", "Bob", BASE).await;

        let matches = db.match_chats_by_name("alice", 10).await.unwrap();
        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].1, "Alice");
        assert_eq!(matches[1].1, "Alice W");
    }

    #[tokio::test]
    async fn message_count_between_honours_group_flag() {
        let (_dir, db) = seeded().await;
        let all = db
            .message_count_between(ts(BASE - 10), ts(BASE + 1000), false)
            .await
            .unwrap();
        assert_eq!(all, 6);
        let groups = db
            .message_count_between(ts(BASE - 10), ts(BASE + 1000), true)
            .await
            .unwrap();
        assert_eq!(groups, 5);
    }
}
