use chrono::{DateTime, SecondsFormat, Utc};
use wren_core::{Chat, MessageRecord, GROUP_SERVER};

/// Canonical stored form for timestamps: RFC3339 UTC, second precision.
pub(crate) fn format_ts(t: &DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Secs, true)
}

pub(crate) fn parse_ts(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|t| t.with_timezone(&Utc))
        .ok()
}

fn is_group_jid(jid: &str) -> bool {
    jid.ends_with(&format!("@{GROUP_SERVER}"))
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct ChatRow {
    pub jid: String,
    pub name: Option<String>,
    pub last_message_time: Option<String>,
    pub last_message: Option<String>,
    pub last_sender: Option<String>,
    pub last_is_from_me: Option<bool>,
}

impl ChatRow {
    pub fn into_chat(self) -> Chat {
        Chat {
            is_group: is_group_jid(&self.jid),
            name: self.name.filter(|n| !n.is_empty()),
            last_message_time: self.last_message_time.as_deref().and_then(parse_ts),
            last_message: self.last_message,
            last_sender: self.last_sender,
            last_is_from_me: self.last_is_from_me,
            jid: self.jid,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct MessageRow {
    pub id: String,
    pub chat_jid: String,
    pub sender: String,
    pub chat_name: Option<String>,
    pub content: Option<String>,
    pub timestamp: String,
    pub is_from_me: bool,
    pub media_type: Option<String>,
}

impl MessageRow {
    pub fn into_record(self) -> MessageRecord {
        MessageRecord {
            timestamp: parse_ts(&self.timestamp).unwrap_or(DateTime::UNIX_EPOCH),
            id: self.id,
            chat_jid: self.chat_jid,
            sender: self.sender,
            chat_name: self.chat_name.filter(|n| !n.is_empty()),
            content: self.content.filter(|c| !c.is_empty()),
            is_from_me: self.is_from_me,
            media_type: self.media_type.filter(|m| !m.is_empty()),
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct ActiveChatRow {
    pub chat_jid: String,
    pub name: Option<String>,
    pub message_count: i64,
}
