use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Media kinds the network client can upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
    Audio,
    Document,
}

impl MediaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Image => "image",
            MediaKind::Video => "video",
            MediaKind::Audio => "audio",
            MediaKind::Document => "document",
        }
    }

    /// Maps a persisted media_type string back onto an upload kind.
    /// Stickers download through the image pipeline.
    pub fn from_media_type(media_type: &str) -> Self {
        match media_type {
            "image" | "sticker" => MediaKind::Image,
            "video" => MediaKind::Video,
            "audio" => MediaKind::Audio,
            _ => MediaKind::Document,
        }
    }
}

/// A chat row as returned by the query surface.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chat {
    pub jid: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub is_group: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_message_time: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_sender: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_is_from_me: Option<bool>,
}

/// A message row as returned by the query surface.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageRecord {
    pub id: String,
    pub chat_jid: String,
    pub sender: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chat_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub is_from_me: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media_type: Option<String>,
}

/// A message with surrounding context from the same chat.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageContext {
    pub message: MessageRecord,
    pub before: Vec<MessageRecord>,
    pub after: Vec<MessageRecord>,
}

/// A full-text hit expanded with nearby messages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
    pub message: MessageRecord,
    pub context_before: Vec<MessageRecord>,
    pub context_after: Vec<MessageRecord>,
}

/// Outcome of a successful send.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendOutcome {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
    pub chat_jid: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

/// Outcome of a successful media download.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadOutcome {
    pub media_type: String,
    pub filename: String,
    pub path: String,
}

/// Per-type counts for the catch-up media summary.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MediaSummary {
    pub images: i64,
    pub videos: i64,
    pub audio: i64,
    pub documents: i64,
}

/// An active chat in a catch-up window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActiveChat {
    pub jid: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub message_count: i64,
    pub recent_messages: Vec<MessageRecord>,
}
