use serde::{Deserialize, Serialize};

/// Events delivered by the network-client adapter.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum NetworkEvent {
    Message(MessageEvent),
    HistorySync(HistorySyncEvent),
    Connected,
    LoggedOut,
}

/// A real-time message event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageEvent {
    pub message_id: String,
    pub chat_jid: String,
    /// Bare user part of the sender's identifier.
    pub sender: String,
    /// Unix seconds.
    pub timestamp: i64,
    pub is_from_me: bool,
    pub content: MessageContent,
}

/// A bulk history-sync payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistorySyncEvent {
    pub conversations: Vec<HistoryConversation>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryConversation {
    pub id: String,
    /// Display name supplied by the adapter, when the payload carried one.
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub messages: Vec<HistoryMessage>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryMessage {
    pub id: String,
    /// Unix seconds; zero means the payload carried no timestamp.
    pub timestamp: i64,
    pub from_me: bool,
    /// Group sender identifier, when present on the message key.
    #[serde(default)]
    pub participant: Option<String>,
    pub content: MessageContent,
}

/// The carrier set of a message, filled by the adapter.
///
/// Mirrors the network payload narrowly; a message may carry text and media
/// at once (e.g. a sticker summarises as text and downloads as media).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MessageContent {
    #[serde(default)]
    pub conversation: Option<String>,
    #[serde(default)]
    pub extended_text: Option<String>,
    #[serde(default)]
    pub location: Option<LocationContent>,
    #[serde(default)]
    pub live_location: Option<LocationContent>,
    #[serde(default)]
    pub contact: Option<ContactContent>,
    #[serde(default)]
    pub poll_name: Option<String>,
    #[serde(default)]
    pub reaction: Option<String>,
    #[serde(default)]
    pub system: bool,
    #[serde(default)]
    pub image: Option<MediaContent>,
    #[serde(default)]
    pub video: Option<MediaContent>,
    #[serde(default)]
    pub audio: Option<MediaContent>,
    #[serde(default)]
    pub document: Option<MediaContent>,
    #[serde(default)]
    pub sticker: Option<MediaContent>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationContent {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContactContent {
    #[serde(default)]
    pub display_name: Option<String>,
}

/// Download metadata attached to a media carrier.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MediaContent {
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub media_key: Vec<u8>,
    #[serde(default)]
    pub file_sha256: Vec<u8>,
    #[serde(default)]
    pub file_enc_sha256: Vec<u8>,
    #[serde(default)]
    pub file_length: u64,
}
