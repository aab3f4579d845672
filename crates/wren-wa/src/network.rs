use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use wren_core::{Jid, MediaKind};

use crate::Result;

/// Names the live directory knows for a contact, in preference order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContactNames {
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub business_name: Option<String>,
    #[serde(default)]
    pub push_name: Option<String>,
}

/// Storage descriptor returned by a media upload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadDescriptor {
    pub url: String,
    pub direct_path: String,
    pub media_key: Vec<u8>,
    pub file_sha256: Vec<u8>,
    pub file_enc_sha256: Vec<u8>,
    pub file_length: u64,
}

/// Descriptor the network needs to re-download stored media.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadDescriptor {
    pub url: String,
    pub direct_path: String,
    pub media_key: Vec<u8>,
    pub file_sha256: Vec<u8>,
    pub file_enc_sha256: Vec<u8>,
    pub file_length: u64,
    pub kind: MediaKind,
}

/// Reference to a message being quoted in a reply.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuoteRef {
    pub message_id: String,
}

/// Outbound message carriers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OutgoingMessage {
    Text {
        body: String,
        #[serde(default)]
        quote: Option<QuoteRef>,
    },
    Image {
        upload: UploadDescriptor,
        mime: String,
        #[serde(default)]
        caption: Option<String>,
    },
    Video {
        upload: UploadDescriptor,
        mime: String,
        #[serde(default)]
        caption: Option<String>,
    },
    Document {
        upload: UploadDescriptor,
        mime: String,
        title: String,
        #[serde(default)]
        caption: Option<String>,
    },
    /// Push-to-talk voice note; requires duration and waveform.
    VoiceNote {
        upload: UploadDescriptor,
        mime: String,
        seconds: u32,
        waveform: Vec<u8>,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendReceipt {
    pub message_id: String,
    /// Unix seconds.
    pub timestamp: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum QrEvent {
    Code(String),
    Success,
}

/// Narrow capability contract over the chat-network client library.
///
/// The sync engine consumes the event stream separately (an
/// `mpsc::Receiver<NetworkEvent>` handed out by the concrete adapter); this
/// trait covers commands and directory queries only.
#[async_trait]
pub trait ChatNetwork: Send + Sync {
    async fn connect(&self) -> Result<()>;
    async fn disconnect(&self);
    fn is_connected(&self) -> bool;
    fn is_logged_in(&self) -> bool;
    /// User part of the paired device's own identifier, once known.
    fn device_user(&self) -> Option<String>;

    /// Starts pairing and streams QR codes until success or drop.
    async fn qr_channel(&self) -> Result<mpsc::Receiver<QrEvent>>;

    async fn group_name(&self, jid: &Jid) -> Option<String>;
    async fn contact_names(&self, jid: &Jid) -> Option<ContactNames>;

    async fn upload(&self, bytes: Vec<u8>, kind: MediaKind) -> Result<UploadDescriptor>;
    async fn download(&self, descriptor: &DownloadDescriptor) -> Result<Vec<u8>>;
    async fn send(&self, to: &Jid, message: OutgoingMessage) -> Result<SendReceipt>;
}
