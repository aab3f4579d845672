use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{TimeZone, Utc};
use wren_core::{DownloadOutcome, MediaKind, SendOutcome};
use wren_db::WrenDb;
use wren_media::{analyze_ogg_opus, classify, convert_to_opus_ogg, is_ogg, MediaSettings};

use crate::error::WaError;
use crate::network::{
    ChatNetwork, DownloadDescriptor, OutgoingMessage, QuoteRef, SendReceipt, UploadDescriptor,
};
use crate::recipient::resolve_recipient;
use crate::Result;

/// Outbound flows: send text, send media, download media.
pub struct Messenger {
    db: Arc<WrenDb>,
    network: Arc<dyn ChatNetwork>,
    media: MediaSettings,
    base_dir: PathBuf,
}

impl Messenger {
    pub fn new(
        db: Arc<WrenDb>,
        network: Arc<dyn ChatNetwork>,
        media: MediaSettings,
        base_dir: PathBuf,
    ) -> Self {
        Self {
            db,
            network,
            media,
            base_dir,
        }
    }

    pub async fn send_text(
        &self,
        recipient: &str,
        text: &str,
        reply_to: Option<&str>,
    ) -> Result<SendOutcome> {
        if !self.network.is_connected() {
            return Err(WaError::NotConnected);
        }
        let jid = resolve_recipient(&self.db, recipient).await?;
        let message = OutgoingMessage::Text {
            body: text.to_string(),
            quote: reply_to.map(|id| QuoteRef {
                message_id: id.to_string(),
            }),
        };
        let receipt = self.network.send(&jid, message).await?;
        Ok(outcome(&jid.to_string(), receipt))
    }

    pub async fn send_media(
        &self,
        recipient: &str,
        path: &Path,
        caption: Option<&str>,
    ) -> Result<SendOutcome> {
        if !self.network.is_connected() {
            return Err(WaError::NotConnected);
        }
        let jid = resolve_recipient(&self.db, recipient).await?;
        let (kind, mime) = classify(path);

        let message = match kind {
            MediaKind::Audio => self.build_voice_note(path).await?,
            MediaKind::Image => {
                let upload = self.upload_file(path, MediaKind::Image).await?;
                OutgoingMessage::Image {
                    upload,
                    mime: mime.to_string(),
                    caption: caption.map(str::to_string),
                }
            }
            MediaKind::Video => {
                let upload = self.upload_file(path, MediaKind::Video).await?;
                OutgoingMessage::Video {
                    upload,
                    mime: mime.to_string(),
                    caption: caption.map(str::to_string),
                }
            }
            MediaKind::Document => {
                let title = path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .unwrap_or("document")
                    .to_string();
                let upload = self.upload_file(path, MediaKind::Document).await?;
                OutgoingMessage::Document {
                    upload,
                    mime: mime.to_string(),
                    title,
                    caption: caption.map(str::to_string),
                }
            }
        };

        let receipt = self.network.send(&jid, message).await?;
        Ok(outcome(&jid.to_string(), receipt))
    }

    /// Looks up stored media metadata and re-downloads the payload. The
    /// direct path is reconstructed from the original URL since its signed
    /// form will have expired.
    pub async fn download_media(&self, message_id: &str, chat_jid: &str) -> Result<DownloadOutcome> {
        let record = self
            .db
            .media_record(message_id, chat_jid)
            .await?
            .ok_or_else(|| WaError::MessageNotFound {
                message_id: message_id.to_string(),
                chat_jid: chat_jid.to_string(),
            })?;

        let incomplete = || WaError::IncompleteMedia {
            message_id: message_id.to_string(),
        };
        let media_type = record
            .media_type
            .filter(|t| !t.is_empty())
            .ok_or_else(incomplete)?;
        let url = record.url.filter(|u| !u.is_empty()).ok_or_else(incomplete)?;
        let media_key = record
            .media_key
            .filter(|k| !k.is_empty())
            .ok_or_else(incomplete)?;
        let file_sha256 = record
            .file_sha256
            .filter(|s| !s.is_empty())
            .ok_or_else(incomplete)?;
        let file_enc_sha256 = record
            .file_enc_sha256
            .filter(|s| !s.is_empty())
            .ok_or_else(incomplete)?;
        let file_length = record
            .file_length
            .filter(|l| *l > 0)
            .ok_or_else(incomplete)?;
        let filename = record
            .filename
            .filter(|f| !f.is_empty())
            .unwrap_or_else(|| message_id.to_string());

        let descriptor = DownloadDescriptor {
            direct_path: extract_direct_path(&url),
            url,
            media_key,
            file_sha256,
            file_enc_sha256,
            file_length: file_length as u64,
            kind: MediaKind::from_media_type(&media_type),
        };
        let data = self.network.download(&descriptor).await?;

        let out_dir = self.base_dir.join(chat_jid.replace(':', "_"));
        tokio::fs::create_dir_all(&out_dir).await?;
        let out_path = out_dir.join(&filename);
        tokio::fs::write(&out_path, &data).await?;

        let path = tokio::fs::canonicalize(&out_path)
            .await
            .unwrap_or(out_path);
        Ok(DownloadOutcome {
            media_type,
            filename,
            path: path.display().to_string(),
        })
    }

    async fn upload_file(&self, path: &Path, kind: MediaKind) -> Result<UploadDescriptor> {
        let bytes = tokio::fs::read(path).await?;
        self.network.upload(bytes, kind).await
    }

    /// Audio goes out as a PTT voice note: non-Ogg input is transcoded
    /// first, and the Opus stream is analysed for duration and waveform.
    async fn build_voice_note(&self, path: &Path) -> Result<OutgoingMessage> {
        let (bytes, converted) = if is_ogg(path) {
            (tokio::fs::read(path).await?, None)
        } else {
            let converted = convert_to_opus_ogg(&self.media, path).await?;
            (tokio::fs::read(&converted).await?, Some(converted))
        };

        let analysis = analyze_ogg_opus(&bytes);
        let upload = self.network.upload(bytes, MediaKind::Audio).await;

        if let Some(tmp) = converted {
            let _ = tokio::fs::remove_file(&tmp).await;
        }

        let analysis = analysis?;
        Ok(OutgoingMessage::VoiceNote {
            upload: upload?,
            mime: "audio/ogg; codecs=opus".to_string(),
            seconds: analysis.seconds,
            waveform: analysis.waveform,
        })
    }
}

fn outcome(chat_jid: &str, receipt: SendReceipt) -> SendOutcome {
    SendOutcome {
        message_id: Some(receipt.message_id),
        chat_jid: chat_jid.to_string(),
        timestamp: Utc.timestamp_opt(receipt.timestamp, 0).single(),
    }
}

/// Everything after `.net/` with the query string stripped, `/`-prefixed.
pub fn extract_direct_path(url: &str) -> String {
    match url.split_once(".net/") {
        Some((_, rest)) => {
            let path = rest.split('?').next().unwrap_or(rest);
            format!("/{path}")
        }
        None => url.to_string(),
    }
}
