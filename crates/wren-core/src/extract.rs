use chrono::Local;

use crate::events::{MediaContent, MessageContent};

/// Extracted download metadata for a media-bearing message.
#[derive(Debug, Clone)]
pub struct MediaInfo {
    pub media_type: &'static str,
    pub filename: String,
    pub url: String,
    pub media_key: Vec<u8>,
    pub file_sha256: Vec<u8>,
    pub file_enc_sha256: Vec<u8>,
    pub file_length: u64,
}

/// Extracts the textual payload of a message.
///
/// Non-text carriers produce a short emoji-prefixed summary; unknown types
/// produce an empty string and the message is dropped at ingest if no media
/// type was found either.
pub fn extract_text(content: &MessageContent) -> String {
    if let Some(text) = non_empty(&content.conversation) {
        return text;
    }
    if let Some(text) = non_empty(&content.extended_text) {
        return text;
    }
    if let Some(loc) = &content.location {
        return format!("📍 Location: {:.6}, {:.6}", loc.latitude, loc.longitude);
    }
    if let Some(contact) = &content.contact {
        let name = contact.display_name.as_deref().unwrap_or("Contact");
        return format!("👤 {name}");
    }
    if content.sticker.is_some() {
        return "🎭 Sticker".to_string();
    }
    if let Some(loc) = &content.live_location {
        return format!("📍 Live Location: {:.6}, {:.6}", loc.latitude, loc.longitude);
    }
    if let Some(name) = &content.poll_name {
        return format!("📊 Poll: {name}");
    }
    if let Some(text) = &content.reaction {
        return format!("😊 Reaction: {text}");
    }
    if content.system {
        return "🔧 System Message".to_string();
    }
    String::new()
}

/// Extracts media download metadata, stamping an auto filename when the
/// payload did not supply one (documents usually do).
pub fn extract_media(content: &MessageContent) -> Option<MediaInfo> {
    if let Some(media) = &content.image {
        return Some(media_info(media, "image", &auto_filename("image", "jpg")));
    }
    if let Some(media) = &content.video {
        return Some(media_info(media, "video", &auto_filename("video", "mp4")));
    }
    if let Some(media) = &content.audio {
        return Some(media_info(media, "audio", &auto_filename("audio", "ogg")));
    }
    if let Some(media) = &content.document {
        let fallback = format!("document_{}", timestamp_stamp());
        return Some(media_info(media, "document", &fallback));
    }
    if let Some(media) = &content.sticker {
        return Some(media_info(media, "sticker", &auto_filename("sticker", "webp")));
    }
    None
}

fn media_info(media: &MediaContent, media_type: &'static str, fallback_name: &str) -> MediaInfo {
    let filename = media
        .filename
        .clone()
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| fallback_name.to_string());
    MediaInfo {
        media_type,
        filename,
        url: media.url.clone(),
        media_key: media.media_key.clone(),
        file_sha256: media.file_sha256.clone(),
        file_enc_sha256: media.file_enc_sha256.clone(),
        file_length: media.file_length,
    }
}

fn auto_filename(prefix: &str, ext: &str) -> String {
    format!("{prefix}_{}.{ext}", timestamp_stamp())
}

fn timestamp_stamp() -> String {
    Local::now().format("%Y%m%d_%H%M%S").to_string()
}

fn non_empty(field: &Option<String>) -> Option<String> {
    field.clone().filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{ContactContent, LocationContent};

    #[test]
    fn conversation_text_wins() {
        let content = MessageContent {
            conversation: Some("hello".into()),
            extended_text: Some("ignored".into()),
            ..Default::default()
        };
        assert_eq!(extract_text(&content), "hello");
    }

    #[test]
    fn extended_text_when_conversation_empty() {
        let content = MessageContent {
            conversation: Some(String::new()),
            extended_text: Some("quoted reply".into()),
            ..Default::default()
        };
        assert_eq!(extract_text(&content), "quoted reply");
    }

    #[test]
    fn location_summary() {
        let content = MessageContent {
            location: Some(LocationContent {
                latitude: 51.507351,
                longitude: -0.127758,
            }),
            ..Default::default()
        };
        assert_eq!(extract_text(&content), "📍 Location: 51.507351, -0.127758");
    }

    #[test]
    fn contact_without_name_uses_placeholder() {
        let content = MessageContent {
            contact: Some(ContactContent { display_name: None }),
            ..Default::default()
        };
        assert_eq!(extract_text(&content), "👤 Contact");
    }

    #[test]
    fn poll_and_reaction_summaries() {
        let poll = MessageContent {
            poll_name: Some("Lunch spot".into()),
            ..Default::default()
        };
        assert_eq!(extract_text(&poll), "📊 Poll: Lunch spot");

        let reaction = MessageContent {
            reaction: Some("👍".into()),
            ..Default::default()
        };
        assert_eq!(extract_text(&reaction), "😊 Reaction: 👍");
    }

    #[test]
    fn unknown_type_yields_empty() {
        assert_eq!(extract_text(&MessageContent::default()), "");
    }

    #[test]
    fn sticker_yields_text_and_media() {
        let content = MessageContent {
            sticker: Some(MediaContent {
                url: "https://mmg.whatsapp.net/d/f/abc.enc".into(),
                media_key: vec![1],
                file_sha256: vec![2],
                file_enc_sha256: vec![3],
                file_length: 42,
                ..Default::default()
            }),
            ..Default::default()
        };
        assert_eq!(extract_text(&content), "🎭 Sticker");
        let media = extract_media(&content).unwrap();
        assert_eq!(media.media_type, "sticker");
        assert!(media.filename.starts_with("sticker_"));
        assert!(media.filename.ends_with(".webp"));
    }

    #[test]
    fn document_keeps_supplied_filename() {
        let content = MessageContent {
            document: Some(MediaContent {
                filename: Some("report.pdf".into()),
                url: "https://mmg.whatsapp.net/d/f/def.enc".into(),
                file_length: 7,
                ..Default::default()
            }),
            ..Default::default()
        };
        let media = extract_media(&content).unwrap();
        assert_eq!(media.media_type, "document");
        assert_eq!(media.filename, "report.pdf");
    }

    #[test]
    fn no_media_returns_none() {
        assert!(extract_media(&MessageContent::default()).is_none());
    }
}
