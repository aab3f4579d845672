use std::path::Path;

use wren_core::MediaKind;

/// Maps a file extension onto an upload kind and MIME type.
///
/// Audio that is not already Ogg goes through the transcoder before upload,
/// so its MIME here only matters until conversion.
pub fn classify(path: &Path) -> (MediaKind, &'static str) {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "jpg" | "jpeg" => (MediaKind::Image, "image/jpeg"),
        "png" => (MediaKind::Image, "image/png"),
        "gif" => (MediaKind::Image, "image/gif"),
        "webp" => (MediaKind::Image, "image/webp"),
        "mp4" => (MediaKind::Video, "video/mp4"),
        "mov" => (MediaKind::Video, "video/quicktime"),
        "avi" => (MediaKind::Video, "video/avi"),
        "ogg" => (MediaKind::Audio, "audio/ogg; codecs=opus"),
        "mp3" => (MediaKind::Audio, "audio/mpeg"),
        "wav" => (MediaKind::Audio, "audio/wav"),
        "m4a" => (MediaKind::Audio, "audio/mp4"),
        "aac" => (MediaKind::Audio, "audio/aac"),
        "opus" => (MediaKind::Audio, "audio/opus"),
        _ => (MediaKind::Document, "application/octet-stream"),
    }
}

pub fn is_ogg(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("ogg"))
        .unwrap_or(false)
}
