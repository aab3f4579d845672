use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::process::Command;

use crate::error::MediaError;
use crate::Result;

/// Media tooling configuration, threaded from startup config.
#[derive(Debug, Clone)]
pub struct MediaSettings {
    pub ffmpeg_path: String,
}

impl Default for MediaSettings {
    fn default() -> Self {
        Self {
            ffmpeg_path: "ffmpeg".to_string(),
        }
    }
}

/// Converts an audio file to Opus-in-Ogg suitable for a voice note.
///
/// The output lands next to the input as `<input>.converted.ogg`; the caller
/// removes it after use.
pub async fn convert_to_opus_ogg(settings: &MediaSettings, input: &Path) -> Result<PathBuf> {
    if tokio::fs::metadata(input).await.is_err() {
        return Err(MediaError::InputMissing(input.display().to_string()));
    }

    let output = PathBuf::from(format!("{}.converted.ogg", input.display()));
    let status = Command::new(&settings.ffmpeg_path)
        .arg("-i")
        .arg(input)
        .args([
            "-c:a",
            "libopus",
            "-b:a",
            "32k",
            "-ar",
            "24000",
            "-application",
            "voip",
            "-vbr",
            "on",
            "-compression_level",
            "10",
            "-frame_duration",
            "60",
            "-y",
        ])
        .arg(&output)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await?;

    if !status.success() {
        return Err(MediaError::TranscodeFailed(status.to_string()));
    }
    tracing::debug!(input = %input.display(), output = %output.display(), "transcoded to opus");
    Ok(output)
}
