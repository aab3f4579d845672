mod classify;
mod error;
mod ffmpeg;
mod opus;

pub use classify::{classify, is_ogg};
pub use error::MediaError;
pub use ffmpeg::{convert_to_opus_ogg, MediaSettings};
pub use opus::{analyze_ogg_opus, OpusAnalysis};

pub type Result<T> = std::result::Result<T, MediaError>;
