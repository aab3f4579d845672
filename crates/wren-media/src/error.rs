use thiserror::Error;

#[derive(Error, Debug)]
pub enum MediaError {
    #[error("not an Ogg stream")]
    NotOgg,

    #[error("input file missing: {0}")]
    InputMissing(String),

    #[error("transcoder failed with status {0}")]
    TranscodeFailed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
