use thiserror::Error;
use wren_wa::WaError;

#[derive(Error, Debug)]
pub enum IpcError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("sidecar process is not running")]
    ProcessNotRunning,

    #[error("failed to spawn sidecar: {0}")]
    SpawnFailed(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("channel closed")]
    ChannelClosed,

    #[error("timed out waiting for sidecar response")]
    Timeout,
}

impl From<IpcError> for WaError {
    fn from(err: IpcError) -> Self {
        WaError::Network(err.to_string())
    }
}
