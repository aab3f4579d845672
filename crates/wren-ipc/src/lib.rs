mod error;
mod process;
mod protocol;
mod sidecar;

pub use error::IpcError;
pub use protocol::{CommandResult, SidecarCommand, SidecarEvent, WireContent, WireMessage};
pub use sidecar::{SidecarConfig, SidecarNetwork};

pub type Result<T> = std::result::Result<T, IpcError>;
