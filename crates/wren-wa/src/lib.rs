mod error;
mod messaging;
mod network;
mod recipient;
mod resolver;
mod sync;

#[cfg(test)]
pub(crate) mod testutil;

pub use error::WaError;
pub use messaging::{extract_direct_path, Messenger};
pub use network::*;
pub use recipient::resolve_recipient;
pub use resolver::{backfill_chat_names, resolve_chat_name, resolve_preferred_name};
pub use sync::SyncEngine;

pub type Result<T> = std::result::Result<T, WaError>;
