mod catchup;
mod chat_service;
mod error;
mod message_service;
mod window;

pub use catchup::CatchupReport;
pub use chat_service::{ChatService, ListChatsResult};
pub use error::ServiceError;
pub use message_service::{
    ConnectionStatus, ListMessagesParams, MessageService, SearchOutcome, SendMessageParams,
};
pub use window::resolve_window;

pub type Result<T> = std::result::Result<T, ServiceError>;
