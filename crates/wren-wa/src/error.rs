use thiserror::Error;

#[derive(Error, Debug)]
pub enum WaError {
    #[error("not connected to the chat network")]
    NotConnected,

    #[error("invalid recipient: {0}")]
    InvalidRecipient(String),

    #[error("no chat matches '{input}'")]
    RecipientNotFound { input: String },

    #[error("recipient '{input}' is ambiguous")]
    AmbiguousRecipient {
        input: String,
        /// `<name> (<jid>)` per candidate, for caller-driven disambiguation.
        candidates: Vec<String>,
    },

    #[error("message not found: {message_id} in {chat_jid}")]
    MessageNotFound {
        message_id: String,
        chat_jid: String,
    },

    #[error("message {message_id} has incomplete media metadata")]
    IncompleteMedia { message_id: String },

    #[error("database error: {0}")]
    Db(#[from] wren_db::DbError),

    #[error("media error: {0}")]
    Media(#[from] wren_media::MediaError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("network client error: {0}")]
    Network(String),
}
