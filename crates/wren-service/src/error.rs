use thiserror::Error;
use wren_db::DbError;
use wren_wa::WaError;

/// Tool-surface failures. `error_code` becomes the short `error` field of
/// the response envelope; `details` and `hint` fill the rest.
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("{details}")]
    Validation {
        details: String,
        hint: Option<String>,
    },

    #[error("{details}")]
    NotFound {
        details: String,
        hint: Option<String>,
    },

    #[error("{details}")]
    Ambiguous { details: String },

    #[error("{details}")]
    IncompleteMedia { details: String },

    #[error("{details}")]
    Transient {
        details: String,
        hint: Option<String>,
    },
}

impl ServiceError {
    pub fn validation(details: impl Into<String>) -> Self {
        Self::Validation {
            details: details.into(),
            hint: None,
        }
    }

    pub fn validation_with_hint(details: impl Into<String>, hint: impl Into<String>) -> Self {
        Self::Validation {
            details: details.into(),
            hint: Some(hint.into()),
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "validation",
            Self::NotFound { .. } => "not_found",
            Self::Ambiguous { .. } => "ambiguous",
            Self::IncompleteMedia { .. } => "incomplete_media",
            Self::Transient { .. } => "transient_io",
        }
    }

    pub fn details(&self) -> &str {
        match self {
            Self::Validation { details, .. }
            | Self::NotFound { details, .. }
            | Self::Ambiguous { details }
            | Self::IncompleteMedia { details }
            | Self::Transient { details, .. } => details,
        }
    }

    pub fn hint(&self) -> Option<&str> {
        match self {
            Self::Validation { hint, .. }
            | Self::NotFound { hint, .. }
            | Self::Transient { hint, .. } => hint.as_deref(),
            Self::Ambiguous { .. } => {
                Some("reply with one of the listed candidates, a phone number, or a full JID")
            }
            Self::IncompleteMedia { .. } => {
                Some("only messages with a media_type and full download metadata can be fetched")
            }
        }
    }
}

impl From<WaError> for ServiceError {
    fn from(err: WaError) -> Self {
        match err {
            WaError::NotConnected => Self::Transient {
                details: err.to_string(),
                hint: Some(
                    "check get_connection_status and ensure the device is paired".to_string(),
                ),
            },
            WaError::InvalidRecipient(_) => Self::Validation {
                details: err.to_string(),
                hint: Some(
                    "use a phone number without '+', a full JID like 44123@s.whatsapp.net, \
                     or a chat name from list_chats"
                        .to_string(),
                ),
            },
            WaError::RecipientNotFound { ref input } => Self::NotFound {
                details: format!("no chat matches '{input}'"),
                hint: Some(
                    "use a phone number without '+', a full JID, or list_chats to discover names"
                        .to_string(),
                ),
            },
            WaError::AmbiguousRecipient {
                ref input,
                ref candidates,
            } => Self::Ambiguous {
                details: format!(
                    "multiple chats match '{input}': {}",
                    candidates.join(", ")
                ),
            },
            WaError::MessageNotFound { .. } => Self::NotFound {
                details: err.to_string(),
                hint: Some(
                    "get message ids from list_messages or search_messages".to_string(),
                ),
            },
            WaError::IncompleteMedia { .. } => Self::IncompleteMedia {
                details: err.to_string(),
            },
            WaError::Media(_) => Self::Transient {
                details: err.to_string(),
                hint: Some("ensure the transcoder (ffmpeg) is installed and on PATH".to_string()),
            },
            WaError::Io(_) => Self::Transient {
                details: err.to_string(),
                hint: Some("check the file path exists and is readable".to_string()),
            },
            WaError::Db(_) | WaError::Network(_) => Self::Transient {
                details: err.to_string(),
                hint: None,
            },
        }
    }
}

impl From<DbError> for ServiceError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::MessageNotFound(_) => Self::NotFound {
                details: err.to_string(),
                hint: Some(
                    "get message ids from list_messages or search_messages".to_string(),
                ),
            },
            other => Self::Transient {
                details: other.to_string(),
                hint: None,
            },
        }
    }
}
