use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Server suffix used for direct (one-to-one) conversations.
pub const USER_SERVER: &str = "s.whatsapp.net";

/// Server suffix used for group conversations.
pub const GROUP_SERVER: &str = "g.us";

#[derive(Error, Debug)]
pub enum JidError {
    #[error("invalid JID: {0}")]
    Invalid(String),
}

/// A chat-network identifier of the form `<user>@<server>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Jid {
    pub user: String,
    pub server: String,
}

impl Jid {
    pub fn new(user: impl Into<String>, server: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            server: server.into(),
        }
    }

    /// A direct-conversation JID for a bare phone number.
    pub fn direct(user: impl Into<String>) -> Self {
        Self::new(user, USER_SERVER)
    }

    pub fn parse(s: &str) -> Result<Self, JidError> {
        let (user, server) = s
            .split_once('@')
            .ok_or_else(|| JidError::Invalid(s.to_string()))?;
        if user.is_empty() || server.is_empty() {
            return Err(JidError::Invalid(s.to_string()));
        }
        Ok(Self::new(user, server))
    }

    pub fn is_group(&self) -> bool {
        self.server == GROUP_SERVER
    }
}

impl fmt::Display for Jid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.user, self.server)
    }
}

/// Reduces a sender string to its user part when it looks like a JID.
///
/// History-sync participants sometimes arrive as full identifiers
/// (e.g. `4471...@lid`); persisted senders are bare user parts.
pub fn normalize_sender(sender: &str) -> String {
    if !sender.contains('@') {
        return sender.to_string();
    }
    match Jid::parse(sender) {
        Ok(jid) => jid.user,
        Err(_) => sender
            .split_once('@')
            .map(|(user, _)| user.to_string())
            .unwrap_or_else(|| sender.to_string()),
    }
}
