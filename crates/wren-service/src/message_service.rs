use std::path::Path;
use std::sync::Arc;

use serde::Serialize;
use wren_core::{DownloadOutcome, MessageContext, MessageRecord, SearchHit, SendOutcome};
use wren_db::{MessageFilter, WrenDb};
use wren_wa::{resolve_recipient, ChatNetwork, Messenger};

use crate::chat_service::check_limit;
use crate::error::ServiceError;
use crate::window::resolve_window;
use crate::Result;

const DEFAULT_CONTEXT: i64 = 5;
const MAX_CONTEXT: i64 = 100;

pub struct MessageService {
    db: Arc<WrenDb>,
    messenger: Messenger,
    network: Arc<dyn ChatNetwork>,
}

#[derive(Debug, Default, Clone)]
pub struct ListMessagesParams {
    /// Phone, JID, or chat name; resolved like a send recipient.
    pub recipient: Option<String>,
    pub timeframe: Option<String>,
    pub after: Option<String>,
    pub before: Option<String>,
    pub sender: Option<String>,
    pub limit: i64,
    pub page: i64,
}

#[derive(Debug, Default, Clone)]
pub struct SendMessageParams {
    pub recipient: String,
    pub text: Option<String>,
    pub media_path: Option<String>,
    pub reply_to_message_id: Option<String>,
}

#[derive(Debug)]
pub struct SearchOutcome {
    pub hits: Vec<SearchHit>,
    pub fallback_used: bool,
}

#[derive(Debug, Serialize)]
pub struct ConnectionStatus {
    pub connected: bool,
    pub logged_in: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device: Option<String>,
    pub chats: i64,
    pub messages: i64,
}

impl MessageService {
    pub fn new(db: Arc<WrenDb>, messenger: Messenger, network: Arc<dyn ChatNetwork>) -> Self {
        Self {
            db,
            messenger,
            network,
        }
    }

    pub async fn list_messages(&self, params: ListMessagesParams) -> Result<Vec<MessageRecord>> {
        let limit = check_limit(params.limit)?;
        let (after, before) = resolve_window(
            params.timeframe.as_deref(),
            params.after.as_deref(),
            params.before.as_deref(),
        )?;

        let chat_jid = match params.recipient.as_deref().filter(|r| !r.is_empty()) {
            Some(recipient) => Some(resolve_recipient(&self.db, recipient).await?.to_string()),
            None => None,
        };

        let filter = MessageFilter {
            after,
            before,
            chat_jid,
            sender: params.sender.clone(),
            limit,
            page: params.page.max(0),
        };
        Ok(self.db.list_messages(&filter).await?)
    }

    pub async fn search_messages(
        &self,
        query: &str,
        timeframe: Option<&str>,
        after: Option<&str>,
        before: Option<&str>,
        limit: i64,
        page: i64,
    ) -> Result<SearchOutcome> {
        if query.trim().is_empty() {
            return Err(ServiceError::validation("query cannot be empty"));
        }
        let limit = check_limit(limit)?;
        let (after, before) = resolve_window(timeframe, after, before)?;

        let results = self
            .db
            .search_messages(query, after, before, limit, page.max(0))
            .await?;
        Ok(SearchOutcome {
            hits: results.hits,
            fallback_used: results.fallback_used,
        })
    }

    pub async fn get_message_context(
        &self,
        message_id: &str,
        before: i64,
        after: i64,
    ) -> Result<MessageContext> {
        if message_id.is_empty() {
            return Err(ServiceError::validation("message_id cannot be empty"));
        }
        let before = check_context(before)?;
        let after = check_context(after)?;
        Ok(self.db.get_message_context(message_id, before, after).await?)
    }

    pub async fn send_message(&self, params: SendMessageParams) -> Result<SendOutcome> {
        if params.recipient.is_empty() {
            return Err(ServiceError::validation_with_hint(
                "recipient is required",
                "use a phone number without '+', a full JID, or a chat name from list_chats",
            ));
        }
        let text = params.text.as_deref().filter(|t| !t.is_empty());
        let media_path = params.media_path.as_deref().filter(|p| !p.is_empty());
        if text.is_none() && media_path.is_none() {
            return Err(ServiceError::validation_with_hint(
                "either 'text' or 'media_path' must be provided",
                "pass message text, a media file path, or both (media with caption)",
            ));
        }

        let outcome = match media_path {
            Some(path) => {
                self.messenger
                    .send_media(&params.recipient, Path::new(path), text)
                    .await?
            }
            None => {
                self.messenger
                    .send_text(
                        &params.recipient,
                        text.unwrap_or_default(),
                        params.reply_to_message_id.as_deref(),
                    )
                    .await?
            }
        };
        Ok(outcome)
    }

    pub async fn download_media(&self, message_id: &str, chat_jid: &str) -> Result<DownloadOutcome> {
        if message_id.is_empty() {
            return Err(ServiceError::validation("message_id cannot be empty"));
        }
        if chat_jid.is_empty() {
            return Err(ServiceError::validation("chat_jid cannot be empty"));
        }
        Ok(self.messenger.download_media(message_id, chat_jid).await?)
    }

    pub async fn connection_status(&self) -> Result<ConnectionStatus> {
        Ok(ConnectionStatus {
            connected: self.network.is_connected(),
            logged_in: self.network.is_logged_in(),
            device: self.network.device_user(),
            chats: self.db.chat_count().await?,
            messages: self.db.message_count().await?,
        })
    }

    pub(crate) fn db(&self) -> &WrenDb {
        &self.db
    }
}

fn check_context(count: i64) -> Result<i64> {
    if count > MAX_CONTEXT {
        return Err(ServiceError::validation(format!(
            "context cannot exceed {MAX_CONTEXT} messages (got {count})"
        )));
    }
    Ok(if count <= 0 { DEFAULT_CONTEXT } else { count })
}
