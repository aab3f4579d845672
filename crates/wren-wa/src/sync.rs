use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use tokio::sync::mpsc;
use wren_core::{
    extract_media, extract_text, normalize_sender, HistorySyncEvent, Jid, MessageEvent,
    NetworkEvent,
};
use wren_db::{NewMessage, WrenDb};

use crate::network::ChatNetwork;
use crate::resolver::{backfill_chat_names, resolve_chat_name, resolve_preferred_name};

/// Drives all store writes from the network event stream.
///
/// Handlers never abort the subscription: bad events are skipped with a
/// warning and the loop continues.
pub struct SyncEngine {
    db: Arc<WrenDb>,
    network: Arc<dyn ChatNetwork>,
}

impl SyncEngine {
    pub fn new(db: Arc<WrenDb>, network: Arc<dyn ChatNetwork>) -> Self {
        Self { db, network }
    }

    pub async fn run(self, mut events: mpsc::Receiver<NetworkEvent>) {
        while let Some(event) = events.recv().await {
            match event {
                NetworkEvent::Message(ev) => self.handle_message(ev).await,
                NetworkEvent::HistorySync(ev) => self.handle_history_sync(ev).await,
                NetworkEvent::Connected => {
                    tracing::info!("connected");
                    let db = Arc::clone(&self.db);
                    let network = Arc::clone(&self.network);
                    tokio::spawn(async move {
                        backfill_chat_names(&db, network.as_ref()).await;
                    });
                }
                NetworkEvent::LoggedOut => {
                    tracing::warn!("logged out; restart and re-pair to continue");
                }
            }
        }
        tracing::debug!("network event stream closed");
    }

    pub(crate) async fn handle_message(&self, ev: MessageEvent) {
        let content = extract_text(&ev.content);
        let media = extract_media(&ev.content);
        if content.is_empty() && media.is_none() {
            return;
        }

        if !ev.sender.is_empty() {
            self.ensure_sender_chat(&ev.sender).await;
        }

        // Real-time events always carry the network's timestamp; persist it
        // as-is. Only history sync treats zero as "no timestamp".
        let timestamp = Utc
            .timestamp_opt(ev.timestamp, 0)
            .single()
            .unwrap_or(DateTime::UNIX_EPOCH);

        let name =
            resolve_chat_name(&self.db, self.network.as_ref(), &ev.chat_jid, None, &ev.sender)
                .await;
        if let Err(err) = self.db.upsert_chat(&ev.chat_jid, &name, &timestamp).await {
            tracing::warn!(jid = %ev.chat_jid, %err, "failed to upsert chat");
        }

        let row = NewMessage {
            id: ev.message_id,
            chat_jid: ev.chat_jid,
            sender: ev.sender,
            content,
            timestamp,
            is_from_me: ev.is_from_me,
            media,
        };
        if let Err(err) = self.db.insert_message(&row).await {
            tracing::warn!(id = %row.id, chat_jid = %row.chat_jid, %err, "failed to store message");
        }
    }

    pub(crate) async fn handle_history_sync(&self, ev: HistorySyncEvent) {
        let mut synced = 0usize;

        for conv in &ev.conversations {
            let Ok(jid) = Jid::parse(&conv.id) else {
                tracing::warn!(jid = %conv.id, "history sync: bad JID");
                continue;
            };

            let name = resolve_chat_name(
                &self.db,
                self.network.as_ref(),
                &conv.id,
                conv.display_name.as_deref(),
                "",
            )
            .await;

            // Latest message observed across the whole conversation.
            let max_ts = conv
                .messages
                .iter()
                .map(|m| m.timestamp)
                .filter(|t| *t != 0)
                .max()
                .and_then(unix_ts);
            if let Some(ts) = max_ts {
                if let Err(err) = self.db.upsert_chat(&conv.id, &name, &ts).await {
                    tracing::warn!(jid = %conv.id, %err, "history sync: failed to upsert chat");
                }
            }

            for msg in &conv.messages {
                let content = extract_text(&msg.content);
                let media = extract_media(&msg.content);
                if content.is_empty() && media.is_none() {
                    tracing::debug!(id = %msg.id, "history sync: skipping empty message");
                    continue;
                }

                let mut sender = jid.user.clone();
                if msg.from_me {
                    if let Some(user) = self.network.device_user() {
                        sender = user;
                    }
                } else if let Some(participant) =
                    msg.participant.as_deref().filter(|p| !p.is_empty())
                {
                    sender = participant.to_string();
                }
                let sender = normalize_sender(&sender);

                if !msg.from_me && !sender.is_empty() {
                    self.ensure_sender_chat(&sender).await;
                }

                let Some(timestamp) = unix_ts(msg.timestamp) else {
                    continue;
                };

                let row = NewMessage {
                    id: msg.id.clone(),
                    chat_jid: conv.id.clone(),
                    sender,
                    content,
                    timestamp,
                    is_from_me: msg.from_me,
                    media,
                };
                if let Err(err) = self.db.insert_message(&row).await {
                    tracing::warn!(id = %row.id, chat_jid = %row.chat_jid, %err,
                        "history sync: failed to store message");
                    continue;
                }
                synced += 1;
            }
        }

        tracing::info!(count = synced, "history sync persisted messages");
    }

    /// Keeps a direct-chat row per sender so name lookups inside group
    /// conversations can resolve later.
    async fn ensure_sender_chat(&self, sender_user: &str) {
        let jid = Jid::direct(sender_user);
        let jid_str = jid.to_string();
        match self.db.chat_name(&jid_str).await {
            Ok(None) => {
                let resolved = resolve_preferred_name(self.network.as_ref(), &jid).await;
                if let Err(err) = self.db.insert_chat_if_absent(&jid_str, &resolved).await {
                    tracing::warn!(jid = %jid_str, %err, "failed to insert sender chat");
                }
            }
            Ok(Some(None)) => {
                let resolved = resolve_preferred_name(self.network.as_ref(), &jid).await;
                if !resolved.is_empty() {
                    if let Err(err) = self.db.set_chat_name(&jid_str, &resolved).await {
                        tracing::warn!(jid = %jid_str, %err, "failed to name sender chat");
                    }
                }
            }
            Ok(Some(Some(_))) => {}
            Err(err) => tracing::warn!(jid = %jid_str, %err, "sender chat lookup failed"),
        }
    }
}

fn unix_ts(secs: i64) -> Option<DateTime<Utc>> {
    if secs == 0 {
        return None;
    }
    Utc.timestamp_opt(secs, 0).single()
}
