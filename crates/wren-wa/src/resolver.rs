use wren_core::{Jid, USER_SERVER};
use wren_db::WrenDb;

use crate::network::ChatNetwork;

/// Resolves the best available display name for a chat.
///
/// Cascade: stored name, conversation metadata (history sync only), live
/// group/contact directory, the fallback sender, the bare user part.
pub async fn resolve_chat_name(
    db: &WrenDb,
    network: &dyn ChatNetwork,
    chat_jid: &str,
    conversation_name: Option<&str>,
    sender: &str,
) -> String {
    if let Ok(Some(Some(stored))) = db.chat_name(chat_jid).await {
        return stored;
    }
    if let Some(name) = conversation_name.filter(|n| !n.is_empty()) {
        return name.to_string();
    }

    let Ok(jid) = Jid::parse(chat_jid) else {
        return chat_jid.to_string();
    };
    if let Some(name) = live_name(network, &jid).await {
        return name;
    }
    if !sender.is_empty() {
        return sender.to_string();
    }
    jid.user
}

/// Like the full cascade but skipping the stored name, so the backfill pass
/// is not pinned by stale cached values.
pub async fn resolve_preferred_name(network: &dyn ChatNetwork, jid: &Jid) -> String {
    live_name(network, jid)
        .await
        .unwrap_or_else(|| jid.user.clone())
}

async fn live_name(network: &dyn ChatNetwork, jid: &Jid) -> Option<String> {
    if jid.is_group() {
        let name = network
            .group_name(jid)
            .await
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| format!("Group {}", jid.user));
        return Some(name);
    }
    if let Some(contact) = network.contact_names(jid).await {
        for candidate in [contact.full_name, contact.business_name, contact.push_name] {
            if let Some(name) = candidate.filter(|n| !n.is_empty()) {
                return Some(name);
            }
        }
    }
    None
}

/// One-shot post-connect pass: improve chats whose stored name is missing or
/// still looks like a raw identifier.
pub async fn backfill_chat_names(db: &WrenDb, network: &dyn ChatNetwork) {
    let chats = match db.all_chats().await {
        Ok(chats) => chats,
        Err(err) => {
            tracing::warn!(%err, "backfill: listing chats failed");
            return;
        }
    };

    let mut updated = 0usize;
    for (jid_str, name) in chats {
        let Ok(jid) = Jid::parse(&jid_str) else {
            continue;
        };
        let name = name.unwrap_or_default();
        let needs_backfill = if jid.is_group() {
            name.is_empty() || name == jid.user
        } else {
            name.is_empty() || name == jid.user || name.ends_with(&format!("@{USER_SERVER}"))
        };
        if !needs_backfill {
            continue;
        }

        let resolved = resolve_preferred_name(network, &jid).await;
        if resolved.is_empty() || resolved == jid.user || resolved == name {
            continue;
        }
        if let Err(err) = db.set_chat_name(&jid_str, &resolved).await {
            tracing::warn!(jid = %jid_str, %err, "backfill: update failed");
            continue;
        }
        updated += 1;
    }

    if updated > 0 {
        tracing::info!(count = updated, "backfill: updated chat names");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::ContactNames;
    use crate::testutil::StubNetwork;
    use chrono::{TimeZone, Utc};

    async fn temp_db() -> (tempfile::TempDir, WrenDb) {
        let dir = tempfile::tempdir().unwrap();
        let db = WrenDb::open(dir.path()).await.unwrap();
        (dir, db)
    }

    #[tokio::test]
    async fn stored_name_wins() {
        let (_dir, db) = temp_db().await;
        let ts = Utc.timestamp_opt(1_700_000_000, 0).single().unwrap();
        db.upsert_chat("1@s.whatsapp.net", "Alice", &ts).await.unwrap();

        let network = StubNetwork::default();
        let name = resolve_chat_name(&db, &network, "1@s.whatsapp.net", None, "fallback").await;
        assert_eq!(name, "Alice");
    }

    #[tokio::test]
    async fn conversation_metadata_beats_directory() {
        let (_dir, db) = temp_db().await;
        let network = StubNetwork::default();
        network.set_contact("1@s.whatsapp.net", ContactNames {
            full_name: Some("Directory Name".into()),
            ..Default::default()
        });

        let name =
            resolve_chat_name(&db, &network, "1@s.whatsapp.net", Some("History Name"), "").await;
        assert_eq!(name, "History Name");
    }

    #[tokio::test]
    async fn contact_cascade_prefers_full_then_business_then_push() {
        let (_dir, db) = temp_db().await;
        let network = StubNetwork::default();
        network.set_contact("1@s.whatsapp.net", ContactNames {
            full_name: None,
            business_name: Some("Acme Ltd".into()),
            push_name: Some("acme".into()),
        });
        let name = resolve_chat_name(&db, &network, "1@s.whatsapp.net", None, "").await;
        assert_eq!(name, "Acme Ltd");
    }

    #[tokio::test]
    async fn unknown_group_gets_placeholder() {
        let (_dir, db) = temp_db().await;
        let network = StubNetwork::default();
        let name = resolve_chat_name(&db, &network, "12036304@g.us", None, "").await;
        assert_eq!(name, "Group 12036304");
    }

    #[tokio::test]
    async fn sender_fallback_then_user_part() {
        let (_dir, db) = temp_db().await;
        let network = StubNetwork::default();
        let with_sender = resolve_chat_name(&db, &network, "1@s.whatsapp.net", None, "4471").await;
        assert_eq!(with_sender, "4471");
        let bare = resolve_chat_name(&db, &network, "1@s.whatsapp.net", None, "").await;
        assert_eq!(bare, "1");
    }

    #[tokio::test]
    async fn preferred_name_ignores_stored_value() {
        let (_dir, db) = temp_db().await;
        let ts = Utc.timestamp_opt(1_700_000_000, 0).single().unwrap();
        db.upsert_chat("1@s.whatsapp.net", "Stale", &ts).await.unwrap();

        let network = StubNetwork::default();
        network.set_contact("1@s.whatsapp.net", ContactNames {
            full_name: Some("Fresh".into()),
            ..Default::default()
        });
        let jid = Jid::parse("1@s.whatsapp.net").unwrap();
        assert_eq!(resolve_preferred_name(&network, &jid).await, "Fresh");
    }

    #[tokio::test]
    async fn backfill_improves_identifier_like_names_only() {
        let (_dir, db) = temp_db().await;
        let ts = Utc.timestamp_opt(1_700_000_000, 0).single().unwrap();
        db.upsert_chat("1@s.whatsapp.net", "1", &ts).await.unwrap();
        db.upsert_chat("2@s.whatsapp.net", "Settled Name", &ts).await.unwrap();

        let network = StubNetwork::default();
        network.set_contact("1@s.whatsapp.net", ContactNames {
            full_name: Some("Alice".into()),
            ..Default::default()
        });
        network.set_contact("2@s.whatsapp.net", ContactNames {
            full_name: Some("Should Not Apply".into()),
            ..Default::default()
        });

        backfill_chat_names(&db, &network).await;

        assert_eq!(
            db.chat_name("1@s.whatsapp.net").await.unwrap(),
            Some(Some("Alice".to_string()))
        );
        // A settled human name is never overwritten.
        assert_eq!(
            db.chat_name("2@s.whatsapp.net").await.unwrap(),
            Some(Some("Settled Name".to_string()))
        );
    }

    #[tokio::test]
    async fn backfill_skips_unresolvable_chats() {
        let (_dir, db) = temp_db().await;
        let ts = Utc.timestamp_opt(1_700_000_000, 0).single().unwrap();
        db.upsert_chat("3@s.whatsapp.net", "", &ts).await.unwrap();

        backfill_chat_names(&db, &StubNetwork::default()).await;

        // Directory knows nothing; the bare user part is not an improvement.
        assert_eq!(db.chat_name("3@s.whatsapp.net").await.unwrap(), Some(None));
    }
}
