use std::sync::Arc;

use serde::Serialize;
use wren_core::Chat;
use wren_db::WrenDb;

use crate::error::ServiceError;
use crate::Result;

pub struct ChatService {
    db: Arc<WrenDb>,
}

#[derive(Debug, Serialize)]
pub struct ListChatsResult {
    pub chats: Vec<Chat>,
    pub total: i64,
    pub page: i64,
    pub limit: i64,
    pub has_more: bool,
}

impl ChatService {
    pub fn new(db: Arc<WrenDb>) -> Self {
        Self { db }
    }

    pub async fn list_chats(
        &self,
        query: Option<&str>,
        only_groups: bool,
        limit: i64,
        page: i64,
    ) -> Result<ListChatsResult> {
        let limit = check_limit(limit)?;
        let page = page.max(0);

        let chats = self.db.list_chats(query, only_groups, limit, page).await?;
        let total = self.db.count_chats(query).await?;
        Ok(ListChatsResult {
            chats,
            total,
            page,
            limit,
            has_more: (page + 1) * limit < total,
        })
    }
}

/// Limits above the cap are rejected; zero and negatives take the default.
pub(crate) fn check_limit(limit: i64) -> Result<i64> {
    if limit > 200 {
        return Err(ServiceError::validation_with_hint(
            format!("limit cannot exceed 200 (got {limit})"),
            "page through results instead of raising the limit",
        ));
    }
    Ok(if limit <= 0 { 20 } else { limit })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    async fn service() -> (tempfile::TempDir, ChatService) {
        let dir = tempfile::tempdir().unwrap();
        let db = Arc::new(WrenDb::open(dir.path()).await.unwrap());
        let ts = Utc.timestamp_opt(1_700_000_000, 0).single().unwrap();
        db.upsert_chat("A@g.us", "Team", &ts).await.unwrap();
        db.upsert_chat("1@s.whatsapp.net", "Alice", &ts).await.unwrap();
        (dir, ChatService::new(db))
    }

    #[tokio::test]
    async fn oversized_limit_is_rejected() {
        let (_dir, svc) = service().await;
        let err = svc.list_chats(None, false, 500, 0).await.unwrap_err();
        assert_eq!(err.error_code(), "validation");
    }

    #[tokio::test]
    async fn pagination_metadata_is_reported() {
        let (_dir, svc) = service().await;
        let result = svc.list_chats(None, false, 1, 0).await.unwrap();
        assert_eq!(result.total, 2);
        assert_eq!(result.chats.len(), 1);
        assert!(result.has_more);

        let last = svc.list_chats(None, false, 1, 1).await.unwrap();
        assert!(!last.has_more);
    }

    #[tokio::test]
    async fn zero_limit_defaults() {
        let (_dir, svc) = service().await;
        let result = svc.list_chats(None, false, 0, 0).await.unwrap();
        assert_eq!(result.limit, 20);
        assert_eq!(result.chats.len(), 2);
    }
}
