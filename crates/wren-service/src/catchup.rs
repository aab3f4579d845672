use serde::Serialize;
use wren_core::{ActiveChat, MediaSummary, MessageRecord};
use wren_db::MessageFilter;

use crate::message_service::MessageService;
use crate::window::resolve_window;
use crate::Result;

const TOP_CHATS: i64 = 10;
const RECENT_PER_CHAT: i64 = 3;
const MAX_QUESTIONS: i64 = 10;

/// Aggregated view of a timeframe, for the `catch_up` tool.
#[derive(Debug, Serialize)]
pub struct CatchupReport {
    pub timeframe: String,
    pub total_messages: i64,
    pub active_chats: Vec<ActiveChat>,
    pub questions_for_me: Vec<MessageRecord>,
    pub media: MediaSummary,
    /// Chat names with at least one outstanding question in the window.
    pub needs_attention: Vec<String>,
    pub summary: String,
}

impl MessageService {
    pub async fn catch_up(&self, timeframe: Option<&str>, only_groups: bool) -> Result<CatchupReport> {
        let preset = timeframe.filter(|t| !t.is_empty()).unwrap_or("today");
        let (Some(after), Some(before)) = resolve_window(Some(preset), None, None)? else {
            return Err(crate::ServiceError::validation(format!(
                "timeframe '{preset}' did not resolve to a window"
            )));
        };

        let db = self.db();
        let total_messages = db.message_count_between(after, before, only_groups).await?;

        let mut active_chats = db
            .get_active_chats(after, before, only_groups, TOP_CHATS)
            .await?;
        for chat in &mut active_chats {
            chat.recent_messages = db
                .list_messages(&MessageFilter {
                    after: Some(after),
                    before: Some(before),
                    chat_jid: Some(chat.jid.clone()),
                    limit: RECENT_PER_CHAT,
                    ..Default::default()
                })
                .await?;
        }

        let questions_for_me = db
            .get_questions_for_me(after, before, MAX_QUESTIONS)
            .await?;
        let media = db.get_media_summary(after, before).await?;

        let mut needs_attention: Vec<String> = Vec::new();
        for question in &questions_for_me {
            let name = question
                .chat_name
                .clone()
                .unwrap_or_else(|| question.chat_jid.clone());
            if !needs_attention.contains(&name) {
                needs_attention.push(name);
            }
        }

        let summary = summarise(
            preset,
            total_messages,
            active_chats.len(),
            questions_for_me.len(),
            &needs_attention,
            &media,
        );

        Ok(CatchupReport {
            timeframe: preset.to_string(),
            total_messages,
            active_chats,
            questions_for_me,
            media,
            needs_attention,
            summary,
        })
    }
}

fn summarise(
    preset: &str,
    total: i64,
    chats: usize,
    questions: usize,
    needs_attention: &[String],
    media: &MediaSummary,
) -> String {
    if total == 0 {
        return format!("No messages in {preset}.");
    }

    let mut summary = format!(
        "{total} message{} across {chats} chat{} in {preset}",
        plural(total),
        plural(chats as i64)
    );
    if questions > 0 {
        summary.push_str(&format!(
            "; {questions} question{} awaiting a reply ({})",
            plural(questions as i64),
            needs_attention.join(", ")
        ));
    }
    let media_total = media.images + media.videos + media.audio + media.documents;
    if media_total > 0 {
        summary.push_str(&format!("; {media_total} media item{}", plural(media_total)));
    }
    summary.push('.');
    summary
}

fn plural(n: i64) -> &'static str {
    if n == 1 {
        ""
    } else {
        "s"
    }
}
