use serde_json::{json, Map, Value};
use wren_service::{
    ChatService, ListMessagesParams, MessageService, SendMessageParams, ServiceError,
};

use crate::types::ToolDefinition;

/// Services the tool handlers dispatch into.
pub struct ToolContext {
    pub chats: ChatService,
    pub messages: MessageService,
}

pub fn tool_definitions() -> Vec<ToolDefinition> {
    vec![
        ToolDefinition {
            name: "list_chats".to_string(),
            description: "List recent conversations with message previews, sorted by activity. \
                Use this to browse chats, find a conversation by name or phone, or discover \
                chat JIDs for other tools."
                .to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "Filter by chat name or JID, case-insensitive partial match. Examples: 'mom', '44123', 'work group'."
                    },
                    "groups_only": {
                        "type": "boolean",
                        "description": "Only return group chats",
                        "default": false
                    },
                    "limit": {
                        "type": "integer",
                        "description": "Maximum chats to return (1-200)",
                        "default": 20, "minimum": 1, "maximum": 200
                    },
                    "page": {
                        "type": "integer",
                        "description": "Page number, 0-based",
                        "default": 0, "minimum": 0
                    }
                }
            }),
        },
        ToolDefinition {
            name: "list_messages".to_string(),
            description: "List messages, newest first. Filter by recipient (phone, JID, or chat \
                name), sender phone, and either a timeframe preset or explicit after/before \
                timestamps."
                .to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "recipient": {
                        "type": "string",
                        "description": "Restrict to one chat: phone without '+', JID, or chat name"
                    },
                    "timeframe": {
                        "type": "string",
                        "enum": ["last_hour", "today", "yesterday", "last_3_days", "this_week", "last_week", "this_month"],
                        "description": "Named window; mutually exclusive with after/before"
                    },
                    "after": { "type": "string", "description": "ISO-8601 lower bound (inclusive)" },
                    "before": { "type": "string", "description": "ISO-8601 upper bound (exclusive)" },
                    "sender": { "type": "string", "description": "Filter by sender phone number without '+'" },
                    "limit": { "type": "integer", "default": 20, "minimum": 1, "maximum": 200 },
                    "page": { "type": "integer", "default": 0, "minimum": 0 }
                }
            }),
        },
        ToolDefinition {
            name: "search_messages".to_string(),
            description: "Full-text search across all message content. Supports FTS5 syntax: \
                keywords, \"exact phrases\", OR, exclusion with -, prefix*. Each hit comes with \
                two messages of surrounding context."
                .to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "query": { "type": "string", "description": "Search query" },
                    "timeframe": {
                        "type": "string",
                        "enum": ["last_hour", "today", "yesterday", "last_3_days", "this_week", "last_week", "this_month"]
                    },
                    "after": { "type": "string" },
                    "before": { "type": "string" },
                    "limit": { "type": "integer", "default": 20, "minimum": 1, "maximum": 200 },
                    "page": { "type": "integer", "default": 0, "minimum": 0 }
                },
                "required": ["query"]
            }),
        },
        ToolDefinition {
            name: "send_message".to_string(),
            description: "Send a text or media message. Recipient is a phone without '+', a JID, \
                or a chat name. With media_path, text becomes the caption; audio files are sent \
                as voice notes and converted to Opus when needed."
                .to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "recipient": { "type": "string", "description": "Phone, JID, or chat name" },
                    "text": { "type": "string", "description": "Message text, or caption when media_path is set" },
                    "media_path": { "type": "string", "description": "Absolute path to an image, video, audio file, or document" },
                    "reply_to_message_id": { "type": "string", "description": "Quote this message id in the reply" }
                },
                "required": ["recipient"]
            }),
        },
        ToolDefinition {
            name: "download_media".to_string(),
            description: "Download the media of a stored message to local disk and return the \
                saved path."
                .to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "message_id": { "type": "string" },
                    "chat_jid": { "type": "string" }
                },
                "required": ["message_id", "chat_jid"]
            }),
        },
        ToolDefinition {
            name: "get_connection_status".to_string(),
            description: "Report chat-network connection and login state plus store statistics."
                .to_string(),
            input_schema: json!({ "type": "object", "properties": {} }),
        },
        ToolDefinition {
            name: "catch_up".to_string(),
            description: "Summarise a timeframe: totals, the most active chats with recent \
                messages, unanswered questions addressed to you, and a media overview."
                .to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "timeframe": {
                        "type": "string",
                        "enum": ["last_hour", "today", "yesterday", "last_3_days", "this_week", "last_week", "this_month"],
                        "default": "today"
                    },
                    "groups_only": { "type": "boolean", "default": false }
                }
            }),
        },
    ]
}

/// Runs one tool call and returns the response envelope. Errors never
/// escape; they map onto `{success:false, error, details, hint}`.
pub async fn handle_tool_call(ctx: &ToolContext, name: &str, args: &Map<String, Value>) -> Value {
    let result = dispatch(ctx, name, args).await;
    match result {
        Ok(value) => value,
        Err(err) => envelope(&err),
    }
}

async fn dispatch(
    ctx: &ToolContext,
    name: &str,
    args: &Map<String, Value>,
) -> Result<Value, ServiceError> {
    match name {
        "list_chats" => {
            let result = ctx
                .chats
                .list_chats(
                    arg_str(args, "query").as_deref(),
                    arg_bool(args, "groups_only"),
                    arg_i64(args, "limit", 20),
                    arg_i64(args, "page", 0),
                )
                .await?;
            Ok(merge_success(serde_json::to_value(result).unwrap_or_default()))
        }
        "list_messages" => {
            let messages = ctx
                .messages
                .list_messages(ListMessagesParams {
                    recipient: arg_str(args, "recipient"),
                    timeframe: arg_str(args, "timeframe"),
                    after: arg_str(args, "after"),
                    before: arg_str(args, "before"),
                    sender: arg_str(args, "sender"),
                    limit: arg_i64(args, "limit", 20),
                    page: arg_i64(args, "page", 0),
                })
                .await?;
            Ok(json!({ "success": true, "messages": messages }))
        }
        "search_messages" => {
            let query = arg_str(args, "query")
                .ok_or_else(|| ServiceError::validation("query is required"))?;
            let outcome = ctx
                .messages
                .search_messages(
                    &query,
                    arg_str(args, "timeframe").as_deref(),
                    arg_str(args, "after").as_deref(),
                    arg_str(args, "before").as_deref(),
                    arg_i64(args, "limit", 20),
                    arg_i64(args, "page", 0),
                )
                .await?;
            let mut value = json!({ "success": true, "messages": outcome.hits });
            if outcome.fallback_used {
                value["warning"] = json!(
                    "full-text query could not be parsed; substring search was used instead"
                );
            }
            Ok(value)
        }
        "send_message" => {
            let outcome = ctx
                .messages
                .send_message(SendMessageParams {
                    recipient: arg_str(args, "recipient").unwrap_or_default(),
                    text: arg_str(args, "text"),
                    media_path: arg_str(args, "media_path"),
                    reply_to_message_id: arg_str(args, "reply_to_message_id"),
                })
                .await?;
            Ok(merge_success(serde_json::to_value(outcome).unwrap_or_default()))
        }
        "download_media" => {
            let outcome = ctx
                .messages
                .download_media(
                    &arg_str(args, "message_id").unwrap_or_default(),
                    &arg_str(args, "chat_jid").unwrap_or_default(),
                )
                .await?;
            Ok(merge_success(serde_json::to_value(outcome).unwrap_or_default()))
        }
        "get_connection_status" => {
            let status = ctx.messages.connection_status().await?;
            Ok(json!({
                "success": true,
                "status": serde_json::to_value(status).unwrap_or_default(),
            }))
        }
        "catch_up" => {
            let report = ctx
                .messages
                .catch_up(
                    arg_str(args, "timeframe").as_deref(),
                    arg_bool(args, "groups_only"),
                )
                .await?;
            Ok(merge_success(serde_json::to_value(report).unwrap_or_default()))
        }
        other => Err(ServiceError::validation_with_hint(
            format!("unknown tool: {other}"),
            "call tools/list for the available tools",
        )),
    }
}

/// Maps a service failure onto the wire envelope.
pub fn envelope(err: &ServiceError) -> Value {
    let mut value = json!({
        "success": false,
        "error": err.error_code(),
        "details": err.details(),
    });
    if let Some(hint) = err.hint() {
        value["hint"] = json!(hint);
    }
    value
}

fn merge_success(value: Value) -> Value {
    match value {
        Value::Object(mut map) => {
            map.insert("success".to_string(), Value::Bool(true));
            Value::Object(map)
        }
        other => json!({ "success": true, "result": other }),
    }
}

fn arg_str(args: &Map<String, Value>, key: &str) -> Option<String> {
    args.get(key)
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn arg_i64(args: &Map<String, Value>, key: &str, default: i64) -> i64 {
    args.get(key).and_then(|v| v.as_i64()).unwrap_or(default)
}

fn arg_bool(args: &Map<String, Value>, key: &str) -> bool {
    args.get(key).and_then(|v| v.as_bool()).unwrap_or(false)
}
