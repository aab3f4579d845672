use std::io::Write;

use serde_json::{json, Map, Value};
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::tools::{handle_tool_call, tool_definitions, ToolContext};
use crate::types::{
    McpMessage, McpNotification, McpRequest, McpResponse, INVALID_PARAMS, METHOD_NOT_FOUND,
    PARSE_ERROR,
};

/// Stdio JSON-RPC server exposing the tool surface. Runs until stdin closes.
pub struct McpServer {
    ctx: ToolContext,
}

impl McpServer {
    pub fn new(ctx: ToolContext) -> Self {
        Self { ctx }
    }

    pub async fn run(&self) -> std::io::Result<()> {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        tracing::info!("tool server listening on stdio");

        while let Some(line) = lines.next_line().await? {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<McpMessage>(&line) {
                Ok(McpMessage::Request(request)) => {
                    let response = self.handle_request(request).await;
                    write_response(&response)?;
                }
                Ok(McpMessage::Notification(notification)) => {
                    self.handle_notification(notification);
                }
                Err(err) => {
                    tracing::error!(%err, "unparsable RPC line");
                    write_response(&McpResponse::error(
                        None,
                        PARSE_ERROR,
                        format!("parse error: {err}"),
                    ))?;
                }
            }
        }

        tracing::info!("stdin closed, tool server stopping");
        Ok(())
    }

    async fn handle_request(&self, request: McpRequest) -> McpResponse {
        let id = request.id.clone();
        match request.method.as_str() {
            "initialize" => McpResponse::success(
                id,
                json!({
                    "protocolVersion": "2024-11-05",
                    "capabilities": {
                        "tools": { "listChanged": false }
                    },
                    "serverInfo": {
                        "name": "wren",
                        "version": env!("CARGO_PKG_VERSION")
                    }
                }),
            ),
            "tools/list" => McpResponse::success(id, json!({ "tools": tool_definitions() })),
            "tools/call" => self.handle_tools_call(id, request.params).await,
            "resources/list" => McpResponse::success(id, json!({ "resources": [] })),
            "prompts/list" => McpResponse::success(id, json!({ "prompts": [] })),
            other => {
                McpResponse::error(id, METHOD_NOT_FOUND, format!("method not found: {other}"))
            }
        }
    }

    fn handle_notification(&self, notification: McpNotification) {
        match notification.method.as_str() {
            "notifications/initialized" => tracing::info!("client initialized"),
            other => tracing::debug!(method = other, "ignoring notification"),
        }
    }

    async fn handle_tools_call(&self, id: Option<Value>, params: Option<Value>) -> McpResponse {
        let Some(params) = params else {
            return McpResponse::error(id, INVALID_PARAMS, "missing params");
        };
        let Some(name) = params.get("name").and_then(|v| v.as_str()) else {
            return McpResponse::error(id, INVALID_PARAMS, "missing tool name");
        };
        let arguments: Map<String, Value> = params
            .get("arguments")
            .and_then(|v| v.as_object())
            .cloned()
            .unwrap_or_default();

        tracing::debug!(tool = name, "tool call");
        let result = handle_tool_call(&self.ctx, name, &arguments).await;
        let is_error = result
            .get("success")
            .and_then(|v| v.as_bool())
            .map(|ok| !ok)
            .unwrap_or(false);

        McpResponse::success(
            id,
            json!({
                "content": [{ "type": "text", "text": result.to_string() }],
                "isError": is_error
            }),
        )
    }
}

/// Responses go to stdout; logs stay on stderr.
fn write_response(response: &McpResponse) -> std::io::Result<()> {
    let text = serde_json::to_string(response)
        .unwrap_or_else(|_| r#"{"jsonrpc":"2.0","error":{"code":-32603,"message":"serialization failed"}}"#.to_string());
    let stdout = std::io::stdout();
    let mut lock = stdout.lock();
    writeln!(lock, "{text}")?;
    lock.flush()
}
