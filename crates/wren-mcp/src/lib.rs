mod server;
mod tools;
mod types;

pub use server::McpServer;
pub use tools::ToolContext;
pub use types::{McpMessage, McpNotification, McpRequest, McpResponse, RpcError, ToolDefinition};
