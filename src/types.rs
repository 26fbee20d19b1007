use serde::{Deserialize, Serialize};
use serde_json::Value;

/// JSON-RPC error codes the endpoint emits. Stable: clients match on them.
pub const ERR_CODE_BAD_REQUEST: i32 = -32000;
pub const ERR_CODE_NO_METHOD: i32 = -32601;
pub const ERR_CODE_INTERNAL: i32 = -32603;

/// The only JSON-RPC version the envelope accepts.
pub const JSONRPC_VERSION: &str = "2.0";

/// Fixed server identity reported by `initialize`.
pub const SERVER_NAME: &str = "mcpgate";
pub const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Header carrying the session token, both directions.
pub const SESSION_HEADER: &str = "mcp-session-id";

// ── Envelopes ──

/// Inbound JSON-RPC 2.0 request.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    #[serde(default)]
    pub id: Option<Value>,
    pub method: String,
    #[serde(default)]
    pub params: Option<Value>,
}

/// Outbound JSON-RPC 2.0 response. Exactly one of `result`/`error` is set;
/// the constructors below are the only way the dispatcher builds one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcError>,
}

/// JSON-RPC 2.0 error object.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcError {
    pub code: i32,
    pub message: String,
}

/// Build a success response echoing the request id.
pub fn ok_response(id: Option<Value>, result: Value) -> JsonRpcResponse {
    JsonRpcResponse {
        jsonrpc: JSONRPC_VERSION.into(),
        id,
        result: Some(result),
        error: None,
    }
}

/// Build an error response echoing the request id.
pub fn error_response(id: Option<Value>, code: i32, message: impl Into<String>) -> JsonRpcResponse {
    JsonRpcResponse {
        jsonrpc: JSONRPC_VERSION.into(),
        id,
        result: None,
        error: Some(RpcError {
            code,
            message: message.into(),
        }),
    }
}

// ── Handler payloads ──

/// Tool call result returned by tool handlers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResult {
    pub content: Vec<ContentBlock>,
}

/// Single content block in a tool result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentBlock {
    #[serde(rename = "type")]
    pub block_type: String,
    pub text: String,
}

/// Resource content returned by resource handlers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceContent {
    pub uri: String,
    pub text: String,
}

/// Create a single-block text tool result.
pub fn text_result(text: impl Into<String>) -> ToolResult {
    ToolResult {
        content: vec![ContentBlock {
            block_type: "text".into(),
            text: text.into(),
        }],
    }
}

/// Crate error type. Handler failures surface as `ERR_CODE_INTERNAL`
/// without the message leaking to the client.
#[derive(Debug, thiserror::Error)]
pub enum McpError {
    #[error("duplicate registration: {0}")]
    DuplicateName(String),
    #[error("handler error: {0}")]
    Handler(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}
