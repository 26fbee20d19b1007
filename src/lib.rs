//! `mcpgate` — a session-scoped MCP (Model Context Protocol) endpoint.
//!
//! A client initializes a session, discovers a fixed set of tools and
//! resources, invokes tools, and fetches resource contents, all over one
//! JSON-RPC request/response channel keyed by an `mcp-session-id` header.
//! The same registry is also served sessionless over stdin/stdout by
//! [`StdioBinding`].
//!
//! # Quick start
//!
//! ```rust
//! use std::sync::Arc;
//! use mcpgate::{build_registry, Dispatcher, RequestMeta, SessionStore};
//!
//! # async fn example() {
//! let registry = Arc::new(build_registry().unwrap());
//! let dispatcher = Dispatcher::new(registry, Arc::new(SessionStore::new()));
//!
//! let meta = RequestMeta {
//!     session_token: None,
//!     accept: Some("application/json".into()),
//! };
//! let body = br#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{"client":{"name":"demo","version":"0.1"}}}"#;
//! let reply = dispatcher.handle(body, &meta).await;
//! assert!(reply.session.is_some());
//! # }
//! ```

pub mod catalog;
pub mod dispatch;
pub mod registry;
pub mod session;
pub mod transport_http;
pub mod transport_stdio;
pub mod types;
pub mod validate;

// Re-export the most commonly used items at the crate root.
pub use catalog::build_registry;
pub use dispatch::{Dispatcher, Method, Reply, ReplyStatus};
pub use registry::{
    FnToolHandler, Locator, ParamType, Registry, Resource, ResourceHandler, Tool, ToolHandler,
    UriTemplate,
};
pub use session::{Session, SessionStore};
pub use transport_http::http_router;
pub use transport_stdio::StdioBinding;
pub use types::{
    error_response, ok_response, text_result, ContentBlock, JsonRpcRequest, JsonRpcResponse,
    McpError, ResourceContent, RpcError, ToolResult, JSONRPC_VERSION, SERVER_NAME, SERVER_VERSION,
    SESSION_HEADER,
};
pub use validate::{classify, RequestMeta, ValidatedRequest, ValidationError};
