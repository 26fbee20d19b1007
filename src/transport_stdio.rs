//! Line-oriented stdio binding: the same registry served over
//! stdin/stdout, one JSON-RPC envelope per line, with no session concept.
//! Independent of the HTTP binding; the accept/session rules do not apply.

use std::sync::Arc;

use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use crate::dispatch::{route_registry, Method};
use crate::registry::Registry;
use crate::types::{
    error_response, ok_response, JsonRpcRequest, McpError, ERR_CODE_INTERNAL, JSONRPC_VERSION,
    SERVER_NAME, SERVER_VERSION,
};

pub struct StdioBinding {
    registry: Arc<Registry>,
}

impl StdioBinding {
    pub fn new(registry: Arc<Registry>) -> Self {
        StdioBinding { registry }
    }

    /// Answer one input line. Returns None for blank lines.
    pub async fn handle_line(&self, line: &str) -> Option<String> {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return None;
        }

        let response = match serde_json::from_str::<JsonRpcRequest>(trimmed) {
            Ok(request) if request.jsonrpc == JSONRPC_VERSION => match Method::parse(&request.method)
            {
                // No session to mint here: initialize just reports identity.
                Method::Initialize => ok_response(
                    request.id,
                    json!({
                        "server": {
                            "name": SERVER_NAME,
                            "version": SERVER_VERSION,
                        },
                    }),
                ),
                _ => route_registry(&self.registry, request).await,
            },
            _ => {
                tracing::warn!("unparseable stdio line");
                error_response(Some(Value::Null), ERR_CODE_INTERNAL, "Internal server error")
            }
        };

        // Envelopes serialize infallibly; fall back to a bare error just in case.
        Some(
            serde_json::to_string(&response)
                .unwrap_or_else(|_| r#"{"jsonrpc":"2.0","error":{"code":-32603,"message":"Internal server error"},"id":null}"#.into()),
        )
    }

    /// Run the loop: read stdin line by line, write one response per line.
    pub async fn run(&self) -> Result<(), McpError> {
        let stdin = tokio::io::stdin();
        let mut stdout = tokio::io::stdout();
        let mut reader = BufReader::new(stdin);
        let mut line = String::new();

        tracing::info!("stdio binding started");

        loop {
            line.clear();
            let bytes_read = reader.read_line(&mut line).await?;
            if bytes_read == 0 {
                tracing::info!("EOF on stdin, shutting down");
                break;
            }

            if let Some(response) = self.handle_line(&line).await {
                stdout.write_all(response.as_bytes()).await?;
                stdout.write_all(b"\n").await?;
                stdout.flush().await?;
            }
        }

        Ok(())
    }
}
