//! HTTP entry point. `PORT` selects the listen port, `RUST_LOG` the
//! filter.

use std::sync::Arc;

use mcpgate::{build_registry, http_router, Dispatcher, SessionStore};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let registry = Arc::new(build_registry().expect("catalog registration failed"));
    let dispatcher = Dispatcher::new(registry, Arc::new(SessionStore::new()));

    let port = std::env::var("PORT").unwrap_or_else(|_| "3000".into());
    let addr = format!("0.0.0.0:{}", port);

    tracing::info!(addr = %addr, "starting MCP endpoint");

    let router = http_router(dispatcher);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("failed to bind");
    axum::serve(listener, router).await.expect("server error");
}
