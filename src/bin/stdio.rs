//! Stdio entry point: the sessionless line-oriented binding. Logs go to
//! stderr so stdout stays a clean response stream.

use std::sync::Arc;

use mcpgate::{build_registry, StdioBinding};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let registry = Arc::new(build_registry().expect("catalog registration failed"));
    let binding = StdioBinding::new(registry);

    if let Err(e) = binding.run().await {
        tracing::error!(error = %e, "stdio binding failed");
        std::process::exit(1);
    }
}
