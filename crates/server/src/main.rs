//! tether-sw entry point.
//!
//! Boots the offline worker behind an MCP server on stdio transport. The
//! client delivers lifecycle events as tool calls.
//! Logging goes to stderr to avoid interfering with the JSON-RPC protocol on stdout.

use std::sync::Arc;

use anyhow::Result;
use rmcp::service::serve_server;
use rmcp::transport::io::stdio;
use tether_client::{FetchClient, FetchConfig, Network};
use tether_core::{CacheDb, WorkerConfig};
use tracing_subscriber::EnvFilter;

mod error;
mod handler;
mod host;
mod tools;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = WorkerConfig::load()?;
    let settings = config.settings()?;
    tracing::info!(version = settings.version(), origin = %settings.origin(), "Starting tether-sw on stdio transport");

    let cache = Arc::new(CacheDb::open(&config.db_path).await?);
    let network: Arc<dyn Network> = Arc::new(FetchClient::new(FetchConfig::from(&config))?);
    let ctx = tools::HostContext::new(settings, cache, network, 1);

    let handler = handler::TetherServer::new(ctx);
    let transport = stdio();
    let server = serve_server(handler, transport).await?;

    server.waiting().await?;

    Ok(())
}
