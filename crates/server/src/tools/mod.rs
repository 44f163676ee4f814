//! MCP tool implementations.
//!
//! Each tool is one host event: install, activate, an intercepted fetch, or
//! a look at the cache stores.

pub mod cache;
pub mod fetch;
pub mod lifecycle;

#[cfg(test)]
pub(crate) mod test_support;

use std::sync::Arc;

use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use serde::Serialize;
use tether_client::{Network, OfflineWorker, WorkerHost};
use tether_core::{CacheDb, CacheStorage, Error, WorkerSettings};

use crate::host::StdioHost;

pub use cache::keys_impl;
pub use fetch::{WorkerFetchParams, fetch_impl};
pub use lifecycle::{activate_impl, install_impl};

/// Shared handles a tool call acts through.
#[derive(Clone)]
pub struct HostContext {
    pub worker: OfflineWorker,
    pub host: Arc<StdioHost>,
    pub cache: Arc<CacheDb>,
    pub network: Arc<dyn Network>,
}

impl HostContext {
    /// Wire a worker to the given store and network, with `clients` open pages.
    pub fn new(settings: WorkerSettings, cache: Arc<CacheDb>, network: Arc<dyn Network>, clients: usize) -> Self {
        let host = Arc::new(StdioHost::new(clients));
        let worker = OfflineWorker::new(
            settings,
            Arc::clone(&cache) as Arc<dyn CacheStorage>,
            Arc::clone(&network),
            Arc::clone(&host) as Arc<dyn WorkerHost>,
        );
        Self { worker, host, cache, network }
    }
}

/// Serialize a tool output as pretty JSON text content.
pub(crate) fn json_result<T: Serialize>(output: &T) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string_pretty(output)
        .map_err(|e| Error::InvalidInput(format!("Failed to serialize output: {e}")))?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}
