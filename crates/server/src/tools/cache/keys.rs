//! cache_keys tool implementation.
//!
//! Lists every cache store with its size and whether activation would keep it.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tether_core::cache::is_current_store;
use tether_core::{CacheDb, CacheStorage};

use crate::tools::json_result;

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct StoreSummary {
    pub name: String,
    pub entries: u64,
    /// Belongs to the configured version.
    pub current: bool,
}

/// Output from the cache_keys tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheKeysOutput {
    pub version: String,
    /// Stores in creation order.
    pub stores: Vec<StoreSummary>,
}

/// Implementation of the cache_keys tool.
pub async fn keys_impl(cache: &CacheDb, version: &str) -> Result<CallToolResult, McpError> {
    let mut stores = Vec::new();
    for name in cache.keys().await? {
        let entries = cache.count_entries(&name).await?;
        let current = is_current_store(&name, version);
        stores.push(StoreSummary { name, entries, current });
    }

    json_result(&CacheKeysOutput { version: version.to_string(), stores })
}
