//! worker_fetch tool implementation.
//!
//! Delivers one intercepted request. Before activation, and for requests the
//! worker declines, the host performs the fetch itself.

use std::collections::BTreeMap;

use chrono::Utc;
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tether_client::{FetchOutcome, LifecycleHandler, canonicalize};
use tether_core::Request;

use super::{HostContext, json_result};
use crate::error::HostError;
use crate::host::RegistrationState;

/// Input parameters for the worker_fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct WorkerFetchParams {
    /// HTTP method (default: GET).
    #[serde(default = "default_method")]
    pub method: String,

    /// Absolute URL, or a root-relative path resolved against the configured origin.
    pub url: String,

    /// Request headers, e.g. `{"Accept": "text/html"}`.
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
}

fn default_method() -> String {
    "GET".into()
}

/// Output structure for the worker_fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct WorkerFetchOutput {
    pub method: String,
    /// The canonical URL that was requested.
    pub url: String,
    pub status: u16,
    pub content_type: Option<String>,
    pub headers: BTreeMap<String, String>,
    /// Body decoded as UTF-8, lossily.
    pub body: String,
    pub body_bytes: usize,
    /// "network", "cache", "offline", or "passthrough".
    pub source: String,
    /// Routing strategy, absent for passthrough.
    pub strategy: Option<String>,
    /// Registration state the request was handled in.
    pub state: RegistrationState,
    pub resolved_at: String,
}

/// Implementation of the worker_fetch tool.
pub async fn fetch_impl(ctx: &HostContext, params: WorkerFetchParams) -> Result<CallToolResult, McpError> {
    let url = canonicalize(&params.url, Some(ctx.worker.settings().origin())).map_err(HostError::from)?;

    let mut request = Request::parse(&params.method, url.as_str())?;
    for (name, value) in &params.headers {
        request = request.try_with_header(name, value)?;
    }

    let state = ctx.host.state();
    let outcome =
        if ctx.host.is_controlling() { ctx.worker.fetch(request.clone()).await? } else { FetchOutcome::Passthrough };

    let (response, source, strategy) = match outcome {
        FetchOutcome::Respond(resolved) => {
            (resolved.response, resolved.source.as_str(), Some(resolved.strategy.as_str().to_string()))
        }
        FetchOutcome::Passthrough => {
            tracing::debug!(method = %request.method(), url = %request.url(), %state, "host fetch");
            (ctx.network.fetch(&request).await?, "passthrough", None)
        }
    };

    let headers = response
        .headers
        .iter()
        .map(|(name, value)| (name.as_str().to_string(), String::from_utf8_lossy(value.as_bytes()).into_owned()))
        .collect();

    let output = WorkerFetchOutput {
        method: request.method().to_string(),
        url: url.to_string(),
        status: response.status.as_u16(),
        content_type: response.content_type().map(str::to_string),
        headers,
        body: String::from_utf8_lossy(&response.body).into_owned(),
        body_bytes: response.body.len(),
        source: source.to_string(),
        strategy,
        state,
        resolved_at: Utc::now().to_rfc3339(),
    };
    json_result(&output)
}
