//! MCP server handler implementation.
//!
//! This module defines the main server handler that
//! routes tool calls to the appropriate implementations.
use crate::tools::{HostContext, WorkerFetchParams, activate_impl, fetch_impl, install_impl, keys_impl};

use rmcp::{
    ErrorData as McpError, ServerHandler,
    handler::server::{
        tool::{ToolCallContext, ToolRouter},
        wrapper::Parameters,
    },
    model::{
        CallToolRequestParam, CallToolResult, Implementation, ListToolsResult, PaginatedRequestParam, ProtocolVersion,
        ServerCapabilities, ServerInfo,
    },
    service::{RequestContext, RoleServer},
    tool, tool_router,
};

/// The MCP server handler for tether-sw.
#[derive(Clone)]
pub struct TetherServer {
    tool_router: ToolRouter<Self>,
    ctx: HostContext,
}

/// Tool router implementation using the #[tool_router] macro.
///
/// This macro generates the routing logic that maps tool names to handler methods.
#[tool_router]
impl TetherServer {
    /// Create a new server handler around a wired worker.
    pub fn new(ctx: HostContext) -> Self {
        Self { tool_router: Self::tool_router(), ctx }
    }

    /// Deliver an install event.
    #[tool(
        description = "Install the worker: cache the offline manifest into the current version's offline store. Activates immediately when the worker asks to skip waiting."
    )]
    async fn worker_install(&self) -> Result<CallToolResult, McpError> {
        install_impl(&self.ctx).await
    }

    /// Deliver an activate event.
    #[tool(
        description = "Activate an installed worker: claim open clients and delete cache stores that belong to other versions."
    )]
    async fn worker_activate(&self) -> Result<CallToolResult, McpError> {
        activate_impl(&self.ctx).await
    }

    /// Deliver a fetch event.
    #[tool(
        description = "Send a request through the worker. Returns the response with its source (network, cache, offline, or passthrough) and routing strategy."
    )]
    async fn worker_fetch(&self, params: Parameters<WorkerFetchParams>) -> Result<CallToolResult, McpError> {
        fetch_impl(&self.ctx, params.0).await
    }

    /// List cache stores.
    #[tool(description = "List cache stores with entry counts and whether each belongs to the current version.")]
    async fn cache_keys(&self) -> Result<CallToolResult, McpError> {
        keys_impl(&self.ctx.cache, self.ctx.worker.settings().version()).await
    }
}

impl ServerHandler for TetherServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: "tether-sw".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }

    async fn list_tools(
        &self, _request: Option<PaginatedRequestParam>, _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, rmcp::model::ErrorData> {
        Ok(ListToolsResult { meta: None, tools: self.tool_router.list_all(), next_cursor: None })
    }

    async fn call_tool(
        &self, request: CallToolRequestParam, context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, rmcp::model::ErrorData> {
        self.tool_router
            .call(ToolCallContext::new(self, request, context))
            .await
    }
}
