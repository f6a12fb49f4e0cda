//! MCP server handler implementation.
//!
//! This module defines the main server handler that
//! routes tool calls to the appropriate implementations.
use crate::tools::{
    cache::{CacheGetParams, CachePurgeParams, get_impl, purge_impl},
    sw_fetch::{SwFetchParams, fetch_impl},
    sw_message::{SwMessageParams, message_impl},
};

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
use std::sync::Arc;
use swcache_client::ServiceWorker;
use swcache_core::RateLimiter;

/// The main MCP server handler for mcp-swcache.
#[derive(Clone)]
pub struct SwCacheServer {
    worker: Arc<ServiceWorker>,
    limiter: Arc<RateLimiter>,
    tool_router: ToolRouter<Self>,
}

/// Tool router implementation using the #[tool_router] macro.
///
/// This macro generates the routing logic that maps tool names to handler methods.
#[tool_router]
impl SwCacheServer {
    /// Create a new server handler around a booted worker.
    pub fn new(worker: Arc<ServiceWorker>, limiter: Arc<RateLimiter>) -> Self {
        Self { worker, limiter, tool_router: Self::tool_router() }
    }

    /// Run a request through the interception layer.
    #[tool(
        description = "Fetch a URL through the caching service worker. Applies the matching route's strategy (cache-first, network-first, stale-while-revalidate, ...) and returns the response with its source."
    )]
    async fn sw_fetch(&self, params: Parameters<SwFetchParams>) -> Result<CallToolResult, McpError> {
        fetch_impl(&self.worker, &self.limiter, params.0).await
    }

    #[tool(description = "Post an administrative message to the worker: SKIP_WAITING, CACHE_UPDATE {urls}, or CLEAR_CACHES.")]
    async fn sw_message(&self, params: Parameters<SwMessageParams>) -> Result<CallToolResult, McpError> {
        message_impl(&self.worker, params.0).await
    }

    #[tool(description = "Look up a cached response across the current named caches, including its bookkeeping headers.")]
    async fn cache_get(&self, params: Parameters<CacheGetParams>) -> Result<CallToolResult, McpError> {
        get_impl(&self.worker, params.0).await
    }

    #[tool(description = "Delete a named cache and/or keep only the newest N entries. At least one option is required.")]
    async fn cache_purge(&self, params: Parameters<CachePurgeParams>) -> Result<CallToolResult, McpError> {
        purge_impl(self.worker.db(), params.0).await
    }
}

impl ServerHandler for SwCacheServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: "mcp-swcache".into(),
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::test_support::booted_worker;
    use std::time::Duration;

    #[tokio::test]
    async fn test_registers_all_tools() {
        let (worker, _) = booted_worker(&[]).await;
        let server = SwCacheServer::new(worker, Arc::new(RateLimiter::new(1, Duration::from_secs(1))));

        let mut names: Vec<String> = server.tool_router.list_all().into_iter().map(|t| t.name.to_string()).collect();
        names.sort();
        assert_eq!(names, vec!["cache_get", "cache_purge", "sw_fetch", "sw_message"]);
        assert_eq!(server.get_info().server_info.name, "mcp-swcache");
    }
}
