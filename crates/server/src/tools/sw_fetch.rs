//! sw_fetch tool implementation.
//!
//! Runs a request through the worker's interception hook, the way a page
//! fetch would be handled.

use std::str::FromStr;

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use swcache_client::{Destination, Method, Request, RequestMode, ServiceWorker};
use swcache_core::{CacheName, Error, RateDecision, RateLimiter, ResponseSource, Strategy};

use super::json_result;
use crate::error::ToolError;

const ANONYMOUS_CLIENT: &str = "anonymous";

/// Input parameters for the sw_fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwFetchParams {
    /// Absolute URL, or a path resolved against the configured origin.
    pub url: String,

    /// HTTP method (default: GET). Only GET is ever cached.
    #[serde(default)]
    pub method: Option<String>,

    /// Request mode: "navigate", "same-origin", "no-cors" or "cors" (default).
    #[serde(default)]
    pub mode: Option<String>,

    /// Request destination, e.g. "document", "image", "script".
    #[serde(default)]
    pub destination: Option<String>,

    /// Caller identity for rate limiting.
    #[serde(default)]
    pub client_id: Option<String>,
}

/// Output structure for the sw_fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwFetchOutput {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    /// Body decoded as UTF-8 (lossy).
    pub body: String,
    /// Where the response came from.
    pub source: ResponseSource,
    /// Strategy that handled the request, if a route matched.
    pub strategy: Option<Strategy>,
    pub cache_name: Option<CacheName>,
}

fn build_request(worker: &ServiceWorker, params: &SwFetchParams) -> Result<Request, McpError> {
    let url = worker.resolve(&params.url)?;
    let mut request = Request::get(url);

    if let Some(method) = params.method.as_deref() {
        let method = Method::from_bytes(method.to_ascii_uppercase().as_bytes())
            .map_err(|_| ToolError::InvalidInput(format!("invalid method: {method}")))?;
        request = request.with_method(method);
    }
    if let Some(mode) = params.mode.as_deref() {
        request = request.with_mode(RequestMode::from_str(mode).map_err(ToolError::InvalidInput)?);
    }
    if let Some(destination) = params.destination.as_deref() {
        request = request.with_destination(Destination::from_str(destination).map_err(ToolError::InvalidInput)?);
    }

    Ok(request)
}

/// Implementation of the sw_fetch tool.
pub async fn fetch_impl(
    worker: &ServiceWorker, limiter: &RateLimiter, params: SwFetchParams,
) -> Result<CallToolResult, McpError> {
    if params.url.trim().is_empty() {
        return Err(Error::InvalidInput("url cannot be empty".into()).into());
    }

    let client_id = params.client_id.as_deref().unwrap_or(ANONYMOUS_CLIENT);
    if let RateDecision::Throttled { retry_after } = limiter.check_and_increment(client_id) {
        tracing::warn!(client_id, retry_after_ms = retry_after.as_millis() as u64, "sw_fetch throttled");
        return Err(Error::RateLimited { retry_after_secs: retry_after.as_secs().max(1) }.into());
    }

    let request = build_request(worker, &params)?;
    let outcome = worker.intercept(&request).await;
    tracing::debug!(
        url = %request.url,
        status = outcome.response.status,
        strategy = outcome.strategy.map(|s| s.as_str()),
        "sw_fetch handled"
    );

    let response = outcome.response;
    let output = SwFetchOutput {
        status: response.status,
        headers: response
            .headers
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect(),
        body: response.text(),
        source: response.source,
        strategy: outcome.strategy,
        cache_name: outcome.cache_name,
    };

    Ok(json_result(&output)?)
}
