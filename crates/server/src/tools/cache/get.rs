//! cache_get tool implementation.
//!
//! Looks a request up across the worker's current partitions.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use swcache_client::ServiceWorker;
use swcache_core::cache::is_expired;
use swcache_core::{CacheName, Error, RequestKey};

use crate::tools::json_result;

/// Parameters for the cache_get tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheGetParams {
    /// Absolute URL or origin-relative path of the cached request.
    pub url: String,

    /// HTTP method of the cached request (default: GET).
    #[serde(default)]
    pub method: Option<String>,
}

/// Output from the cache_get tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheGetOutput {
    pub cache_name: CacheName,
    pub method: String,
    pub url: String,
    pub status: u16,
    /// Stored headers, including the synthetic bookkeeping headers.
    pub headers: Vec<(String, String)>,
    pub body: String,
    /// Insertion time, epoch milliseconds.
    pub timestamp_ms: Option<i64>,
    pub max_age_secs: Option<u64>,
    /// Whether the entry is past the max-age it was stored with.
    pub expired: bool,
}

/// Implementation of the cache_get tool.
pub async fn get_impl(worker: &ServiceWorker, params: CacheGetParams) -> Result<CallToolResult, McpError> {
    let url = worker.resolve(&params.url)?;
    let key = RequestKey::new(params.method.as_deref().unwrap_or("GET"), url.as_str());

    let entry = worker
        .db()
        .match_any(&key, &worker.expected_caches())
        .await?
        .ok_or_else(|| Error::CacheMiss(key.to_string()))?;

    let max_age_secs = entry.max_age_secs();
    let output = CacheGetOutput {
        expired: is_expired(&entry, max_age_secs.unwrap_or(0)),
        timestamp_ms: entry.timestamp_ms(),
        max_age_secs,
        method: entry.key.method().to_string(),
        url: entry.key.url().to_string(),
        status: entry.response.status,
        headers: entry
            .response
            .headers
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect(),
        body: entry.response.text(),
        cache_name: entry.cache_name,
    };

    Ok(json_result(&output)?)
}
