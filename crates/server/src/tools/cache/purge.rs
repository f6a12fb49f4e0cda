//! cache_purge tool implementation.
//!
//! Deletes a named cache and/or trims entries by insertion age.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use swcache_core::{CacheDb, CacheName, Error};

use crate::tools::json_result;

/// Parameters for the cache_purge tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CachePurgeParams {
    /// Named cache to delete with all its entries, e.g. "dynamic-v1".
    pub cache_name: Option<String>,

    /// Keep only the newest N entries across all caches (LRU purge).
    pub max_entries: Option<usize>,
}

/// Output from the cache_purge tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CachePurgeOutput {
    /// Whether the named cache existed and was deleted.
    pub cache_deleted: Option<bool>,
    /// Number of entries deleted by the LRU purge.
    pub entries_deleted: u64,
}

/// Implementation of the cache_purge tool.
pub async fn purge_impl(cache: &CacheDb, params: CachePurgeParams) -> Result<CallToolResult, McpError> {
    if params.cache_name.is_none() && params.max_entries.is_none() {
        return Err(Error::InvalidInput("At least one of cache_name or max_entries must be specified".to_string()).into());
    }

    let mut cache_deleted = None;
    if let Some(name) = params.cache_name {
        let deleted = cache.delete_cache(&CacheName::from_raw(name.trim())).await?;
        tracing::info!(cache = name.trim(), deleted, "cache_purge deleted named cache");
        cache_deleted = Some(deleted);
    }

    let mut entries_deleted = 0u64;
    if let Some(max_entries) = params.max_entries {
        entries_deleted = cache.purge_lru_entries(max_entries).await?;
    }

    Ok(json_result(&CachePurgeOutput { cache_deleted, entries_deleted })?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use swcache_core::{Headers, Partition, RequestKey, Response, ResponseSource};

    async fn seeded() -> CacheDb {
        let db = CacheDb::open_in_memory().await.unwrap();
        for (partition, path) in [(Partition::Dynamic, "/a"), (Partition::Dynamic, "/b"), (Partition::Api, "/api/c")] {
            let cache = db.open_cache(&partition.cache_name("v1")).await.unwrap();
            let response = Response::new(200, Headers::new(), "x", ResponseSource::Network);
            cache
                .put(&RequestKey::get(format!("https://portfolio.dev{path}")), &response, 60)
                .await
                .unwrap();
        }
        db
    }

    fn decode(result: &CallToolResult) -> CachePurgeOutput {
        crate::tools::test_support::output(result)
    }

    #[tokio::test]
    async fn test_purge_named_cache() {
        let db = seeded().await;
        let params = CachePurgeParams { cache_name: Some("dynamic-v1".into()), max_entries: None };

        let output = decode(&purge_impl(&db, params).await.unwrap());
        assert_eq!(output.cache_deleted, Some(true));
        assert_eq!(output.entries_deleted, 0);
        assert_eq!(db.cache_names().await.unwrap(), vec![Partition::Api.cache_name("v1")]);
    }

    #[tokio::test]
    async fn test_purge_unknown_cache() {
        let db = seeded().await;
        let params = CachePurgeParams { cache_name: Some("old-cache-v0".into()), max_entries: None };

        let output = decode(&purge_impl(&db, params).await.unwrap());
        assert_eq!(output.cache_deleted, Some(false));
    }

    #[tokio::test]
    async fn test_purge_lru() {
        let db = seeded().await;
        let params = CachePurgeParams { cache_name: None, max_entries: Some(1) };

        let output = decode(&purge_impl(&db, params).await.unwrap());
        assert_eq!(output.entries_deleted, 2);
    }

    #[tokio::test]
    async fn test_purge_no_params() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let params = CachePurgeParams { cache_name: None, max_entries: None };

        let result = purge_impl(&db, params).await;
        assert!(result.is_err());
    }
}
