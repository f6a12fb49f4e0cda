//! sw_message tool implementation.
//!
//! Posts an administrative message to the worker.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use swcache_client::ServiceWorker;
use swcache_core::WorkerMessage;

use super::json_result;

/// Input parameters for the sw_message tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwMessageParams {
    /// Message to post, e.g. `{"type": "CACHE_UPDATE", "urls": ["/about"]}`.
    pub message: WorkerMessage,
}

/// Output structure for the sw_message tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwMessageOutput {
    /// Message type that was handled.
    pub kind: String,
    /// Worker lifecycle state after handling.
    pub state: String,
    pub controlling: bool,
}

/// Implementation of the sw_message tool.
pub async fn message_impl(worker: &ServiceWorker, params: SwMessageParams) -> Result<CallToolResult, McpError> {
    let kind = params.message.kind();
    worker.post_message(params.message).await?;

    let output = SwMessageOutput { kind: kind.to_string(), state: worker.state().to_string(), controlling: worker.is_controlling() };
    Ok(json_result(&output)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::test_support::{booted_worker, output};
    use swcache_core::{Partition, RequestKey};

    #[tokio::test]
    async fn test_cache_update_message() {
        let (worker, _) = booted_worker(&[("/about", "about me")]).await;
        let params: SwMessageParams =
            serde_json::from_str(r#"{"message": {"type": "CACHE_UPDATE", "urls": ["/about"]}}"#).unwrap();

        let out: SwMessageOutput = output(&message_impl(&worker, params).await.unwrap());
        assert_eq!(out.kind, "CACHE_UPDATE");
        assert_eq!(out.state, "activated");
        assert!(out.controlling);

        let cache = worker.db().open_cache(&Partition::Dynamic.cache_name("v1")).await.unwrap();
        let key = RequestKey::get("https://portfolio.dev/about");
        assert_eq!(cache.get(&key).await.unwrap().unwrap().response.text(), "about me");
    }

    #[tokio::test]
    async fn test_clear_caches_message() {
        let (worker, _) = booted_worker(&[]).await;
        let params = SwMessageParams { message: WorkerMessage::ClearCaches };

        message_impl(&worker, params).await.unwrap();
        assert!(worker.db().cache_names().await.unwrap().is_empty());
    }
}
