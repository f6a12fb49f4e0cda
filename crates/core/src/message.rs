//! Administrative messages a host page can post to the worker.

use serde::{Deserialize, Serialize};

/// Structured message posted to the worker.
///
/// Serialized with a `type` tag, e.g. `{"type": "SKIP_WAITING"}` or
/// `{"type": "CACHE_UPDATE", "urls": ["/about"]}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkerMessage {
    /// Activate a waiting worker immediately.
    SkipWaiting,
    /// Re-fetch the given URLs and store them in their partitions.
    CacheUpdate { urls: Vec<String> },
    /// Drop every named cache.
    ClearCaches,
}

impl WorkerMessage {
    pub fn kind(&self) -> &'static str {
        match self {
            WorkerMessage::SkipWaiting => "SKIP_WAITING",
            WorkerMessage::CacheUpdate { .. } => "CACHE_UPDATE",
            WorkerMessage::ClearCaches => "CLEAR_CACHES",
        }
    }
}
