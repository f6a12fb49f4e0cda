//! Administrative message dispatch.

use super::{ServiceWorker, WorkerState};
use crate::fetch::Request;
use std::sync::atomic::Ordering;
use swcache_core::{Error, WorkerMessage};

/// Max-age for explicitly updated URLs that no route claims.
const UNROUTED_MAX_AGE_SECS: u64 = 24 * 60 * 60;

impl ServiceWorker {
    /// Handle a message posted by the host page.
    ///
    /// Messages are not queued: one posted while another is still being
    /// handled is rejected with [`Error::MessageInFlight`].
    pub async fn post_message(&self, message: WorkerMessage) -> Result<(), Error> {
        let Ok(_guard) = self.message_lock.try_lock() else {
            tracing::warn!(kind = message.kind(), "message rejected, another is in flight");
            return Err(Error::MessageInFlight);
        };
        tracing::info!(kind = message.kind(), "handling message");

        match message {
            WorkerMessage::SkipWaiting => self.skip_waiting_now().await,
            WorkerMessage::CacheUpdate { urls } => {
                self.update_caches(&urls).await;
                Ok(())
            }
            WorkerMessage::ClearCaches => self.clear_caches().await,
        }
    }

    async fn skip_waiting_now(&self) -> Result<(), Error> {
        self.skip_waiting.store(true, Ordering::SeqCst);
        if self.state() == WorkerState::Installed {
            self.activate().await?;
        }
        Ok(())
    }

    /// Re-fetch each URL into the partition its route selects. Failures
    /// are logged per URL and do not stop the rest.
    async fn update_caches(&self, urls: &[String]) -> usize {
        let mut updated = 0;
        for raw in urls {
            let url = match self.resolve(raw) {
                Ok(url) => url,
                Err(e) => {
                    tracing::warn!("skipping cache update for {}: {}", raw, e);
                    continue;
                }
            };

            let (partition, max_age) = self.routes.partition_for(url.as_str());
            let request = Request::get(url);
            let response = match self.ctx.network.fetch(&request).await {
                Ok(response) if response.is_ok() => response,
                Ok(response) => {
                    tracing::warn!("cache update for {} got status {}", request.url, response.status);
                    continue;
                }
                Err(e) => {
                    tracing::warn!("cache update for {} failed: {}", request.url, e);
                    continue;
                }
            };

            let cache_name = partition.cache_name(&self.config.version);
            let stored = match self.db().open_cache(&cache_name).await {
                Ok(cache) => cache.put(&request.key(), &response, max_age.unwrap_or(UNROUTED_MAX_AGE_SECS)).await,
                Err(e) => Err(e),
            };
            match stored {
                Ok(()) => updated += 1,
                Err(e) => tracing::warn!("failed to store update for {} in {}: {}", request.url, cache_name, e),
            }
        }

        tracing::info!(updated, requested = urls.len(), "cache update finished");
        updated
    }

    async fn clear_caches(&self) -> Result<(), Error> {
        for name in self.db().cache_names().await? {
            self.db().delete_cache(&name).await?;
            tracing::info!(cache = %name, "cleared cache");
        }
        Ok(())
    }
}
