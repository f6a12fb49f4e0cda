//! Install and activate.
//!
//! Install pre-warms the static partition from the precache manifest,
//! all or nothing. Activate deletes every named cache this version does
//! not own and claims clients. Neither step runs on a timer; the host
//! triggers both, usually through [`ServiceWorker::boot`].

use super::{ServiceWorker, WorkerState};
use crate::fetch::Request;
use futures_util::future::try_join_all;
use std::sync::atomic::Ordering;
use swcache_core::{CacheName, Error, Partition, RequestKey, Response};

/// Result of an install.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallReport {
    /// Number of manifest entries stored in the static partition.
    pub precached: usize,
    /// Why the pre-warm was abandoned, if it was.
    pub error: Option<String>,
}

/// Result of an activation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivateReport {
    /// Named caches removed because this version does not own them.
    pub deleted: Vec<CacheName>,
}

impl ServiceWorker {
    /// Install and, if skip-waiting was requested, activate.
    pub async fn boot(&self) -> Result<(), Error> {
        self.install().await?;
        if self.skip_waiting_requested() {
            self.activate().await?;
        } else {
            tracing::info!("installed worker is waiting");
        }
        Ok(())
    }

    /// Pre-warm the static partition and request immediate activation.
    ///
    /// A failed pre-warm is logged and reported but does not fail the
    /// install; the worker proceeds with a cold cache.
    pub async fn install(&self) -> Result<InstallReport, Error> {
        self.transition(WorkerState::Parsed, WorkerState::Installing)?;

        let report = match self.precache().await {
            Ok(precached) => {
                tracing::info!(precached, "precache complete");
                InstallReport { precached, error: None }
            }
            Err(e) => {
                tracing::error!("precache failed, installing with a cold cache: {}", e);
                InstallReport { precached: 0, error: Some(e.to_string()) }
            }
        };

        self.set_state(WorkerState::Installed);
        self.skip_waiting.store(true, Ordering::SeqCst);
        Ok(report)
    }

    /// Delete stale named caches and take control of clients.
    pub async fn activate(&self) -> Result<ActivateReport, Error> {
        self.transition(WorkerState::Installed, WorkerState::Activating)?;

        let deleted = match self.delete_stale_caches().await {
            Ok(deleted) => deleted,
            Err(e) => {
                self.set_state(WorkerState::Installed);
                return Err(e);
            }
        };

        self.set_state(WorkerState::Activated);
        self.controlling.store(true, Ordering::SeqCst);
        tracing::info!(deleted = deleted.len(), "worker activated and controlling");
        Ok(ActivateReport { deleted })
    }

    fn transition(&self, from: WorkerState, to: WorkerState) -> Result<(), Error> {
        let mut state = self.state.write();
        if *state != from {
            return Err(Error::InvalidState(format!("cannot move to {} from {} (expected {})", to, *state, from)));
        }
        *state = to;
        drop(state);
        tracing::info!(%from, %to, "worker state changed");
        Ok(())
    }

    async fn delete_stale_caches(&self) -> Result<Vec<CacheName>, Error> {
        let expected = self.expected_caches();
        let mut deleted = Vec::new();
        for name in self.db().cache_names().await? {
            if expected.contains(&name) {
                continue;
            }
            if self.db().delete_cache(&name).await? {
                tracing::info!(cache = %name, "deleted stale cache");
                deleted.push(name);
            }
        }
        Ok(deleted)
    }

    /// Fetch the whole manifest, then store it. Nothing is kept unless
    /// every entry was fetched and stored.
    async fn precache(&self) -> Result<usize, Error> {
        let requests = self
            .config
            .precache
            .iter()
            .map(|path| self.resolve(path).map(Request::get))
            .collect::<Result<Vec<_>, _>>()?;

        let responses = try_join_all(requests.iter().map(|request| self.fetch_for_precache(request))).await?;

        let cache = self.db().open_cache(&Partition::Static.cache_name(&self.config.version)).await?;
        let mut stored: Vec<RequestKey> = Vec::with_capacity(requests.len());
        for (request, response) in requests.iter().zip(&responses) {
            let key = request.key();
            if let Err(e) = cache.put(&key, response, self.config.precache_max_age_secs).await {
                for key in &stored {
                    if let Err(e) = cache.delete(key).await {
                        tracing::warn!("failed to roll back precached {}: {}", key, e);
                    }
                }
                return Err(Error::PrecacheFailed(format!("storing {}: {}", key, e)));
            }
            stored.push(key);
        }

        Ok(stored.len())
    }

    async fn fetch_for_precache(&self, request: &Request) -> Result<Response, Error> {
        let response = self
            .ctx
            .network
            .fetch(request)
            .await
            .map_err(|e| Error::PrecacheFailed(format!("{}: {}", request.url, e)))?;
        if !response.is_ok() {
            return Err(Error::PrecacheFailed(format!("{} returned {}", request.url, response.status)));
        }
        Ok(response)
    }
}
