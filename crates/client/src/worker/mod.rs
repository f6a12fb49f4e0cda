//! The request-interception worker.
//!
//! [`ServiceWorker`] ties the route table, the strategy executors and the
//! offline fallback together behind a single hook, [`ServiceWorker::handle_fetch`],
//! which the host awaits for every intercepted request. It also owns the
//! install/activate lifecycle and the administrative message channel.
//!
//! ### Request path
//! 1. Before activation: straight to the network
//! 2. Non-GET or unmatched URL: straight to the network
//! 3. Otherwise: the matched rule's strategy against its partition
//!
//! When a strategy fails for a URL in the precache manifest, a fresh copy
//! in the static partition answers instead. Any error left over at the end
//! turns into an offline fallback, so the hook always yields a response.

mod lifecycle;
mod message;

use crate::fallback::fallback;
use crate::fetch::{Network, Request, canonicalize};
use crate::strategy::{self, StrategyContext};
use parking_lot::RwLock;
use reqwest::Method;
use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use swcache_core::config::{AppConfig, ConfigError};
use swcache_core::{CacheDb, CacheName, Error, Partition, Response, RouteRule, RouteTable, Strategy};
use url::Url;

pub use lifecycle::{ActivateReport, InstallReport};

/// Lifecycle state of the worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    Parsed,
    Installing,
    Installed,
    Activating,
    Activated,
}

impl WorkerState {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkerState::Parsed => "parsed",
            WorkerState::Installing => "installing",
            WorkerState::Installed => "installed",
            WorkerState::Activating => "activating",
            WorkerState::Activated => "activated",
        }
    }
}

impl std::fmt::Display for WorkerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Static worker settings, fixed at construction.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Base for relative URLs in the precache manifest and cache updates.
    pub origin: Url,
    /// Version tag of every partition this worker owns.
    pub version: String,
    pub precache: Vec<String>,
    pub precache_max_age_secs: u64,
    pub dedupe_revalidation: bool,
}

impl WorkerConfig {
    pub fn from_app(config: &AppConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            origin: config.origin_url()?,
            version: config.cache_version.clone(),
            precache: config.precache.clone(),
            precache_max_age_secs: config.precache_max_age_secs,
            dedupe_revalidation: config.dedupe_revalidation,
        })
    }
}

/// How an intercepted request was answered.
#[derive(Debug, Clone)]
pub struct FetchOutcome {
    pub response: Response,
    /// Strategy that ran, if a route matched.
    pub strategy: Option<Strategy>,
    pub cache_name: Option<CacheName>,
}

impl FetchOutcome {
    fn passthrough(response: Response) -> Self {
        Self { response, strategy: None, cache_name: None }
    }
}

pub struct ServiceWorker {
    config: WorkerConfig,
    routes: RouteTable,
    ctx: StrategyContext,
    /// Canonical URLs of the precache manifest.
    precached: HashSet<String>,
    state: RwLock<WorkerState>,
    skip_waiting: AtomicBool,
    controlling: AtomicBool,
    message_lock: tokio::sync::Mutex<()>,
}

impl ServiceWorker {
    pub fn new(config: WorkerConfig, routes: RouteTable, db: CacheDb, network: Arc<dyn Network>) -> Self {
        let ctx = StrategyContext::new(db, network).with_revalidation_dedupe(config.dedupe_revalidation);
        let precached = config
            .precache
            .iter()
            .filter_map(|path| canonicalize(path, Some(&config.origin)).ok())
            .map(String::from)
            .collect();
        Self {
            config,
            routes,
            ctx,
            precached,
            state: RwLock::new(WorkerState::Parsed),
            skip_waiting: AtomicBool::new(false),
            controlling: AtomicBool::new(false),
            message_lock: tokio::sync::Mutex::new(()),
        }
    }

    pub fn config(&self) -> &WorkerConfig {
        &self.config
    }

    pub fn db(&self) -> &CacheDb {
        &self.ctx.db
    }

    pub fn state(&self) -> WorkerState {
        *self.state.read()
    }

    fn set_state(&self, state: WorkerState) {
        let previous = std::mem::replace(&mut *self.state.write(), state);
        tracing::info!(from = %previous, to = %state, "worker state changed");
    }

    /// Whether the worker has claimed its clients.
    pub fn is_controlling(&self) -> bool {
        self.controlling.load(Ordering::SeqCst)
    }

    pub fn skip_waiting_requested(&self) -> bool {
        self.skip_waiting.load(Ordering::SeqCst)
    }

    /// Names of the partitions this worker's version owns.
    pub fn expected_caches(&self) -> Vec<CacheName> {
        CacheName::expected(&self.config.version)
    }

    /// Route rule that would handle `url`.
    pub fn route_for(&self, url: &Url) -> Option<&RouteRule> {
        self.routes.classify(url.as_str())
    }

    /// Canonicalize `input`, resolving relative references against the origin.
    pub fn resolve(&self, input: &str) -> Result<Url, Error> {
        canonicalize(input, Some(&self.config.origin)).map_err(|e| Error::InvalidUrl(e.to_string()))
    }

    /// Intercept `request` and produce its response.
    pub async fn handle_fetch(&self, request: &Request) -> Response {
        self.intercept(request).await.response
    }

    /// Like [`Self::handle_fetch`], also reporting the route that answered.
    pub async fn intercept(&self, request: &Request) -> FetchOutcome {
        if !self.is_controlling() {
            tracing::debug!(state = %self.state(), url = %request.url, "not controlling, passing through");
            return FetchOutcome::passthrough(self.passthrough(request).await);
        }

        if request.method != Method::GET {
            return FetchOutcome::passthrough(self.passthrough(request).await);
        }

        let Some(rule) = self.routes.classify(request.url.as_str()) else {
            return FetchOutcome::passthrough(self.passthrough(request).await);
        };

        let cache_name = rule.partition.cache_name(&self.config.version);
        let response = match strategy::execute(&self.ctx, rule.strategy, request, &cache_name, rule.max_age_secs).await {
            Ok(response) => response,
            Err(e) => match self.precached_copy(request, &cache_name).await {
                Some(response) => {
                    tracing::debug!(strategy = %rule.strategy, url = %request.url, "serving precached copy: {}", e);
                    response
                }
                None => {
                    tracing::info!(strategy = %rule.strategy, url = %request.url, "serving offline fallback: {}", e);
                    fallback(request)
                }
            },
        };

        FetchOutcome { response, strategy: Some(rule.strategy), cache_name: Some(cache_name) }
    }

    /// Fresh copy of a precached URL from the static partition, unless the
    /// strategy already looked there.
    async fn precached_copy(&self, request: &Request, tried: &CacheName) -> Option<Response> {
        if !self.precached.contains(request.url.as_str()) {
            return None;
        }
        let static_name = Partition::Static.cache_name(&self.config.version);
        if &static_name == tried {
            return None;
        }
        strategy::fresh_entry(&self.ctx, &static_name, &request.key(), self.config.precache_max_age_secs).await
    }

    /// Network with no caching; the offline fallback on failure.
    async fn passthrough(&self, request: &Request) -> Response {
        match self.ctx.network.fetch(request).await {
            Ok(response) => response,
            Err(e) => {
                tracing::info!(url = %request.url, "serving offline fallback: {}", e);
                fallback(request)
            }
        }
    }
}
