//! Caching strategy executors.
//!
//! Each strategy takes a request, the named cache it should use and the
//! max-age to apply, and produces a response or an error. Errors are left
//! for the caller to turn into an offline fallback.
//!
//! Cache storage failures never surface from here: a failed read is a
//! miss and a failed write is logged and dropped.

pub mod revalidate;

use crate::fetch::{Network, Request};
use std::sync::Arc;
use swcache_core::cache::is_expired;
use swcache_core::{CacheDb, CacheEntry, CacheName, Error, Headers, RequestKey, Response, ResponseSource, Strategy};

pub use revalidate::{RevalidationGuard, RevalidationRegistry};

/// Shared state every strategy runs against.
#[derive(Clone)]
pub struct StrategyContext {
    pub db: CacheDb,
    pub network: Arc<dyn Network>,
    revalidations: Option<RevalidationRegistry>,
}

impl StrategyContext {
    pub fn new(db: CacheDb, network: Arc<dyn Network>) -> Self {
        Self { db, network, revalidations: None }
    }

    /// Coalesce concurrent background revalidations of the same request.
    pub fn with_revalidation_dedupe(mut self, enabled: bool) -> Self {
        self.revalidations = enabled.then(RevalidationRegistry::new);
        self
    }

    pub fn revalidations(&self) -> Option<&RevalidationRegistry> {
        self.revalidations.as_ref()
    }
}

/// Run `strategy` for `request`.
pub async fn execute(
    ctx: &StrategyContext, strategy: Strategy, request: &Request, cache_name: &CacheName, max_age_secs: u64,
) -> Result<Response, Error> {
    tracing::debug!(%strategy, cache = %cache_name, url = %request.url, "executing strategy");
    match strategy {
        Strategy::CacheFirst => cache_first(ctx, request, cache_name, max_age_secs).await,
        Strategy::NetworkFirst => network_first(ctx, request, cache_name, max_age_secs).await,
        Strategy::StaleWhileRevalidate => stale_while_revalidate(ctx, request, cache_name, max_age_secs).await,
        Strategy::NetworkOnly => network_only(ctx, request).await,
        Strategy::CacheOnly => cache_only(ctx, request, cache_name, max_age_secs).await,
    }
}

/// Serve a fresh cached entry without touching the network; otherwise
/// fetch, store and return.
pub async fn cache_first(
    ctx: &StrategyContext, request: &Request, cache_name: &CacheName, max_age_secs: u64,
) -> Result<Response, Error> {
    let key = request.key();
    if let Some(response) = fresh_entry(ctx, cache_name, &key, max_age_secs).await {
        tracing::debug!("cache hit for {}", key);
        return Ok(response);
    }

    let response = ctx.network.fetch(request).await?;
    store(ctx, cache_name, &key, &response, max_age_secs).await;
    Ok(response)
}

/// Prefer the network; fall back to any cached entry, stale or not.
pub async fn network_first(
    ctx: &StrategyContext, request: &Request, cache_name: &CacheName, max_age_secs: u64,
) -> Result<Response, Error> {
    let key = request.key();
    match ctx.network.fetch(request).await {
        Ok(response) => {
            store(ctx, cache_name, &key, &response, max_age_secs).await;
            Ok(response)
        }
        Err(err) => match lookup(ctx, cache_name, &key).await {
            Some(entry) => {
                tracing::debug!("network failed for {}, serving cached copy: {}", key, err);
                Ok(entry.response)
            }
            None => Err(err),
        },
    }
}

/// Serve whatever is cached right away and refresh it in the background.
///
/// The returned body is always the entry present at call time, never the
/// result of the background fetch. Without a cached entry the caller
/// waits on the network.
pub async fn stale_while_revalidate(
    ctx: &StrategyContext, request: &Request, cache_name: &CacheName, max_age_secs: u64,
) -> Result<Response, Error> {
    let key = request.key();
    if let Some(entry) = lookup(ctx, cache_name, &key).await {
        tracing::debug!("cache hit for {}, revalidating in background", key);
        spawn_revalidation(ctx, request, cache_name, key, max_age_secs);
        return Ok(entry.response);
    }

    let response = ctx.network.fetch(request).await?;
    store(ctx, cache_name, &key, &response, max_age_secs).await;
    Ok(response)
}

/// Always the network, never the cache.
pub async fn network_only(ctx: &StrategyContext, request: &Request) -> Result<Response, Error> {
    ctx.network.fetch(request).await
}

/// Always the cache; a synthetic 404 when nothing fresh is stored.
pub async fn cache_only(
    ctx: &StrategyContext, request: &Request, cache_name: &CacheName, max_age_secs: u64,
) -> Result<Response, Error> {
    let key = request.key();
    Ok(fresh_entry(ctx, cache_name, &key, max_age_secs)
        .await
        .unwrap_or_else(|| not_in_cache(&key)))
}

fn not_in_cache(key: &RequestKey) -> Response {
    let headers: Headers = [("content-type", "text/plain; charset=utf-8")].into_iter().collect();
    Response::new(404, headers, format!("Not found in cache: {key}"), ResponseSource::Fallback)
}

fn spawn_revalidation(ctx: &StrategyContext, request: &Request, cache_name: &CacheName, key: RequestKey, max_age_secs: u64) {
    let guard = match ctx.revalidations() {
        Some(registry) => match registry.start(&key) {
            Some(guard) => Some(guard),
            None => {
                tracing::debug!("revalidation of {} already in flight", key);
                return;
            }
        },
        None => None,
    };

    let ctx = ctx.clone();
    let request = request.clone();
    let cache_name = cache_name.clone();
    tokio::spawn(async move {
        let _guard = guard;
        match ctx.network.fetch(&request).await {
            Ok(response) => store(&ctx, &cache_name, &key, &response, max_age_secs).await,
            Err(e) => tracing::warn!("background revalidation of {} failed: {}", key, e),
        }
    });
}

/// Read an entry, treating storage failures as a miss.
async fn lookup(ctx: &StrategyContext, cache_name: &CacheName, key: &RequestKey) -> Option<CacheEntry> {
    let result = match ctx.db.open_cache(cache_name).await {
        Ok(cache) => cache.get(key).await,
        Err(e) => Err(e),
    };
    result.unwrap_or_else(|e| {
        tracing::warn!("cache read failed for {} in {}: {}", key, cache_name, e);
        None
    })
}

/// Read an entry and drop it if expired.
pub(crate) async fn fresh_entry(ctx: &StrategyContext, cache_name: &CacheName, key: &RequestKey, max_age_secs: u64) -> Option<Response> {
    let entry = lookup(ctx, cache_name, key).await?;
    if !is_expired(&entry, max_age_secs) {
        return Some(entry.response);
    }

    tracing::debug!("cached entry for {} expired, purging", key);
    let purged = match ctx.db.open_cache(cache_name).await {
        Ok(cache) => cache.delete(key).await.map(|_| ()),
        Err(e) => Err(e),
    };
    if let Err(e) = purged {
        tracing::warn!("failed to purge expired entry {}: {}", key, e);
    }
    None
}

/// Store a successful response, logging and dropping storage failures.
async fn store(ctx: &StrategyContext, cache_name: &CacheName, key: &RequestKey, response: &Response, max_age_secs: u64) {
    if !response.is_ok() {
        tracing::debug!("not caching {} (status {})", key, response.status);
        return;
    }

    let result = match ctx.db.open_cache(cache_name).await {
        Ok(cache) => cache.put(key, response, max_age_secs).await,
        Err(e) => Err(e),
    };
    if let Err(e) = result {
        tracing::warn!("cache write failed for {} in {}: {}", key, cache_name, e);
    }
}
