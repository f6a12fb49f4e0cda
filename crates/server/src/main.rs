//! mcp-swcache server entry point.
//!
//! Boots the caching service worker and serves it over MCP on stdio.
//! Logging goes to stderr to avoid interfering with the JSON-RPC protocol on stdout.

use std::sync::Arc;

use anyhow::{Context, Result};
use rmcp::service::serve_server;
use rmcp::transport::io::stdio;
use swcache_client::{FetchClient, FetchConfig, ServiceWorker, WorkerConfig};
use swcache_core::{CacheDb, RateLimiter, config::AppConfig};
use tracing_subscriber::EnvFilter;

mod error;
mod handler;
mod tools;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = AppConfig::load().context("loading configuration")?;
    tracing::info!(
        db_path = %config.db_path.display(),
        origin = %config.origin,
        version = %config.cache_version,
        routes = config.routes.len(),
        "Starting mcp-swcache server on stdio transport"
    );

    let db = CacheDb::open(&config.db_path)
        .await
        .with_context(|| format!("opening cache storage at {}", config.db_path.display()))?
        .with_quota(config.quota_bytes);

    let network = Arc::new(FetchClient::new(FetchConfig::from_app(&config))?);
    let worker = ServiceWorker::new(WorkerConfig::from_app(&config)?, config.route_table()?, db, network);
    worker.boot().await.context("booting service worker")?;

    let limiter = Arc::new(RateLimiter::new(config.rate_limit.max_requests, config.rate_limit.window()));
    spawn_limiter_cleanup(limiter.clone(), config.rate_limit.window());

    let handler = handler::SwCacheServer::new(Arc::new(worker), limiter);
    let transport = stdio();
    let server = serve_server(handler, transport).await?;

    server.waiting().await?;

    Ok(())
}

fn spawn_limiter_cleanup(limiter: Arc<RateLimiter>, every: std::time::Duration) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        loop {
            interval.tick().await;
            limiter.cleanup_expired();
        }
    });
}
