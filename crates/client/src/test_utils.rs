//! Scripted network double for strategy and lifecycle tests.

use crate::fetch::{Network, Request};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;
use swcache_core::{Error, Headers, Response, ResponseSource};
use url::Url;

pub(crate) const ORIGIN: &str = "https://portfolio.dev";

pub(crate) fn url(path: &str) -> Url {
    Url::parse(ORIGIN).unwrap().join(path).unwrap()
}

#[derive(Default)]
pub(crate) struct MockNetwork {
    bodies: Mutex<HashMap<String, (u16, String)>>,
    calls: Mutex<HashMap<String, usize>>,
    total: AtomicUsize,
    offline: AtomicBool,
    delay: Mutex<Option<Duration>>,
}

impl MockNetwork {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Serve `body` with `status` for `path` (relative to [`ORIGIN`]).
    pub(crate) fn respond(&self, path: &str, status: u16, body: &str) {
        self.bodies.lock().insert(url(path).to_string(), (status, body.to_string()));
    }

    pub(crate) fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub(crate) fn set_delay(&self, delay: Option<Duration>) {
        *self.delay.lock() = delay;
    }

    pub(crate) fn calls(&self) -> usize {
        self.total.load(Ordering::SeqCst)
    }

    pub(crate) fn calls_for(&self, path: &str) -> usize {
        self.calls.lock().get(url(path).as_str()).copied().unwrap_or(0)
    }
}

#[async_trait]
impl Network for MockNetwork {
    async fn fetch(&self, request: &Request) -> Result<Response, Error> {
        self.total.fetch_add(1, Ordering::SeqCst);
        *self.calls.lock().entry(request.url.to_string()).or_default() += 1;

        let delay = *self.delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if self.offline.load(Ordering::SeqCst) {
            return Err(Error::Network(format!("offline: {}", request.url)));
        }

        let reply = self.bodies.lock().get(request.url.as_str()).cloned();
        let (status, body) = reply.unwrap_or((404, "not found".to_string()));
        let headers: Headers = [("content-type", "text/plain")].into_iter().collect();
        Ok(Response::new(status, headers, body, ResponseSource::Network))
    }
}
