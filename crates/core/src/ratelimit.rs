//! Per-key fixed-window request limiter.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Outcome of [`RateLimiter::check_and_increment`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateDecision {
    Allowed,
    Throttled { retry_after: Duration },
}

#[derive(Debug)]
struct Window {
    count: u32,
    reset_at: Instant,
}

/// Counts requests per client key within a window.
///
/// Each key gets `max_requests` per `window`; the window starts at the
/// key's first request and resets once it elapses.
#[derive(Debug)]
pub struct RateLimiter {
    max_requests: u32,
    window: Duration,
    windows: Mutex<HashMap<String, Window>>,
}

impl RateLimiter {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self { max_requests, window, windows: Mutex::new(HashMap::new()) }
    }

    /// Record a request for `key` if its budget allows it.
    pub fn check_and_increment(&self, key: &str) -> RateDecision {
        self.check_at(key, Instant::now())
    }

    fn check_at(&self, key: &str, now: Instant) -> RateDecision {
        let mut windows = self.windows.lock();
        let window = windows
            .entry(key.to_string())
            .or_insert_with(|| Window { count: 0, reset_at: now + self.window });

        if now >= window.reset_at {
            window.count = 0;
            window.reset_at = now + self.window;
        }

        if window.count < self.max_requests {
            window.count += 1;
            RateDecision::Allowed
        } else {
            RateDecision::Throttled { retry_after: window.reset_at - now }
        }
    }

    /// Drop windows that have already reset.
    pub fn cleanup_expired(&self) {
        let now = Instant::now();
        self.windows.lock().retain(|_, w| w.reset_at > now);
    }

    /// Number of keys currently tracked.
    pub fn tracked_keys(&self) -> usize {
        self.windows.lock().len()
    }
}
