//! In-flight background revalidation registry.
//!
//! Lets stale-while-revalidate skip a background fetch when one for the
//! same request is already running.

use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;
use swcache_core::RequestKey;

#[derive(Debug, Clone, Default)]
pub struct RevalidationRegistry {
    in_flight: Arc<Mutex<HashSet<String>>>,
}

impl RevalidationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the revalidation of `key`.
    ///
    /// Returns `None` if another revalidation of the same key holds the
    /// claim. The claim is released when the guard drops.
    pub fn start(&self, key: &RequestKey) -> Option<RevalidationGuard> {
        let hash = key.hash();
        if !self.in_flight.lock().insert(hash.clone()) {
            return None;
        }
        Some(RevalidationGuard { registry: self.clone(), hash })
    }

    pub fn is_in_flight(&self, key: &RequestKey) -> bool {
        self.in_flight.lock().contains(&key.hash())
    }

    pub fn len(&self) -> usize {
        self.in_flight.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Releases a revalidation claim on drop.
#[derive(Debug)]
pub struct RevalidationGuard {
    registry: RevalidationRegistry,
    hash: String,
}

impl Drop for RevalidationGuard {
    fn drop(&mut self) {
        self.registry.in_flight.lock().remove(&self.hash);
    }
}
