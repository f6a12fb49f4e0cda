//! Client side of swcache.
//!
//! This crate provides the network fetch seam, the caching strategy
//! executors, the offline fallback provider and the service worker that
//! wires them to the route table.

pub mod fallback;
pub mod fetch;
pub mod strategy;
pub mod worker;

#[cfg(test)]
mod test_utils;

pub use fallback::fallback;
pub use fetch::{Destination, FetchClient, FetchConfig, Network, Request, RequestMode};
pub use reqwest::Method;
pub use strategy::{RevalidationRegistry, StrategyContext};
pub use worker::{ActivateReport, FetchOutcome, InstallReport, ServiceWorker, WorkerConfig, WorkerState};
