//! Core types and shared functionality for swcache.
//!
//! This crate provides:
//! - Named cache storage with SQLite backend
//! - Freshness evaluation for cached responses
//! - Route table and request classification
//! - Unified error types
//! - Configuration structures

pub mod cache;
pub mod config;
pub mod error;
pub mod message;
pub mod ratelimit;
pub mod response;
pub mod routes;

pub use cache::{CacheDb, CacheEntry, CacheHandle, CacheName, Partition, RequestKey};
pub use error::Error;
pub use message::WorkerMessage;
pub use ratelimit::{RateDecision, RateLimiter};
pub use response::{Headers, Response, ResponseSource};
pub use routes::{RouteRule, RouteTable, Strategy};
