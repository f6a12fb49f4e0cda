//! Named cache storage backed by SQLite.
//!
//! This module provides persistent, partitioned response caching using
//! SQLite with async access via tokio-rusqlite. It supports:
//!
//! - Versioned named caches (`static-v1`, `api-v1`, ...)
//! - Entries keyed by a SHA-256 of the canonical request
//! - Synthetic timestamp/max-age headers for freshness decisions
//! - An optional storage quota
//! - Automatic schema migrations and WAL mode

pub mod connection;
pub mod entries;
pub mod freshness;
pub mod hash;
pub mod migrations;
pub mod partitions;

pub use crate::Error;

pub use connection::CacheDb;
pub use entries::{CacheEntry, CacheHandle, MAX_AGE_HEADER, TIMESTAMP_HEADER};
pub use freshness::{is_expired, is_expired_at};
pub use hash::RequestKey;
pub use partitions::{CacheName, Partition};
