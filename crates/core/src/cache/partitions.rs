//! Named cache partitions.
//!
//! A named cache is a versioned partition (`static-v1`, `api-v1`, ...).
//! Partitions are opened through the [`Partition`] enum; stored names are
//! plain strings because storage may still hold names from older versions.

use super::connection::CacheDb;
use super::entries::CacheHandle;
use crate::Error;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio_rusqlite::params;

/// Logical cache partition, scoped by purpose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Partition {
    Static,
    Dynamic,
    Image,
    Api,
}

impl Partition {
    pub const ALL: [Partition; 4] = [Partition::Static, Partition::Dynamic, Partition::Image, Partition::Api];

    pub fn as_str(&self) -> &'static str {
        match self {
            Partition::Static => "static",
            Partition::Dynamic => "dynamic",
            Partition::Image => "image",
            Partition::Api => "api",
        }
    }

    /// Name of this partition for the given version tag.
    pub fn cache_name(&self, version: &str) -> CacheName {
        CacheName(format!("{}-{}", self.as_str(), version))
    }
}

impl std::fmt::Display for Partition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Name of a named cache as it appears in storage.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(transparent)]
pub struct CacheName(String);

impl CacheName {
    /// Wrap a raw stored name, e.g. one read back during activation.
    pub fn from_raw(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The full set of names a worker running `version` expects to exist.
    pub fn expected(version: &str) -> Vec<CacheName> {
        Partition::ALL.iter().map(|p| p.cache_name(version)).collect()
    }
}

impl std::fmt::Display for CacheName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl CacheDb {
    /// Open a named cache, creating it on first use.
    pub async fn open_cache(&self, name: &CacheName) -> Result<CacheHandle, Error> {
        let raw = name.as_str().to_string();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT OR IGNORE INTO named_caches (name, created_at) VALUES (?1, ?2)",
                    params![raw, Utc::now().to_rfc3339()],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)?;

        Ok(CacheHandle::new(self.clone(), name.clone()))
    }

    /// Whether a named cache exists.
    pub async fn has_cache(&self, name: &CacheName) -> Result<bool, Error> {
        let raw = name.as_str().to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let exists =
                    conn.query_row("SELECT EXISTS(SELECT 1 FROM named_caches WHERE name = ?1)", params![raw], |row| {
                        row.get(0)
                    })?;
                Ok(exists)
            })
            .await
            .map_err(Error::from)
    }

    /// List every named cache in creation order.
    pub async fn cache_names(&self) -> Result<Vec<CacheName>, Error> {
        self.conn
            .call(|conn| -> Result<Vec<CacheName>, Error> {
                let mut stmt = conn.prepare("SELECT name FROM named_caches ORDER BY created_at ASC, name ASC")?;
                let names = stmt
                    .query_map([], |row| row.get::<_, String>(0))?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(names.into_iter().map(CacheName).collect())
            })
            .await
            .map_err(Error::from)
    }

    /// Drop a named cache and all of its entries.
    ///
    /// Returns false if no such cache existed.
    pub async fn delete_cache(&self, name: &CacheName) -> Result<bool, Error> {
        let raw = name.as_str().to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let count = conn.execute("DELETE FROM named_caches WHERE name = ?1", params![raw])?;
                Ok(count > 0)
            })
            .await
            .map_err(Error::from)
    }

    /// Number of entries held by each named cache.
    pub async fn entry_counts(&self) -> Result<Vec<(CacheName, u64)>, Error> {
        self.conn
            .call(|conn| -> Result<Vec<(CacheName, u64)>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT n.name, COUNT(e.key_hash) FROM named_caches n
                     LEFT JOIN cache_entries e ON e.cache_name = n.name
                     GROUP BY n.name ORDER BY n.name",
                )?;
                let rows = stmt
                    .query_map([], |row| Ok((CacheName(row.get(0)?), row.get::<_, i64>(1)? as u64)))?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(rows)
            })
            .await
            .map_err(Error::from)
    }
}
