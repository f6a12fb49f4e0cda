//! Cache entry access within one named cache.
//!
//! Entries are stored with two synthetic headers, [`TIMESTAMP_HEADER`]
//! and [`MAX_AGE_HEADER`], injected at `put` time. `get` returns whatever
//! is stored; freshness is decided by [`super::freshness`].

use super::connection::CacheDb;
use super::hash::RequestKey;
use super::partitions::CacheName;
use crate::Error;
use crate::response::{Headers, Response, ResponseSource};
use chrono::Utc;
use tokio_rusqlite::{params, rusqlite};

/// Insertion time of the entry, epoch milliseconds.
pub const TIMESTAMP_HEADER: &str = "sw-cache-timestamp";

/// Max-age the entry was stored under, seconds.
pub const MAX_AGE_HEADER: &str = "sw-cache-max-age";

/// A stored response together with the request it is keyed on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    pub cache_name: CacheName,
    pub key: RequestKey,
    pub response: Response,
}

impl CacheEntry {
    /// Insertion timestamp from the synthetic header, if parseable.
    pub fn timestamp_ms(&self) -> Option<i64> {
        self.response.headers.get(TIMESTAMP_HEADER)?.trim().parse().ok()
    }

    /// Max-age recorded at insertion, if parseable.
    pub fn max_age_secs(&self) -> Option<u64> {
        self.response.headers.get(MAX_AGE_HEADER)?.trim().parse().ok()
    }
}

/// Handle to one opened named cache.
#[derive(Debug, Clone)]
pub struct CacheHandle {
    db: CacheDb,
    name: CacheName,
}

impl CacheHandle {
    pub(crate) fn new(db: CacheDb, name: CacheName) -> Self {
        Self { db, name }
    }

    pub fn name(&self) -> &CacheName {
        &self.name
    }

    /// Look up the entry stored for `key`.
    ///
    /// No freshness check is applied here.
    pub async fn get(&self, key: &RequestKey) -> Result<Option<CacheEntry>, Error> {
        let cache_name = self.name.as_str().to_string();
        let key_hash = key.hash();
        let found = self
            .db
            .conn
            .call(move |conn| -> Result<Option<StoredRow>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT method, url, status, headers_json, body
                     FROM cache_entries WHERE cache_name = ?1 AND key_hash = ?2",
                )?;
                match stmt.query_row(params![cache_name, key_hash], StoredRow::from_row) {
                    Ok(row) => Ok(Some(row)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)?;

        found.map(|row| row.into_entry(self.name.clone())).transpose()
    }

    /// Store a copy of `response` under `key`, overwriting any previous entry.
    ///
    /// The stored copy carries the insertion timestamp and `max_age_secs`
    /// as synthetic headers; the caller's response is left untouched.
    pub async fn put(&self, key: &RequestKey, response: &Response, max_age_secs: u64) -> Result<(), Error> {
        self.put_at(key, response, max_age_secs, Utc::now().timestamp_millis()).await
    }

    /// Like [`Self::put`], stamping the entry as stored at `timestamp_ms`
    /// (epoch milliseconds) instead of now. Used to import entries that
    /// were fetched earlier.
    pub async fn put_at(
        &self, key: &RequestKey, response: &Response, max_age_secs: u64, timestamp_ms: i64,
    ) -> Result<(), Error> {
        let mut stored = response.clone();
        stored.headers.set(TIMESTAMP_HEADER, timestamp_ms.to_string());
        stored.headers.set(MAX_AGE_HEADER, max_age_secs.to_string());

        let headers_json = serde_json::to_string(&stored.headers)?;
        let cache_name = self.name.as_str().to_string();
        let key_hash = key.hash();
        let method = key.method().to_string();
        let url = key.url().to_string();
        let status = stored.status as i64;
        let body = stored.body.to_vec();
        let quota = self.db.quota_bytes;

        self.db
            .conn
            .call(move |conn| -> Result<(), Error> {
                if let Some(quota) = quota {
                    let used: i64 = conn.query_row(
                        "SELECT COALESCE(SUM(LENGTH(body)), 0) FROM cache_entries
                         WHERE NOT (cache_name = ?1 AND key_hash = ?2)",
                        params![cache_name, key_hash],
                        |row| row.get(0),
                    )?;
                    let incoming = body.len() as u64;
                    if used as u64 + incoming > quota {
                        return Err(Error::QuotaExceeded { used: used as u64, incoming, quota });
                    }
                }

                conn.execute(
                    "INSERT INTO cache_entries (
                        cache_name, key_hash, method, url, status, headers_json, body, stored_at
                    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                    ON CONFLICT(cache_name, key_hash) DO UPDATE SET
                        method = excluded.method,
                        url = excluded.url,
                        status = excluded.status,
                        headers_json = excluded.headers_json,
                        body = excluded.body,
                        stored_at = excluded.stored_at",
                    params![cache_name, key_hash, method, url, status, headers_json, body, Utc::now().to_rfc3339()],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Remove the entry for `key`. Returns false if nothing was stored.
    pub async fn delete(&self, key: &RequestKey) -> Result<bool, Error> {
        let cache_name = self.name.as_str().to_string();
        let key_hash = key.hash();
        self.db
            .conn
            .call(move |conn| -> Result<bool, Error> {
                let count = conn.execute(
                    "DELETE FROM cache_entries WHERE cache_name = ?1 AND key_hash = ?2",
                    params![cache_name, key_hash],
                )?;
                Ok(count > 0)
            })
            .await
            .map_err(Error::from)
    }

    /// Request keys currently stored in this cache, oldest first.
    pub async fn keys(&self) -> Result<Vec<RequestKey>, Error> {
        let cache_name = self.name.as_str().to_string();
        self.db
            .conn
            .call(move |conn| -> Result<Vec<RequestKey>, Error> {
                let mut stmt =
                    conn.prepare("SELECT method, url FROM cache_entries WHERE cache_name = ?1 ORDER BY stored_at ASC")?;
                let keys = stmt
                    .query_map(params![cache_name], |row| {
                        Ok(RequestKey::new(&row.get::<_, String>(0)?, row.get::<_, String>(1)?))
                    })?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(keys)
            })
            .await
            .map_err(Error::from)
    }
}

struct StoredRow {
    method: String,
    url: String,
    status: i64,
    headers_json: String,
    body: Vec<u8>,
}

impl StoredRow {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self { method: row.get(0)?, url: row.get(1)?, status: row.get(2)?, headers_json: row.get(3)?, body: row.get(4)? })
    }

    fn into_entry(self, cache_name: CacheName) -> Result<CacheEntry, Error> {
        let headers: Headers = serde_json::from_str(&self.headers_json)?;
        let status = u16::try_from(self.status).map_err(|_| Error::CorruptEntry(format!("status {}", self.status)))?;
        Ok(CacheEntry {
            cache_name,
            key: RequestKey::new(&self.method, self.url),
            response: Response::new(status, headers, self.body, ResponseSource::Cache),
        })
    }
}

impl CacheDb {
    /// Find `key` in the first of `names` that holds it.
    pub async fn match_any(&self, key: &RequestKey, names: &[CacheName]) -> Result<Option<CacheEntry>, Error> {
        for name in names {
            if !self.has_cache(name).await? {
                continue;
            }
            let handle = CacheHandle::new(self.clone(), name.clone());
            if let Some(entry) = handle.get(key).await? {
                return Ok(Some(entry));
            }
        }
        Ok(None)
    }

    /// Delete the oldest entries across all caches until at most
    /// `max_entries` remain.
    ///
    /// Returns the number of deleted entries.
    pub async fn purge_lru_entries(&self, max_entries: usize) -> Result<u64, Error> {
        let max = max_entries as i64;
        self.conn
            .call(move |conn| -> Result<u64, Error> {
                let count: i64 = conn.query_row("SELECT COUNT(*) FROM cache_entries", [], |row| row.get(0))?;
                if count <= max {
                    return Ok(0);
                }

                let deleted = conn.execute(
                    "DELETE FROM cache_entries WHERE rowid IN (
                        SELECT rowid FROM cache_entries ORDER BY stored_at ASC LIMIT ?1
                    )",
                    params![count - max],
                )?;
                Ok(deleted as u64)
            })
            .await
            .map_err(Error::from)
    }

    /// Total stored body bytes across all named caches.
    pub async fn stored_bytes(&self) -> Result<u64, Error> {
        self.conn
            .call(|conn| -> Result<u64, Error> {
                let used: i64 =
                    conn.query_row("SELECT COALESCE(SUM(LENGTH(body)), 0) FROM cache_entries", [], |row| row.get(0))?;
                Ok(used as u64)
            })
            .await
            .map_err(Error::from)
    }
}
