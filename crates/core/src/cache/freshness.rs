//! Freshness evaluation for cached entries.
//!
//! An entry is expired once `now - timestamp > max_age * 1000`. A missing
//! or unparseable timestamp counts as expired.

use super::entries::CacheEntry;
use chrono::Utc;

/// Whether `entry` is expired under `max_age_secs` right now.
pub fn is_expired(entry: &CacheEntry, max_age_secs: u64) -> bool {
    is_expired_at(entry, max_age_secs, Utc::now().timestamp_millis())
}

/// Whether `entry` is expired under `max_age_secs` at `now_ms`.
///
/// Monotonic in `now_ms`: once true it stays true for every later instant.
pub fn is_expired_at(entry: &CacheEntry, max_age_secs: u64, now_ms: i64) -> bool {
    let Some(stored_ms) = entry.timestamp_ms() else {
        return true;
    };
    let max_age_ms = i64::try_from(max_age_secs.saturating_mul(1000)).unwrap_or(i64::MAX);
    now_ms.saturating_sub(stored_ms) > max_age_ms
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::entries::TIMESTAMP_HEADER;
    use crate::cache::{CacheName, RequestKey};
    use crate::response::{Headers, Response, ResponseSource};

    fn entry_with_timestamp(ts: Option<&str>) -> CacheEntry {
        let mut headers = Headers::new();
        if let Some(ts) = ts {
            headers.set(TIMESTAMP_HEADER, ts);
        }
        CacheEntry {
            cache_name: CacheName::from_raw("dynamic-v1"),
            key: RequestKey::get("https://example.com/"),
            response: Response::new(200, headers, "body", ResponseSource::Cache),
        }
    }

    #[test]
    fn test_fresh_within_max_age() {
        let entry = entry_with_timestamp(Some("1000000"));
        assert!(!is_expired_at(&entry, 60, 1_000_000 + 59_999));
    }

    #[test]
    fn test_boundary_is_fresh() {
        let entry = entry_with_timestamp(Some("1000000"));
        assert!(!is_expired_at(&entry, 60, 1_000_000 + 60_000));
        assert!(is_expired_at(&entry, 60, 1_000_000 + 60_001));
    }

    #[test]
    fn test_missing_timestamp_is_expired() {
        assert!(is_expired_at(&entry_with_timestamp(None), 3600, 0));
    }

    #[test]
    fn test_garbage_timestamp_is_expired() {
        assert!(is_expired_at(&entry_with_timestamp(Some("yesterday")), 3600, 0));
    }

    #[test]
    fn test_zero_max_age() {
        let entry = entry_with_timestamp(Some("5000"));
        assert!(!is_expired_at(&entry, 0, 5000));
        assert!(is_expired_at(&entry, 0, 5001));
    }

    #[test]
    fn test_huge_max_age_does_not_overflow() {
        let entry = entry_with_timestamp(Some("0"));
        assert!(!is_expired_at(&entry, u64::MAX, i64::MAX));
    }

    #[test]
    fn test_expiry_is_monotonic() {
        let entry = entry_with_timestamp(Some("1700000000000"));
        let max_ages = [0u64, 1, 59, 300, 86_400];
        for max_age in max_ages {
            let mut seen_expired = false;
            for offset in (0..200_000_000i64).step_by(997_331) {
                let expired = is_expired_at(&entry, max_age, 1_700_000_000_000 + offset);
                assert!(!(seen_expired && !expired), "un-expired at offset {offset} with max_age {max_age}");
                seen_expired |= expired;
            }
        }
    }

    #[test]
    fn test_is_expired_uses_clock() {
        let now = Utc::now().timestamp_millis();
        let recent = entry_with_timestamp(Some(&now.to_string()));
        let old = entry_with_timestamp(Some(&(now - 10 * 60 * 1000).to_string()));
        assert!(!is_expired(&recent, 300));
        assert!(is_expired(&old, 300));
    }
}
