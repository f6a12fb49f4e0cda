//! Unified error types for swcache.

use rmcp::model::{ErrorCode, ErrorData as McpError};
use tokio_rusqlite::rusqlite;

/// Unified error types for the cache layer and its server.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid input parameters (e.g., unknown request method).
    #[error("INVALID_INPUT: {0}")]
    InvalidInput(String),

    /// No cache entry found for the given request.
    #[error("CACHE_MISS: {0}")]
    CacheMiss(String),

    /// Database operation failed.
    #[error("CACHE_ERROR: {0}")]
    Database(tokio_rusqlite::Error),

    /// Migration failed to apply.
    #[error("CACHE_ERROR: migration failed: {0}")]
    MigrationFailed(String),

    /// Stored entry could not be decoded.
    #[error("CACHE_ERROR: corrupt entry: {0}")]
    CorruptEntry(String),

    /// Storing the entry would exceed the configured storage quota.
    #[error("QUOTA_EXCEEDED: {used} + {incoming} bytes exceeds {quota}")]
    QuotaExceeded { used: u64, incoming: u64, quota: u64 },

    /// Invalid URL.
    #[error("INVALID_URL: {0}")]
    InvalidUrl(String),

    /// Network fetch failed (offline, DNS, connection reset, timeout).
    #[error("NETWORK_ERROR: {0}")]
    Network(String),

    /// Fetch response too large.
    #[error("FETCH_TOO_LARGE: {0}")]
    FetchTooLarge(String),

    /// Install-time pre-warm of the static cache failed.
    #[error("PRECACHE_FAILED: {0}")]
    PrecacheFailed(String),

    /// Lifecycle transition requested from the wrong state.
    #[error("INVALID_STATE: {0}")]
    InvalidState(String),

    /// Another worker message is still being handled.
    #[error("MESSAGE_IN_FLIGHT")]
    MessageInFlight,

    /// Client exceeded its request budget for the current window.
    #[error("RATE_LIMITED: retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },
}

impl From<tokio_rusqlite::Error<Error>> for Error {
    fn from(err: tokio_rusqlite::Error<Error>) -> Self {
        match err {
            tokio_rusqlite::Error::Error(e) => e,
            tokio_rusqlite::Error::ConnectionClosed => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
            tokio_rusqlite::Error::Close(c) => Error::Database(tokio_rusqlite::Error::Close(c)),
            _ => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
        }
    }
}

impl From<tokio_rusqlite::Error<rusqlite::Error>> for Error {
    fn from(err: tokio_rusqlite::Error<rusqlite::Error>) -> Self {
        Error::Database(err)
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::Database(tokio_rusqlite::Error::Error(err))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::CorruptEntry(err.to_string())
    }
}

impl From<Error> for McpError {
    fn from(err: Error) -> Self {
        let (code, message) = match &err {
            Error::InvalidInput(msg) => (-32602, msg.clone()),
            Error::CacheMiss(msg) => (-32001, msg.clone()),
            Error::Database(e) => (-32002, e.to_string()),
            Error::MigrationFailed(msg) | Error::CorruptEntry(msg) => (-32002, msg.clone()),
            Error::QuotaExceeded { .. } => (-32002, err.to_string()),
            Error::InvalidUrl(msg) => (-32003, msg.clone()),
            Error::Network(msg) => (-32004, msg.clone()),
            Error::FetchTooLarge(msg) => (-32005, msg.clone()),
            Error::PrecacheFailed(msg) => (-32006, msg.clone()),
            Error::InvalidState(msg) => (-32007, msg.clone()),
            Error::MessageInFlight => (-32008, "Another worker message is in flight".to_string()),
            Error::RateLimited { .. } => (-32009, err.to_string()),
        };

        McpError { code: ErrorCode(code), message: message.into(), data: None }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::CacheMiss("GET https://example.com/".to_string());
        assert!(err.to_string().contains("CACHE_MISS"));
        assert!(err.to_string().contains("https://example.com/"));
    }

    #[test]
    fn test_quota_display() {
        let err = Error::QuotaExceeded { used: 90, incoming: 20, quota: 100 };
        assert_eq!(err.to_string(), "QUOTA_EXCEEDED: 90 + 20 bytes exceeds 100");
    }

    #[test]
    fn test_error_to_mcp_error() {
        let mcp_err: McpError = Error::CacheMiss("abc123".to_string()).into();
        assert_eq!(mcp_err.code.0, -32001);

        let mcp_err: McpError = Error::RateLimited { retry_after_secs: 3 }.into();
        assert_eq!(mcp_err.code.0, -32009);
        assert!(mcp_err.message.contains("retry after 3s"));
    }
}
