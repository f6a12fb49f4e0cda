//! Response model shared by the network, the cache storage and the
//! offline fallback provider.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// Where a response handed back to the page came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ResponseSource {
    Network,
    Cache,
    Fallback,
}

/// Ordered response header list.
///
/// Names are stored lowercased; lookups are case-insensitive.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Headers(Vec<(String, String)>);

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    /// First value for `name`, if present.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Replace every value for `name` with `value`.
    pub fn set(&mut self, name: &str, value: impl Into<String>) {
        self.remove(name);
        self.0.push((name.to_ascii_lowercase(), value.into()));
    }

    /// Append a value without touching existing ones.
    pub fn append(&mut self, name: &str, value: impl Into<String>) {
        self.0.push((name.to_ascii_lowercase(), value.into()));
    }

    pub fn remove(&mut self, name: &str) {
        self.0.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Headers {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut headers = Headers::new();
        for (k, v) in iter {
            let name: String = k.into();
            headers.append(&name, v);
        }
        headers
    }
}

/// An HTTP response as seen by the interception layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub headers: Headers,
    pub body: Bytes,
    /// Not persisted; set by whoever produced the response.
    pub source: ResponseSource,
}

impl Response {
    pub fn new(status: u16, headers: Headers, body: impl Into<Bytes>, source: ResponseSource) -> Self {
        Self { status, headers, body: body.into(), source }
    }

    /// 2xx status.
    pub fn is_ok(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn content_type(&self) -> Option<&str> {
        self.headers.get("content-type")
    }

    /// Body decoded as UTF-8, replacing invalid sequences.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_headers_case_insensitive() {
        let mut headers = Headers::new();
        headers.set("Content-Type", "text/html");
        assert_eq!(headers.get("content-type"), Some("text/html"));
        assert_eq!(headers.get("CONTENT-TYPE"), Some("text/html"));
    }

    #[test]
    fn test_headers_set_replaces() {
        let mut headers: Headers = [("x-a", "1"), ("X-A", "2"), ("x-b", "3")].into_iter().collect();
        assert_eq!(headers.len(), 3);

        headers.set("x-a", "9");
        assert_eq!(headers.len(), 2);
        assert_eq!(headers.get("x-a"), Some("9"));
        assert_eq!(headers.get("x-b"), Some("3"));
    }

    #[test]
    fn test_headers_json_shape() {
        let headers: Headers = [("etag", "\"abc\"")].into_iter().collect();
        let json = serde_json::to_string(&headers).unwrap();
        assert_eq!(json, r#"[["etag","\"abc\""]]"#);
        let back: Headers = serde_json::from_str(&json).unwrap();
        assert_eq!(back, headers);
    }

    #[test]
    fn test_response_is_ok() {
        let ok = Response::new(204, Headers::new(), Bytes::new(), ResponseSource::Network);
        let missing = Response::new(404, Headers::new(), Bytes::new(), ResponseSource::Network);
        assert!(ok.is_ok());
        assert!(!missing.is_ok());
    }
}
