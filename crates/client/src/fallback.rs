//! Offline fallback responses.
//!
//! The terminal handler for a request that neither the network nor the
//! cache could answer. Dispatch is on request shape only and every branch
//! builds a 503.

use crate::fetch::Request;
use bytes::Bytes;
use serde_json::json;
use swcache_core::{Headers, Response, ResponseSource};

/// Prefix marking API routes.
pub const API_PREFIX: &str = "/api/";

pub const OFFLINE_STATUS: u16 = 503;

/// Offline page served to navigations. Inlined so it works without any cache.
pub const OFFLINE_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <meta name="viewport" content="width=device-width, initial-scale=1">
  <title>Offline</title>
  <style>
    body { font-family: system-ui, sans-serif; display: flex; min-height: 100vh; margin: 0;
           align-items: center; justify-content: center; background: #0f172a; color: #e2e8f0; }
    main { text-align: center; padding: 2rem; }
    button { margin-top: 1rem; padding: 0.5rem 1.25rem; border: 0; border-radius: 0.375rem;
             background: #38bdf8; color: #0f172a; cursor: pointer; }
  </style>
</head>
<body>
  <main>
    <h1>You're offline</h1>
    <p>This page isn't available right now. Check your connection and try again.</p>
    <button onclick="location.reload()">Retry</button>
  </main>
</body>
</html>
"#;

/// Build the offline substitute for `request`. Never fails.
pub fn fallback(request: &Request) -> Response {
    if request.is_navigation() {
        return offline("text/html; charset=utf-8", OFFLINE_HTML.to_string());
    }

    if request.url.path().starts_with(API_PREFIX) {
        let body = json!({
            "error": "offline",
            "message": "Network unavailable and no cached data for this request",
        });
        return offline("application/json", body.to_string());
    }

    if request.is_image() {
        return Response::new(OFFLINE_STATUS, Headers::new(), Bytes::new(), ResponseSource::Fallback);
    }

    offline("text/plain; charset=utf-8", "Offline".to_string())
}

fn offline(content_type: &str, body: String) -> Response {
    let headers: Headers = [("content-type", content_type)].into_iter().collect();
    Response::new(OFFLINE_STATUS, headers, body, ResponseSource::Fallback)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::{Destination, RequestMode};
    use crate::test_utils::url;

    #[test]
    fn test_navigation_gets_offline_page() {
        let response = fallback(&Request::navigate(url("/about")));
        assert_eq!(response.status, 503);
        assert_eq!(response.content_type(), Some("text/html; charset=utf-8"));
        assert!(response.text().contains("You're offline"));
        assert_eq!(response.source, ResponseSource::Fallback);
    }

    #[test]
    fn test_api_gets_json_error() {
        let response = fallback(&Request::get(url("/api/projects")));
        assert_eq!(response.status, 503);
        assert_eq!(response.content_type(), Some("application/json"));

        let body: serde_json::Value = serde_json::from_slice(&response.body).unwrap();
        assert_eq!(body["error"], "offline");
        assert!(body["message"].is_string());
    }

    #[test]
    fn test_image_gets_empty_503() {
        let request = Request::get(url("/images/hero.png")).with_destination(Destination::Image);
        let response = fallback(&request);
        assert_eq!(response.status, 503);
        assert!(response.body.is_empty());
    }

    #[test]
    fn test_other_gets_plain_text() {
        let request = Request::get(url("/app.js")).with_destination(Destination::Script);
        let response = fallback(&request);
        assert_eq!(response.status, 503);
        assert_eq!(response.content_type(), Some("text/plain; charset=utf-8"));
        assert_eq!(response.text(), "Offline");
    }

    #[test]
    fn test_api_prefix_must_be_a_path_prefix() {
        let response = fallback(&Request::get(url("/docs/api/intro")));
        assert_eq!(response.content_type(), Some("text/plain; charset=utf-8"));
    }

    #[test]
    fn test_every_request_shape_gets_a_response() {
        let modes = [RequestMode::Navigate, RequestMode::Cors];
        let destinations = [Destination::Image, Destination::Document, Destination::Empty];
        let paths = ["/api/chat", "/projects", "/logo.svg"];

        for mode in modes {
            for destination in destinations {
                for path in paths {
                    let request = Request::get(url(path)).with_mode(mode).with_destination(destination);
                    let response = fallback(&request);
                    assert_eq!(response.status, OFFLINE_STATUS, "{mode:?} {destination:?} {path}");
                    assert_eq!(response.source, ResponseSource::Fallback);

                    let expected_type = if mode == RequestMode::Navigate {
                        Some("text/html; charset=utf-8")
                    } else if path.starts_with(API_PREFIX) {
                        Some("application/json")
                    } else if destination == Destination::Image {
                        None
                    } else {
                        Some("text/plain; charset=utf-8")
                    };
                    assert_eq!(response.content_type(), expected_type, "{mode:?} {destination:?} {path}");
                }
            }
        }
    }
}
