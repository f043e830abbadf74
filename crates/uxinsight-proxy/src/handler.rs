//! The proxy pipeline: parse → fetch → dispatch → rewrite + inject.
//!
//! Produces a [`ProxyResponse`] without touching the client socket so the
//! whole pipeline can be driven directly. Only two failures reach the
//! browser: a missing `url` parameter (400, JSON body) and a failed fetch
//! (500, fixed plain-text body).

use crate::audit::{self, ResponsePath};
use crate::dispatch::{dispatch, Dispatched};
use crate::error::ProxyError;
use crate::fetch::Fetcher;
use crate::inject::inject_tracking_script;
use crate::request::ProxyRequest;
use crate::rewrite::{rewrite_html, RewriteContext};
use tracing::info;
use url::Url;

/// Body of every 500 caused by an upstream failure.
pub const FETCH_ERROR_BODY: &str = "Error fetching content";

/// Content type of rewritten documents. The body is always UTF-8.
pub const HTML_CONTENT_TYPE: &str = "text/html; charset=utf-8";

/// A response ready to be written to the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

impl ProxyResponse {
    #[must_use]
    pub fn html(status: u16, body: String) -> Self {
        Self {
            status,
            content_type: Some(HTML_CONTENT_TYPE.to_string()),
            body: body.into_bytes(),
        }
    }

    #[must_use]
    pub fn text(status: u16, body: &str) -> Self {
        Self {
            status,
            content_type: Some("text/plain; charset=utf-8".to_string()),
            body: body.as_bytes().to_vec(),
        }
    }

    /// `{"error": message}` with the given status.
    #[must_use]
    pub fn json_error(status: u16, message: &str) -> Self {
        Self {
            status,
            content_type: Some("application/json".to_string()),
            body: serde_json::json!({ "error": message }).to_string().into_bytes(),
        }
    }

    fn fetch_failure() -> Self {
        Self::text(500, FETCH_ERROR_BODY)
    }
}

/// Rewrite same-origin links in `html` against `base`, then inject the
/// tracking script.
#[must_use]
pub fn transform_html(html: &str, base: &Url) -> String {
    let ctx = RewriteContext::new(base.clone());
    inject_tracking_script(&rewrite_html(html, &ctx))
}

/// Serve one `/proxy` request given its raw query string.
pub async fn handle_proxy(query: &str, fetcher: &Fetcher) -> ProxyResponse {
    let request = match ProxyRequest::from_query(query) {
        Ok(request) => request,
        Err(ProxyError::MissingParameter) => {
            audit::log_rejected(query, 400, "missing url parameter");
            return ProxyResponse::json_error(400, "Missing URL parameter");
        }
        Err(e) => {
            audit::log_fetch_failed(query, "", &e.to_string());
            return ProxyResponse::fetch_failure();
        }
    };

    info!(
        "Proxying request to: {} from origin: {}",
        request.target_url, request.origin_hint
    );

    let resource = match fetcher.fetch(&request.target_url).await {
        Ok(resource) => resource,
        Err(e) => {
            audit::log_fetch_failed(
                request.target_url.as_str(),
                &request.origin_hint,
                &e.to_string(),
            );
            return ProxyResponse::fetch_failure();
        }
    };

    let (response, path) = match dispatch(resource) {
        Dispatched::Html { status, html } => (
            ProxyResponse::html(status, transform_html(&html, &request.target_url)),
            ResponsePath::Html,
        ),
        Dispatched::Passthrough {
            status,
            content_type,
            body,
        } => (
            ProxyResponse {
                status,
                content_type,
                body,
            },
            ResponsePath::Passthrough,
        ),
    };

    audit::log_proxied(
        request.target_url.as_str(),
        &request.origin_hint,
        response.status,
        path,
        response.body.len(),
    );
    response
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::ProxyConfig;

    fn fetcher() -> Fetcher {
        Fetcher::new(&ProxyConfig::default()).unwrap()
    }

    #[tokio::test]
    async fn test_missing_url_is_400_json() {
        let response = handle_proxy("origin=https%3A%2F%2Fa.test", &fetcher()).await;
        assert_eq!(response.status, 400);
        assert_eq!(response.content_type.as_deref(), Some("application/json"));
        let body: serde_json::Value = serde_json::from_slice(&response.body).unwrap();
        assert_eq!(body, serde_json::json!({ "error": "Missing URL parameter" }));
    }

    #[tokio::test]
    async fn test_invalid_target_is_generic_500() {
        let response = handle_proxy("url=not%20a%20url", &fetcher()).await;
        assert_eq!(response.status, 500);
        assert_eq!(response.body, FETCH_ERROR_BODY.as_bytes());
    }

    #[test]
    fn test_transform_html_rewrites_then_injects() {
        let base = Url::parse("https://example.com/").unwrap();
        let out = transform_html(
            r#"<html><head></head><body><a href="/a.html">x</a></body></html>"#,
            &base,
        );
        let script_at = out.find("<script data-uxinsight").unwrap();
        assert!(script_at < out.find("</head>").unwrap());
        assert!(out.contains("href=\"/proxy?url=https%3A%2F%2Fexample.com%2Fa.html&origin="));
    }
}
