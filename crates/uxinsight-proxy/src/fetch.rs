//! Outbound fetcher.
//!
//! One GET per proxied request with a fixed browser-like `User-Agent`.
//! Behavior that is held constant for the life of the process:
//!
//! - redirects are followed by the HTTP client, at most [`MAX_REDIRECTS`]
//!   hops; redirect targets are never rewritten
//! - the whole request (connect, headers and body) is bounded by
//!   `fetch_timeout_secs`; on expiry the fetch fails instead of hanging
//! - environment proxy settings are ignored
//! - nothing is cached
//!
//! The underlying client owns a connection pool that is safe to share across
//! concurrent requests; the fetcher holds no other mutable state.

use crate::config::ProxyConfig;
use crate::error::{ProxyError, Result};
use reqwest::header::{HeaderMap, CONTENT_TYPE};
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Redirect hops followed before giving up.
pub const MAX_REDIRECTS: usize = 10;

/// Upper bound on TCP connect time, further capped by the request timeout.
const UPSTREAM_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// A fetched upstream resource.
#[derive(Debug, Clone)]
pub struct FetchedResource {
    pub status: u16,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl FetchedResource {
    /// Declared `Content-Type`, if present and valid UTF-8.
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.headers
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
    }
}

/// HTTP client wrapper shared by all proxy requests.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: reqwest::Client,
    max_body_bytes: usize,
}

impl Fetcher {
    /// Build a fetcher from the proxy configuration.
    pub fn new(config: &ProxyConfig) -> Result<Self> {
        let timeout = config.fetch_timeout();
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(timeout)
            .connect_timeout(UPSTREAM_CONNECT_TIMEOUT.min(timeout))
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .no_proxy()
            .build()
            .map_err(|e| ProxyError::Config(format!("HTTP client error: {}", e)))?;

        Ok(Self {
            client,
            max_body_bytes: config.max_body_bytes,
        })
    }

    /// GET `url` and buffer the full body.
    pub async fn fetch(&self, url: &Url) -> Result<FetchedResource> {
        let fetch_error = |reason: String| ProxyError::Fetch {
            url: url.to_string(),
            reason,
        };

        debug!("Fetching {}", url);
        let mut response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| fetch_error(describe(&e)))?;

        let status = response.status().as_u16();
        let headers = response.headers().clone();

        if let Some(len) = response.content_length() {
            if len > self.max_body_bytes as u64 {
                return Err(fetch_error(format!(
                    "declared body of {} bytes exceeds limit of {}",
                    len, self.max_body_bytes
                )));
            }
        }

        let mut body = Vec::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| fetch_error(describe(&e)))?
        {
            if body.len().saturating_add(chunk.len()) > self.max_body_bytes {
                return Err(fetch_error(format!(
                    "body exceeds limit of {} bytes",
                    self.max_body_bytes
                )));
            }
            body.extend_from_slice(&chunk);
        }

        debug!("Fetched {} ({} bytes, status {})", url, body.len(), status);
        Ok(FetchedResource {
            status,
            headers,
            body,
        })
    }
}

fn describe(err: &reqwest::Error) -> String {
    if err.is_timeout() {
        "request timed out".to_string()
    } else if err.is_redirect() {
        format!("too many redirects: {}", err)
    } else if err.is_connect() {
        format!("connection failed: {}", err)
    } else {
        err.to_string()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    #[test]
    fn test_content_type_lookup() {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("image/png"));
        let resource = FetchedResource {
            status: 200,
            headers,
            body: Vec::new(),
        };
        assert_eq!(resource.content_type(), Some("image/png"));
    }

    #[test]
    fn test_content_type_absent() {
        let resource = FetchedResource {
            status: 204,
            headers: HeaderMap::new(),
            body: Vec::new(),
        };
        assert_eq!(resource.content_type(), None);
    }

    #[tokio::test]
    async fn test_connection_refused_is_fetch_error() {
        // Bind then drop to get a port nothing is listening on.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let fetcher = Fetcher::new(&ProxyConfig::default()).unwrap();
        let url = Url::parse(&format!("http://127.0.0.1:{}/", port)).unwrap();
        let err = fetcher.fetch(&url).await.unwrap_err();
        assert!(matches!(err, ProxyError::Fetch { .. }));
        assert_eq!(err.status(), 500);
    }
}
