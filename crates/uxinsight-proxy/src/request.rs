//! The `/proxy` route: query parsing and proxied-link construction.
//!
//! `GET /proxy?url=<percent-encoded absolute URL>[&origin=<percent-encoded origin>]`
//!
//! The `url` parameter is decoded exactly once. `origin` is kept only as a
//! diagnostic hint and is never used for a security decision.

use crate::error::{ProxyError, Result};
use url::Url;

/// Path of the proxy route.
pub const PROXY_PATH: &str = "/proxy";

/// Recorded when the caller supplied no `origin` hint.
pub const UNKNOWN_ORIGIN: &str = "unknown-origin";

/// One inbound proxy call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyRequest {
    /// Absolute resource to fetch
    pub target_url: Url,
    /// Informational only (logging)
    pub origin_hint: String,
}

impl ProxyRequest {
    /// Parse the query string of a `/proxy` request (without the leading `?`).
    pub fn from_query(query: &str) -> Result<Self> {
        let mut target = None;
        let mut origin = None;
        for (name, value) in url::form_urlencoded::parse(query.as_bytes()) {
            match name.as_ref() {
                "url" if target.is_none() => target = Some(value.into_owned()),
                "origin" if origin.is_none() => origin = Some(value.into_owned()),
                _ => {}
            }
        }

        let target = target
            .filter(|t| !t.trim().is_empty())
            .ok_or(ProxyError::MissingParameter)?;
        let target_url = parse_target(target.trim())?;

        Ok(Self {
            target_url,
            origin_hint: origin
                .filter(|o| !o.is_empty())
                .unwrap_or_else(|| UNKNOWN_ORIGIN.to_string()),
        })
    }
}

/// Parse a fetch target, accepting only absolute http(s) URLs.
pub fn parse_target(raw: &str) -> Result<Url> {
    let url = Url::parse(raw).map_err(|e| ProxyError::InvalidTarget {
        url: raw.to_string(),
        reason: e.to_string(),
    })?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        scheme => Err(ProxyError::InvalidTarget {
            url: raw.to_string(),
            reason: format!("unsupported URL scheme: {}", scheme),
        }),
    }
}

/// Build a proxy-routed href for `target`.
///
/// Components are percent-encoded so the value survives a round trip
/// through [`ProxyRequest::from_query`].
#[must_use]
pub fn proxy_href(target: &str, origin: Option<&str>) -> String {
    match origin {
        Some(origin) => format!(
            "{}?url={}&origin={}",
            PROXY_PATH,
            urlencoding::encode(target),
            urlencoding::encode(origin)
        ),
        None => format!("{}?url={}", PROXY_PATH, urlencoding::encode(target)),
    }
}

/// Target of a value previously produced by [`proxy_href`].
///
/// Only `/proxy?...` values whose `url` parameter is an absolute http(s) URL
/// qualify; `/proxy` alone or `/proxy?id=3` are ordinary paths.
#[must_use]
pub fn proxied_target(value: &str) -> Option<Url> {
    let query = value.strip_prefix(PROXY_PATH)?.strip_prefix('?')?;
    ProxyRequest::from_query(query)
        .ok()
        .map(|request| request.target_url)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_url_and_origin() {
        let req = ProxyRequest::from_query(
            "url=https%3A%2F%2Fexample.com%2Fa%3Fq%3D1&origin=https%3A%2F%2Fexample.com",
        )
        .unwrap();
        assert_eq!(req.target_url.as_str(), "https://example.com/a?q=1");
        assert_eq!(req.origin_hint, "https://example.com");
    }

    #[test]
    fn test_missing_url() {
        assert!(matches!(
            ProxyRequest::from_query("origin=x"),
            Err(ProxyError::MissingParameter)
        ));
        assert!(matches!(
            ProxyRequest::from_query(""),
            Err(ProxyError::MissingParameter)
        ));
    }

    #[test]
    fn test_empty_url_counts_as_missing() {
        let err = ProxyRequest::from_query("url=").unwrap_err();
        assert_eq!(err.status(), 400);
    }

    #[test]
    fn test_origin_defaults_to_unknown() {
        let req = ProxyRequest::from_query("url=http%3A%2F%2Flocalhost%3A9000%2F").unwrap();
        assert_eq!(req.origin_hint, UNKNOWN_ORIGIN);
        assert_eq!(req.target_url.port(), Some(9000));
    }

    #[test]
    fn test_relative_or_non_http_target_rejected() {
        let err = ProxyRequest::from_query("url=%2Fonly%2Fa%2Fpath").unwrap_err();
        assert!(matches!(err, ProxyError::InvalidTarget { .. }));
        assert_eq!(err.status(), 500);

        let err = ProxyRequest::from_query("url=file%3A%2F%2F%2Fetc%2Fpasswd").unwrap_err();
        assert!(matches!(err, ProxyError::InvalidTarget { .. }));
    }

    #[test]
    fn test_proxy_href_round_trips() {
        let target = "https://example.com/search?q=a b&lang=en#top";
        let href = proxy_href(target, Some("https://example.com"));
        let query = href.strip_prefix("/proxy?").unwrap();
        let req = ProxyRequest::from_query(query).unwrap();
        assert_eq!(req.target_url.as_str(), Url::parse(target).unwrap().as_str());
        assert_eq!(req.origin_hint, "https://example.com");
    }

    #[test]
    fn test_proxied_target() {
        let href = proxy_href("https://example.com/a.html", Some("https://example.com"));
        assert_eq!(
            proxied_target(&href).unwrap().as_str(),
            "https://example.com/a.html"
        );
        assert!(proxied_target("/proxy").is_none());
        assert!(proxied_target("/proxy?id=3").is_none());
        assert!(proxied_target("/proxy?url=%2Frelative").is_none());
        assert!(proxied_target("/proxyfoo?url=https%3A%2F%2Fexample.com").is_none());
        assert!(proxied_target("https://example.com/proxy?url=x").is_none());
    }
}
