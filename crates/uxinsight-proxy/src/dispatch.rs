//! Content-type dispatch.
//!
//! Only a declared `text/html` media type (any case, parameters allowed)
//! takes the rewrite path. Anything else, including a missing or unparsable
//! `Content-Type`, is passed through untouched.

use crate::fetch::FetchedResource;

/// Which pipeline branch a response takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    Html,
    Binary,
}

/// Classify a declared `Content-Type` header value.
#[must_use]
pub fn classify(content_type: Option<&str>) -> ContentKind {
    match content_type.and_then(parse_media_type) {
        Some((kind, subtype))
            if kind.eq_ignore_ascii_case("text") && subtype.eq_ignore_ascii_case("html") =>
        {
            ContentKind::Html
        }
        _ => ContentKind::Binary,
    }
}

/// Split `type/subtype; params` into `(type, subtype)`.
fn parse_media_type(value: &str) -> Option<(&str, &str)> {
    let essence = value.split(';').next()?.trim();
    let (kind, subtype) = essence.split_once('/')?;
    let is_token = |s: &str| !s.is_empty() && !s.contains(|c: char| c.is_whitespace() || c == '/');
    (is_token(kind) && is_token(subtype)).then_some((kind, subtype))
}

/// An upstream response routed to its branch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatched {
    /// Decoded document text awaiting rewrite and injection
    Html { status: u16, html: String },
    /// Opaque body returned as-is with the upstream content type
    Passthrough {
        status: u16,
        content_type: Option<String>,
        body: Vec<u8>,
    },
}

/// Route a fetched resource. HTML bodies are decoded as UTF-8, replacing
/// invalid sequences.
#[must_use]
pub fn dispatch(resource: FetchedResource) -> Dispatched {
    let content_type = resource.content_type().map(str::to_string);
    match classify(content_type.as_deref()) {
        ContentKind::Html => Dispatched::Html {
            status: resource.status,
            html: String::from_utf8_lossy(&resource.body).into_owned(),
        },
        ContentKind::Binary => Dispatched::Passthrough {
            status: resource.status,
            content_type,
            body: resource.body,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};

    fn resource(content_type: Option<&'static str>, body: &[u8]) -> FetchedResource {
        let mut headers = HeaderMap::new();
        if let Some(ct) = content_type {
            headers.insert(CONTENT_TYPE, HeaderValue::from_static(ct));
        }
        FetchedResource {
            status: 200,
            headers,
            body: body.to_vec(),
        }
    }

    #[test]
    fn test_classify_html_variants() {
        assert_eq!(classify(Some("text/html")), ContentKind::Html);
        assert_eq!(classify(Some("TEXT/HTML; charset=UTF-8")), ContentKind::Html);
        assert_eq!(classify(Some("  text/html ;charset=utf-8")), ContentKind::Html);
    }

    #[test]
    fn test_classify_non_html() {
        assert_eq!(classify(Some("application/xhtml+xml")), ContentKind::Binary);
        assert_eq!(classify(Some("text/plain")), ContentKind::Binary);
        assert_eq!(classify(Some("text/htmlx")), ContentKind::Binary);
    }

    #[test]
    fn test_classify_missing_or_garbage_is_binary() {
        assert_eq!(classify(None), ContentKind::Binary);
        assert_eq!(classify(Some("")), ContentKind::Binary);
        assert_eq!(classify(Some("html")), ContentKind::Binary);
        assert_eq!(classify(Some("text/")), ContentKind::Binary);
        assert_eq!(classify(Some("text/html/extra")), ContentKind::Binary);
    }

    #[test]
    fn test_dispatch_passthrough_keeps_bytes_and_type() {
        let png = [0x89, b'P', b'N', b'G', 0x00, 0xff];
        match dispatch(resource(Some("image/png"), &png)) {
            Dispatched::Passthrough {
                content_type, body, ..
            } => {
                assert_eq!(content_type.as_deref(), Some("image/png"));
                assert_eq!(body, png);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_dispatch_html_decodes_lossily() {
        match dispatch(resource(Some("text/html"), b"<p>caf\xe9</p>")) {
            Dispatched::Html { html, status } => {
                assert_eq!(status, 200);
                assert!(html.starts_with("<p>caf"));
                assert!(html.contains('\u{FFFD}'));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_dispatch_without_content_type_passes_through() {
        assert!(matches!(
            dispatch(resource(None, b"<html></html>")),
            Dispatched::Passthrough { content_type: None, .. }
        ));
    }
}
