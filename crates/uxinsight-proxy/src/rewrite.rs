//! Same-origin link rewriting.
//!
//! Scans HTML text for double-quoted `href="..."` and `src="..."` attributes.
//! Each value is resolved against the document's base URL; when the result
//! shares the base origin (scheme, host, port) the value is replaced by a
//! proxy-routed href so navigation stays inside the proxy. Cross-origin and
//! unresolvable values are left byte-for-byte unchanged.
//!
//! Out of reach by construction: `srcset`, `data-*` attributes, inline CSS
//! `url()`, single-quoted or unquoted attributes, and JavaScript strings.
//!
//! Rewriting is idempotent: a value this module already produced (a
//! `/proxy?url=...` href whose target shares the base origin) is kept as is.
//! Any other `/proxy` path is the target site's own and gets rewritten.

use crate::error::{ProxyError, Result};
use crate::request::{proxied_target, proxy_href};
use std::borrow::Cow;
use tracing::debug;
use url::{Origin, Url};

/// Attributes whose values are rewritten.
const REWRITTEN_ATTRIBUTES: [&str; 2] = ["href", "src"];

/// Per-document rewrite state, derived once from the fetched URL.
#[derive(Debug, Clone)]
pub struct RewriteContext {
    base_url: Url,
    base_origin: Origin,
    base_origin_serialized: String,
}

impl RewriteContext {
    #[must_use]
    pub fn new(base_url: Url) -> Self {
        let base_origin = base_url.origin();
        let base_origin_serialized = base_origin.ascii_serialization();
        Self {
            base_url,
            base_origin,
            base_origin_serialized,
        }
    }

    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// `scheme://host[:port]` of the base URL.
    #[must_use]
    pub fn base_origin(&self) -> &str {
        &self.base_origin_serialized
    }

    /// Decide the replacement for one attribute value.
    ///
    /// `Ok(None)` means leave the value as it is. An error means the value
    /// could not be resolved; callers also leave it as it is.
    pub fn rewrite_value(&self, value: &str) -> Result<Option<String>> {
        if proxied_target(value).is_some_and(|target| target.origin() == self.base_origin) {
            return Ok(None);
        }

        let unescaped = unescape_ampersands(value);
        let resolved = self
            .base_url
            .join(&unescaped)
            .map_err(|e| ProxyError::MalformedUrl {
                value: value.to_string(),
                reason: e.to_string(),
            })?;

        if resolved.origin() != self.base_origin {
            return Ok(None);
        }

        Ok(Some(proxy_href(
            resolved.as_str(),
            Some(&self.base_origin_serialized),
        )))
    }
}

/// Rewrite every same-origin `href`/`src` value in `html`.
#[must_use]
pub fn rewrite_html(html: &str, ctx: &RewriteContext) -> String {
    let bytes = html.as_bytes();
    let mut out = String::with_capacity(html.len() + html.len() / 4);
    let mut copied = 0;
    let mut pos = 0;

    while pos < bytes.len() {
        let Some(name_len) = attribute_at(bytes, pos) else {
            pos += 1;
            continue;
        };

        // name + '=' + '"'
        let value_start = pos + name_len + 2;
        let Some(value_len) = html[value_start..].find('"') else {
            break;
        };
        let value_end = value_start + value_len;
        let value = &html[value_start..value_end];

        match ctx.rewrite_value(value) {
            Ok(Some(rewritten)) => {
                out.push_str(&html[copied..value_start]);
                out.push_str(&rewritten);
                copied = value_end;
            }
            Ok(None) => {}
            Err(e) => debug!("Leaving attribute unrewritten: {}", e),
        }
        pos = value_end + 1;
    }

    out.push_str(&html[copied..]);
    out
}

/// If a rewritable attribute opens at `pos`, return its name length.
fn attribute_at(bytes: &[u8], pos: usize) -> Option<usize> {
    if pos > 0 && !is_attribute_boundary(bytes[pos - 1]) {
        return None;
    }
    REWRITTEN_ATTRIBUTES.iter().find_map(|name| {
        let end = pos + name.len();
        let matches = bytes.len() > end + 1
            && bytes[pos..end].eq_ignore_ascii_case(name.as_bytes())
            && bytes[end] == b'='
            && bytes[end + 1] == b'"';
        matches.then_some(name.len())
    })
}

/// Character references for `&` accepted inside attribute values.
const AMPERSAND_REFERENCES: [&str; 3] = ["&amp;", "&#38;", "&#x26;"];

/// Decode `&` character references in one pass, so `&amp;#38;` yields
/// `&#38;` and not `&`.
fn unescape_ampersands(value: &str) -> Cow<'_, str> {
    if !value.contains('&') {
        return Cow::Borrowed(value);
    }

    let mut out = String::with_capacity(value.len());
    let mut rest = value;
    while let Some(at) = rest.find('&') {
        out.push_str(&rest[..at]);
        let tail = &rest[at..];
        let consumed = AMPERSAND_REFERENCES
            .iter()
            .find(|reference| {
                tail.len() >= reference.len()
                    && tail.as_bytes()[..reference.len()].eq_ignore_ascii_case(reference.as_bytes())
            })
            .map_or(1, |reference| reference.len());
        out.push('&');
        rest = &tail[consumed..];
    }
    out.push_str(rest);
    Cow::Owned(out)
}

/// Bytes that may directly precede an attribute name inside a tag.
fn is_attribute_boundary(byte: u8) -> bool {
    byte.is_ascii_whitespace() || byte == b'"' || byte == b'\'' || byte == b'/'
}
