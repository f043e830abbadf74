//! Tracking-script injection.
//!
//! The instrumentation snippet is inserted immediately before the first
//! `</head>` (ASCII case-insensitive). Documents without one are returned
//! unmodified and are simply not instrumented.
//!
//! The snippet is rendered once from `tracking.js` with the storage key,
//! expiration window and message type names taken from the `uxinsight`
//! crate, so the browser script and the Rust session model cannot drift.

use std::sync::LazyLock;
use uxinsight::relay::{MSG_INTERACTION, MSG_LOG_READY, MSG_URL_CHANGE};
use uxinsight::{SESSION_EXPIRATION_MS, SESSION_KEY};

const TRACKING_TEMPLATE: &str = include_str!("tracking.js");

const HEAD_CLOSE: &str = "</head>";

static TRACKING_SCRIPT: LazyLock<String> = LazyLock::new(|| {
    TRACKING_TEMPLATE
        .replace("__SESSION_KEY__", SESSION_KEY)
        .replace("__EXPIRATION_MS__", &SESSION_EXPIRATION_MS.to_string())
        .replace("__MSG_INTERACTION__", MSG_INTERACTION)
        .replace("__MSG_URL_CHANGE__", MSG_URL_CHANGE)
        .replace("__MSG_LOG_READY__", MSG_LOG_READY)
});

static TRACKING_SNIPPET: LazyLock<String> = LazyLock::new(|| {
    format!(
        "<script data-uxinsight=\"tracker\">\n{}</script>\n",
        tracking_script()
    )
});

/// The rendered tracking script, without the `<script>` element.
#[must_use]
pub fn tracking_script() -> &'static str {
    &TRACKING_SCRIPT
}

/// The full `<script>` element inserted into tracked pages.
#[must_use]
pub fn tracking_snippet() -> &'static str {
    &TRACKING_SNIPPET
}

/// Insert the tracking snippet before the head-closing tag.
#[must_use]
pub fn inject_tracking_script(html: &str) -> String {
    match find_ascii_case_insensitive(html, HEAD_CLOSE) {
        Some(at) => {
            let snippet = tracking_snippet();
            let mut out = String::with_capacity(html.len() + snippet.len());
            out.push_str(&html[..at]);
            out.push_str(snippet);
            out.push_str(&html[at..]);
            out
        }
        None => html.to_string(),
    }
}

fn find_ascii_case_insensitive(haystack: &str, needle: &str) -> Option<usize> {
    let needle = needle.as_bytes();
    haystack
        .as_bytes()
        .windows(needle.len())
        .position(|window| window.eq_ignore_ascii_case(needle))
}
