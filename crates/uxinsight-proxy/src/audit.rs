//! Audit logging for proxy requests.
//!
//! Logs every proxied request with structured fields via `tracing`. The
//! caller-supplied `origin` hint is recorded here and nowhere else; it never
//! influences routing or rewriting.

use tracing::{info, warn};

/// Which branch of the pipeline produced the response body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponsePath {
    /// Body was rewritten and instrumented
    Html,
    /// Body was passed through byte-for-byte
    Passthrough,
}

impl std::fmt::Display for ResponsePath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResponsePath::Html => write!(f, "html"),
            ResponsePath::Passthrough => write!(f, "passthrough"),
        }
    }
}

/// Log a successfully proxied request.
pub fn log_proxied(target_url: &str, origin_hint: &str, status: u16, path: ResponsePath, bytes: usize) {
    info!(
        target: "uxinsight_proxy::audit",
        target_url = target_url,
        origin_hint = origin_hint,
        status = status,
        path = %path,
        bytes = bytes,
        decision = "proxied",
        "proxy request served"
    );
}

/// Log a request rejected before any fetch was attempted.
pub fn log_rejected(request_target: &str, status: u16, reason: &str) {
    info!(
        target: "uxinsight_proxy::audit",
        request_target = request_target,
        status = status,
        decision = "reject",
        reason = reason,
        "proxy request rejected"
    );
}

/// Log a failed upstream fetch. `reason` stays in the log; the browser only
/// sees a fixed message.
pub fn log_fetch_failed(target_url: &str, origin_hint: &str, reason: &str) {
    warn!(
        target: "uxinsight_proxy::audit",
        target_url = target_url,
        origin_hint = origin_hint,
        decision = "error",
        reason = reason,
        "upstream fetch failed"
    );
}
