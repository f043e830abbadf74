//! Rewriting reverse proxy for the uxinsight session tracker.
//!
//! `uxinsight-proxy` serves `GET /proxy?url=<target>`:
//!
//! 1. **Fetch** (`fetch`) - The target is retrieved server-side with a
//!    browser-like identity, following redirects.
//!
//! 2. **Dispatch** (`dispatch`) - The upstream `Content-Type` decides
//!    whether the body is HTML (instrumented) or anything else (passed
//!    through byte-for-byte with its original type).
//!
//! 3. **Rewrite + inject** (`rewrite`, `inject`) - Same-origin `href`/`src`
//!    values are routed back through the proxy, then the tracking script is
//!    inserted before `</head>`.
//!
//! `GET /` serves a hosting page (`host`) that frames the proxied target so
//! the injected script can relay session events to its parent.

pub mod audit;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod fetch;
pub mod handler;
pub mod host;
pub mod inject;
pub mod request;
pub mod rewrite;
pub mod server;

#[cfg(test)]
mod script_env;

pub use config::ProxyConfig;
pub use error::{ProxyError, Result};
pub use handler::{handle_proxy, transform_html, ProxyResponse};
pub use inject::{inject_tracking_script, tracking_script, tracking_snippet};
pub use rewrite::{rewrite_html, RewriteContext};
pub use server::{start, ProxyHandle};
