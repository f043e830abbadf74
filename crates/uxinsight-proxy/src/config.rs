//! Proxy configuration types.
//!
//! Defines the listen address, the outbound identity presented to target
//! sites, and the resource limits applied to each proxied request.

use crate::error::{ProxyError, Result};
use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::path::Path;
use std::time::Duration;

/// Browser-like identity sent on every outbound request.
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/116.0.5845.179 Safari/537.36";

/// Configuration for the proxy server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProxyConfig {
    /// Bind address (default: 127.0.0.1)
    pub bind_addr: IpAddr,

    /// Bind port (0 = OS-assigned ephemeral port)
    pub bind_port: u16,

    /// `User-Agent` header for outbound fetches
    pub user_agent: String,

    /// Whole-request timeout for outbound fetches, in seconds
    pub fetch_timeout_secs: u64,

    /// Time allowed for a client to send its request line and headers
    pub request_read_timeout_secs: u64,

    /// Upstream bodies larger than this are rejected
    pub max_body_bytes: usize,

    /// Maximum concurrent connections (0 = unlimited).
    pub max_connections: usize,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            bind_port: 0,
            user_agent: BROWSER_USER_AGENT.to_string(),
            fetch_timeout_secs: 30,
            request_read_timeout_secs: 10,
            max_body_bytes: 32 * 1024 * 1024,
            max_connections: 256,
        }
    }
}

fn default_bind_addr() -> IpAddr {
    IpAddr::V4(std::net::Ipv4Addr::LOCALHOST)
}

impl ProxyConfig {
    /// Load a JSON config file. Missing fields take their defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            ProxyError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        let config: ProxyConfig = serde_json::from_str(&raw).map_err(|e| {
            ProxyError::Config(format!("invalid config {}: {}", path.display(), e))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the proxy cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.fetch_timeout_secs == 0 {
            return Err(ProxyError::Config(
                "fetch_timeout_secs must be at least 1".to_string(),
            ));
        }
        if self.request_read_timeout_secs == 0 {
            return Err(ProxyError::Config(
                "request_read_timeout_secs must be at least 1".to_string(),
            ));
        }
        if self.user_agent.trim().is_empty() {
            return Err(ProxyError::Config("user_agent must not be empty".to_string()));
        }
        Ok(())
    }

    #[must_use]
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    #[must_use]
    pub fn request_read_timeout(&self) -> Duration {
        Duration::from_secs(self.request_read_timeout_secs)
    }
}
