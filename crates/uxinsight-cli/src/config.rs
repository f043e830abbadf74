//! Proxy configuration resolution for `uxinsight serve`.
//!
//! Sources, highest precedence first:
//! - CLI flags
//! - `--config <file>`
//! - `~/.config/uxinsight/proxy.json` when it exists
//! - built-in defaults

use crate::cli::ServeArgs;
use crate::error::Result;
use std::path::{Path, PathBuf};
use tracing::debug;
use uxinsight_proxy::ProxyConfig;

/// Get the user config directory path
pub fn user_config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("uxinsight"))
}

/// Path of the user-level proxy config, whether or not it exists.
pub fn user_config_file() -> Option<PathBuf> {
    user_config_dir().map(|p| p.join("proxy.json"))
}

/// Resolve the effective configuration for `serve`.
pub fn resolve(args: &ServeArgs) -> Result<ProxyConfig> {
    resolve_with(args, user_config_file().as_deref())
}

fn resolve_with(args: &ServeArgs, user_file: Option<&Path>) -> Result<ProxyConfig> {
    let mut config = match (&args.config, user_file) {
        (Some(path), _) => {
            debug!("Loading proxy config from {}", path.display());
            ProxyConfig::from_file(path)?
        }
        (None, Some(path)) if path.exists() => {
            debug!("Loading user proxy config from {}", path.display());
            ProxyConfig::from_file(path)?
        }
        _ => ProxyConfig::default(),
    };

    if let Some(bind) = args.bind {
        config.bind_addr = bind;
    }
    if let Some(port) = args.port {
        config.bind_port = port;
    }
    if let Some(timeout) = args.timeout {
        config.fetch_timeout_secs = timeout;
    }

    config.validate()?;
    Ok(config)
}
