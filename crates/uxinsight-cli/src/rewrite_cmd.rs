//! `uxinsight rewrite`: run the HTML pipeline on a local document.

use crate::cli::RewriteArgs;
use crate::error::{CliError, Result};
use std::io::{Read, Write};
use url::Url;
use uxinsight_proxy::{rewrite_html, transform_html, RewriteContext};

pub fn run_rewrite(args: RewriteArgs) -> Result<()> {
    let base = parse_base_url(&args.base_url)?;

    let raw = match args.file {
        Some(ref path) => std::fs::read(path).map_err(|e| CliError::ReadInput {
            path: path.display().to_string(),
            source: e,
        })?,
        None => {
            let mut buf = Vec::new();
            std::io::stdin()
                .read_to_end(&mut buf)
                .map_err(|e| CliError::ReadInput {
                    path: "<stdin>".to_string(),
                    source: e,
                })?;
            buf
        }
    };

    let html = String::from_utf8_lossy(&raw);
    let output = rewrite_document(&html, &base, !args.no_inject);

    let mut stdout = std::io::stdout().lock();
    stdout.write_all(output.as_bytes())?;
    stdout.flush()?;
    Ok(())
}

/// Produce the document the proxy would serve for `html` fetched from `base`.
pub fn rewrite_document(html: &str, base: &Url, inject: bool) -> String {
    if inject {
        transform_html(html, base)
    } else {
        rewrite_html(html, &RewriteContext::new(base.clone()))
    }
}

fn parse_base_url(raw: &str) -> Result<Url> {
    let url = Url::parse(raw).map_err(|e| CliError::InvalidBaseUrl {
        url: raw.to_string(),
        reason: e.to_string(),
    })?;
    if url.cannot_be_a_base() {
        return Err(CliError::InvalidBaseUrl {
            url: raw.to_string(),
            reason: "URL cannot be used as a base".to_string(),
        });
    }
    Ok(url)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<html><head></head><body><img src="logo.png"></body></html>"#;

    #[test]
    fn test_rewrite_document_with_injection() {
        let base = parse_base_url("https://example.com/docs/").unwrap();
        let out = rewrite_document(PAGE, &base, true);
        assert!(out.contains("src=\"/proxy?url=https%3A%2F%2Fexample.com%2Fdocs%2Flogo.png"));
        assert!(out.contains("<script data-uxinsight"));
    }

    #[test]
    fn test_rewrite_document_without_injection() {
        let base = parse_base_url("https://example.com/docs/").unwrap();
        let out = rewrite_document(PAGE, &base, false);
        assert!(out.contains("/proxy?url="));
        assert!(!out.contains("<script"));
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(matches!(
            parse_base_url("not a url"),
            Err(CliError::InvalidBaseUrl { .. })
        ));
        assert!(matches!(
            parse_base_url("mailto:someone@example.com"),
            Err(CliError::InvalidBaseUrl { .. })
        ));
    }
}
