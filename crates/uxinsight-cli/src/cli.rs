//! CLI argument definitions for uxinsight
//!
//! Uses clap for argument parsing. This module defines all subcommands
//! and their options.

use clap::{Args, Parser, Subcommand};
use std::net::IpAddr;
use std::path::PathBuf;

/// uxinsight - session tracking through a rewriting proxy
///
/// Serves third-party pages through a local proxy that keeps navigation on
/// the proxy and instruments every HTML page with a session tracker.
#[derive(Parser, Debug)]
#[command(name = "uxinsight")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Silent mode - suppress the banner and status lines
    #[arg(long, short = 's', global = true)]
    pub silent: bool,

    /// Enable verbose output (-v info, -vv debug, -vvv trace)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the rewriting proxy
    #[command(after_help = "EXAMPLES:
    # Listen on an OS-assigned port on 127.0.0.1
    uxinsight serve

    # Fixed port, 10 second upstream timeout
    uxinsight serve --port 8080 --timeout 10

    # Then open http://127.0.0.1:8080/?url=https://example.com
")]
    Serve(ServeArgs),

    /// Rewrite an HTML document offline, as the proxy would serve it
    #[command(after_help = "EXAMPLES:
    # Rewrite a saved page
    uxinsight rewrite --base-url https://example.com/docs/ page.html

    # From stdin, without the tracking script
    curl -s https://example.com | uxinsight rewrite --base-url https://example.com --no-inject
")]
    Rewrite(RewriteArgs),

    /// Aggregate a recorded stream of relay messages
    #[command(after_help = "EXAMPLES:
    # One JSON message per line, as logged to the browser console by the
    # hosting page at http://<proxy>/?url=<target>
    uxinsight replay session.jsonl

    # Machine-readable summary
    uxinsight replay session.jsonl --json
")]
    Replay(ReplayArgs),
}

#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Listen address
    #[arg(long, value_name = "ADDR")]
    pub bind: Option<IpAddr>,

    /// Listen port (0 = OS-assigned)
    #[arg(long, short = 'p', value_name = "PORT")]
    pub port: Option<u16>,

    /// Upstream fetch timeout in seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Configuration file path (JSON)
    #[arg(long, short = 'c', value_name = "FILE")]
    pub config: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct RewriteArgs {
    /// URL the document was fetched from
    #[arg(long, value_name = "URL")]
    pub base_url: String,

    /// HTML file to rewrite (stdin when omitted)
    #[arg(value_name = "FILE")]
    pub file: Option<PathBuf>,

    /// Skip tracking script injection
    #[arg(long)]
    pub no_inject: bool,
}

#[derive(Args, Debug)]
pub struct ReplayArgs {
    /// File with one relay message per line
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Print the summary as JSON
    #[arg(long)]
    pub json: bool,
}
