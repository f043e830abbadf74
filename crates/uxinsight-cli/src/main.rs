//! uxinsight CLI - session tracking through a rewriting proxy
//!
//! This is the CLI binary over the uxinsight and uxinsight-proxy libraries.

mod cli;
mod config;
mod error;
mod output;
mod replay_cmd;
mod rewrite_cmd;
mod serve_cmd;

use clap::Parser;
use cli::{Cli, Commands};
use error::Result;
use tracing::error;
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();

    // Initialize logging. -v overrides RUST_LOG.
    let filter = match cli.verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(cli) {
        error!("{}", e);
        eprintln!("uxinsight: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Serve(args) => {
            output::print_banner(cli.silent);
            serve_cmd::run_serve(args, cli.silent)
        }
        Commands::Rewrite(args) => rewrite_cmd::run_rewrite(args),
        Commands::Replay(args) => replay_cmd::run_replay(args, cli.silent),
    }
}
