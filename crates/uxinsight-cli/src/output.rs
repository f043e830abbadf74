//! CLI output styling for uxinsight

use crate::replay_cmd::SkippedLine;
use colored::Colorize;
use std::net::SocketAddr;
use uxinsight::InsightSummary;

/// Print the uxinsight banner
pub fn print_banner(silent: bool) {
    if silent {
        return;
    }

    let title = "uxinsight".truecolor(46, 139, 87).bold();
    let ver = format!("v{}", env!("CARGO_PKG_VERSION")).white();

    eprintln!();
    eprintln!("  {} {}", title, ver);
    eprintln!(
        "  {}",
        "rewriting proxy with session tracking".truecolor(150, 150, 150)
    );
    eprintln!();
}

/// Print where the proxy is reachable
pub fn print_listening(addr: SocketAddr, silent: bool) {
    if silent {
        return;
    }
    eprintln!("  {} http://{}", "Listening on".green(), addr);
    eprintln!(
        "  {}",
        format!("Open http://{}/?url=<target> to browse through the proxy.", addr)
            .truecolor(150, 150, 150)
    );
    eprintln!("  {}", "Press Ctrl-C to stop.".truecolor(150, 150, 150));
    eprintln!();
}

/// Print shutdown notice
pub fn print_stopped(silent: bool) {
    if silent {
        return;
    }
    eprintln!("{}", "Proxy stopped.".truecolor(150, 150, 150));
}

/// Print an aggregated session summary to stdout
pub fn print_summary(summary: &InsightSummary) {
    println!("{}", "Session Summary".bold());
    println!("  {:<15} {}", "Total Clicks:", summary.total_clicks);
    println!("  {:<15} {}", "Interactions:", summary.total_interactions);
    println!("  {:<15} {}", "URL Changes:", summary.total_url_changes);
    println!("  {:<15} {}", "Session Start:", summary.session_start_display());
}

/// Report lines that could not be replayed
pub fn print_skipped(skipped: &[SkippedLine], silent: bool) {
    if silent || skipped.is_empty() {
        return;
    }
    eprintln!(
        "{}",
        format!("Skipped {} malformed line(s):", skipped.len()).yellow()
    );
    for line in skipped {
        eprintln!("  line {}: {}", line.line, line.reason);
    }
}
