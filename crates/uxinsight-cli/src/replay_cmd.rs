//! `uxinsight replay`: aggregate recorded relay messages.
//!
//! Input is one JSON relay message per line, exactly as the tracking script
//! posts them to its parent frame. Blank lines are skipped. Malformed lines
//! are reported with their 1-based line number and do not stop the replay.

use crate::cli::ReplayArgs;
use crate::error::{CliError, Result};
use crate::output;
use std::fs::File;
use std::io::{BufRead, BufReader};
use tracing::{debug, warn};
use uxinsight::Aggregator;

/// A line that failed to decode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedLine {
    pub line: usize,
    pub reason: String,
}

/// Result of feeding a message stream to an [`Aggregator`].
#[derive(Debug, Default)]
pub struct ReplayReport {
    pub aggregator: Aggregator,
    pub applied: usize,
    pub skipped: Vec<SkippedLine>,
}

pub fn run_replay(args: ReplayArgs, silent: bool) -> Result<()> {
    let file = File::open(&args.file).map_err(|e| CliError::ReadInput {
        path: args.file.display().to_string(),
        source: e,
    })?;

    let report = replay(BufReader::new(file))?;
    output::print_skipped(&report.skipped, silent);

    let summary = report.aggregator.summary();
    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        output::print_summary(&summary);
    }
    Ok(())
}

/// Apply every message in `reader` to a fresh aggregator.
pub fn replay(reader: impl BufRead) -> Result<ReplayReport> {
    let mut report = ReplayReport::default();

    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        match report.aggregator.apply_raw(trimmed) {
            Ok(()) => report.applied += 1,
            Err(e) => {
                warn!("Skipping line {}: {}", index + 1, e);
                report.skipped.push(SkippedLine {
                    line: index + 1,
                    reason: e.to_string(),
                });
            }
        }
    }

    debug!(
        "Replayed {} message(s), skipped {}",
        report.applied,
        report.skipped.len()
    );
    Ok(report)
}
