//! Host-side accumulation of relayed events.
//!
//! The hosting page owns one [`Aggregator`] per embedded-page session. It
//! only grows; it is reset by creating a new one when the host reloads.

use crate::error::Result;
use crate::event::{Interaction, InteractionKind, UrlChange};
use crate::relay::{Inbound, RelayMessage};
use serde::Serialize;
use std::fmt;
use tracing::debug;

/// Accumulated interactions and URL changes.
#[derive(Debug, Clone, Default)]
pub struct Aggregator {
    interactions: Vec<Interaction>,
    url_changes: Vec<UrlChange>,
}

impl Aggregator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one typed message.
    pub fn apply_message(&mut self, message: RelayMessage) {
        match message {
            RelayMessage::Interaction(interaction) => self.interactions.push(interaction),
            RelayMessage::UrlChange(change) => self.url_changes.push(change),
            RelayMessage::LogReady(entries) => {
                debug!("Tracked page resumed with {} logged entries", entries.len());
            }
        }
    }

    /// Apply a decoded inbound message, ignoring unknown types.
    pub fn apply(&mut self, inbound: Inbound) {
        match inbound {
            Inbound::Message(message) => self.apply_message(message),
            Inbound::Unknown(kind) => debug!("Ignoring relay message of unknown type '{}'", kind),
        }
    }

    /// Decode and apply a raw JSON message.
    pub fn apply_raw(&mut self, raw: &str) -> Result<()> {
        self.apply(RelayMessage::decode(raw)?);
        Ok(())
    }

    #[must_use]
    pub fn interactions(&self) -> &[Interaction] {
        &self.interactions
    }

    #[must_use]
    pub fn url_changes(&self) -> &[UrlChange] {
        &self.url_changes
    }

    #[must_use]
    pub fn interaction_count(&self) -> usize {
        self.interactions.len()
    }

    /// Interactions whose kind is `click`.
    #[must_use]
    pub fn total_clicks(&self) -> usize {
        self.interactions
            .iter()
            .filter(|i| i.kind == InteractionKind::Click)
            .count()
    }

    #[must_use]
    pub fn url_change_count(&self) -> usize {
        self.url_changes.len()
    }

    /// Timestamp of the first received interaction, if any.
    #[must_use]
    pub fn session_start(&self) -> Option<i64> {
        self.interactions.first().map(|i| i.timestamp)
    }

    #[must_use]
    pub fn summary(&self) -> InsightSummary {
        InsightSummary {
            total_interactions: self.interaction_count(),
            total_clicks: self.total_clicks(),
            total_url_changes: self.url_change_count(),
            session_start: self.session_start(),
        }
    }
}

/// Read-only view of the derived counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct InsightSummary {
    pub total_interactions: usize,
    pub total_clicks: usize,
    pub total_url_changes: usize,
    /// Epoch milliseconds, `None` until the first interaction arrives
    pub session_start: Option<i64>,
}

impl InsightSummary {
    /// Session start in local time, or `N/A` when unknown.
    #[must_use]
    pub fn session_start_display(&self) -> String {
        self.session_start
            .and_then(chrono::DateTime::<chrono::Utc>::from_timestamp_millis)
            .map(|t| {
                t.with_timezone(&chrono::Local)
                    .format("%Y-%m-%d %H:%M:%S")
                    .to_string()
            })
            .unwrap_or_else(|| "N/A".to_string())
    }
}

impl fmt::Display for InsightSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Total Clicks: {}", self.total_clicks)?;
        writeln!(f, "Interactions: {}", self.total_interactions)?;
        writeln!(f, "URL Changes: {}", self.total_url_changes)?;
        write!(f, "Session Start: {}", self.session_start_display())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::event::SessionEntry;

    fn change(ts: i64) -> UrlChange {
        UrlChange {
            from: "https://shop.test/".to_string(),
            to: format!("https://shop.test/{}", ts),
            timestamp: ts,
        }
    }

    #[test]
    fn test_counts_three_interactions_two_changes() {
        let mut agg = Aggregator::new();
        agg.apply_message(RelayMessage::Interaction(Interaction::click(1.0, 1.0, 100)));
        agg.apply_message(RelayMessage::UrlChange(change(150)));
        agg.apply_message(RelayMessage::Interaction(Interaction::scroll(20.0, 200)));
        agg.apply_message(RelayMessage::Interaction(Interaction::click(3.0, 4.0, 300)));
        agg.apply_message(RelayMessage::UrlChange(change(350)));

        assert_eq!(agg.interaction_count(), 3);
        assert_eq!(agg.total_clicks(), 2);
        assert_eq!(agg.url_change_count(), 2);
        assert_eq!(agg.session_start(), Some(100));
    }

    #[test]
    fn test_session_start_unknown_without_interactions() {
        let mut agg = Aggregator::new();
        agg.apply_message(RelayMessage::UrlChange(change(1)));
        assert_eq!(agg.session_start(), None);
        assert_eq!(agg.summary().session_start_display(), "N/A");
    }

    #[test]
    fn test_log_ready_changes_nothing() {
        let mut agg = Aggregator::new();
        agg.apply_message(RelayMessage::LogReady(vec![SessionEntry::from(
            Interaction::click(0.0, 0.0, 1),
        )]));
        assert_eq!(agg.interaction_count(), 0);
        assert_eq!(agg.url_change_count(), 0);
    }

    #[test]
    fn test_unknown_raw_message_ignored() {
        let mut agg = Aggregator::new();
        agg.apply_raw(r#"{"type":"resize","data":{"w":1}}"#).unwrap();
        assert_eq!(agg.summary().total_interactions, 0);
    }

    #[test]
    fn test_malformed_raw_message_errors_without_state_change() {
        let mut agg = Aggregator::new();
        assert!(agg.apply_raw("[]").is_err());
        assert_eq!(agg.interaction_count(), 0);
    }

    #[test]
    fn test_summary_display() {
        let mut agg = Aggregator::new();
        agg.apply_message(RelayMessage::Interaction(Interaction::click(1.0, 1.0, 0)));
        let text = agg.summary().to_string();
        assert!(text.contains("Total Clicks: 1"));
        assert!(text.contains("URL Changes: 0"));
        assert!(!text.contains("N/A"));
    }
}
