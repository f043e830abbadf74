//! The durable, expiring session log kept by the tracked page.
//!
//! The log is append-only while active. It expires when its most recent entry
//! is older than [`SESSION_EXPIRATION_MS`]; an expired log is discarded on load
//! and a fresh one is started in its place.

use crate::error::{InsightError, Result};
use crate::event::SessionEntry;
use serde::{Deserialize, Serialize};

/// Storage key holding the serialized log.
pub const SESSION_KEY: &str = "trackingSession";

/// Expiration window measured from the most recent entry (10 minutes).
pub const SESSION_EXPIRATION_MS: i64 = 10 * 60 * 1000;

/// Ordered sequence of session entries.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionLog {
    entries: Vec<SessionEntry>,
}

impl SessionLog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn from_entries(entries: Vec<SessionEntry>) -> Self {
        Self { entries }
    }

    /// Parse a stored log. The stored form is a JSON array of tagged entries.
    pub fn from_json(raw: &str) -> Result<Self> {
        serde_json::from_str(raw).map_err(|e| InsightError::CorruptSession(e.to_string()))
    }

    /// Serialize to the stored form.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn push(&mut self, entry: impl Into<SessionEntry>) {
        self.entries.push(entry.into());
    }

    #[must_use]
    pub fn entries(&self) -> &[SessionEntry] {
        &self.entries
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Timestamp of the most recent entry.
    #[must_use]
    pub fn last_timestamp(&self) -> Option<i64> {
        self.entries.last().map(SessionEntry::timestamp)
    }

    /// Whether the log has gone stale relative to `now` (epoch ms).
    ///
    /// Strictly greater than the window: an entry exactly ten minutes old is
    /// still live. An empty log never expires.
    #[must_use]
    pub fn is_expired_at(&self, now: i64) -> bool {
        match self.last_timestamp() {
            Some(last) => now.saturating_sub(last) > SESSION_EXPIRATION_MS,
            None => false,
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
