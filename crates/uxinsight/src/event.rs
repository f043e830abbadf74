//! Entries recorded by the tracking script.
//!
//! A session log is an ordered sequence of [`SessionEntry`] values. Each
//! entry is either an [`Interaction`] (one physical user action) or a
//! [`UrlChange`] (a client-side navigation observed without a full page load).

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;

/// Kind of user interaction.
///
/// Serialized as a bare lowercase string. Kinds this build does not know
/// about are preserved verbatim in [`InteractionKind::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum InteractionKind {
    Click,
    Scroll,
    Other(String),
}

impl InteractionKind {
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            InteractionKind::Click => "click",
            InteractionKind::Scroll => "scroll",
            InteractionKind::Other(kind) => kind,
        }
    }
}

impl From<String> for InteractionKind {
    fn from(kind: String) -> Self {
        match kind.as_str() {
            "click" => InteractionKind::Click,
            "scroll" => InteractionKind::Scroll,
            _ => InteractionKind::Other(kind),
        }
    }
}

impl From<InteractionKind> for String {
    fn from(kind: InteractionKind) -> Self {
        match kind {
            InteractionKind::Other(kind) => kind,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for InteractionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One user interaction inside the tracked page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interaction {
    pub kind: InteractionKind,
    /// Epoch milliseconds
    pub timestamp: i64,
    /// Kind-specific payload (click: pointer coordinates, scroll: offset)
    #[serde(default)]
    pub detail: Value,
}

impl Interaction {
    /// A click at viewport coordinates `(x, y)`.
    #[must_use]
    pub fn click(x: f64, y: f64, timestamp: i64) -> Self {
        Self {
            kind: InteractionKind::Click,
            timestamp,
            detail: json!({ "x": x, "y": y }),
        }
    }

    /// A scroll leaving the page at vertical offset `scroll_y`.
    #[must_use]
    pub fn scroll(scroll_y: f64, timestamp: i64) -> Self {
        Self {
            kind: InteractionKind::Scroll,
            timestamp,
            detail: json!({ "scrollY": scroll_y }),
        }
    }
}

/// A client-side location change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UrlChange {
    pub from: String,
    pub to: String,
    pub timestamp: i64,
}

/// A single entry of the durable session log.
///
/// Stored as an internally tagged object, e.g.
/// `{"type":"url-change","from":"…","to":"…","timestamp":1}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum SessionEntry {
    Interaction(Interaction),
    UrlChange(UrlChange),
}

impl SessionEntry {
    #[must_use]
    pub fn timestamp(&self) -> i64 {
        match self {
            SessionEntry::Interaction(i) => i.timestamp,
            SessionEntry::UrlChange(c) => c.timestamp,
        }
    }
}

impl From<Interaction> for SessionEntry {
    fn from(interaction: Interaction) -> Self {
        SessionEntry::Interaction(interaction)
    }
}

impl From<UrlChange> for SessionEntry {
    fn from(change: UrlChange) -> Self {
        SessionEntry::UrlChange(change)
    }
}
