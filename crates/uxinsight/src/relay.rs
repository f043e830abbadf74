//! Message protocol from the tracked page to the hosting page.
//!
//! Messages are `{ "type": ..., "data": ... }` objects. The set of types is
//! closed on the sending side ([`RelayMessage`]) but open on the receiving
//! side: a message with a type this build does not recognize decodes to
//! [`Inbound::Unknown`] and must be ignored, never treated as an error.
//!
//! Delivery is fire-and-forget. The transport preserves send order for one
//! uninterrupted page session, but a frame reload can replay a `log-ready`
//! snapshot, so receivers must not assume exactly-once delivery.

use crate::aggregate::Aggregator;
use crate::error::{InsightError, Result};
use crate::event::{Interaction, SessionEntry, UrlChange};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::mpsc;
use tracing::debug;

pub const MSG_INTERACTION: &str = "interaction";
pub const MSG_URL_CHANGE: &str = "url-change";
pub const MSG_LOG_READY: &str = "log-ready";

/// A message posted by the tracked page to its embedding parent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "kebab-case")]
pub enum RelayMessage {
    /// One user interaction
    Interaction(Interaction),
    /// One client-side navigation
    UrlChange(UrlChange),
    /// Snapshot of the resumed log, sent once on startup
    LogReady(Vec<SessionEntry>),
}

/// Result of decoding a message received from the tracked page.
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    Message(RelayMessage),
    /// A well-formed envelope whose `type` is not recognized
    Unknown(String),
}

impl RelayMessage {
    /// Wire name of this message's type.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            RelayMessage::Interaction(_) => MSG_INTERACTION,
            RelayMessage::UrlChange(_) => MSG_URL_CHANGE,
            RelayMessage::LogReady(_) => MSG_LOG_READY,
        }
    }

    pub fn encode(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Decode a raw JSON message.
    pub fn decode(raw: &str) -> Result<Inbound> {
        let value: Value =
            serde_json::from_str(raw).map_err(|e| InsightError::Protocol(e.to_string()))?;
        Self::decode_value(value)
    }

    /// Decode an already-parsed message.
    pub fn decode_value(value: Value) -> Result<Inbound> {
        let kind = value
            .get("type")
            .and_then(Value::as_str)
            .ok_or_else(|| InsightError::Protocol("missing string field 'type'".to_string()))?
            .to_string();

        match kind.as_str() {
            MSG_INTERACTION | MSG_URL_CHANGE | MSG_LOG_READY => serde_json::from_value(value)
                .map(Inbound::Message)
                .map_err(|e| InsightError::Protocol(format!("{}: {}", kind, e))),
            _ => Ok(Inbound::Unknown(kind)),
        }
    }
}

/// One-way channel from the tracked page to the hosting page.
pub trait EventRelay {
    /// Post a message. Never fails from the caller's point of view.
    fn post(&self, message: &RelayMessage);
}

impl<R: EventRelay + ?Sized> EventRelay for &R {
    fn post(&self, message: &RelayMessage) {
        (**self).post(message);
    }
}

/// Relay that serializes messages onto an unbounded in-process channel.
#[derive(Debug, Clone)]
pub struct ChannelRelay {
    tx: mpsc::UnboundedSender<String>,
}

impl EventRelay for ChannelRelay {
    fn post(&self, message: &RelayMessage) {
        let encoded = match message.encode() {
            Ok(encoded) => encoded,
            Err(e) => {
                debug!("Dropping unencodable {} message: {}", message.kind(), e);
                return;
            }
        };
        if self.tx.send(encoded).is_err() {
            debug!("Relay receiver gone, dropping {} message", message.kind());
        }
    }
}

/// Receiving end held by the hosting page.
#[derive(Debug)]
pub struct RelayReceiver {
    rx: mpsc::UnboundedReceiver<String>,
}

impl RelayReceiver {
    /// Next raw message if one is already queued.
    pub fn try_next(&mut self) -> Option<String> {
        self.rx.try_recv().ok()
    }

    /// Wait for the next raw message. `None` once every sender is dropped.
    pub async fn next(&mut self) -> Option<String> {
        self.rx.recv().await
    }

    /// Apply every queued message to `aggregator`, returning how many were
    /// consumed (including ignored and malformed ones).
    pub fn drain_into(&mut self, aggregator: &mut Aggregator) -> usize {
        let mut consumed = 0;
        while let Some(raw) = self.try_next() {
            if let Err(e) = aggregator.apply_raw(&raw) {
                debug!("Ignoring malformed relay message: {}", e);
            }
            consumed += 1;
        }
        consumed
    }
}

/// Create a connected relay pair.
#[must_use]
pub fn channel() -> (ChannelRelay, RelayReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    (ChannelRelay { tx }, RelayReceiver { rx })
}
