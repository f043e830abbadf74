//! The tracked page's session actor.
//!
//! [`SessionTracker`] owns the session log and the last observed location.
//! It is created once per frame by [`SessionTracker::load`], which either
//! resumes the stored log or starts a fresh one, and then stays active for
//! the page's lifetime. Every recorded entry is written through to storage
//! and relayed to the hosting page immediately.
//!
//! Nothing here throws: storage and parse failures degrade to "no prior
//! session" and are logged.

use crate::clock::Clock;
use crate::error::Result;
use crate::event::{Interaction, SessionEntry, UrlChange};
use crate::relay::{EventRelay, RelayMessage};
use crate::session::{SessionLog, SESSION_KEY};
use crate::storage::SessionStorage;
use tracing::{debug, warn};

/// Anything that can report the page's effective location.
///
/// In a browser this is `location.href` read from a DOM mutation callback;
/// single-page routers change it without firing navigation events.
pub trait LocationSource {
    fn current_location(&self) -> String;
}

/// Raw page events fed to the tracker by the runtime.
#[derive(Debug, Clone, PartialEq)]
pub enum PageEvent {
    Click { x: f64, y: f64 },
    Scroll { scroll_y: f64 },
    /// The document mutated; `location` is the href at that moment
    Mutation { location: String },
}

/// How the session log was obtained on startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Nothing was stored
    Fresh,
    /// A live log was resumed with this many entries
    Resumed(usize),
    /// The stored log was past the expiration window and was discarded
    Expired,
    /// The stored log could not be read and was discarded
    Corrupt,
}

/// Session actor for one tracked frame.
pub struct SessionTracker<S, R, C> {
    storage: S,
    relay: R,
    clock: C,
    log: SessionLog,
    last_location: String,
    outcome: LoadOutcome,
}

impl<S, R, C> SessionTracker<S, R, C>
where
    S: SessionStorage,
    R: EventRelay,
    C: Clock,
{
    /// Start tracking: load or reset the stored log, then relay the resumed
    /// log once as a `log-ready` snapshot.
    pub fn load(mut storage: S, relay: R, clock: C, initial_location: impl Into<String>) -> Self {
        let (log, outcome) = read_stored_log(&mut storage, clock.now_millis());
        let last_location = initial_location.into();
        debug!(
            "Tracking initialized at {} ({:?}, {} entries)",
            last_location,
            outcome,
            log.len()
        );
        relay.post(&RelayMessage::LogReady(log.entries().to_vec()));

        Self {
            storage,
            relay,
            clock,
            log,
            last_location,
            outcome,
        }
    }

    #[must_use]
    pub fn load_outcome(&self) -> LoadOutcome {
        self.outcome
    }

    #[must_use]
    pub fn log(&self) -> &SessionLog {
        &self.log
    }

    #[must_use]
    pub fn last_location(&self) -> &str {
        &self.last_location
    }

    #[must_use]
    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Dispatch a raw page event.
    pub fn handle(&mut self, event: PageEvent) {
        match event {
            PageEvent::Click { x, y } => self.record_click(x, y),
            PageEvent::Scroll { scroll_y } => self.record_scroll(scroll_y),
            PageEvent::Mutation { location } => {
                self.record_navigation(&location);
            }
        }
    }

    pub fn record_click(&mut self, x: f64, y: f64) {
        let interaction = Interaction::click(x, y, self.clock.now_millis());
        self.record_interaction(interaction);
    }

    pub fn record_scroll(&mut self, scroll_y: f64) {
        let interaction = Interaction::scroll(scroll_y, self.clock.now_millis());
        self.record_interaction(interaction);
    }

    /// Append an interaction, persist, and relay it.
    pub fn record_interaction(&mut self, interaction: Interaction) {
        self.append(SessionEntry::Interaction(interaction.clone()));
        self.relay.post(&RelayMessage::Interaction(interaction));
    }

    /// Record a move to `location`. Returns `false` (and records nothing)
    /// when it equals the last observed location.
    pub fn record_navigation(&mut self, location: &str) -> bool {
        if location == self.last_location {
            return false;
        }
        let change = UrlChange {
            from: std::mem::replace(&mut self.last_location, location.to_string()),
            to: location.to_string(),
            timestamp: self.clock.now_millis(),
        };
        self.append(SessionEntry::UrlChange(change.clone()));
        self.relay.post(&RelayMessage::UrlChange(change));
        true
    }

    /// Mutation callback: re-read the location and record a change if any.
    pub fn on_mutation<L: LocationSource + ?Sized>(&mut self, source: &L) -> bool {
        let current = source.current_location();
        self.record_navigation(&current)
    }

    /// Overwrite the stored copy of the log.
    pub fn flush(&mut self) -> Result<()> {
        let json = self.log.to_json()?;
        self.storage.set(SESSION_KEY, &json)
    }

    fn append(&mut self, entry: SessionEntry) {
        self.log.push(entry);
        if let Err(e) = self.flush() {
            warn!("Failed to persist session log: {}", e);
        }
    }
}

fn read_stored_log<S: SessionStorage>(storage: &mut S, now: i64) -> (SessionLog, LoadOutcome) {
    let raw = match storage.get(SESSION_KEY) {
        Ok(Some(raw)) => raw,
        Ok(None) => return (SessionLog::new(), LoadOutcome::Fresh),
        Err(e) => {
            warn!("Could not read stored session, starting fresh: {}", e);
            return (SessionLog::new(), LoadOutcome::Corrupt);
        }
    };

    match SessionLog::from_json(&raw) {
        Ok(log) if log.is_expired_at(now) => {
            debug!("Session expired, clearing {} entries", log.len());
            discard(storage);
            (SessionLog::new(), LoadOutcome::Expired)
        }
        Ok(log) => {
            let count = log.len();
            (log, LoadOutcome::Resumed(count))
        }
        Err(e) => {
            warn!("Discarding unreadable session log: {}", e);
            discard(storage);
            (SessionLog::new(), LoadOutcome::Corrupt)
        }
    }
}

fn discard<S: SessionStorage>(storage: &mut S) {
    if let Err(e) = storage.remove(SESSION_KEY) {
        warn!("Failed to clear stored session: {}", e);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::relay::{self, Inbound, RelayReceiver};
    use crate::session::SESSION_EXPIRATION_MS;
    use crate::storage::MemoryStorage;
    use std::cell::RefCell;

    const START: i64 = 1_700_000_000_000;

    struct ScriptedLocation(RefCell<String>);

    impl LocationSource for ScriptedLocation {
        fn current_location(&self) -> String {
            self.0.borrow().clone()
        }
    }

    fn next_message(rx: &mut RelayReceiver) -> RelayMessage {
        match RelayMessage::decode(&rx.try_next().unwrap()).unwrap() {
            Inbound::Message(m) => m,
            Inbound::Unknown(kind) => panic!("unexpected type {}", kind),
        }
    }

    fn stored_with_last_entry_at(ts: i64) -> MemoryStorage {
        let mut log = SessionLog::new();
        log.push(Interaction::click(5.0, 5.0, ts));
        let mut storage = MemoryStorage::new();
        storage.set(SESSION_KEY, &log.to_json().unwrap()).unwrap();
        storage
    }

    #[test]
    fn test_fresh_load_sends_empty_snapshot() {
        let (relay, mut rx) = relay::channel();
        let clock = ManualClock::new(START);
        let tracker = SessionTracker::load(MemoryStorage::new(), relay, &clock, "https://a.test/");
        assert_eq!(tracker.load_outcome(), LoadOutcome::Fresh);
        assert_eq!(next_message(&mut rx), RelayMessage::LogReady(Vec::new()));
    }

    #[test]
    fn test_discards_log_just_past_expiration() {
        let storage = stored_with_last_entry_at(START);
        let (relay, _rx) = relay::channel();
        let clock = ManualClock::new(START + SESSION_EXPIRATION_MS + 1);
        let tracker = SessionTracker::load(storage, relay, &clock, "https://a.test/");
        assert_eq!(tracker.load_outcome(), LoadOutcome::Expired);
        assert!(tracker.log().is_empty());
        assert!(tracker.storage().get(SESSION_KEY).unwrap().is_none());
    }

    #[test]
    fn test_resumes_log_inside_window() {
        let storage = stored_with_last_entry_at(START);
        let (relay, mut rx) = relay::channel();
        let clock = ManualClock::new(START + 9 * 60 * 1000 + 59 * 1000);
        let tracker = SessionTracker::load(storage, relay, &clock, "https://a.test/");
        assert_eq!(tracker.load_outcome(), LoadOutcome::Resumed(1));
        match next_message(&mut rx) {
            RelayMessage::LogReady(entries) => assert_eq!(entries.len(), 1),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_corrupt_storage_starts_fresh() {
        let mut storage = MemoryStorage::new();
        storage.set(SESSION_KEY, "{{garbage").unwrap();
        let (relay, _rx) = relay::channel();
        let clock = ManualClock::new(START);
        let mut tracker = SessionTracker::load(storage, relay, &clock, "https://a.test/");
        assert_eq!(tracker.load_outcome(), LoadOutcome::Corrupt);

        tracker.record_click(1.0, 2.0);
        let stored = tracker.storage().get(SESSION_KEY).unwrap().unwrap();
        assert_eq!(SessionLog::from_json(&stored).unwrap().len(), 1);
    }

    #[test]
    fn test_each_entry_is_persisted_and_relayed() {
        let (relay, mut rx) = relay::channel();
        let clock = ManualClock::new(START);
        let mut tracker = SessionTracker::load(MemoryStorage::new(), relay, &clock, "https://a.test/");
        let _snapshot = next_message(&mut rx);

        tracker.handle(PageEvent::Click { x: 10.0, y: 20.0 });
        clock.advance(100);
        tracker.handle(PageEvent::Scroll { scroll_y: 300.0 });

        let stored = tracker.storage().get(SESSION_KEY).unwrap().unwrap();
        assert_eq!(SessionLog::from_json(&stored).unwrap(), *tracker.log());
        assert_eq!(tracker.log().last_timestamp(), Some(START + 100));

        match next_message(&mut rx) {
            RelayMessage::Interaction(i) => assert_eq!(i.detail["x"], 10.0),
            other => panic!("unexpected {:?}", other),
        }
        match next_message(&mut rx) {
            RelayMessage::Interaction(i) => assert_eq!(i.detail["scrollY"], 300.0),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_mutation_without_location_change_is_ignored() {
        let (relay, mut rx) = relay::channel();
        let clock = ManualClock::new(START);
        let mut tracker = SessionTracker::load(MemoryStorage::new(), relay, &clock, "https://a.test/");
        let _snapshot = next_message(&mut rx);

        let location = ScriptedLocation(RefCell::new("https://a.test/".to_string()));
        assert!(!tracker.on_mutation(&location));
        assert!(rx.try_next().is_none());

        *location.0.borrow_mut() = "https://a.test/checkout".to_string();
        assert!(tracker.on_mutation(&location));
        assert!(!tracker.on_mutation(&location));

        match next_message(&mut rx) {
            RelayMessage::UrlChange(change) => {
                assert_eq!(change.from, "https://a.test/");
                assert_eq!(change.to, "https://a.test/checkout");
            }
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(tracker.last_location(), "https://a.test/checkout");
        assert_eq!(tracker.log().len(), 1);
    }
}
