//! Tracked-page session model for the uxinsight proxy.
//!
//! Pages fetched through `uxinsight-proxy` get an instrumentation script
//! injected. This crate is the typed model of what that script does and of
//! the hosting page that listens to it:
//!
//! - [`SessionTracker`] records interactions and client-side navigations
//!   into an expiring [`SessionLog`] held in [`SessionStorage`], and relays
//!   each entry through an [`EventRelay`].
//! - [`RelayMessage`] is the three-variant message protocol; receivers
//!   decode into [`Inbound`] and ignore types they don't know.
//! - [`Aggregator`] accumulates relayed events on the hosting side.

pub mod aggregate;
pub mod clock;
pub mod error;
pub mod event;
pub mod relay;
pub mod session;
pub mod storage;
pub mod tracker;

pub use aggregate::{Aggregator, InsightSummary};
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{InsightError, Result};
pub use event::{Interaction, InteractionKind, SessionEntry, UrlChange};
pub use relay::{ChannelRelay, EventRelay, Inbound, RelayMessage, RelayReceiver};
pub use session::{SessionLog, SESSION_EXPIRATION_MS, SESSION_KEY};
pub use storage::{FileStorage, MemoryStorage, SessionStorage};
pub use tracker::{LoadOutcome, LocationSource, PageEvent, SessionTracker};
