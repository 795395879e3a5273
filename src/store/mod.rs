//! History persistence.
//!
//! The store owns all persisted entries; the delta engine only ever holds
//! transient in-memory copies during a run. Entries are created once, have
//! `last_seen` advanced on every reappearance, and are never deleted.

mod snapshot;
mod sqlite;

pub use snapshot::Snapshot;
pub use sqlite::{HistoryEntry, HistoryStore};
