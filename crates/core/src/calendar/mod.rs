//! Calendar store: per-platform, per-day scheduled items.

pub mod codec;
pub mod ports;
pub mod store;
pub mod view;

pub use ports::KeyValueStore;
pub use store::{CalendarStore, MarkOutcome, MoveOutcome, StoreError, UpsertOutcome};
