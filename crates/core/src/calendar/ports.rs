//! Port interfaces for calendar persistence
//!
//! The calendar is persisted as one string record under a fixed key. The same
//! store also holds per-platform credential records.

use postdeck_domain::Result;

/// Local key-value store holding string records.
///
/// Calls are synchronous: the calendar persists while holding its own lock so
/// no other mutation can interleave with a write.
pub trait KeyValueStore: Send + Sync {
    /// Read the record under `key`, `None` when absent.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Replace the record under `key`.
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Delete the record under `key`. Removing an absent key is not an error.
    fn remove(&self, key: &str) -> Result<()>;
}
