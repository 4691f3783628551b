//! Key-value store adapters for the calendar and credential records.

pub mod file;
pub mod memory;
pub mod sqlite;

use std::sync::Arc;

use postdeck_core::KeyValueStore;
use postdeck_domain::{Result, StorageBackend, StorageConfig};
use tracing::info;

pub use file::JsonFileStore;
pub use memory::MemoryKeyValueStore;
pub use sqlite::SqliteKeyValueStore;

/// Open the store selected by `[storage]`.
pub fn open_store(config: &StorageConfig) -> Result<Arc<dyn KeyValueStore>> {
    info!(backend = ?config.backend, path = %config.path, "Opening key-value store");
    let store: Arc<dyn KeyValueStore> = match config.backend {
        StorageBackend::File => Arc::new(JsonFileStore::open(&config.path)?),
        StorageBackend::Sqlite => Arc::new(SqliteKeyValueStore::open(&config.path)?),
        StorageBackend::Memory => Arc::new(MemoryKeyValueStore::new()),
    };
    Ok(store)
}
