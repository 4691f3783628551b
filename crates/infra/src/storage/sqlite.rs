//! SQLite-backed key-value store.

use std::path::Path;

use parking_lot::Mutex;
use postdeck_core::KeyValueStore;
use postdeck_domain::Result;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::debug;

use crate::errors::InfraError;

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS kv_records (
    key TEXT PRIMARY KEY NOT NULL,
    value TEXT NOT NULL,
    updated_at INTEGER NOT NULL
)";

pub struct SqliteKeyValueStore {
    conn: Mutex<Connection>,
}

impl std::fmt::Debug for SqliteKeyValueStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteKeyValueStore").finish_non_exhaustive()
    }
}

impl SqliteKeyValueStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path.as_ref()).map_err(InfraError::from)?;
        conn.busy_timeout(std::time::Duration::from_secs(5)).map_err(InfraError::from)?;
        Self::with_connection(conn)
    }

    pub fn in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory().map_err(InfraError::from)?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        conn.execute(SCHEMA, []).map_err(InfraError::from)?;
        debug!("SQLite key-value store ready");
        Ok(Self { conn: Mutex::new(conn) })
    }
}

impl KeyValueStore for SqliteKeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let conn = self.conn.lock();
        let value = conn
            .query_row("SELECT value FROM kv_records WHERE key = ?1", params![key], |row| row.get(0))
            .optional()
            .map_err(InfraError::from)?;
        Ok(value)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let now = chrono::Utc::now().timestamp();
        self.conn
            .lock()
            .execute(
                "INSERT INTO kv_records (key, value, updated_at) VALUES (?1, ?2, ?3)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
                params![key, value, now],
            )
            .map_err(InfraError::from)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.conn
            .lock()
            .execute("DELETE FROM kv_records WHERE key = ?1", params![key])
            .map_err(InfraError::from)?;
        Ok(())
    }
}
