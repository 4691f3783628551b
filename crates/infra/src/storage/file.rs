//! JSON file store.
//!
//! All records live in one JSON object on disk. Writes go to a sibling
//! temporary file which is then renamed over the original, so a crash mid-write
//! leaves the previous file intact.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use postdeck_core::KeyValueStore;
use postdeck_domain::{PostdeckError, Result};
use tracing::{debug, warn};

use crate::errors::InfraError;

#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    records: Mutex<BTreeMap<String, String>>,
}

impl JsonFileStore {
    /// Open or create the store at `path`.
    ///
    /// A file that is not a JSON object of strings is moved aside to
    /// `<path>.corrupt` and the store starts empty.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let records = match fs::read_to_string(&path) {
            Ok(raw) if raw.trim().is_empty() => BTreeMap::new(),
            Ok(raw) => match serde_json::from_str::<BTreeMap<String, String>>(&raw) {
                Ok(records) => records,
                Err(err) => {
                    let backup = path.with_extension("corrupt");
                    warn!(path = %path.display(), error = %err, backup = %backup.display(), "Store file is malformed; starting empty");
                    fs::rename(&path, &backup).map_err(|e| PostdeckError::from(InfraError::from(e)))?;
                    BTreeMap::new()
                }
            },
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(err) => return Err(InfraError::from(err).into()),
        };
        debug!(path = %path.display(), records = records.len(), "Opened JSON file store");
        Ok(Self { path, records: Mutex::new(records) })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self, records: &BTreeMap<String, String>) -> Result<()> {
        let raw = serde_json::to_string_pretty(records).map_err(InfraError::from)?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(InfraError::from)?;
        }
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, raw).map_err(InfraError::from)?;
        fs::rename(&tmp, &self.path).map_err(InfraError::from)?;
        Ok(())
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.records.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut records = self.records.lock();
        records.insert(key.to_string(), value.to_string());
        self.flush(&records)
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut records = self.records.lock();
        if records.remove(key).is_some() {
            self.flush(&records)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn round_trips_records_across_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("store.json");

        let store = JsonFileStore::open(&path).unwrap();
        assert_eq!(store.get("missing").unwrap(), None);
        store.set("platform_calendars", "{\"YouTube\":{}}").unwrap();
        store.set("youtube_auth_done", "1").unwrap();
        store.remove("youtube_auth_done").unwrap();

        let reopened = JsonFileStore::open(&path).unwrap();
        assert_eq!(reopened.get("platform_calendars").unwrap().as_deref(), Some("{\"YouTube\":{}}"));
        assert_eq!(reopened.get("youtube_auth_done").unwrap(), None);
        assert!(!path.with_extension("tmp").exists());
    }

    #[test]
    fn malformed_file_is_moved_aside() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("store.json");
        fs::write(&path, "not json").unwrap();

        let store = JsonFileStore::open(&path).unwrap();
        assert_eq!(store.get("anything").unwrap(), None);
        assert!(path.with_extension("corrupt").exists());
    }
}
