//! Store, clock and service fixtures.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{TimeZone, Utc};
use parking_lot::Mutex;
use postdeck_core::{CalendarStore, KeyValueStore, ManualClock, SchedulingService, TimezoneResolver};
use postdeck_domain::{DateKey, Result as DomainResult, ScheduledItem, TimeOfDay};

use super::gateway::ScriptedGateway;

/// In-memory key-value store.
#[derive(Default)]
pub struct MemoryKv {
    records: Mutex<HashMap<String, String>>,
}

impl MemoryKv {
    pub fn with_record(key: &str, value: &str) -> Self {
        let kv = Self::default();
        kv.records.lock().insert(key.to_string(), value.to_string());
        kv
    }

    pub fn record(&self, key: &str) -> Option<String> {
        self.records.lock().get(key).cloned()
    }
}

impl KeyValueStore for MemoryKv {
    fn get(&self, key: &str) -> DomainResult<Option<String>> {
        Ok(self.records.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> DomainResult<()> {
        self.records.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> DomainResult<()> {
        self.records.lock().remove(key);
        Ok(())
    }
}

pub struct Harness {
    pub service: Arc<SchedulingService>,
    pub store: Arc<CalendarStore>,
    pub clock: ManualClock,
    pub kv: Arc<MemoryKv>,
}

/// Service pinned at 2025-06-15 10:00 UTC.
pub fn harness(gateway: ScriptedGateway) -> Harness {
    harness_with_kv(gateway, Arc::new(MemoryKv::default()))
}

pub fn harness_with_kv(gateway: ScriptedGateway, kv: Arc<MemoryKv>) -> Harness {
    let clock = ManualClock::new(Utc.with_ymd_and_hms(2025, 6, 15, 10, 0, 0).unwrap());
    let store = Arc::new(CalendarStore::load(kv.clone()));
    let resolver = TimezoneResolver::new(Arc::new(clock.clone()));
    let service = Arc::new(SchedulingService::new(Arc::clone(&store), Arc::new(gateway), resolver));
    Harness { service, store, clock, kv }
}

pub fn date(s: &str) -> DateKey {
    s.parse().unwrap()
}

pub fn time(s: &str) -> TimeOfDay {
    s.parse().unwrap()
}

pub fn video_post(at: &str, title: &str) -> ScheduledItem {
    ScheduledItem::new(time(at)).with_title(title).with_media(format!("storage/{title}.mp4"))
}

pub fn text_post(at: &str, title: &str) -> ScheduledItem {
    ScheduledItem::new(time(at)).with_title(title).with_description("body")
}
