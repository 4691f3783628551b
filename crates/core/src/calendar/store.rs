//! The calendar store: root aggregate for all scheduled items.
//!
//! Every operation takes the store lock once, mutates the in-memory state,
//! and persists the whole record before releasing the lock. A failed persist
//! is logged and remembered but never undoes the in-memory change; the
//! in-memory state is authoritative for the running session.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use postdeck_domain::constants::CALENDAR_STORE_KEY;
use postdeck_domain::{
    CalendarDay, DateKey, DedupKey, Platform, PlatformCalendars, ScheduledItem, TimeOfDay,
};
use thiserror::Error;
use tracing::{debug, warn};

use super::codec;
use super::ports::KeyValueStore;

/// Lookup failures for operations addressed at an existing item.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("no item {key} on {platform} {date}")]
    NotFound { platform: Platform, date: DateKey, key: DedupKey },
}

/// Result of adding an item to a day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    /// The item was appended to the end of the day.
    Inserted,
    /// An item with the same dedup key already existed; nothing changed.
    Duplicate,
}

/// Result of moving an item to another day or time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    /// The item left its old slot and was appended at the destination.
    Moved,
    /// The destination already held an identical item, so the source copy was
    /// removed and the destination kept as is.
    Merged,
    /// Same day and same time; nothing changed.
    Unchanged,
}

/// Result of recording a successful publish.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkOutcome {
    /// `posted_at` was set now.
    Marked,
    /// The item was already posted; its original timestamp is kept.
    AlreadyPosted,
}

/// Platform calendars shared by user intents and the background ticks.
pub struct CalendarStore {
    kv: Arc<dyn KeyValueStore>,
    state: Mutex<PlatformCalendars>,
    revision: AtomicU64,
    last_persist_error: Mutex<Option<String>>,
}

impl std::fmt::Debug for CalendarStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CalendarStore")
            .field("items", &self.state.lock().item_count())
            .field("revision", &self.revision())
            .finish()
    }
}

impl CalendarStore {
    /// Load the persisted calendar, or start empty when the record is
    /// missing, unreadable or malformed.
    pub fn load(kv: Arc<dyn KeyValueStore>) -> Self {
        let calendars = match kv.get(CALENDAR_STORE_KEY) {
            Ok(Some(raw)) => codec::decode(&raw),
            Ok(None) => PlatformCalendars::new(),
            Err(err) => {
                warn!(error = %err, "Failed to read persisted calendar; starting empty");
                PlatformCalendars::new()
            }
        };
        debug!(items = calendars.item_count(), "Calendar store loaded");

        Self {
            kv,
            state: Mutex::new(calendars),
            revision: AtomicU64::new(0),
            last_persist_error: Mutex::new(None),
        }
    }

    /// Copy of the full state. Background scans iterate over a snapshot, never
    /// the live map.
    pub fn snapshot(&self) -> PlatformCalendars {
        self.state.lock().clone()
    }

    /// Copy of one day, if it holds any items.
    pub fn get(&self, platform: Platform, date: DateKey) -> Option<CalendarDay> {
        self.state.lock().day(platform, date).cloned()
    }

    /// Copy of the item matching `key` on that day.
    pub fn find_item(
        &self,
        platform: Platform,
        date: DateKey,
        key: &DedupKey,
    ) -> Option<ScheduledItem> {
        self.state.lock().day(platform, date).and_then(|day| day.find(key)).cloned()
    }

    /// Append `item` to its day unless an item with the same dedup key is
    /// already there.
    pub fn upsert_item(
        &self,
        platform: Platform,
        date: DateKey,
        item: ScheduledItem,
    ) -> UpsertOutcome {
        let mut state = self.state.lock();
        let day = state.calendar_mut(platform).entry(date).or_insert_with(|| CalendarDay::new(date));
        if day.contains(&item.dedup_key()) {
            return UpsertOutcome::Duplicate;
        }
        day.items.push(item);
        self.commit(&state);
        UpsertOutcome::Inserted
    }

    /// Overwrite the item identified by `key`, keeping its position.
    ///
    /// Returns `Duplicate` without changing anything when the new fields
    /// collide with a different item of the same day.
    pub fn replace_item(
        &self,
        platform: Platform,
        date: DateKey,
        key: &DedupKey,
        updated: ScheduledItem,
    ) -> Result<UpsertOutcome, StoreError> {
        let mut state = self.state.lock();
        let day = state
            .calendar_mut(platform)
            .get_mut(&date)
            .ok_or_else(|| not_found(platform, date, key))?;
        let index = day.position(key).ok_or_else(|| not_found(platform, date, key))?;
        if day.position(&updated.dedup_key()).is_some_and(|other| other != index) {
            return Ok(UpsertOutcome::Duplicate);
        }
        day.items[index] = updated;
        self.commit(&state);
        Ok(UpsertOutcome::Inserted)
    }

    /// Move the item identified by `key` from `from` to `to` with a new time.
    ///
    /// All other fields are carried over unchanged. The source copy is only
    /// removed once the destination is known, inside the same lock.
    pub fn move_item(
        &self,
        platform: Platform,
        from: DateKey,
        to: DateKey,
        key: &DedupKey,
        new_time: TimeOfDay,
    ) -> Result<MoveOutcome, StoreError> {
        let mut state = self.state.lock();
        let calendar = state.calendar_mut(platform);

        let source = calendar
            .get(&from)
            .and_then(|day| day.find(key))
            .cloned()
            .ok_or_else(|| not_found(platform, from, key))?;

        let mut moved = source;
        moved.time = new_time;
        let moved_key = moved.dedup_key();
        if from == to && moved_key == *key {
            return Ok(MoveOutcome::Unchanged);
        }

        let duplicate = calendar.get(&to).is_some_and(|day| day.contains(&moved_key));
        remove_from_day(calendar, from, key);
        let outcome = if duplicate {
            MoveOutcome::Merged
        } else {
            calendar.entry(to).or_insert_with(|| CalendarDay::new(to)).items.push(moved);
            MoveOutcome::Moved
        };

        self.commit(&state);
        Ok(outcome)
    }

    /// Remove the item identified by `key`; the day goes away with its last
    /// item.
    pub fn remove_item(
        &self,
        platform: Platform,
        date: DateKey,
        key: &DedupKey,
    ) -> Result<ScheduledItem, StoreError> {
        let mut state = self.state.lock();
        let removed = remove_from_day(state.calendar_mut(platform), date, key)
            .ok_or_else(|| not_found(platform, date, key))?;
        self.commit(&state);
        Ok(removed)
    }

    /// Drop a whole day. Returns the number of items removed.
    pub fn remove_day(&self, platform: Platform, date: DateKey) -> usize {
        let mut state = self.state.lock();
        match state.calendar_mut(platform).remove(&date) {
            Some(day) => {
                self.commit(&state);
                day.items.len()
            }
            None => 0,
        }
    }

    /// Record a successful publish on the item in place.
    ///
    /// The first timestamp wins. A provided URL is stored when the item does
    /// not have one yet.
    pub fn mark_posted(
        &self,
        platform: Platform,
        date: DateKey,
        key: &DedupKey,
        posted_at: DateTime<Utc>,
        published_url: Option<String>,
    ) -> Result<MarkOutcome, StoreError> {
        let mut state = self.state.lock();
        let item = state
            .calendar_mut(platform)
            .get_mut(&date)
            .and_then(|day| day.items.iter_mut().find(|item| item.dedup_key() == *key))
            .ok_or_else(|| not_found(platform, date, key))?;

        let mut changed = false;
        let outcome = if item.posted_at.is_some() {
            MarkOutcome::AlreadyPosted
        } else {
            item.posted_at = Some(posted_at);
            changed = true;
            MarkOutcome::Marked
        };
        if item.published_url.is_none() {
            if let Some(url) = published_url.filter(|u| !u.is_empty()) {
                item.published_url = Some(url);
                changed = true;
            }
        }

        if changed {
            self.commit(&state);
        }
        Ok(outcome)
    }

    /// Delete every day strictly before `today` on every platform. Returns the
    /// number of days removed.
    pub fn prune_before(&self, today: DateKey) -> usize {
        let mut state = self.state.lock();
        let mut removed = 0;
        for platform in Platform::ALL {
            let calendar = state.calendar_mut(platform);
            let kept = calendar.split_off(&today);
            removed += calendar.len();
            *calendar = kept;
        }
        if removed > 0 {
            self.commit(&state);
        }
        removed
    }

    /// Monotonic counter bumped on every committed mutation. Views poll it to
    /// know when to re-render.
    pub fn revision(&self) -> u64 {
        self.revision.load(Ordering::Acquire)
    }

    /// Message of the most recent failed persist, cleared by the next
    /// successful one.
    pub fn last_persist_error(&self) -> Option<String> {
        self.last_persist_error.lock().clone()
    }

    fn commit(&self, state: &PlatformCalendars) {
        self.revision.fetch_add(1, Ordering::AcqRel);

        let result = codec::encode(state)
            .map_err(|err| err.to_string())
            .and_then(|raw| self.kv.set(CALENDAR_STORE_KEY, &raw).map_err(|err| err.to_string()));

        let mut last_error = self.last_persist_error.lock();
        match result {
            Ok(()) => *last_error = None,
            Err(err) => {
                warn!(error = %err, "Failed to persist calendar; keeping in-memory state");
                *last_error = Some(err);
            }
        }
    }
}

fn remove_from_day(
    calendar: &mut postdeck_domain::DayCalendar,
    date: DateKey,
    key: &DedupKey,
) -> Option<ScheduledItem> {
    let day = calendar.get_mut(&date)?;
    let index = day.position(key)?;
    let removed = day.items.remove(index);
    if day.items.is_empty() {
        calendar.remove(&date);
    }
    Some(removed)
}

fn not_found(platform: Platform, date: DateKey, key: &DedupKey) -> StoreError {
    StoreError::NotFound { platform, date, key: key.clone() }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use chrono::TimeZone;
    use postdeck_domain::{PostdeckError, Result};

    use super::*;

    #[derive(Default)]
    struct MemoryKv {
        records: Mutex<HashMap<String, String>>,
        fail_writes: std::sync::atomic::AtomicBool,
    }

    impl KeyValueStore for MemoryKv {
        fn get(&self, key: &str) -> Result<Option<String>> {
            Ok(self.records.lock().get(key).cloned())
        }

        fn set(&self, key: &str, value: &str) -> Result<()> {
            if self.fail_writes.load(Ordering::SeqCst) {
                return Err(PostdeckError::Storage("quota exceeded".into()));
            }
            self.records.lock().insert(key.to_string(), value.to_string());
            Ok(())
        }

        fn remove(&self, key: &str) -> Result<()> {
            self.records.lock().remove(key);
            Ok(())
        }
    }

    fn key(s: &str) -> DateKey {
        s.parse().unwrap()
    }

    fn item(time: &str, title: &str) -> ScheduledItem {
        ScheduledItem::new(time.parse().unwrap()).with_title(title)
    }

    fn store() -> (Arc<MemoryKv>, CalendarStore) {
        let kv = Arc::new(MemoryKv::default());
        let store = CalendarStore::load(kv.clone());
        (kv, store)
    }

    #[test]
    fn upsert_is_idempotent() {
        let (_, store) = store();
        let post = item("10:00", "Launch").with_media("storage/a.mp4");
        assert_eq!(store.upsert_item(Platform::YouTube, key("2025-06-15"), post.clone()), UpsertOutcome::Inserted);
        assert_eq!(store.upsert_item(Platform::YouTube, key("2025-06-15"), post), UpsertOutcome::Duplicate);
        assert_eq!(store.get(Platform::YouTube, key("2025-06-15")).unwrap().items.len(), 1);
    }

    #[test]
    fn removing_last_item_deletes_day() {
        let (_, store) = store();
        let post = item("10:00", "Only");
        store.upsert_item(Platform::Facebook, key("2025-06-15"), post.clone());
        store.remove_item(Platform::Facebook, key("2025-06-15"), &post.dedup_key()).unwrap();
        assert!(store.get(Platform::Facebook, key("2025-06-15")).is_none());
        assert!(store.snapshot().is_empty());
    }

    #[test]
    fn remove_unknown_item_is_not_found() {
        let (_, store) = store();
        let err = store
            .remove_item(Platform::Facebook, key("2025-06-15"), &item("10:00", "x").dedup_key())
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound { platform: Platform::Facebook, .. }));
    }

    #[test]
    fn move_changes_time_only() {
        let (_, store) = store();
        let post = item("09:00", "Teaser").with_media("storage/t.mp4");
        let mut post = post.with_description("body");
        post.privacy = postdeck_domain::Privacy::Unlisted;
        store.upsert_item(Platform::YouTube, key("2025-06-10"), post.clone());

        let outcome = store
            .move_item(Platform::YouTube, key("2025-06-10"), key("2025-06-12"), &post.dedup_key(), "14:00".parse().unwrap())
            .unwrap();
        assert_eq!(outcome, MoveOutcome::Moved);
        assert!(store.get(Platform::YouTube, key("2025-06-10")).is_none());

        let moved = &store.get(Platform::YouTube, key("2025-06-12")).unwrap().items[0];
        let mut expected = post;
        expected.time = "14:00".parse().unwrap();
        assert_eq!(*moved, expected);
    }

    #[test]
    fn move_onto_identical_item_merges() {
        let (_, store) = store();
        store.upsert_item(Platform::LinkedIn, key("2025-06-10"), item("09:00", "Same"));
        store.upsert_item(Platform::LinkedIn, key("2025-06-11"), item("14:00", "Same"));

        let outcome = store
            .move_item(
                Platform::LinkedIn,
                key("2025-06-10"),
                key("2025-06-11"),
                &item("09:00", "Same").dedup_key(),
                "14:00".parse().unwrap(),
            )
            .unwrap();
        assert_eq!(outcome, MoveOutcome::Merged);
        assert!(store.get(Platform::LinkedIn, key("2025-06-10")).is_none());
        assert_eq!(store.get(Platform::LinkedIn, key("2025-06-11")).unwrap().items.len(), 1);
    }

    #[test]
    fn move_of_missing_item_keeps_store_intact() {
        let (_, store) = store();
        store.upsert_item(Platform::LinkedIn, key("2025-06-10"), item("09:00", "Keep"));
        let before = store.snapshot();
        let err = store.move_item(
            Platform::LinkedIn,
            key("2025-06-10"),
            key("2025-06-11"),
            &item("10:00", "Other").dedup_key(),
            "11:00".parse().unwrap(),
        );
        assert!(err.is_err());
        assert_eq!(store.snapshot(), before);
    }

    #[test]
    fn mark_posted_keeps_first_timestamp() {
        let (_, store) = store();
        let post = item("10:00", "Once");
        store.upsert_item(Platform::Facebook, key("2025-06-15"), post.clone());
        let first = Utc.with_ymd_and_hms(2025, 6, 15, 10, 0, 5).unwrap();
        let second = Utc.with_ymd_and_hms(2025, 6, 15, 10, 0, 35).unwrap();

        let k = post.dedup_key();
        assert_eq!(store.mark_posted(Platform::Facebook, key("2025-06-15"), &k, first, None).unwrap(), MarkOutcome::Marked);
        assert_eq!(
            store
                .mark_posted(Platform::Facebook, key("2025-06-15"), &k, second, Some("https://fb.com/p/1".into()))
                .unwrap(),
            MarkOutcome::AlreadyPosted
        );

        let stored = store.find_item(Platform::Facebook, key("2025-06-15"), &k).unwrap();
        assert_eq!(stored.posted_at, Some(first));
        assert_eq!(stored.published_url.as_deref(), Some("https://fb.com/p/1"));
    }

    #[test]
    fn prune_removes_only_days_before_today() {
        let (_, store) = store();
        let posted = item("08:00", "done");
        store.upsert_item(Platform::YouTube, key("2025-06-14"), item("10:00", "old"));
        store.upsert_item(Platform::TikTok, key("2025-06-01"), item("10:00", "older"));
        store.upsert_item(Platform::YouTube, key("2025-06-15"), posted.clone());
        store.upsert_item(Platform::YouTube, key("2025-06-16"), item("10:00", "next"));
        store
            .mark_posted(Platform::YouTube, key("2025-06-15"), &posted.dedup_key(), Utc::now(), None)
            .unwrap();

        assert_eq!(store.prune_before(key("2025-06-15")), 2);
        assert!(store.get(Platform::YouTube, key("2025-06-14")).is_none());
        assert!(store.get(Platform::YouTube, key("2025-06-15")).is_some());
        assert!(store.get(Platform::YouTube, key("2025-06-16")).is_some());
        assert_eq!(store.prune_before(key("2025-06-15")), 0);
    }

    #[test]
    fn persists_every_mutation_and_reloads() {
        let (kv, store) = store();
        store.upsert_item(Platform::TikTok, key("2025-06-20"), item("18:00", "Dance"));
        let reloaded = CalendarStore::load(kv);
        assert_eq!(reloaded.snapshot(), store.snapshot());
    }

    #[test]
    fn persist_failure_is_non_fatal() {
        let (kv, store) = store();
        kv.fail_writes.store(true, Ordering::SeqCst);
        let outcome = store.upsert_item(Platform::YouTube, key("2025-06-20"), item("18:00", "Kept"));
        assert_eq!(outcome, UpsertOutcome::Inserted);
        assert!(store.get(Platform::YouTube, key("2025-06-20")).is_some());
        assert!(store.last_persist_error().unwrap().contains("quota exceeded"));

        kv.fail_writes.store(false, Ordering::SeqCst);
        store.upsert_item(Platform::YouTube, key("2025-06-20"), item("19:00", "Next"));
        assert!(store.last_persist_error().is_none());
    }
}
