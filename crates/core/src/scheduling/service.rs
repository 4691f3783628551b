//! Scheduling service - validated calendar mutations and background ticks

use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use chrono_tz::Tz;
use postdeck_domain::constants::MULTI_UPLOAD_TITLE_SEPARATOR;
use postdeck_domain::{
    DateKey, DedupKey, Platform, Privacy, PublishFailure, PublishReceipt, PublishRequest,
    ScheduledItem, TimeOfDay, ValidationError,
};
use tracing::{debug, info, instrument, warn};

use super::errors::IntentError;
use super::guard::{InFlightClaim, InFlightRegistry, TickGuard};
use super::report::{DueScanReport, Notice, PruneReport};
use super::validation::validate_item;
use crate::calendar::{CalendarStore, MarkOutcome, MoveOutcome, UpsertOutcome};
use crate::publishing::intake::UploadedMedia;
use crate::publishing::ports::PublishGateway;
use crate::time::resolver::TimezoneResolver;

/// Fields shared by every item created from one add-post form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleDraft {
    /// Time of day every created item is scheduled at.
    pub time: TimeOfDay,
    pub title: String,
    pub description: String,
    pub privacy: Privacy,
}

impl ScheduleDraft {
    fn item(&self) -> ScheduledItem {
        ScheduledItem::new(self.time)
            .with_title(self.title.clone())
            .with_description(self.description.clone())
            .with_privacy(self.privacy)
    }
}

/// Orchestrates user intents against the calendar store and runs the
/// due-scan and prune ticks.
///
/// Every mutation of an existing item claims it in the in-flight registry
/// first. A publish holds its claim across the gateway call, so edits that
/// race with a publish fail with [`IntentError::PublishInFlight`] instead of
/// touching an item that is about to be marked posted.
pub struct SchedulingService {
    store: Arc<CalendarStore>,
    gateway: Arc<dyn PublishGateway>,
    resolver: TimezoneResolver,
    in_flight: InFlightRegistry,
    due_scan_running: AtomicBool,
    prune_running: AtomicBool,
}

impl SchedulingService {
    /// Build a service over `store`, publishing through `gateway`.
    pub fn new(
        store: Arc<CalendarStore>,
        gateway: Arc<dyn PublishGateway>,
        resolver: TimezoneResolver,
    ) -> Self {
        Self {
            store,
            gateway,
            resolver,
            in_flight: InFlightRegistry::new(),
            due_scan_running: AtomicBool::new(false),
            prune_running: AtomicBool::new(false),
        }
    }

    /// The store every intent mutates.
    pub fn store(&self) -> &Arc<CalendarStore> {
        &self.store
    }

    /// The resolver deciding "now" for validation and scans.
    pub fn resolver(&self) -> &TimezoneResolver {
        &self.resolver
    }

    /// Items currently claimed by an intent or a publish.
    pub fn in_flight(&self) -> &InFlightRegistry {
        &self.in_flight
    }

    /// Add `item` to `date`. Re-adding an identical item is a no-op.
    pub fn schedule(
        &self,
        platform: Platform,
        date: DateKey,
        item: ScheduledItem,
        tz: Tz,
    ) -> Result<UpsertOutcome, IntentError> {
        reject_posted_fields(&item)?;
        validate_item(platform, &item)?;
        self.ensure_future(date, item.time, tz)?;

        let outcome = self.store.upsert_item(platform, date, item);
        debug!(%platform, %date, ?outcome, "Schedule intent applied");
        Ok(outcome)
    }

    /// Create one item per uploaded file from a single draft.
    ///
    /// With several files each title gets the file name appended. Without
    /// files the draft is scheduled as a text-only post. All items are
    /// validated before any is stored.
    pub fn schedule_uploads(
        &self,
        platform: Platform,
        date: DateKey,
        draft: &ScheduleDraft,
        uploads: &[UploadedMedia],
        tz: Tz,
    ) -> Result<Vec<UpsertOutcome>, IntentError> {
        let items: Vec<ScheduledItem> = match uploads {
            [] => vec![draft.item()],
            [single] => vec![draft.item().with_media(single.media_path.clone())],
            many => many
                .iter()
                .map(|upload| {
                    let title = if draft.title.trim().is_empty() {
                        upload.file_name.clone()
                    } else {
                        format!("{}{MULTI_UPLOAD_TITLE_SEPARATOR}{}", draft.title.trim(), upload.file_name)
                    };
                    draft.item().with_title(title).with_media(upload.media_path.clone())
                })
                .collect(),
        };

        for item in &items {
            validate_item(platform, item)?;
        }
        self.ensure_future(date, draft.time, tz)?;

        let outcomes: Vec<UpsertOutcome> =
            items.into_iter().map(|item| self.store.upsert_item(platform, date, item)).collect();
        info!(%platform, %date, count = outcomes.len(), "Scheduled uploaded media");
        Ok(outcomes)
    }

    /// Replace the fields of an existing, not yet posted item in place.
    pub fn edit(
        &self,
        platform: Platform,
        date: DateKey,
        key: &DedupKey,
        updated: ScheduledItem,
        tz: Tz,
    ) -> Result<UpsertOutcome, IntentError> {
        let _claim = self.claim(platform, date, key)?;
        let current = self.store.find_item(platform, date, key).ok_or(IntentError::NotFound)?;
        if current.is_posted() {
            return Err(IntentError::AlreadyPosted);
        }
        reject_posted_fields(&updated)?;
        validate_item(platform, &updated)?;
        self.ensure_future(date, updated.time, tz)?;

        let outcome = self.store.replace_item(platform, date, key, updated)?;
        debug!(%platform, %date, ?outcome, "Edit intent applied");
        Ok(outcome)
    }

    /// Move an item to another day and/or time.
    pub fn reschedule(
        &self,
        platform: Platform,
        from: DateKey,
        key: &DedupKey,
        to: DateKey,
        new_time: TimeOfDay,
        tz: Tz,
    ) -> Result<MoveOutcome, IntentError> {
        let _claim = self.claim(platform, from, key)?;
        let current = self.store.find_item(platform, from, key).ok_or(IntentError::NotFound)?;
        if current.is_posted() {
            return Err(IntentError::AlreadyPosted);
        }
        self.ensure_future(to, new_time, tz)?;

        let outcome = self.store.move_item(platform, from, to, key, new_time)?;
        info!(%platform, %from, %to, time = %new_time, ?outcome, "Reschedule intent applied");
        Ok(outcome)
    }

    /// Remove an item. Posted items may be deleted too.
    pub fn delete(
        &self,
        platform: Platform,
        date: DateKey,
        key: &DedupKey,
    ) -> Result<ScheduledItem, IntentError> {
        let _claim = self.claim(platform, date, key)?;
        let removed = self.store.remove_item(platform, date, key)?;
        info!(%platform, %date, key = %key, "Delete intent applied");
        Ok(removed)
    }

    /// Publish an item immediately, bypassing the due scan. On success the
    /// item is marked posted and then removed from the schedule.
    #[instrument(skip(self, key))]
    pub async fn publish_now(
        &self,
        platform: Platform,
        date: DateKey,
        key: &DedupKey,
    ) -> Result<PublishReceipt, IntentError> {
        if !platform.capabilities().publishable {
            return Err(ValidationError::PublishingUnsupported { platform }.into());
        }
        let _claim = self.claim(platform, date, key)?;
        let item = self.store.find_item(platform, date, key).ok_or(IntentError::NotFound)?;
        if item.is_posted() {
            return Err(IntentError::AlreadyPosted);
        }
        validate_item(platform, &item)?;

        let receipt = self
            .gateway
            .publish(PublishRequest::for_item(platform, &item))
            .await
            .map_err(|failure| {
                warn!(category = failure.category(), detail = failure.detail(), "Manual publish failed");
                IntentError::from_failure(platform, failure)
            })?;

        let posted_at = self.resolver.now();
        if let Err(err) =
            self.store.mark_posted(platform, date, key, posted_at, receipt.published_url.clone())
        {
            warn!(error = %err, "Published item vanished before it could be marked");
        }
        if let Err(err) = self.store.remove_item(platform, date, key) {
            warn!(error = %err, "Published item vanished before it could be removed");
        }
        info!(url = receipt.published_url.as_deref().unwrap_or(""), "Manual publish succeeded");
        Ok(receipt)
    }

    /// One due-scan tick over today's items in `tz`.
    ///
    /// Items are processed in stored order from a snapshot taken at the start
    /// of the tick. Each item is re-read from the live store after it has
    /// been claimed. Failures leave the item unposted for the next tick.
    #[instrument(skip(self))]
    pub async fn run_due_scan(&self, tz: Tz) -> DueScanReport {
        let today = self.resolver.today(tz);
        let Some(_tick) = TickGuard::try_acquire(&self.due_scan_running) else {
            debug!(%today, "Previous due scan still running; skipping tick");
            return DueScanReport::skipped(today);
        };

        let mut report = DueScanReport::new(today);
        let snapshot = self.store.snapshot();

        for platform in Platform::ALL.into_iter().filter(|p| p.capabilities().publishable) {
            let Some(day) = snapshot.day(platform, today) else {
                continue;
            };

            for candidate in &day.items {
                if candidate.is_posted() || !self.resolver.is_due_now(today, candidate.time, tz) {
                    continue;
                }
                let key = candidate.dedup_key();
                let Some(_claim) = self.in_flight.try_claim(platform, today, &key) else {
                    debug!(%platform, key = %key, "Item busy; leaving it for the next tick");
                    continue;
                };
                let Some(item) = self.store.find_item(platform, today, &key) else {
                    continue;
                };
                if item.is_posted() {
                    continue;
                }
                if let Err(err) = validate_item(platform, &item) {
                    debug!(%platform, key = %key, error = %err, "Stored item cannot be published; skipping");
                    continue;
                }

                report.attempted += 1;
                match self.gateway.publish(PublishRequest::for_item(platform, &item)).await {
                    Ok(receipt) => self.record_auto_post(platform, today, &key, receipt, &mut report),
                    Err(PublishFailure::NotConfigured(detail)) => {
                        report.failed += 1;
                        warn!(%platform, %detail, "Platform not configured; skipping its remaining items this tick");
                        report.notices.push(Notice::warning(
                            platform,
                            PublishFailure::NotConfigured(detail).user_message(platform),
                        ));
                        break;
                    }
                    Err(failure) => {
                        report.failed += 1;
                        warn!(
                            %platform,
                            time = %item.time,
                            category = failure.category(),
                            detail = failure.detail(),
                            retryable = failure.is_retryable(),
                            "Auto-post failed"
                        );
                        report.notices.push(Notice::error(platform, failure.user_message(platform)));
                    }
                }
            }
        }

        if report.attempted > 0 {
            info!(
                date = %today,
                attempted = report.attempted,
                posted = report.posted,
                failed = report.failed,
                "Due scan finished"
            );
        }
        report
    }

    /// One prune tick: drop every day before today in `tz`.
    #[instrument(skip(self))]
    pub fn run_prune(&self, tz: Tz) -> PruneReport {
        let today = self.resolver.today(tz);
        let Some(_tick) = TickGuard::try_acquire(&self.prune_running) else {
            return PruneReport { today, skipped: true, days_removed: 0 };
        };

        let days_removed = self.store.prune_before(today);
        if days_removed > 0 {
            info!(%today, days_removed, "Pruned elapsed calendar days");
        }
        PruneReport { today, skipped: false, days_removed }
    }

    fn record_auto_post(
        &self,
        platform: Platform,
        date: DateKey,
        key: &DedupKey,
        receipt: PublishReceipt,
        report: &mut DueScanReport,
    ) {
        let url = receipt.published_url;
        match self.store.mark_posted(platform, date, key, self.resolver.now(), url.clone()) {
            Ok(MarkOutcome::Marked) => {
                report.posted += 1;
                info!(%platform, %date, key = %key, url = url.as_deref().unwrap_or(""), "Auto-posted");
                report.notices.push(Notice::info(platform, format!("Auto-posted to {platform}")));
            }
            Ok(MarkOutcome::AlreadyPosted) => {
                debug!(%platform, key = %key, "Item was already marked posted");
            }
            Err(err) => {
                warn!(error = %err, "Published item vanished before it could be marked");
            }
        }
    }

    fn claim(
        &self,
        platform: Platform,
        date: DateKey,
        key: &DedupKey,
    ) -> Result<InFlightClaim, IntentError> {
        self.in_flight.try_claim(platform, date, key).ok_or(IntentError::PublishInFlight)
    }

    fn ensure_future(&self, date: DateKey, time: TimeOfDay, tz: Tz) -> Result<(), IntentError> {
        if self.resolver.is_due_now(date, time, tz) {
            return Err(ValidationError::PastTime { date, time }.into());
        }
        Ok(())
    }
}

/// Only a publish may set `posted_at` or `published_url`.
fn reject_posted_fields(item: &ScheduledItem) -> Result<(), IntentError> {
    if item.is_posted() || item.published_url.is_some() {
        return Err(IntentError::AlreadyPosted);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use chrono_tz::UTC;
    use parking_lot::Mutex;
    use postdeck_domain::Result as DomainResult;

    use super::*;
    use crate::calendar::KeyValueStore;
    use crate::time::ManualClock;

    #[derive(Default)]
    struct MemoryKv(Mutex<HashMap<String, String>>);

    impl KeyValueStore for MemoryKv {
        fn get(&self, key: &str) -> DomainResult<Option<String>> {
            Ok(self.0.lock().get(key).cloned())
        }

        fn set(&self, key: &str, value: &str) -> DomainResult<()> {
            self.0.lock().insert(key.into(), value.into());
            Ok(())
        }

        fn remove(&self, key: &str) -> DomainResult<()> {
            self.0.lock().remove(key);
            Ok(())
        }
    }

    struct OkGateway;

    #[async_trait]
    impl PublishGateway for OkGateway {
        async fn publish(&self, _request: PublishRequest) -> Result<PublishReceipt, PublishFailure> {
            Ok(PublishReceipt { published_url: Some("https://example.test/p/1".into()) })
        }
    }

    fn service() -> SchedulingService {
        let clock = ManualClock::new(Utc.with_ymd_and_hms(2025, 6, 15, 10, 0, 0).unwrap());
        let store = Arc::new(CalendarStore::load(Arc::new(MemoryKv::default())));
        SchedulingService::new(store, Arc::new(OkGateway), TimezoneResolver::new(Arc::new(clock)))
    }

    fn key(s: &str) -> DateKey {
        s.parse().unwrap()
    }

    fn draft(time: &str, title: &str) -> ScheduleDraft {
        ScheduleDraft {
            time: time.parse().unwrap(),
            title: title.into(),
            description: String::new(),
            privacy: Privacy::Public,
        }
    }

    fn upload(name: &str) -> UploadedMedia {
        UploadedMedia {
            file_name: name.into(),
            media_path: format!("storage/{name}"),
            kind: postdeck_domain::MediaKind::Video,
        }
    }

    #[test]
    fn multi_upload_titles_include_file_names() {
        let service = service();
        let outcomes = service
            .schedule_uploads(
                Platform::YouTube,
                key("2025-06-16"),
                &draft("09:00", "Series"),
                &[upload("ep1.mp4"), upload("ep2.mp4")],
                UTC,
            )
            .unwrap();
        assert_eq!(outcomes, vec![UpsertOutcome::Inserted, UpsertOutcome::Inserted]);

        let day = service.store().get(Platform::YouTube, key("2025-06-16")).unwrap();
        let titles: Vec<_> = day.items.iter().map(ScheduledItem::title_or_empty).collect();
        assert_eq!(titles, vec!["Series • ep1.mp4", "Series • ep2.mp4"]);
        assert!(day.items.iter().all(|i| i.privacy == Privacy::Public));
    }

    #[test]
    fn single_upload_keeps_plain_title() {
        let service = service();
        service
            .schedule_uploads(Platform::TikTok, key("2025-06-16"), &draft("09:00", "Solo"), &[upload("a.mp4")], UTC)
            .unwrap();
        let day = service.store().get(Platform::TikTok, key("2025-06-16")).unwrap();
        assert_eq!(day.items[0].title_or_empty(), "Solo");
        assert_eq!(day.items[0].media_path.as_deref(), Some("storage/a.mp4"));
    }

    #[test]
    fn text_only_draft_without_uploads() {
        let service = service();
        let mut text = draft("12:00", "Hiring");
        text.description = "We are hiring".into();
        service.schedule_uploads(Platform::LinkedIn, key("2025-06-15"), &text, &[], UTC).unwrap();
        assert!(service.store().get(Platform::LinkedIn, key("2025-06-15")).is_some());

        let err = service
            .schedule_uploads(Platform::YouTube, key("2025-06-15"), &text, &[], UTC)
            .unwrap_err();
        assert!(matches!(err, IntentError::Validation(ValidationError::MediaRequired { .. })));
    }

    #[test]
    fn edit_replaces_fields_in_place() {
        let service = service();
        let original = ScheduledItem::new("11:00".parse().unwrap()).with_title("Draft").with_description("v1");
        service.schedule(Platform::Facebook, key("2025-06-15"), original.clone(), UTC).unwrap();

        let updated = original.clone().with_title("Final").with_description("v2");
        service
            .edit(Platform::Facebook, key("2025-06-15"), &original.dedup_key(), updated.clone(), UTC)
            .unwrap();
        let day = service.store().get(Platform::Facebook, key("2025-06-15")).unwrap();
        assert_eq!(day.items, vec![updated]);
    }

    #[test]
    fn edit_cannot_mark_an_item_posted() {
        let service = service();
        let original = ScheduledItem::new("11:00".parse().unwrap()).with_title("Draft");
        service.schedule(Platform::LinkedIn, key("2025-06-15"), original.clone(), UTC).unwrap();

        let mut forged = original.clone().with_title("Final");
        forged.posted_at = Some(Utc.with_ymd_and_hms(2025, 6, 15, 9, 0, 0).unwrap());
        let err = service
            .edit(Platform::LinkedIn, key("2025-06-15"), &original.dedup_key(), forged, UTC)
            .unwrap_err();
        assert_eq!(err, IntentError::AlreadyPosted);

        let mut with_url = original.clone();
        with_url.published_url = Some("https://example.test/p/9".into());
        assert_eq!(
            service
                .edit(Platform::LinkedIn, key("2025-06-15"), &original.dedup_key(), with_url, UTC)
                .unwrap_err(),
            IntentError::AlreadyPosted
        );

        let day = service.store().get(Platform::LinkedIn, key("2025-06-15")).unwrap();
        assert_eq!(day.items, vec![original]);
    }

    #[tokio::test]
    async fn publish_now_removes_item() {
        let service = service();
        let item = ScheduledItem::new("18:00".parse().unwrap()).with_title("Now").with_media("storage/a.mp4");
        service.schedule(Platform::YouTube, key("2025-06-15"), item.clone(), UTC).unwrap();

        let receipt = service.publish_now(Platform::YouTube, key("2025-06-15"), &item.dedup_key()).await.unwrap();
        assert_eq!(receipt.published_url.as_deref(), Some("https://example.test/p/1"));
        assert!(service.store().get(Platform::YouTube, key("2025-06-15")).is_none());
    }

    #[tokio::test]
    async fn publish_now_rejects_unpublishable_platform() {
        let service = service();
        let item = ScheduledItem::new("18:00".parse().unwrap()).with_media("storage/a.mp4");
        service.schedule(Platform::TikTok, key("2025-06-15"), item.clone(), UTC).unwrap();
        let err = service.publish_now(Platform::TikTok, key("2025-06-15"), &item.dedup_key()).await.unwrap_err();
        assert!(matches!(err, IntentError::Validation(ValidationError::PublishingUnsupported { .. })));
        assert!(service.store().get(Platform::TikTok, key("2025-06-15")).is_some());
    }

    #[test]
    fn prune_reports_removed_days() {
        let service = service();
        let item = ScheduledItem::new("10:00".parse().unwrap()).with_title("old");
        service.store().upsert_item(Platform::Facebook, key("2025-06-14"), item);
        let report = service.run_prune(UTC);
        assert_eq!(report, PruneReport { today: key("2025-06-15"), skipped: false, days_removed: 1 });
    }
}
