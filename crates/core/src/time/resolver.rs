//! Timezone-aware date/time resolution.
//!
//! The selected timezone is always passed in explicitly. Nothing here reads
//! the host's local zone.

use std::sync::Arc;

use chrono::{DateTime, Duration, LocalResult, NaiveDateTime, TimeZone, Timelike, Utc};
use chrono_tz::Tz;
use postdeck_domain::constants::{
    DEFAULT_SCHEDULE_HOUR, DEFAULT_SCHEDULE_MINUTE, SUGGESTED_SLOT_MINUTES,
};
use postdeck_domain::{DateKey, TimeOfDay, ValidationError};

use super::{Clock, SystemClock};

/// Longest spring-forward gap we walk across when resolving a local time.
const MAX_GAP_MINUTES: i64 = 180;

/// Single authority for "what date/time is it" in a given zone.
#[derive(Clone)]
pub struct TimezoneResolver {
    clock: Arc<dyn Clock>,
}

impl Default for TimezoneResolver {
    fn default() -> Self {
        Self::new(Arc::new(SystemClock))
    }
}

impl std::fmt::Debug for TimezoneResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimezoneResolver").field("now", &self.clock.now()).finish()
    }
}

impl TimezoneResolver {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Canonical date key of `instant` as seen in `tz`.
    pub fn date_key_of(&self, instant: DateTime<Utc>, tz: Tz) -> DateKey {
        DateKey::new(instant.with_timezone(&tz).date_naive())
    }

    /// `HH:MM` wall-clock time of `instant` as seen in `tz`.
    pub fn time_of_day_of(&self, instant: DateTime<Utc>, tz: Tz) -> TimeOfDay {
        TimeOfDay::from_time(instant.with_timezone(&tz).time())
    }

    pub fn today(&self, tz: Tz) -> DateKey {
        self.date_key_of(self.now(), tz)
    }

    /// UTC instant of a local `(date, time)` in `tz`.
    ///
    /// Ambiguous local times (fall-back overlap) resolve to the earlier
    /// instant. Local times that do not exist (spring-forward gap) resolve to
    /// the first valid minute after the gap.
    pub fn instant_of(&self, date: DateKey, time: TimeOfDay, tz: Tz) -> DateTime<Utc> {
        let local = date.date().and_time(time.time());
        resolve_local(local, tz)
    }

    /// True iff `date` lies strictly before today in `tz`.
    pub fn is_past(&self, date: DateKey, tz: Tz) -> bool {
        date < self.today(tz)
    }

    /// True iff the instant of `(date, time)` in `tz` is at or before now.
    pub fn is_due_now(&self, date: DateKey, time: TimeOfDay, tz: Tz) -> bool {
        self.instant_of(date, time, tz) <= self.now()
    }

    /// Default time offered when adding a post to `date`.
    ///
    /// For today this is the next 10-minute slot after the current minute,
    /// rolling into the next hour and capped at 23:59. Any other day gets
    /// 09:00.
    pub fn suggested_time(&self, date: DateKey, tz: Tz) -> TimeOfDay {
        let default = || {
            TimeOfDay::from_hm(DEFAULT_SCHEDULE_HOUR, DEFAULT_SCHEDULE_MINUTE)
                .unwrap_or_else(|_| TimeOfDay::from_time(chrono::NaiveTime::MIN))
        };
        if date != self.today(tz) {
            return default();
        }

        let local = self.now().with_timezone(&tz);
        let slot = (local.minute() / SUGGESTED_SLOT_MINUTES + 1) * SUGGESTED_SLOT_MINUTES;
        let (hour, minute) = if slot >= 60 { (local.hour() + 1, 0) } else { (local.hour(), slot) };
        let (hour, minute) = if hour > 23 { (23, 59) } else { (hour, minute) };
        TimeOfDay::from_hm(hour, minute).unwrap_or_else(|_| default())
    }
}

/// Parses an IANA zone name such as `Europe/Berlin`.
pub fn parse_timezone(name: &str) -> Result<Tz, ValidationError> {
    name.trim().parse::<Tz>().map_err(|_| ValidationError::InvalidTimezone(name.to_string()))
}

fn resolve_local(local: NaiveDateTime, tz: Tz) -> DateTime<Utc> {
    match tz.from_local_datetime(&local) {
        LocalResult::Single(dt) => dt.with_timezone(&Utc),
        LocalResult::Ambiguous(earliest, _) => earliest.with_timezone(&Utc),
        LocalResult::None => {
            for step in 1..=MAX_GAP_MINUTES {
                if let Some(dt) = tz.from_local_datetime(&(local + Duration::minutes(step))).earliest()
                {
                    return dt.with_timezone(&Utc);
                }
            }
            local.and_utc()
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use chrono_tz::America::Los_Angeles;
    use chrono_tz::Asia::Tokyo;
    use chrono_tz::UTC;

    use super::*;
    use crate::time::ManualClock;

    fn resolver_at(y: i32, m: u32, d: u32, h: u32, min: u32) -> TimezoneResolver {
        let clock = ManualClock::new(Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap());
        TimezoneResolver::new(Arc::new(clock))
    }

    fn key(s: &str) -> DateKey {
        s.parse().unwrap()
    }

    fn hm(s: &str) -> TimeOfDay {
        s.parse().unwrap()
    }

    #[test]
    fn date_key_follows_selected_zone() {
        let resolver = resolver_at(2025, 6, 15, 20, 30);
        let now = resolver.now();
        assert_eq!(resolver.date_key_of(now, UTC), key("2025-06-15"));
        assert_eq!(resolver.date_key_of(now, Tokyo), key("2025-06-16"));
        assert_eq!(resolver.time_of_day_of(now, Tokyo), hm("05:30"));
        assert_eq!(resolver.date_key_of(now, Los_Angeles), key("2025-06-15"));
        assert_eq!(resolver.time_of_day_of(now, Los_Angeles), hm("13:30"));
    }

    #[test]
    fn is_past_compares_whole_days() {
        let resolver = resolver_at(2025, 6, 15, 10, 0);
        assert!(resolver.is_past(key("2025-06-14"), UTC));
        assert!(!resolver.is_past(key("2025-06-15"), UTC));
        assert!(!resolver.is_past(key("2025-06-16"), UTC));
    }

    #[test]
    fn due_now_is_inclusive() {
        let resolver = resolver_at(2025, 6, 15, 10, 0);
        assert!(resolver.is_due_now(key("2025-06-15"), hm("09:00"), UTC));
        assert!(resolver.is_due_now(key("2025-06-15"), hm("10:00"), UTC));
        assert!(!resolver.is_due_now(key("2025-06-15"), hm("10:01"), UTC));
        // 10:00 UTC is 03:00 in Los Angeles.
        assert!(resolver.is_due_now(key("2025-06-15"), hm("03:00"), Los_Angeles));
        assert!(!resolver.is_due_now(key("2025-06-15"), hm("03:01"), Los_Angeles));
    }

    #[test]
    fn ambiguous_local_time_resolves_to_earlier_instant() {
        let resolver = TimezoneResolver::default();
        let instant = resolver.instant_of(key("2024-11-03"), hm("01:30"), Los_Angeles);
        // First 01:30 is still PDT (UTC-7).
        assert_eq!(instant, Utc.with_ymd_and_hms(2024, 11, 3, 8, 30, 0).unwrap());
    }

    #[test]
    fn gap_local_time_resolves_past_the_gap() {
        let resolver = TimezoneResolver::default();
        let instant = resolver.instant_of(key("2024-03-10"), hm("02:30"), Los_Angeles);
        // 02:00-02:59 does not exist; 03:00 PDT is 10:00 UTC.
        assert_eq!(instant, Utc.with_ymd_and_hms(2024, 3, 10, 10, 0, 0).unwrap());
    }

    #[test]
    fn suggested_time_for_today_is_next_slot() {
        let resolver = resolver_at(2025, 6, 15, 10, 4);
        assert_eq!(resolver.suggested_time(key("2025-06-15"), UTC), hm("10:10"));

        let resolver = resolver_at(2025, 6, 15, 10, 50);
        assert_eq!(resolver.suggested_time(key("2025-06-15"), UTC), hm("11:00"));

        let resolver = resolver_at(2025, 6, 15, 23, 55);
        assert_eq!(resolver.suggested_time(key("2025-06-15"), UTC), hm("23:59"));
    }

    #[test]
    fn suggested_time_for_other_days_is_nine() {
        let resolver = resolver_at(2025, 6, 15, 10, 4);
        assert_eq!(resolver.suggested_time(key("2025-06-20"), UTC), hm("09:00"));
    }

    #[test]
    fn parses_known_zones_only() {
        assert_eq!(parse_timezone(" Asia/Tokyo ").unwrap(), Tokyo);
        assert!(matches!(parse_timezone("Nowhere/Land"), Err(ValidationError::InvalidTimezone(_))));
    }
}
