//! Persisted calendar record codec.
//!
//! Decoding never fails: a root that is not a JSON object yields the empty
//! calendar, and malformed days or items are skipped one by one. Duplicate
//! items inside a day are dropped on load, keeping the first.

use postdeck_domain::constants::LEGACY_TIKTOK_KEY;
use postdeck_domain::{CalendarDay, DateKey, DayCalendar, Platform, PlatformCalendars, ScheduledItem};
use serde_json::{Map, Value};
use tracing::warn;

/// Serialize the calendars in the canonical camelCase layout.
pub fn encode(calendars: &PlatformCalendars) -> serde_json::Result<String> {
    serde_json::to_string(calendars)
}

/// Decode a persisted record, tolerating legacy and partially corrupt data.
pub fn decode(raw: &str) -> PlatformCalendars {
    let mut calendars = PlatformCalendars::new();

    let root = match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(root)) => root,
        Ok(other) => {
            warn!(kind = json_kind(&other), "Persisted calendar root is not an object; starting empty");
            return calendars;
        }
        Err(err) => {
            warn!(error = %err, "Persisted calendar is not valid JSON; starting empty");
            return calendars;
        }
    };

    for platform in Platform::ALL {
        let Some(days) = platform_entry(&root, platform) else {
            continue;
        };
        *calendars.calendar_mut(platform) = decode_platform(platform, days);
    }

    calendars
}

fn platform_entry(root: &Map<String, Value>, platform: Platform) -> Option<&Value> {
    let entry = root.get(platform.as_str()).filter(|v| !v.is_null());
    match (entry, platform) {
        (None, Platform::TikTok) => root.get(LEGACY_TIKTOK_KEY).filter(|v| !v.is_null()),
        (entry, _) => entry,
    }
}

fn decode_platform(platform: Platform, value: &Value) -> DayCalendar {
    let mut calendar = DayCalendar::new();
    let Value::Object(days) = value else {
        warn!(%platform, kind = json_kind(value), "Calendar for platform is not an object; ignoring");
        return calendar;
    };

    for (raw_key, raw_day) in days {
        let date: DateKey = match raw_key.parse() {
            Ok(date) => date,
            Err(err) => {
                warn!(%platform, key = %raw_key, error = %err, "Skipping day with malformed date key");
                continue;
            }
        };

        let day = decode_day(platform, date, raw_day);
        if !day.items.is_empty() {
            calendar.insert(date, day);
        }
    }

    calendar
}

fn decode_day(platform: Platform, date: DateKey, value: &Value) -> CalendarDay {
    let mut day = CalendarDay::new(date);
    let items = match value {
        Value::Object(obj) => obj.get("items").and_then(Value::as_array),
        // Some early records stored the item list directly.
        Value::Array(items) => Some(items),
        _ => None,
    };
    let Some(items) = items else {
        warn!(%platform, %date, "Skipping day without an item list");
        return day;
    };

    for raw in items {
        match serde_json::from_value::<ScheduledItem>(raw.clone()) {
            Ok(item) if day.contains(&item.dedup_key()) => {
                warn!(%platform, %date, key = %item.dedup_key(), "Dropping duplicate item on load");
            }
            Ok(item) => day.items.push(item),
            Err(err) => {
                warn!(%platform, %date, error = %err, "Skipping malformed scheduled item");
            }
        }
    }

    day
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
