//! Scheduled posts and the per-platform calendars that hold them.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::date::{DateKey, TimeOfDay};
use super::platform::Platform;

/// Visibility requested for a published post. Only forwarded for platforms
/// whose capabilities include privacy control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Privacy {
    Public,
    #[default]
    Private,
    Unlisted,
}

impl Privacy {
    pub const fn as_str(self) -> &'static str {
        match self {
            Privacy::Public => "public",
            Privacy::Private => "private",
            Privacy::Unlisted => "unlisted",
        }
    }
}

/// One post scheduled on a calendar day.
///
/// Field names follow the persisted record layout. Historical field names
/// (`path`, `_posted`, `_videoUrl`) are accepted when reading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledItem {
    pub time: TimeOfDay,
    #[serde(default, deserialize_with = "empty_as_none", skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none", skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(
        default,
        alias = "path",
        deserialize_with = "empty_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub media_path: Option<String>,
    #[serde(default)]
    pub privacy: Privacy,
    /// Set once the item was auto-published; the due scanner never touches a
    /// posted item again.
    #[serde(
        default,
        alias = "_posted",
        deserialize_with = "posted_at_compat",
        skip_serializing_if = "Option::is_none"
    )]
    pub posted_at: Option<DateTime<Utc>>,
    #[serde(
        default,
        alias = "_videoUrl",
        deserialize_with = "empty_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub published_url: Option<String>,
}

impl ScheduledItem {
    pub fn new(time: TimeOfDay) -> Self {
        Self {
            time,
            title: None,
            description: None,
            media_path: None,
            privacy: Privacy::default(),
            posted_at: None,
            published_url: None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = non_empty(title.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = non_empty(description.into());
        self
    }

    pub fn with_media(mut self, media_path: impl Into<String>) -> Self {
        self.media_path = non_empty(media_path.into());
        self
    }

    pub fn with_privacy(mut self, privacy: Privacy) -> Self {
        self.privacy = privacy;
        self
    }

    /// Identity used for de-duplication and matching.
    pub fn dedup_key(&self) -> DedupKey {
        let field = |value: &Option<String>| value.as_deref().map_or("", str::trim).to_string();
        DedupKey { media_path: field(&self.media_path), title: field(&self.title), time: self.time }
    }

    pub fn is_posted(&self) -> bool {
        self.posted_at.is_some()
    }

    pub fn has_text(&self) -> bool {
        self.title.as_deref().is_some_and(|t| !t.trim().is_empty())
            || self.description.as_deref().is_some_and(|d| !d.trim().is_empty())
    }

    pub fn title_or_empty(&self) -> &str {
        self.title.as_deref().unwrap_or_default()
    }

    pub fn description_or_empty(&self) -> &str {
        self.description.as_deref().unwrap_or_default()
    }
}

/// `(mediaPath, title, time)` with absent fields as empty strings. Two items
/// with equal keys are the same scheduled post.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DedupKey {
    pub media_path: String,
    pub title: String,
    pub time: TimeOfDay,
}

impl fmt::Display for DedupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}|{}|{}", self.media_path, self.title, self.time)
    }
}

/// Items scheduled for a single date. Never persisted with an empty item
/// list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarDay {
    pub date: DateKey,
    pub items: Vec<ScheduledItem>,
}

impl CalendarDay {
    pub fn new(date: DateKey) -> Self {
        Self { date, items: Vec::new() }
    }

    pub fn position(&self, key: &DedupKey) -> Option<usize> {
        self.items.iter().position(|item| item.dedup_key() == *key)
    }

    pub fn find(&self, key: &DedupKey) -> Option<&ScheduledItem> {
        self.items.iter().find(|item| item.dedup_key() == *key)
    }

    pub fn contains(&self, key: &DedupKey) -> bool {
        self.position(key).is_some()
    }

    /// Items ordered by time for the day-detail view; equal times keep their
    /// insertion order.
    pub fn items_by_time(&self) -> Vec<&ScheduledItem> {
        let mut items: Vec<&ScheduledItem> = self.items.iter().collect();
        items.sort_by_key(|item| item.time);
        items
    }

    pub fn posted_count(&self) -> usize {
        self.items.iter().filter(|item| item.is_posted()).count()
    }
}

/// Days of a single platform, keyed and ordered by date.
pub type DayCalendar = BTreeMap<DateKey, CalendarDay>;

/// One day map per platform. All four platforms are always present.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlatformCalendars {
    calendars: [DayCalendar; 4],
}

impl PlatformCalendars {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calendar(&self, platform: Platform) -> &DayCalendar {
        &self.calendars[platform.index()]
    }

    pub fn calendar_mut(&mut self, platform: Platform) -> &mut DayCalendar {
        &mut self.calendars[platform.index()]
    }

    pub fn day(&self, platform: Platform, date: DateKey) -> Option<&CalendarDay> {
        self.calendar(platform).get(&date)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Platform, &DayCalendar)> + '_ {
        Platform::ALL.into_iter().map(move |p| (p, self.calendar(p)))
    }

    pub fn item_count(&self) -> usize {
        self.calendars.iter().flat_map(|cal| cal.values()).map(|day| day.items.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.calendars.iter().all(BTreeMap::is_empty)
    }
}

impl Serialize for PlatformCalendars {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(Platform::ALL.len()))?;
        for (platform, calendar) in self.iter() {
            map.serialize_entry(platform.as_str(), calendar)?;
        }
        map.end()
    }
}

fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn empty_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.and_then(non_empty))
}

/// Accepts RFC 3339 strings and legacy epoch-millisecond numbers.
fn posted_at_compat<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Millis(i64),
        Fractional(f64),
        Text(String),
    }

    let from_millis = |ms: i64| {
        DateTime::<Utc>::from_timestamp_millis(ms)
            .ok_or_else(|| serde::de::Error::custom(format!("timestamp out of range: {ms}")))
    };

    match Option::<Raw>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Raw::Millis(ms)) => from_millis(ms).map(Some),
        #[allow(clippy::cast_possible_truncation)]
        Some(Raw::Fractional(ms)) => from_millis(ms as i64).map(Some),
        Some(Raw::Text(text)) => DateTime::parse_from_rfc3339(&text)
            .map(|dt| Some(dt.with_timezone(&Utc)))
            .map_err(serde::de::Error::custom),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn at(time: &str) -> ScheduledItem {
        ScheduledItem::new(time.parse().unwrap())
    }

    #[test]
    fn dedup_key_treats_absent_fields_as_empty() {
        let a = at("10:00").with_title("Launch");
        let mut b = at("10:00").with_title("Launch");
        b.description = Some("different body".into());
        assert_eq!(a.dedup_key(), b.dedup_key());

        let c = at("10:00").with_title("Launch").with_media("storage/a.mp4");
        assert_ne!(a.dedup_key(), c.dedup_key());
        assert_eq!(at("08:00").with_title("  ").dedup_key(), at("08:00").dedup_key());
        assert_eq!(c.dedup_key().to_string(), "storage/a.mp4|Launch|10:00");
    }

    #[test]
    fn serializes_canonical_camel_case_layout() {
        let item = at("09:30").with_title("Teaser").with_media("storage/t.mp4");
        let value = serde_json::to_value(&item).unwrap();
        assert_eq!(
            value,
            json!({"time": "09:30", "title": "Teaser", "mediaPath": "storage/t.mp4", "privacy": "private"})
        );
    }

    #[test]
    fn reads_legacy_field_names() {
        let raw = json!({
            "time": "11:15",
            "title": "Old",
            "path": "storage/old.mp4",
            "_posted": 1_718_445_600_000_i64,
            "_videoUrl": "https://youtu.be/abc",
            "privacy": "unlisted"
        });
        let item: ScheduledItem = serde_json::from_value(raw).unwrap();
        assert_eq!(item.media_path.as_deref(), Some("storage/old.mp4"));
        assert_eq!(item.published_url.as_deref(), Some("https://youtu.be/abc"));
        assert_eq!(item.privacy, Privacy::Unlisted);
        assert_eq!(item.posted_at.unwrap().timestamp_millis(), 1_718_445_600_000);
    }

    #[test]
    fn empty_strings_read_as_absent() {
        let item: ScheduledItem =
            serde_json::from_value(json!({"time": "07:00", "title": "", "path": ""})).unwrap();
        assert!(item.title.is_none());
        assert!(item.media_path.is_none());
        assert_eq!(item.privacy, Privacy::Private);
    }

    #[test]
    fn stored_and_built_items_share_one_key() {
        let stored: ScheduledItem =
            serde_json::from_value(json!({"time": "10:00", "title": "Launch ", "path": " storage/a.mp4"}))
                .unwrap();
        assert_eq!(stored.title.as_deref(), Some("Launch"));
        let built = at("10:00").with_title("Launch ").with_media("storage/a.mp4");
        assert_eq!(stored.dedup_key(), built.dedup_key());

        let mut literal = at("10:00").with_media("storage/a.mp4");
        literal.title = Some("Launch  ".into());
        assert_eq!(literal.dedup_key(), built.dedup_key());
    }

    #[test]
    fn day_orders_items_by_time_for_detail_view() {
        let mut day = CalendarDay::new("2025-06-15".parse().unwrap());
        day.items.push(at("15:00").with_title("b"));
        day.items.push(at("09:00").with_title("a"));
        day.items.push(at("15:00").with_title("c"));
        let titles: Vec<_> = day.items_by_time().iter().map(|i| i.title_or_empty()).collect();
        assert_eq!(titles, vec!["a", "b", "c"]);
        assert_eq!(day.items[0].title_or_empty(), "b");
    }

    #[test]
    fn calendars_always_serialize_all_platforms() {
        let value = serde_json::to_value(PlatformCalendars::new()).unwrap();
        assert_eq!(value, json!({"YouTube": {}, "Facebook": {}, "TikTok": {}, "LinkedIn": {}}));
    }
}
