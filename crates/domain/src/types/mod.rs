//! Domain types and models

pub mod date;
pub mod platform;
pub mod publish;
pub mod schedule;

pub use date::{DateKey, TimeOfDay};
pub use platform::{MediaKind, Platform, PlatformCapabilities};
pub use publish::{PublishFailure, PublishReceipt, PublishRequest};
pub use schedule::{CalendarDay, DayCalendar, DedupKey, PlatformCalendars, Privacy, ScheduledItem};
