//! # Postdeck Core
//!
//! Pure business logic layer - no infrastructure dependencies.
//!
//! This crate contains:
//! - The calendar store and its persisted-record codec
//! - The clock / timezone resolver
//! - The scheduling engine (user intents, due-scan and prune ticks)
//! - Port/adapter interfaces (traits) for storage, publishing and uploads
//!
//! ## Architecture Principles
//! - Only depends on `postdeck-domain`
//! - No database, HTTP, or platform code
//! - All external dependencies via traits
//! - Pure, testable business logic

pub mod calendar;
pub mod publishing;
pub mod scheduling;
pub mod time;

// Re-export specific items to avoid ambiguity
pub use calendar::ports::KeyValueStore;
pub use calendar::store::{CalendarStore, MarkOutcome, MoveOutcome, StoreError, UpsertOutcome};
pub use calendar::view::{month_grid, month_summary, DaySummary};
pub use publishing::intake::{MediaIntake, UploadedMedia};
pub use publishing::ports::{MediaFile, MediaUploader, PublishGateway};
pub use scheduling::errors::IntentError;
pub use scheduling::guard::{InFlightRegistry, TickGuard};
pub use scheduling::report::{DueScanReport, Notice, NoticeLevel, PruneReport};
pub use scheduling::service::{ScheduleDraft, SchedulingService};
pub use scheduling::validation::{validate_item, validate_media_type};
pub use time::resolver::{parse_timezone, TimezoneResolver};
pub use time::{Clock, ManualClock, SystemClock};
