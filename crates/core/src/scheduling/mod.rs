//! Scheduling engine: user intents plus the due-scan and prune ticks.

pub mod errors;
pub mod guard;
pub mod report;
pub mod service;
pub mod validation;

pub use errors::IntentError;
pub use report::{DueScanReport, Notice, NoticeLevel, PruneReport};
pub use service::{ScheduleDraft, SchedulingService};
