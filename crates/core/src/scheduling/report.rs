//! Tick reports handed to the presentation layer.

use postdeck_domain::{DateKey, Platform};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

/// User-facing message produced by a background tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub platform: Option<Platform>,
    pub message: String,
}

impl Notice {
    pub fn info(platform: Platform, message: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Info, platform: Some(platform), message: message.into() }
    }

    pub fn warning(platform: Platform, message: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Warning, platform: Some(platform), message: message.into() }
    }

    pub fn error(platform: Platform, message: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Error, platform: Some(platform), message: message.into() }
    }
}

/// Outcome of one due-scan tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DueScanReport {
    pub date: DateKey,
    /// The tick did not run because the previous one was still in progress.
    pub skipped: bool,
    pub attempted: usize,
    pub posted: usize,
    pub failed: usize,
    pub notices: Vec<Notice>,
}

impl DueScanReport {
    pub fn new(date: DateKey) -> Self {
        Self { date, skipped: false, attempted: 0, posted: 0, failed: 0, notices: Vec::new() }
    }

    pub fn skipped(date: DateKey) -> Self {
        Self { skipped: true, ..Self::new(date) }
    }
}

/// Outcome of one prune tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PruneReport {
    pub today: DateKey,
    pub skipped: bool,
    pub days_removed: usize,
}
