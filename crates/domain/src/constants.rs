//! Application constants
//!
//! Centralized location for all domain-level constants used throughout the
//! application.

// Key-value store layout
pub const CALENDAR_STORE_KEY: &str = "platform_calendars";
pub const LINKEDIN_CONFIG_KEY: &str = "linkedin_config";
pub const FACEBOOK_CONFIG_KEY: &str = "facebook_config";
pub const YOUTUBE_AUTH_FLAG_KEY: &str = "youtube_auth_done";

/// Historical name of the TikTok calendar in persisted records.
pub const LEGACY_TIKTOK_KEY: &str = "Instagram";

// Scheduling defaults
pub const DEFAULT_SCHEDULE_HOUR: u32 = 9;
pub const DEFAULT_SCHEDULE_MINUTE: u32 = 0;
pub const SUGGESTED_SLOT_MINUTES: u32 = 10;
pub const DEFAULT_TICK_INTERVAL_SECS: u64 = 30;
pub const DEFAULT_TICK_TIMEOUT_SECS: u64 = 300;

/// Separator between the draft title and the file name in multi-upload items.
pub const MULTI_UPLOAD_TITLE_SEPARATOR: &str = " • ";

// Backend defaults
pub const DEFAULT_BACKEND_URL: &str = "http://localhost:8000";
pub const DEFAULT_BACKEND_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_BACKEND_MAX_ATTEMPTS: usize = 3;
