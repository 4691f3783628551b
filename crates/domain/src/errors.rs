//! Error types used throughout the application

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{DateKey, Platform, TimeOfDay};

/// Main error type for Postdeck
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum PostdeckError {
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for Postdeck operations
pub type Result<T> = std::result::Result<T, PostdeckError>;

/// Rejections raised synchronously when a user intent is checked.
///
/// A validation failure never mutates the calendar store.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{date} {time} is in the past; pick a future time")]
    PastTime { date: DateKey, time: TimeOfDay },

    #[error("{platform} posts require a video file")]
    MediaRequired { platform: Platform },

    #[error("{platform} posts need media or text")]
    ContentRequired { platform: Platform },

    #[error("media '{media}' is not allowed for {platform}")]
    MediaTypeNotAllowed { platform: Platform, media: String },

    #[error("publishing to {platform} is not supported by the backend")]
    PublishingUnsupported { platform: Platform },

    #[error("invalid date key '{0}', expected YYYY-MM-DD")]
    InvalidDateKey(String),

    #[error("invalid time '{0}', expected HH:MM")]
    InvalidTime(String),

    #[error("unknown timezone '{0}'")]
    InvalidTimezone(String),

    #[error("unknown platform '{0}'")]
    InvalidPlatform(String),
}

impl From<ValidationError> for PostdeckError {
    fn from(err: ValidationError) -> Self {
        PostdeckError::Validation(err.to_string())
    }
}
