//! Publish gateway contract: request, receipt, and failure taxonomy.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::platform::Platform;
use super::schedule::{Privacy, ScheduledItem};

/// Payload handed to the publish gateway. Credentials are resolved by the
/// gateway itself and never travel through the scheduling core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishRequest {
    pub platform: Platform,
    pub title: String,
    pub description: String,
    pub media_path: Option<String>,
    pub privacy: Option<Privacy>,
}

impl PublishRequest {
    pub fn for_item(platform: Platform, item: &ScheduledItem) -> Self {
        Self {
            platform,
            title: item.title_or_empty().to_string(),
            description: item.description_or_empty().to_string(),
            media_path: item.media_path.clone(),
            privacy: platform.capabilities().supports_privacy.then_some(item.privacy),
        }
    }
}

/// Successful publish result.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishReceipt {
    pub published_url: Option<String>,
}

/// Machine-distinguishable publish failure.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail")]
pub enum PublishFailure {
    #[error("not configured: {0}")]
    NotConfigured(String),

    #[error("rate limited: {0}")]
    RateLimited(String),

    #[error("quota exceeded: {0}")]
    QuotaExceeded(String),

    #[error("permission denied: {0}")]
    PermissionDenied(String),

    #[error("transient network error: {0}")]
    TransientNetworkError(String),

    #[error("unsupported: {0}")]
    Unsupported(String),

    #[error("invalid media: {0}")]
    InvalidMedia(String),

    #[error("unknown error: {0}")]
    UnknownError(String),
}

impl PublishFailure {
    /// Whether retrying without user action can succeed.
    pub const fn is_retryable(&self) -> bool {
        !matches!(
            self,
            PublishFailure::NotConfigured(_)
                | PublishFailure::Unsupported(_)
                | PublishFailure::InvalidMedia(_)
        )
    }

    pub const fn category(&self) -> &'static str {
        match self {
            PublishFailure::NotConfigured(_) => "not_configured",
            PublishFailure::RateLimited(_) => "rate_limited",
            PublishFailure::QuotaExceeded(_) => "quota_exceeded",
            PublishFailure::PermissionDenied(_) => "permission_denied",
            PublishFailure::TransientNetworkError(_) => "transient_network",
            PublishFailure::Unsupported(_) => "unsupported",
            PublishFailure::InvalidMedia(_) => "invalid_media",
            PublishFailure::UnknownError(_) => "unknown",
        }
    }

    pub fn detail(&self) -> &str {
        match self {
            PublishFailure::NotConfigured(d)
            | PublishFailure::RateLimited(d)
            | PublishFailure::QuotaExceeded(d)
            | PublishFailure::PermissionDenied(d)
            | PublishFailure::TransientNetworkError(d)
            | PublishFailure::Unsupported(d)
            | PublishFailure::InvalidMedia(d)
            | PublishFailure::UnknownError(d) => d,
        }
    }

    /// Notice text shown to the user for this failure.
    pub fn user_message(&self, platform: Platform) -> String {
        match (self, platform) {
            (PublishFailure::NotConfigured(_), _) => {
                format!("{platform} credentials not configured. Please configure in Settings first.")
            }
            (PublishFailure::QuotaExceeded(_), Platform::YouTube) => {
                "YouTube daily upload limit reached. Please try again tomorrow.".to_string()
            }
            (PublishFailure::PermissionDenied(_), Platform::Facebook) => {
                "Facebook permissions error: Require pages_manage_posts and \
                 pages_read_engagement with a Page access token (and app installed). \
                 Update token in Settings and try again."
                    .to_string()
            }
            (PublishFailure::Unsupported(_), _) => {
                format!("Publishing to {platform} is not supported yet.")
            }
            (PublishFailure::InvalidMedia(_), Platform::YouTube) => {
                "YouTube requires a video file.".to_string()
            }
            (failure, _) => format!("Failed to upload to {platform}. {}", failure.detail()),
        }
    }
}
