//! Errors returned to the presentation layer for user intents.

use postdeck_domain::{Platform, PostdeckError, PublishFailure, ValidationError};
use thiserror::Error;

use crate::calendar::StoreError;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IntentError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("this post was already published and can no longer be changed")]
    AlreadyPosted,

    #[error("scheduled post not found")]
    NotFound,

    #[error("this post is being published right now")]
    PublishInFlight,

    #[error("{platform} is not configured: {detail}")]
    NotConfigured { platform: Platform, detail: String },

    #[error("publishing to {platform} failed: {failure}")]
    Publish { platform: Platform, failure: PublishFailure },

    #[error("media upload failed: {0}")]
    Upload(String),
}

impl IntentError {
    pub(crate) fn from_failure(platform: Platform, failure: PublishFailure) -> Self {
        match failure {
            PublishFailure::NotConfigured(detail) => IntentError::NotConfigured { platform, detail },
            failure => IntentError::Publish { platform, failure },
        }
    }

    /// Inline text for the presentation layer.
    pub fn user_message(&self) -> String {
        match self {
            IntentError::NotConfigured { platform, detail } => {
                PublishFailure::NotConfigured(detail.clone()).user_message(*platform)
            }
            IntentError::Publish { platform, failure } => failure.user_message(*platform),
            other => other.to_string(),
        }
    }
}

impl From<StoreError> for IntentError {
    fn from(_: StoreError) -> Self {
        IntentError::NotFound
    }
}

impl From<IntentError> for PostdeckError {
    fn from(err: IntentError) -> Self {
        match err {
            IntentError::Validation(inner) => inner.into(),
            IntentError::AlreadyPosted | IntentError::PublishInFlight => {
                PostdeckError::Conflict(err.to_string())
            }
            IntentError::NotFound => PostdeckError::NotFound(err.to_string()),
            IntentError::NotConfigured { .. } => PostdeckError::Config(err.to_string()),
            IntentError::Publish { .. } | IntentError::Upload(_) => {
                PostdeckError::Network(err.to_string())
            }
        }
    }
}
