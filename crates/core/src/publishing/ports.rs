//! Port interfaces for the external backend
//!
//! These traits define the boundaries between the scheduling core and the
//! HTTP adapters in `postdeck-infra`.

use async_trait::async_trait;
use postdeck_domain::{PublishFailure, PublishReceipt, PublishRequest, Result};

/// Posts content to a platform through the backend.
///
/// Implementations resolve platform credentials themselves and report every
/// failure as a [`PublishFailure`]; they never panic or retry internally on
/// `NotConfigured`.
#[async_trait]
pub trait PublishGateway: Send + Sync {
    async fn publish(&self, request: PublishRequest) -> std::result::Result<PublishReceipt, PublishFailure>;
}

/// A local file picked for upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaFile {
    pub file_name: String,
    pub mime: String,
    pub bytes: Vec<u8>,
}

/// Stores media on the backend.
#[async_trait]
pub trait MediaUploader: Send + Sync {
    /// Upload a file and return the backend's opaque path for it.
    async fn upload(&self, file: MediaFile) -> Result<String>;
}
