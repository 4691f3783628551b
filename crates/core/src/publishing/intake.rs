//! Upload intake: type-check picked files for a platform, then upload them.

use std::sync::Arc;

use postdeck_domain::{MediaKind, Platform};
use tracing::{debug, warn};

use super::ports::{MediaFile, MediaUploader};
use crate::scheduling::errors::IntentError;
use crate::scheduling::validation::validate_media_type;

/// A file that has been stored by the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedMedia {
    pub file_name: String,
    pub media_path: String,
    pub kind: MediaKind,
}

pub struct MediaIntake {
    uploader: Arc<dyn MediaUploader>,
}

impl MediaIntake {
    pub fn new(uploader: Arc<dyn MediaUploader>) -> Self {
        Self { uploader }
    }

    /// Upload `files` for `platform`.
    ///
    /// Every file is type-checked before the first upload starts, so a
    /// disallowed file rejects the whole batch without any network I/O.
    pub async fn upload_for(
        &self,
        platform: Platform,
        files: Vec<MediaFile>,
    ) -> Result<Vec<UploadedMedia>, IntentError> {
        let kinds = files
            .iter()
            .map(|file| validate_media_type(platform, &file.mime))
            .collect::<Result<Vec<_>, _>>()?;

        let mut uploaded = Vec::with_capacity(files.len());
        for (file, kind) in files.into_iter().zip(kinds) {
            let file_name = file.file_name.clone();
            let media_path = self.uploader.upload(file).await.map_err(|err| {
                warn!(%platform, file = %file_name, error = %err, "Media upload failed");
                IntentError::Upload(err.to_string())
            })?;
            debug!(%platform, file = %file_name, path = %media_path, "Media uploaded");
            uploaded.push(UploadedMedia { file_name, media_path, kind });
        }
        Ok(uploaded)
    }
}
