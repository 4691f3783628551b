//! Platform rules for uploads and scheduled items, driven by the capability
//! table.

use postdeck_domain::{MediaKind, Platform, ScheduledItem, ValidationError};

/// Check a picked file's MIME type against what `platform` accepts.
pub fn validate_media_type(platform: Platform, mime: &str) -> Result<MediaKind, ValidationError> {
    MediaKind::from_mime(mime)
        .filter(|kind| platform.capabilities().allowed_media.contains(kind))
        .ok_or_else(|| ValidationError::MediaTypeNotAllowed { platform, media: mime.to_string() })
}

/// Check that `item` carries the content `platform` needs.
///
/// Media paths are opaque backend references. Unless the platform demands a
/// specific extension, a path whose extension does not reveal the kind is
/// accepted as is.
pub fn validate_item(platform: Platform, item: &ScheduledItem) -> Result<(), ValidationError> {
    let caps = platform.capabilities();

    match item.media_path.as_deref() {
        Some(path) if !platform.accepts_path(path) => {
            Err(ValidationError::MediaTypeNotAllowed { platform, media: path.to_string() })
        }
        Some(_) => Ok(()),
        None if caps.requires_video => Err(ValidationError::MediaRequired { platform }),
        None if caps.allows_text_only && item.has_text() => Ok(()),
        None => Err(ValidationError::ContentRequired { platform }),
    }
}
