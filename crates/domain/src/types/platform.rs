//! Target platforms and their capability table.
//!
//! Every platform-specific decision (allowed upload types, whether a video is
//! mandatory, whether privacy applies, whether the backend can publish) reads
//! from [`PlatformCapabilities`] instead of comparing platform names.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::ValidationError;

/// A social platform the scheduler can target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Platform {
    YouTube,
    Facebook,
    TikTok,
    LinkedIn,
}

/// Kind of uploaded media.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Video,
    Image,
}

/// Static description of what a platform accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlatformCapabilities {
    /// Media kinds the upload picker may offer.
    pub allowed_media: &'static [MediaKind],
    /// A video must be attached to every post.
    pub requires_video: bool,
    /// Posts without media are accepted when they carry text.
    pub allows_text_only: bool,
    /// The public/private/unlisted setting is forwarded on publish.
    pub supports_privacy: bool,
    /// The backend exposes a publish endpoint for this platform.
    pub publishable: bool,
    /// Stored media paths must carry this extension.
    pub required_extension: Option<&'static str>,
}

const VIDEO_ONLY: &[MediaKind] = &[MediaKind::Video];
const IMAGE_OR_VIDEO: &[MediaKind] = &[MediaKind::Video, MediaKind::Image];

const CAPABILITIES: [PlatformCapabilities; 4] = [
    // YouTube
    PlatformCapabilities {
        allowed_media: VIDEO_ONLY,
        requires_video: true,
        allows_text_only: false,
        supports_privacy: true,
        publishable: true,
        required_extension: Some("mp4"),
    },
    // Facebook
    PlatformCapabilities {
        allowed_media: IMAGE_OR_VIDEO,
        requires_video: false,
        allows_text_only: true,
        supports_privacy: false,
        publishable: true,
        required_extension: None,
    },
    // TikTok
    PlatformCapabilities {
        allowed_media: VIDEO_ONLY,
        requires_video: true,
        allows_text_only: false,
        supports_privacy: false,
        publishable: false,
        required_extension: None,
    },
    // LinkedIn
    PlatformCapabilities {
        allowed_media: IMAGE_OR_VIDEO,
        requires_video: false,
        allows_text_only: true,
        supports_privacy: false,
        publishable: true,
        required_extension: None,
    },
];

impl Platform {
    /// Fixed platform set, in persisted-record order.
    pub const ALL: [Platform; 4] =
        [Platform::YouTube, Platform::Facebook, Platform::TikTok, Platform::LinkedIn];

    pub const fn index(self) -> usize {
        match self {
            Platform::YouTube => 0,
            Platform::Facebook => 1,
            Platform::TikTok => 2,
            Platform::LinkedIn => 3,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Platform::YouTube => "YouTube",
            Platform::Facebook => "Facebook",
            Platform::TikTok => "TikTok",
            Platform::LinkedIn => "LinkedIn",
        }
    }

    pub const fn capabilities(self) -> &'static PlatformCapabilities {
        &CAPABILITIES[self.index()]
    }

    /// Whether an upload with the given MIME type may be attached.
    pub fn accepts_mime(self, mime: &str) -> bool {
        MediaKind::from_mime(mime)
            .is_some_and(|kind| self.capabilities().allowed_media.contains(&kind))
    }

    /// Whether a stored media path is one this platform can publish.
    pub fn accepts_path(self, path: &str) -> bool {
        let caps = self.capabilities();
        match caps.required_extension {
            Some(required) => path
                .rsplit_once('.')
                .is_some_and(|(_, ext)| ext.eq_ignore_ascii_case(required)),
            None => MediaKind::from_path(path).map_or(true, |kind| caps.allowed_media.contains(&kind)),
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Platform::ALL
            .into_iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ValidationError::InvalidPlatform(s.to_string()))
    }
}

impl MediaKind {
    pub fn from_mime(mime: &str) -> Option<Self> {
        let mime = mime.trim().to_ascii_lowercase();
        if mime.starts_with("video/") {
            Some(MediaKind::Video)
        } else if mime.starts_with("image/") {
            Some(MediaKind::Image)
        } else {
            None
        }
    }

    /// Infers the kind of a stored media path from its extension.
    pub fn from_path(path: &str) -> Option<Self> {
        let ext = path.rsplit_once('.')?.1.to_ascii_lowercase();
        match ext.as_str() {
            "mp4" | "mov" | "webm" | "mkv" | "m4v" | "avi" => Some(MediaKind::Video),
            "jpg" | "jpeg" | "png" | "gif" | "webp" | "bmp" => Some(MediaKind::Image),
            _ => None,
        }
    }
}
