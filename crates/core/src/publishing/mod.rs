//! Publish gateway and media upload boundaries.

pub mod intake;
pub mod ports;

pub use intake::{MediaIntake, UploadedMedia};
pub use ports::{MediaFile, MediaUploader, PublishGateway};
