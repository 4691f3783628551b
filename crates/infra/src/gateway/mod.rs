//! HTTP adapters for the publish and upload ports.

mod backend;
mod classify;
mod uploader;

pub use backend::BackendPublishGateway;
pub use uploader::BackendMediaUploader;
