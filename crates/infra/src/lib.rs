//! # Postdeck Infrastructure
//!
//! Infrastructure implementations of core ports.
//!
//! This crate contains:
//! - Key-value stores (JSON file, SQLite, in-memory)
//! - HTTP client and backend adapters (publish gateway, media uploader)
//! - Per-platform credential records
//! - Configuration loading
//! - Interval schedulers for the due-scan and prune ticks
//! - Tracing initialisation and scheduler metrics
//!
//! ## Architecture
//! - Implements traits defined in `postdeck-core`
//! - Contains all "impure" code (I/O, network, timers)

pub mod config;
pub mod credentials;
pub mod errors;
pub mod gateway;
pub mod http;
pub mod observability;
pub mod scheduling;
pub mod storage;

// Re-export commonly used items
pub use credentials::{CredentialStore, FacebookConfig, LinkedInConfig};
pub use errors::InfraError;
pub use gateway::{BackendMediaUploader, BackendPublishGateway};
pub use http::HttpClient;
pub use storage::{open_store, JsonFileStore, MemoryKeyValueStore, SqliteKeyValueStore};
