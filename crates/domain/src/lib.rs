//! # Postdeck Domain
//!
//! Business domain types and models for Postdeck.
//!
//! This crate contains:
//! - Scheduling data types (ScheduledItem, CalendarDay, PlatformCalendars)
//! - The closed `Platform` enumeration and its capability table
//! - Domain error types and Result definitions
//! - Configuration structures
//! - Domain constants
//!
//! ## Architecture
//! - No dependencies on other Postdeck crates
//! - Only external dependencies allowed
//! - Pure domain models and data structures

pub mod config;
pub mod constants;
pub mod errors;
pub mod types;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;
