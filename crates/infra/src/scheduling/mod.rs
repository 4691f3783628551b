//! Interval schedulers for the background ticks
//!
//! - Due-scan scheduler (publishes today's due items, broadcasts reports)
//! - Prune scheduler (drops past calendar days)
//!
//! Both follow the same lifecycle rules:
//! - Explicit start/stop
//! - Join handles for spawned tasks
//! - Cancellation token support
//! - Timeout wrapping on every tick

pub mod due_scan_scheduler;
pub mod error;
pub mod prune_scheduler;
mod runner;

pub use due_scan_scheduler::DueScanScheduler;
pub use error::{SchedulerError, SchedulerResult};
pub use prune_scheduler::PruneScheduler;
pub use runner::TickSchedulerConfig;
