//! Tracing initialisation and scheduler metrics.

pub mod metrics;

use postdeck_domain::{LoggingConfig, PostdeckError, Result};
use tracing_subscriber::EnvFilter;

pub use metrics::{SchedulerMetrics, SchedulerMetricsSnapshot};

/// Install the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over `logging.level`. Returns an error if a
/// subscriber is already installed or the filter cannot be parsed.
pub fn init_tracing(config: &LoggingConfig) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(config.level.trim())
            .map_err(|e| PostdeckError::Config(format!("Invalid log level '{}': {e}", config.level)))?,
    };

    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(true);
    let installed = if config.json {
        builder.json().with_current_span(true).try_init()
    } else {
        builder.try_init()
    };

    installed.map_err(|e| PostdeckError::Internal(format!("Failed to install tracing subscriber: {e}")))
}
