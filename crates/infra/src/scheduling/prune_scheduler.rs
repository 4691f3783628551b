//! Prune scheduler: drops calendar days before today on a fixed interval.

use std::sync::Arc;

use chrono_tz::Tz;
use postdeck_core::{PruneReport, SchedulingService};
use tracing::{debug, info, instrument, warn};

use crate::observability::SchedulerMetrics;
use crate::scheduling::error::SchedulerResult;
use crate::scheduling::runner::{TickLoop, TickSchedulerConfig};

#[derive(Clone)]
struct PruneContext {
    service: Arc<SchedulingService>,
    tz: Tz,
    config: TickSchedulerConfig,
    metrics: Arc<SchedulerMetrics>,
}

impl PruneContext {
    async fn tick(&self) -> Option<PruneReport> {
        let service = Arc::clone(&self.service);
        let tz = self.tz;
        // Pruning persists synchronously under the store lock
        let work = tokio::task::spawn_blocking(move || service.run_prune(tz));

        match tokio::time::timeout(self.config.tick_timeout, work).await {
            Ok(Ok(report)) => {
                self.metrics.record_prune(&report);
                debug!(today = %report.today, days_removed = report.days_removed, "Prune tick finished");
                Some(report)
            }
            Ok(Err(err)) => {
                warn!(error = %err, "Prune tick task failed");
                None
            }
            Err(_) => {
                self.metrics.record_timeout();
                warn!(timeout_secs = self.config.tick_timeout.as_secs(), "Prune tick timed out");
                None
            }
        }
    }
}

/// Periodic prune with explicit lifecycle management.
pub struct PruneScheduler {
    context: PruneContext,
    runner: TickLoop,
}

impl PruneScheduler {
    pub fn new(
        service: Arc<SchedulingService>,
        tz: Tz,
        config: TickSchedulerConfig,
        metrics: Arc<SchedulerMetrics>,
    ) -> Self {
        Self {
            context: PruneContext { service, tz, config, metrics },
            runner: TickLoop::new("prune"),
        }
    }

    #[instrument(skip(self))]
    pub async fn start(&mut self) -> SchedulerResult<()> {
        let context = self.context.clone();
        self.runner.start(self.context.config.interval, move || {
            let context = context.clone();
            async move {
                context.tick().await;
            }
        })?;
        info!(interval_secs = self.context.config.interval.as_secs(), "Prune scheduler started");
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn stop(&mut self) -> SchedulerResult<()> {
        self.runner.stop(self.context.config.join_timeout).await?;
        info!("Prune scheduler stopped");
        Ok(())
    }

    pub fn is_running(&self) -> bool {
        self.runner.is_running()
    }

    /// Run one tick now, outside the interval. Returns `None` on timeout.
    pub async fn run_tick(&self) -> Option<PruneReport> {
        self.context.tick().await
    }
}
