//! Due-scan scheduler: publishes today's due items on a fixed interval.
//!
//! Every completed tick is counted in [`SchedulerMetrics`] and broadcast to
//! subscribers. A tick that exceeds `tick_timeout` is abandoned; items it did
//! not reach stay unposted and are retried on the next tick.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use postdeck_core::SchedulingService;
//! use postdeck_infra::observability::SchedulerMetrics;
//! use postdeck_infra::scheduling::{DueScanScheduler, SchedulerResult, TickSchedulerConfig};
//!
//! # async fn example(service: Arc<SchedulingService>) -> SchedulerResult<()> {
//! let metrics = Arc::new(SchedulerMetrics::new());
//! let mut scheduler =
//!     DueScanScheduler::new(service, chrono_tz::UTC, TickSchedulerConfig::default(), metrics);
//! let mut reports = scheduler.subscribe();
//!
//! scheduler.start().await?;
//! let report = reports.recv().await;
//! scheduler.stop().await?;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;
use std::time::Instant;

use chrono_tz::Tz;
use postdeck_core::{DueScanReport, SchedulingService};
use tokio::sync::broadcast;
use tracing::{debug, info, instrument, warn};

use crate::observability::SchedulerMetrics;
use crate::scheduling::error::SchedulerResult;
use crate::scheduling::runner::{TickLoop, TickSchedulerConfig};

const REPORT_CHANNEL_CAPACITY: usize = 32;

/// State cloned into the loop task.
#[derive(Clone)]
struct DueScanContext {
    service: Arc<SchedulingService>,
    tz: Tz,
    config: TickSchedulerConfig,
    metrics: Arc<SchedulerMetrics>,
    reports: broadcast::Sender<DueScanReport>,
}

impl DueScanContext {
    async fn tick(&self) -> Option<DueScanReport> {
        let started = Instant::now();
        match tokio::time::timeout(self.config.tick_timeout, self.service.run_due_scan(self.tz))
            .await
        {
            Ok(report) => {
                self.metrics.record_due_scan(&report);
                debug!(
                    date = %report.date,
                    attempted = report.attempted,
                    elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
                    "Due-scan tick finished"
                );
                if self.reports.send(report.clone()).is_err() {
                    debug!("No due-scan report subscribers");
                }
                Some(report)
            }
            Err(_) => {
                self.metrics.record_timeout();
                warn!(timeout_secs = self.config.tick_timeout.as_secs(), "Due-scan tick timed out");
                None
            }
        }
    }
}

/// Periodic due-scan with explicit lifecycle management.
pub struct DueScanScheduler {
    context: DueScanContext,
    runner: TickLoop,
}

impl DueScanScheduler {
    pub fn new(
        service: Arc<SchedulingService>,
        tz: Tz,
        config: TickSchedulerConfig,
        metrics: Arc<SchedulerMetrics>,
    ) -> Self {
        let (reports, _) = broadcast::channel(REPORT_CHANNEL_CAPACITY);
        Self {
            context: DueScanContext { service, tz, config, metrics, reports },
            runner: TickLoop::new("due_scan"),
        }
    }

    /// Receive a copy of every completed tick report.
    pub fn subscribe(&self) -> broadcast::Receiver<DueScanReport> {
        self.context.reports.subscribe()
    }

    /// Start the background loop.
    ///
    /// # Errors
    ///
    /// Returns error if scheduler is already running
    #[instrument(skip(self))]
    pub async fn start(&mut self) -> SchedulerResult<()> {
        let context = self.context.clone();
        self.runner.start(self.context.config.interval, move || {
            let context = context.clone();
            async move {
                context.tick().await;
            }
        })?;
        info!(interval_secs = self.context.config.interval.as_secs(), "Due-scan scheduler started");
        Ok(())
    }

    /// Stop the loop and wait for it to finish.
    ///
    /// # Errors
    ///
    /// Returns error if scheduler is not running or the loop does not exit
    /// within the join timeout
    #[instrument(skip(self))]
    pub async fn stop(&mut self) -> SchedulerResult<()> {
        self.runner.stop(self.context.config.join_timeout).await?;
        info!("Due-scan scheduler stopped");
        Ok(())
    }

    pub fn is_running(&self) -> bool {
        self.runner.is_running()
    }

    /// Run one tick now, outside the interval. Returns `None` on timeout.
    pub async fn run_tick(&self) -> Option<DueScanReport> {
        self.context.tick().await
    }
}
