//! Interval loop shared by the tick schedulers.
//!
//! Owns the cancellation token and join handle so each scheduler only
//! supplies the work done per tick.

use std::future::Future;
use std::time::Duration;

use postdeck_domain::SchedulerConfig;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::scheduling::error::{SchedulerError, SchedulerResult};

/// Timing for one periodic tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickSchedulerConfig {
    /// Time between tick starts. The first tick runs immediately.
    pub interval: Duration,
    /// Upper bound for a single tick.
    pub tick_timeout: Duration,
    /// How long `stop` waits for the loop task to finish.
    pub join_timeout: Duration,
}

impl Default for TickSchedulerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(30),
            tick_timeout: Duration::from_secs(300),
            join_timeout: Duration::from_secs(5),
        }
    }
}

impl TickSchedulerConfig {
    pub fn due_scan(config: &SchedulerConfig) -> Self {
        Self {
            interval: config.due_scan_interval(),
            tick_timeout: config.tick_timeout(),
            ..Self::default()
        }
    }

    pub fn prune(config: &SchedulerConfig) -> Self {
        Self { interval: config.prune_interval(), tick_timeout: config.tick_timeout(), ..Self::default() }
    }
}

#[derive(Debug)]
pub(crate) struct TickLoop {
    name: &'static str,
    cancellation: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl TickLoop {
    pub(crate) fn new(name: &'static str) -> Self {
        Self { name, cancellation: CancellationToken::new(), handle: None }
    }

    pub(crate) fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Spawn the loop. `tick` is awaited to completion before the next
    /// interval is considered, so ticks of one loop never overlap.
    pub(crate) fn start<F, Fut>(&mut self, interval: Duration, mut tick: F) -> SchedulerResult<()>
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send,
    {
        if self.is_running() {
            return Err(SchedulerError::AlreadyRunning);
        }

        // Fresh token so the loop can be restarted after stop
        self.cancellation = CancellationToken::new();
        let cancel = self.cancellation.clone();
        let name = self.name;

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    () = cancel.cancelled() => {
                        debug!(scheduler = name, "Tick loop cancelled");
                        break;
                    }
                    _ = ticker.tick() => tick().await,
                }
            }
        });

        self.handle = Some(handle);
        Ok(())
    }

    pub(crate) async fn stop(&mut self, join_timeout: Duration) -> SchedulerResult<()> {
        let Some(handle) = self.handle.take() else {
            return Err(SchedulerError::NotRunning);
        };

        self.cancellation.cancel();
        tokio::time::timeout(join_timeout, handle)
            .await
            .map_err(|source| SchedulerError::Timeout { duration: join_timeout, source })??;
        Ok(())
    }
}

impl Drop for TickLoop {
    fn drop(&mut self) {
        self.cancellation.cancel();
    }
}
