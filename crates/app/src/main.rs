//! Postdeck - headless scheduling runner
//!
//! Loads configuration, wires the calendar store, scheduling engine and
//! backend adapters, then runs the due-scan and prune ticks until Ctrl-C.

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use postdeck_core::{CalendarStore, SchedulingService, TimezoneResolver};
use postdeck_domain::AppConfig;
use postdeck_infra::observability::{init_tracing, SchedulerMetrics};
use postdeck_infra::scheduling::{DueScanScheduler, PruneScheduler, TickSchedulerConfig};
use postdeck_infra::{config, open_store, BackendPublishGateway, CredentialStore, HttpClient};
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> ExitCode {
    let config = match config::load() {
        Ok(config) => config,
        Err(err) => {
            // Tracing is not installed yet
            eprintln!("postdeck: failed to load configuration: {err}");
            return ExitCode::FAILURE;
        }
    };

    if let Err(err) = init_tracing(&config.logging) {
        eprintln!("postdeck: {err}");
        return ExitCode::FAILURE;
    }

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("Postdeck stopped with an error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(config: AppConfig) -> anyhow::Result<()> {
    let tz = config.calendar.timezone().context("invalid calendar timezone")?;

    let kv = open_store(&config.storage).context("failed to open local store")?;
    let store = Arc::new(CalendarStore::load(Arc::clone(&kv)));
    info!(
        backend = ?config.storage.backend,
        path = %config.storage.path,
        items = store.snapshot().item_count(),
        "Calendar loaded"
    );

    let http = HttpClient::from_config(&config.backend).context("failed to build HTTP client")?;
    let credentials = CredentialStore::new(kv);
    let gateway = BackendPublishGateway::new(http, &config.backend.base_url, credentials)
        .context("invalid backend configuration")?;

    let service = Arc::new(SchedulingService::new(
        Arc::clone(&store),
        Arc::new(gateway),
        TimezoneResolver::default(),
    ));

    if !config.scheduler.enabled {
        warn!("Background scheduler disabled; nothing will be auto-posted");
        tokio::signal::ctrl_c().await.context("failed to listen for Ctrl-C")?;
        return Ok(());
    }

    let metrics = Arc::new(SchedulerMetrics::new());
    let mut due_scan = DueScanScheduler::new(
        Arc::clone(&service),
        tz,
        TickSchedulerConfig::due_scan(&config.scheduler),
        Arc::clone(&metrics),
    );
    let mut prune = PruneScheduler::new(
        Arc::clone(&service),
        tz,
        TickSchedulerConfig::prune(&config.scheduler),
        Arc::clone(&metrics),
    );

    prune.start().await.context("failed to start prune scheduler")?;
    due_scan.start().await.context("failed to start due-scan scheduler")?;
    info!(timezone = %tz, backend = %config.backend.base_url, "Postdeck running; press Ctrl-C to stop");

    tokio::signal::ctrl_c().await.context("failed to listen for Ctrl-C")?;
    info!("Shutting down");

    let due_scan_stopped = due_scan.stop().await;
    let prune_stopped = prune.stop().await;
    info!(metrics = ?metrics.snapshot(), "Schedulers stopped");

    if let Some(err) = store.last_persist_error() {
        warn!(error = %err, "Last calendar write failed; recent changes may not be on disk");
    }

    due_scan_stopped.context("due-scan scheduler did not stop cleanly")?;
    prune_stopped.context("prune scheduler did not stop cleanly")?;
    Ok(())
}
