//! Counters for the background due-scan and prune loops.
//!
//! Counters are independent, so `Relaxed` ordering is enough; a snapshot may
//! mix values from adjacent ticks.

use std::sync::atomic::{AtomicU64, Ordering};

use postdeck_core::{DueScanReport, PruneReport};
use serde::Serialize;

#[derive(Debug, Default)]
pub struct SchedulerMetrics {
    due_scan_ticks: AtomicU64,
    prune_ticks: AtomicU64,
    skipped_overlap: AtomicU64,
    published: AtomicU64,
    failed: AtomicU64,
    pruned_days: AtomicU64,
    tick_timeouts: AtomicU64,
}

/// Point-in-time copy of [`SchedulerMetrics`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SchedulerMetricsSnapshot {
    pub due_scan_ticks: u64,
    pub prune_ticks: u64,
    pub skipped_overlap: u64,
    pub published: u64,
    pub failed: u64,
    pub pruned_days: u64,
    pub tick_timeouts: u64,
}

impl SchedulerMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_due_scan(&self, report: &DueScanReport) {
        self.due_scan_ticks.fetch_add(1, Ordering::Relaxed);
        if report.skipped {
            self.skipped_overlap.fetch_add(1, Ordering::Relaxed);
        }
        self.published.fetch_add(as_u64(report.posted), Ordering::Relaxed);
        self.failed.fetch_add(as_u64(report.failed), Ordering::Relaxed);
    }

    pub fn record_prune(&self, report: &PruneReport) {
        self.prune_ticks.fetch_add(1, Ordering::Relaxed);
        if report.skipped {
            self.skipped_overlap.fetch_add(1, Ordering::Relaxed);
        }
        self.pruned_days.fetch_add(as_u64(report.days_removed), Ordering::Relaxed);
    }

    pub fn record_timeout(&self) {
        self.tick_timeouts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> SchedulerMetricsSnapshot {
        SchedulerMetricsSnapshot {
            due_scan_ticks: self.due_scan_ticks.load(Ordering::Relaxed),
            prune_ticks: self.prune_ticks.load(Ordering::Relaxed),
            skipped_overlap: self.skipped_overlap.load(Ordering::Relaxed),
            published: self.published.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            pruned_days: self.pruned_days.load(Ordering::Relaxed),
            tick_timeouts: self.tick_timeouts.load(Ordering::Relaxed),
        }
    }
}

fn as_u64(n: usize) -> u64 {
    u64::try_from(n).unwrap_or(u64::MAX)
}
