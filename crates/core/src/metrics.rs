//! Prometheus metrics for trending jobs.
//!
//! Metrics are registered with the server's registry through [`all_metrics`].

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts};

// =============================================================================
// Job runs
// =============================================================================

/// Job runs total by job and result.
pub static JOB_RUNS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("readtrend_job_runs_total", "Total trending job runs"),
        &["job", "result"], // result: "success", "failed"
    )
    .unwrap()
});

/// Job duration in seconds.
pub static JOB_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new("readtrend_job_duration_seconds", "Duration of trending job runs")
            .buckets(vec![0.01, 0.05, 0.1, 0.5, 1.0, 5.0, 30.0, 60.0, 300.0, 540.0]),
        &["job"],
    )
    .unwrap()
});

// =============================================================================
// Job output
// =============================================================================

/// Search events read by aggregation runs.
pub static EVENTS_SCANNED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "readtrend_events_scanned_total",
        "Total search events scanned by aggregation",
    )
    .unwrap()
});

/// Catalog entries written by job.
pub static ENTRIES_UPDATED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "readtrend_entries_updated_total",
            "Total catalog entries written by trending jobs",
        ),
        &["job"], // "aggregation", "decay"
    )
    .unwrap()
});

/// Search events removed by retention.
pub static EVENTS_DELETED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "readtrend_events_deleted_total",
        "Total expired search events deleted",
    )
    .unwrap()
});

/// Club pool writes by result.
pub static CLUB_WRITES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("readtrend_club_writes_total", "Total club trending pool writes"),
        &["result"],
    )
    .unwrap()
});

// =============================================================================
// Ingest
// =============================================================================

/// Search events recorded.
pub static SEARCH_EVENTS_RECORDED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "readtrend_search_events_recorded_total",
        "Total search events recorded",
    )
    .unwrap()
});

/// Get all core metrics for registration.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        Box::new(JOB_RUNS.clone()),
        Box::new(JOB_DURATION.clone()),
        Box::new(EVENTS_SCANNED.clone()),
        Box::new(ENTRIES_UPDATED.clone()),
        Box::new(EVENTS_DELETED.clone()),
        Box::new(CLUB_WRITES.clone()),
        Box::new(SEARCH_EVENTS_RECORDED.clone()),
    ]
}
