//! Prometheus metrics for observability.
//!
//! This module provides metrics for monitoring the readtrend server:
//! - HTTP request metrics (latency, counts, in flight)
//! - Scheduler status and event store size (collected dynamically)
//! - Trending job metrics registered from the core crate

use once_cell::sync::Lazy;
use prometheus::{
    self, Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};
use readtrend_core::EventStore;

/// Global metrics registry.
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    register_metrics(&registry);
    registry
});

// =============================================================================
// HTTP Request Metrics
// =============================================================================

/// HTTP request duration in seconds.
pub static HTTP_REQUEST_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "readtrend_http_request_duration_seconds",
            "HTTP request duration in seconds",
        )
        .buckets(vec![
            0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
        ]),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests total count.
pub static HTTP_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("readtrend_http_requests_total", "Total HTTP requests"),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests currently in flight.
pub static HTTP_REQUESTS_IN_FLIGHT: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "readtrend_http_requests_in_flight",
        "Number of HTTP requests currently being processed",
    )
    .unwrap()
});

// =============================================================================
// Scheduler & Store Metrics
// =============================================================================

/// Whether the daily scheduler is running (1) or not (0).
pub static SCHEDULER_RUNNING: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "readtrend_scheduler_running",
        "Whether the job scheduler is running",
    )
    .unwrap()
});

/// Stored search events.
pub static EVENT_STORE_SIZE: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "readtrend_search_events_stored",
        "Number of search events currently stored",
    )
    .unwrap()
});

// =============================================================================
// Registration
// =============================================================================

fn register_metrics(registry: &Registry) {
    // HTTP
    registry
        .register(Box::new(HTTP_REQUEST_DURATION.clone()))
        .unwrap();
    registry
        .register(Box::new(HTTP_REQUESTS_TOTAL.clone()))
        .unwrap();
    registry
        .register(Box::new(HTTP_REQUESTS_IN_FLIGHT.clone()))
        .unwrap();

    // Scheduler and store
    registry
        .register(Box::new(SCHEDULER_RUNNING.clone()))
        .unwrap();
    registry
        .register(Box::new(EVENT_STORE_SIZE.clone()))
        .unwrap();

    // Core metrics (jobs, ingest)
    for metric in readtrend_core::metrics::all_metrics() {
        registry.register(metric).unwrap();
    }
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!("Failed to encode metrics: {}", e);
    }
    String::from_utf8_lossy(&buffer).into_owned()
}

/// Collect dynamic metrics from current application state.
///
/// Called before encoding so gauges reflect the current scheduler and store.
pub async fn collect_dynamic_metrics(state: &crate::state::AppState) {
    let running = state
        .scheduler()
        .map(|scheduler| scheduler.is_running())
        .unwrap_or(false);
    SCHEDULER_RUNNING.set(if running { 1 } else { 0 });

    match state.events().count().await {
        Ok(count) => EVENT_STORE_SIZE.set(count as i64),
        Err(e) => tracing::warn!("Failed to count search events: {}", e),
    }
}

static SLUG_SEGMENT: Lazy<regex_lite::Regex> =
    Lazy::new(|| regex_lite::Regex::new(r"^/api/v1/(books|clubs|jobs)/([^/]+)").unwrap());

/// Normalize a path for metric labels (replace IDs with placeholders).
pub fn normalize_path(path: &str) -> String {
    match SLUG_SEGMENT.captures(path) {
        // Keep the fixed sub-resources readable
        Some(caps) if &caps[2] == "trending" || &caps[2] == "schedule" => path.to_string(),
        Some(caps) => {
            let placeholder = match &caps[1] {
                "books" => "{slug}",
                "clubs" => "{id}",
                _ => "{job}",
            };
            let rest = &path[caps[0].len()..];
            format!("/api/v1/{}/{}{}", &caps[1], placeholder, rest)
        }
        None => path.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path_book_slug() {
        assert_eq!(normalize_path("/api/v1/books/dune"), "/api/v1/books/{slug}");
    }

    #[test]
    fn test_normalize_path_club_id() {
        assert_eq!(normalize_path("/api/v1/clubs/club-42"), "/api/v1/clubs/{id}");
    }

    #[test]
    fn test_normalize_path_job_run() {
        assert_eq!(
            normalize_path("/api/v1/jobs/decay/run"),
            "/api/v1/jobs/{job}/run"
        );
    }

    #[test]
    fn test_normalize_path_fixed_segments() {
        assert_eq!(
            normalize_path("/api/v1/books/trending"),
            "/api/v1/books/trending"
        );
        assert_eq!(
            normalize_path("/api/v1/jobs/schedule"),
            "/api/v1/jobs/schedule"
        );
    }

    #[test]
    fn test_normalize_path_no_ids() {
        assert_eq!(normalize_path("/api/v1/health"), "/api/v1/health");
        assert_eq!(normalize_path("/api/v1/clubs"), "/api/v1/clubs");
    }

    #[test]
    fn test_encode_metrics_returns_prometheus_format() {
        HTTP_REQUESTS_TOTAL
            .with_label_values(&["GET", "/test", "200"])
            .inc();

        let output = encode_metrics();
        assert!(output.contains("readtrend_http_requests_total"));
        assert!(output.contains("# HELP"));
        assert!(output.contains("# TYPE"));
    }

    #[test]
    fn test_registry_contains_core_metrics() {
        readtrend_core::metrics::JOB_RUNS
            .with_label_values(&["decay", "success"])
            .inc();
        readtrend_core::metrics::EVENTS_DELETED.inc_by(0);
        SCHEDULER_RUNNING.set(0);
        EVENT_STORE_SIZE.set(0);

        let output = encode_metrics();
        assert!(output.contains("readtrend_job_runs_total"));
        assert!(output.contains("readtrend_events_deleted_total"));
        assert!(output.contains("readtrend_scheduler_running"));
        assert!(output.contains("readtrend_search_events_stored"));
    }
}
