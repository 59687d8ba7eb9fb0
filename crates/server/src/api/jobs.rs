//! Manual job triggers and schedule inspection.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;

use readtrend_core::{JobError, JobKind, JobReport, JobTrigger};

use super::handlers::{api_error, ApiError};
use crate::scheduler::{upcoming, ScheduledJob};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct ScheduleResponse {
    pub enabled: bool,
    pub running: bool,
    pub job_timeout_secs: u64,
    pub jobs: Vec<ScheduledJob>,
}

/// Run a job now and return its report
pub async fn run_job(
    State(state): State<Arc<AppState>>,
    Path(job): Path<String>,
) -> Result<Json<JobReport>, ApiError> {
    let kind: JobKind = job
        .parse()
        .map_err(|e: JobError| api_error(StatusCode::NOT_FOUND, e.to_string()))?;

    state
        .jobs()
        .run(kind, Utc::now(), JobTrigger::Manual)
        .await
        .map(Json)
        .map_err(|e| api_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
}

/// Next fire time of every job
pub async fn get_schedule(State(state): State<Arc<AppState>>) -> Json<ScheduleResponse> {
    let config = &state.config().scheduler;

    Json(ScheduleResponse {
        enabled: config.enabled,
        running: state.scheduler().is_some_and(|s| s.is_running()),
        job_timeout_secs: config.job_timeout_secs,
        jobs: upcoming(config, Utc::now()),
    })
}
