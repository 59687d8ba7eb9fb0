//! Search event recording.

use axum::{extract::State, http::StatusCode, Json};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use readtrend_core::metrics::SEARCH_EVENTS_RECORDED;

use super::handlers::{api_error, store_error, ApiError};
use crate::state::AppState;

/// Request body for recording a search
#[derive(Debug, Deserialize)]
pub struct RecordSearchBody {
    /// The query exactly as typed
    pub query: String,
}

#[derive(Debug, Serialize)]
pub struct RecordSearchResponse {
    pub id: i64,
}

/// Record a search event stamped with the current time
pub async fn record_search(
    State(state): State<Arc<AppState>>,
    Json(body): Json<RecordSearchBody>,
) -> Result<(StatusCode, Json<RecordSearchResponse>), ApiError> {
    if body.query.trim().is_empty() {
        return Err(api_error(StatusCode::BAD_REQUEST, "query cannot be empty"));
    }

    let id = state
        .events()
        .record(&body.query, Utc::now())
        .await
        .map_err(store_error)?;
    SEARCH_EVENTS_RECORDED.inc();

    Ok((StatusCode::CREATED, Json(RecordSearchResponse { id })))
}
