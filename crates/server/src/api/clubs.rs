//! Club handlers.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Deserialize;
use std::sync::Arc;

use readtrend_core::{Club, StoreError};

use super::handlers::{store_error, ApiError};
use crate::state::AppState;

/// Request body for creating or renaming a club
#[derive(Debug, Deserialize)]
pub struct UpsertClubBody {
    pub name: String,
}

/// Create a club, or rename it keeping its published pool
pub async fn upsert_club(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(body): Json<UpsertClubBody>,
) -> Result<Json<Club>, ApiError> {
    let club = match state.clubs().get_club(&id).await {
        Ok(existing) => Club {
            name: body.name,
            ..existing
        },
        Err(StoreError::NotFound(_)) => Club::new(id, body.name),
        Err(e) => return Err(store_error(e)),
    };

    state.clubs().upsert_club(&club).await.map_err(store_error)?;
    Ok(Json(club))
}

/// Get a club by ID
pub async fn get_club(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Club>, ApiError> {
    state
        .clubs()
        .get_club(&id)
        .await
        .map(Json)
        .map_err(store_error)
}

/// List all clubs
pub async fn list_clubs(State(state): State<Arc<AppState>>) -> Result<Json<Vec<Club>>, ApiError> {
    state
        .clubs()
        .list_clubs()
        .await
        .map(Json)
        .map_err(store_error)
}
