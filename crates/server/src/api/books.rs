//! Catalog entry handlers.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use std::sync::Arc;

use readtrend_core::CatalogEntry;

use super::handlers::{api_error, store_error, ApiError};
use crate::state::AppState;

/// Maximum allowed limit for trending queries
const MAX_TRENDING_LIMIT: usize = 100;

/// Taken by the `/books/trending` listing, so a book with this slug could
/// never be read back.
const RESERVED_SLUG: &str = "trending";

/// Request body for creating or replacing a book
#[derive(Debug, Deserialize)]
pub struct UpsertBookBody {
    pub title: String,
    #[serde(default)]
    pub search_score_24h: u64,
    #[serde(default)]
    pub trending_score: f64,
}

#[derive(Debug, Deserialize)]
pub struct TrendingParams {
    /// Defaults to the configured pool size
    pub limit: Option<usize>,
}

/// Create or replace a book
pub async fn upsert_book(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
    Json(body): Json<UpsertBookBody>,
) -> Result<Json<CatalogEntry>, ApiError> {
    if slug == RESERVED_SLUG {
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            format!("slug {:?} is reserved", RESERVED_SLUG),
        ));
    }

    let entry = CatalogEntry::new(slug, body.title)
        .with_search_score(body.search_score_24h)
        .with_trending_score(body.trending_score);

    state
        .catalog()
        .upsert_entry(&entry)
        .await
        .map_err(store_error)?;

    let stored = state
        .catalog()
        .get_entry(&entry.slug)
        .await
        .map_err(store_error)?;
    Ok(Json(stored))
}

/// Get a book by slug
pub async fn get_book(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
) -> Result<Json<CatalogEntry>, ApiError> {
    state
        .catalog()
        .get_entry(&slug)
        .await
        .map(Json)
        .map_err(store_error)
}

/// Books with the highest search score, as the pool publisher sees them
pub async fn trending_books(
    State(state): State<Arc<AppState>>,
    Query(params): Query<TrendingParams>,
) -> Result<Json<Vec<CatalogEntry>>, ApiError> {
    let limit = params
        .limit
        .unwrap_or(state.config().trending.pool.pool_size)
        .clamp(1, MAX_TRENDING_LIMIT);

    state
        .catalog()
        .top_by_search_score(limit)
        .await
        .map(Json)
        .map_err(store_error)
}
