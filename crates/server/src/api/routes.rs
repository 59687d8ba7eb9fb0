use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use super::{audit, books, clubs, events, handlers, jobs, middleware::metrics_middleware};
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    let api_routes = Router::new()
        // Health and config
        .route("/health", get(handlers::health))
        .route("/config", get(handlers::get_config))
        // Audit
        .route("/audit", get(audit::query_audit))
        // Search events
        .route("/search-events", post(events::record_search))
        // Catalog (static segment wins over {slug})
        .route("/books/trending", get(books::trending_books))
        .route("/books/{slug}", get(books::get_book).put(books::upsert_book))
        // Clubs
        .route("/clubs", get(clubs::list_clubs))
        .route("/clubs/{id}", get(clubs::get_club).put(clubs::upsert_club))
        // Jobs
        .route("/jobs/schedule", get(jobs::get_schedule))
        .route("/jobs/{job}/run", post(jobs::run_job));

    Router::new()
        .nest("/api/v1", api_routes)
        .route("/metrics", get(handlers::metrics))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
