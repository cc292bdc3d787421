use axum::{routing::get, Router};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::http::handlers;
use crate::http::state::AppState;

/// Builds the full HTTP application: health check, album routes, request tracing and CORS.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .route(
            "/api/v1/albums",
            get(handlers::list_albums).post(handlers::create_album),
        )
        .route(
            "/api/v1/albums/:id",
            get(handlers::get_album)
                .put(handlers::update_album)
                .delete(handlers::delete_album),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
