use super::handlers;
use super::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

/// Create the HTTP router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Share-preview pages
        .route(
            "/api/audio/preview/:audio_id",
            get(handlers::audio_preview),
        )
        .route("/api/video/:video_id", get(handlers::video_preview))
        // Frame button callback; other methods get 405 from the router
        .route("/api/redirect", post(handlers::redirect_to_app))
        // Add tracing middleware for request logging
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
