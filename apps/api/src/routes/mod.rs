pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::errors::AppError;
use crate::interview::handlers;
use crate::state::AppState;

/// Recorded answers and long transcripts can be large.
const MAX_BODY_BYTES: usize = 50 * 1024 * 1024;

async fn not_found() -> AppError {
    AppError::NotFound("Route not found".to_string())
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/status", get(health::status_handler))
        // Interview API
        .route("/api/interview/start", post(handlers::handle_start))
        .route("/api/interview/respond", post(handlers::handle_respond))
        .route("/api/interview/transcribe", post(handlers::handle_transcribe))
        .route("/api/interview/audio/:id", get(handlers::handle_get_audio))
        .fallback(not_found)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .with_state(state)
}
