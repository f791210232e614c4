use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::state::AppState;

/// GET /health
pub async fn health_handler() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// GET /api/status
/// Reports that the API is up and which completion model it talks to.
pub async fn status_handler(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "online",
        "model": state.config.provider.completion_model
    }))
}
