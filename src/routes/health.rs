use axum::routing::any;
use axum::{Json, Router};

use crate::state::AppState;

/// Liveness probe; answers any method.
async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/api/health", any(health))
}
