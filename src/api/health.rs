//! Health check endpoint

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use serde_json::{json, Value};

use crate::api::middleware::AppState;

/// Build the health router
pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health))
}

/// GET /health - Liveness probe backed by a database ping
async fn health(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    match state.pool.ping().await {
        Ok(()) => (StatusCode::OK, Json(json!({ "status": "OK" }))),
        Err(e) => {
            tracing::error!("Health check database ping failed: {:#}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "status": "unavailable" })),
            )
        }
    }
}
