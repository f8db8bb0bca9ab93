use crate::services::deadline::within;
use crate::startup::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use std::time::Duration;

/// Budget for the per-request liveness probe.
pub const PING_DEADLINE: Duration = Duration::from_millis(500);

pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    match within("ping", PING_DEADLINE, state.store.ping()).await {
        Ok(()) => (StatusCode::OK, Json(json!({ "status": "ok" }))),
        Err(e) => {
            tracing::warn!(error = %e, "Health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "status": "unhealthy",
                    "error": e.detail()
                })),
            )
        }
    }
}
