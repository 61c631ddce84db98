//! Health endpoints.

use axum::{extract::State, http::StatusCode};

use crate::state::AppState;

/// GET /health - liveness. Answers as long as the process is up; checks no
/// dependencies.
pub async fn live() -> &'static str {
    "ok"
}

/// GET /health/ready - readiness. 503 until the database answers a trivial
/// query.
pub async fn ready(State(state): State<AppState>) -> StatusCode {
    if sqlx::query("SELECT 1").fetch_one(state.pool()).await.is_ok() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}
