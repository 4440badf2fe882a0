use axum::{extract::State, http::StatusCode};

use crate::AppState;

/// Liveness probe. Does not touch dependencies.
#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Service is running", body = String))
)]
pub async fn health() -> &'static str {
    "ok"
}

/// Readiness probe.
///
/// 503 when the database cannot be reached.
#[utoipa::path(
    get,
    path = "/health/ready",
    responses(
        (status = 200, description = "Database reachable"),
        (status = 503, description = "Database unreachable")
    )
)]
pub async fn readiness(State(state): State<AppState>) -> StatusCode {
    match state.repo.ping().await {
        Ok(()) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}
