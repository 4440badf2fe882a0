use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Public Router Module
///
/// Health probes, the login/logout pair and the branding settings the login
/// page needs before anyone is signed in.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // Liveness probe for load balancers.
        .route("/health", get(handlers::health::health))
        // GET /health/ready
        // Readiness probe: 503 while the database is unreachable.
        .route("/health/ready", get(handlers::health::readiness))
        // POST /api/auth/login
        // Verifies credentials and binds the user to a fresh session id.
        .route("/api/auth/login", post(handlers::auth::login))
        // POST /api/auth/logout
        // Destroys the session (no-op without one).
        .route("/api/auth/logout", post(handlers::auth::logout))
        // GET /api/system/settings
        // Resolved branding settings.
        .route(
            "/api/system/settings",
            get(handlers::settings::get_public_settings),
        )
}
