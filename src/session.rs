//! Session layer configuration.
//!
//! Sessions live in PostgreSQL (`tower_sessions.session`, created by the
//! store's own migration) and expire after a period of inactivity.

use tower_sessions::{
    Expiry, SessionManagerLayer, SessionStore,
    cookie::{SameSite, time::Duration},
};

use crate::config::{AppConfig, Env};

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "portal_session";

/// Build the session layer over any store.
///
/// Production cookies are `Secure`; local development runs over plain HTTP.
pub fn create_session_layer<S>(store: S, config: &AppConfig) -> SessionManagerLayer<S>
where
    S: SessionStore + Clone,
{
    SessionManagerLayer::new(store)
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(Duration::hours(
            config.session_ttl_hours,
        )))
        .with_secure(config.env == Env::Production)
        .with_same_site(SameSite::Lax)
        .with_http_only(true)
        .with_path("/")
}
