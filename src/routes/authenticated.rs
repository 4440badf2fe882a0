use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// Authenticated Router Module
///
/// Every route here requires a session. Most are shared by several roles and
/// the handler narrows the data to the caller: a client only ever sees its own
/// client record and invoices, a team member only its own record and the
/// projects it is assigned to.
pub fn authenticated_routes() -> Router<AppState> {
    Router::<AppState>::new()
        // GET /api/auth/user
        .route("/api/auth/user", get(handlers::auth::current_user))
        // --- Clients (admin, client) ---
        .route("/api/clients", get(handlers::clients::list_clients))
        .route(
            "/api/clients/{id}",
            get(handlers::clients::get_client).put(handlers::clients::update_client),
        )
        // --- Team (admin, team) ---
        .route("/api/team", get(handlers::team::list_team))
        .route(
            "/api/team/{id}",
            get(handlers::team::get_team_member).put(handlers::team::update_team_member),
        )
        // --- Projects (admin, team) ---
        // Team members are limited to assigned projects, and may only move
        // status and progress.
        .route("/api/projects", get(handlers::projects::list_projects))
        .route(
            "/api/projects/{id}",
            get(handlers::projects::get_project).put(handlers::projects::update_project),
        )
        // --- Invoices (admin, client) ---
        .route("/api/invoices", get(handlers::invoices::list_invoices))
        .route("/api/invoices/{id}", get(handlers::invoices::get_invoice))
        // --- Dashboard stats ---
        .route(
            "/api/stats/client/{client_id}",
            get(handlers::stats::get_client_stats),
        )
        .route(
            "/api/stats/team/{team_member_id}",
            get(handlers::stats::get_team_stats),
        )
}

