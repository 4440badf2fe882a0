use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{delete, get, post, put},
};

/// Admin Router Module
///
/// Routes reserved for the `admin` role. The whole router is wrapped in
/// `admin_middleware`, and each handler repeats the role check.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        // --- Tenant management ---
        .route("/api/clients", post(handlers::clients::create_client))
        .route("/api/clients/{id}", delete(handlers::clients::delete_client))
        .route("/api/team", post(handlers::team::create_team_member))
        .route(
            "/api/team/{id}",
            delete(handlers::team::delete_team_member),
        )
        // --- Projects & assignments ---
        .route("/api/projects", post(handlers::projects::create_project))
        .route(
            "/api/projects/{id}",
            delete(handlers::projects::delete_project),
        )
        .route(
            "/api/projects/{id}/assignments",
            get(handlers::projects::list_assignments).post(handlers::projects::create_assignment),
        )
        .route(
            "/api/projects/{id}/assignments/{team_member_id}",
            delete(handlers::projects::delete_assignment),
        )
        // --- Invoices ---
        .route("/api/invoices", post(handlers::invoices::create_invoice))
        .route(
            "/api/invoices/{id}",
            put(handlers::invoices::update_invoice).delete(handlers::invoices::delete_invoice),
        )
        // --- Dashboard & system administration ---
        .route("/api/admin/stats", get(handlers::stats::get_admin_stats))
        .route(
            "/api/admin/settings",
            get(handlers::settings::get_admin_settings).put(handlers::settings::update_settings),
        )
        .route(
            "/api/admin/settings/{key}",
            delete(handlers::settings::delete_setting),
        )
        .route(
            "/api/admin/roles",
            get(handlers::roles::list_roles).post(handlers::roles::create_role),
        )
        .route(
            "/api/admin/roles/{id}",
            get(handlers::roles::get_role)
                .put(handlers::roles::update_role)
                .delete(handlers::roles::delete_role),
        )
        .route(
            "/api/admin/permissions",
            get(handlers::roles::list_permissions),
        )
        .route("/api/admin/users", get(handlers::users::list_users))
        .route(
            "/api/admin/users/{id}/active",
            put(handlers::users::set_user_active),
        )
}
