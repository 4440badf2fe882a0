use axum::{
    Router,
    extract::{FromRef, Request},
    http::HeaderName,
    middleware::{self, Next},
    response::Response,
};
use tower_sessions::{SessionManagerLayer, SessionStore};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod repository;
pub mod session;
pub mod settings;

// Routing segregation (Public, Authenticated, Admin).
pub mod routes;
use auth::AuthUser;
use error::AppError;
use models::Role;
use routes::{admin, authenticated, public};

// --- Public Re-exports ---

pub use config::AppConfig;
pub use repository::{PostgresRepository, Repository, RepositoryError, RepositoryState};

/// ApiDoc
///
/// OpenAPI document for every handler and model, served at `/api-docs/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::health::health, handlers::health::readiness,
        handlers::auth::login, handlers::auth::logout, handlers::auth::current_user,
        handlers::clients::list_clients, handlers::clients::get_client,
        handlers::clients::create_client, handlers::clients::update_client,
        handlers::clients::delete_client,
        handlers::team::list_team, handlers::team::get_team_member,
        handlers::team::create_team_member, handlers::team::update_team_member,
        handlers::team::delete_team_member,
        handlers::projects::list_projects, handlers::projects::get_project,
        handlers::projects::create_project, handlers::projects::update_project,
        handlers::projects::delete_project, handlers::projects::list_assignments,
        handlers::projects::create_assignment, handlers::projects::delete_assignment,
        handlers::invoices::list_invoices, handlers::invoices::get_invoice,
        handlers::invoices::create_invoice, handlers::invoices::update_invoice,
        handlers::invoices::delete_invoice,
        handlers::stats::get_admin_stats, handlers::stats::get_client_stats,
        handlers::stats::get_team_stats,
        handlers::settings::get_public_settings, handlers::settings::get_admin_settings,
        handlers::settings::update_settings, handlers::settings::delete_setting,
        handlers::roles::list_roles, handlers::roles::get_role, handlers::roles::create_role,
        handlers::roles::update_role, handlers::roles::delete_role,
        handlers::roles::list_permissions,
        handlers::users::list_users, handlers::users::set_user_active,
    ),
    components(
        schemas(
            error::ErrorBody, error::FieldError,
            models::Role, models::UserProfile, models::LoginRequest, models::LoginResponse,
            models::MessageResponse, models::SetUserActiveRequest,
            models::Client, models::CreateClientRequest, models::UpdateClientRequest,
            models::TeamMember, models::CreateTeamMemberRequest, models::UpdateTeamMemberRequest,
            models::Project, models::ProjectStatus, models::CreateProjectRequest,
            models::UpdateProjectRequest, models::ProjectAssignment,
            models::CreateAssignmentRequest,
            models::Invoice, models::InvoiceStatus, models::CreateInvoiceRequest,
            models::UpdateInvoiceRequest,
            models::AdminDashboardStats, models::ClientStats, models::TeamStats,
            models::SettingType, models::SystemSetting,
            models::UserRole, models::Permission, models::CreateRoleRequest,
            models::UpdateRoleRequest,
        )
    ),
    tags(
        (name = "business-portal", description = "Business Portal API")
    )
)]
pub struct ApiDoc;

/// AppState
///
/// The single, cloneable container shared by every request: the persistence
/// layer and the immutable configuration.
#[derive(Clone)]
pub struct AppState {
    pub repo: RepositoryState,
    pub config: AppConfig,
}

// --- Axum FromRef Extractor Implementations ---

impl FromRef<AppState> for RepositoryState {
    fn from_ref(app_state: &AppState) -> RepositoryState {
        app_state.repo.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// auth_middleware
///
/// Guards the authenticated routes. The extractor rejects with 401 before the
/// handler runs; on success the resolved user rides along in the request
/// extensions so the handler's own `AuthUser` needs no second lookup.
async fn auth_middleware(auth_user: AuthUser, mut request: Request, next: Next) -> Response {
    request.extensions_mut().insert(auth_user);
    next.run(request).await
}

/// admin_middleware
///
/// Guards the admin routes: 401 without a valid session, 403 for any role
/// other than `admin`.
async fn admin_middleware(
    auth_user: AuthUser,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    auth_user.require(&[Role::Admin])?;
    request.extensions_mut().insert(auth_user);
    Ok(next.run(request).await)
}

/// create_router
///
/// Assembles the routing tree, applies the route guards, the session layer
/// and the observability stack. Generic over the session store so tests can
/// run against an in-memory store.
pub fn create_router<S>(state: AppState, sessions: SessionManagerLayer<S>) -> Router
where
    S: SessionStore + Clone,
{
    // 1. CORS Configuration
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    let x_request_id = HeaderName::from_static("x-request-id");

    // 2. Base Router Assembly
    let base_router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(public::public_routes())
        .merge(
            authenticated::authenticated_routes().route_layer(middleware::from_fn_with_state(
                state.clone(),
                auth_middleware,
            )),
        )
        .merge(
            admin::admin_routes().route_layer(middleware::from_fn_with_state(
                state.clone(),
                admin_middleware,
            )),
        )
        .with_state(state)
        // Sessions must wrap the guards so `Session` is in the request extensions.
        .layer(sessions);

    // 3. Observability and Correlation Layers
    base_router
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        // 4. CORS Layer
        .layer(cors)
}

/// trace_span_logger
///
/// Span factory for `TraceLayer`: method, URI and the request id, so every log
/// line of one request can be correlated.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
