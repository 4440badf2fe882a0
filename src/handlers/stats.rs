use axum::{
    Json,
    extract::{Path, State},
};
use uuid::Uuid;

use super::{ensure_own, own_client, own_team_member};
use crate::{
    AppState,
    auth::AuthUser,
    error::{AppError, ErrorBody},
    models::{AdminDashboardStats, ClientStats, Role, TeamStats},
};

/// get_admin_stats
///
/// [Admin Route] Dashboard counters: clients, paid revenue, active projects, team size.
#[utoipa::path(
    get,
    path = "/api/admin/stats",
    responses(
        (status = 200, description = "Admin dashboard counters", body = AdminDashboardStats),
        (status = 403, description = "Admins only", body = ErrorBody)
    )
)]
pub async fn get_admin_stats(
    user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<AdminDashboardStats>, AppError> {
    user.require(&[Role::Admin])?;
    Ok(Json(state.repo.admin_stats().await?))
}

/// get_client_stats
///
/// [Authenticated Route] Open (sent) invoice totals for one client. Clients
/// may only ask about themselves.
#[utoipa::path(
    get,
    path = "/api/stats/client/{client_id}",
    params(("client_id" = Uuid, Path, description = "Client id")),
    responses(
        (status = 200, description = "Client dashboard counters", body = ClientStats),
        (status = 403, description = "Not the caller's record", body = ErrorBody),
        (status = 404, description = "Client not found", body = ErrorBody)
    )
)]
pub async fn get_client_stats(
    user: AuthUser,
    State(state): State<AppState>,
    Path(client_id): Path<Uuid>,
) -> Result<Json<ClientStats>, AppError> {
    user.require(&[Role::Admin, Role::Client])?;

    if user.role == Role::Client {
        let own = own_client(&state, &user).await?;
        ensure_own(own.id, client_id)?;
    } else {
        state
            .repo
            .get_client(client_id)
            .await?
            .ok_or_else(|| AppError::not_found("Client"))?;
    }

    Ok(Json(state.repo.client_stats(client_id).await?))
}

/// get_team_stats
///
/// [Authenticated Route] Counters derived from the member's assigned projects.
#[utoipa::path(
    get,
    path = "/api/stats/team/{team_member_id}",
    params(("team_member_id" = Uuid, Path, description = "Team member id")),
    responses(
        (status = 200, description = "Team dashboard counters", body = TeamStats),
        (status = 403, description = "Not the caller's record", body = ErrorBody),
        (status = 404, description = "Team member not found", body = ErrorBody)
    )
)]
pub async fn get_team_stats(
    user: AuthUser,
    State(state): State<AppState>,
    Path(team_member_id): Path<Uuid>,
) -> Result<Json<TeamStats>, AppError> {
    user.require(&[Role::Admin, Role::Team])?;

    if user.role == Role::Team {
        let own = own_team_member(&state, &user).await?;
        ensure_own(own.id, team_member_id)?;
    } else {
        state
            .repo
            .get_team_member(team_member_id)
            .await?
            .ok_or_else(|| AppError::not_found("Team member"))?;
    }

    Ok(Json(state.repo.team_stats(team_member_id).await?))
}
