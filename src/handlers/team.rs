use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use rust_decimal::Decimal;
use uuid::Uuid;

use super::{ensure_own, hash_new_user, own_team_member, validate};
use crate::{
    AppState,
    auth::AuthUser,
    error::{AppError, ErrorBody},
    models::{CreateTeamMemberRequest, MessageResponse, Role, TeamMember, UpdateTeamMemberRequest},
};

fn check_salary(salary: Option<Decimal>) -> Result<(), AppError> {
    match salary {
        Some(s) if s <= Decimal::ZERO => Err(AppError::validation(
            "salary",
            "Salary must be a positive amount",
        )),
        _ => Ok(()),
    }
}

/// Staff records belong to team or admin users; a client login needs a client row.
fn check_staff_role(role: Role) -> Result<(), AppError> {
    match role {
        Role::Team | Role::Admin => Ok(()),
        Role::Client => Err(AppError::validation(
            "role",
            "Team members must have the team or admin role",
        )),
    }
}

/// list_team
///
/// [Authenticated Route] Admins see the whole team; a team member sees only
/// its own record.
#[utoipa::path(
    get,
    path = "/api/team",
    responses(
        (status = 200, description = "Team members visible to the caller", body = [TeamMember]),
        (status = 403, description = "Clients cannot list the team", body = ErrorBody)
    )
)]
pub async fn list_team(
    user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<TeamMember>>, AppError> {
    user.require(&[Role::Admin, Role::Team])?;

    if user.is_admin() {
        return Ok(Json(state.repo.list_team_members().await?));
    }

    let member = own_team_member(&state, &user).await?;
    Ok(Json(vec![member]))
}

#[utoipa::path(
    get,
    path = "/api/team/{id}",
    params(("id" = Uuid, Path, description = "Team member id")),
    responses(
        (status = 200, description = "Team member", body = TeamMember),
        (status = 403, description = "Not the caller's record", body = ErrorBody),
        (status = 404, description = "Not found", body = ErrorBody)
    )
)]
pub async fn get_team_member(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<TeamMember>, AppError> {
    user.require(&[Role::Admin, Role::Team])?;

    if user.role == Role::Team {
        let own = own_team_member(&state, &user).await?;
        ensure_own(own.id, id)?;
        return Ok(Json(own));
    }

    let member = state
        .repo
        .get_team_member(id)
        .await?
        .ok_or_else(|| AppError::not_found("Team member"))?;
    Ok(Json(member))
}

/// create_team_member
///
/// [Admin Route] Creates the login user and the team member record together.
/// `hire_date` defaults to today.
#[utoipa::path(
    post,
    path = "/api/team",
    request_body = CreateTeamMemberRequest,
    responses(
        (status = 201, description = "Team member created", body = TeamMember),
        (status = 400, description = "Invalid data", body = ErrorBody),
        (status = 409, description = "Email already in use", body = ErrorBody)
    )
)]
pub async fn create_team_member(
    user: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<CreateTeamMemberRequest>,
) -> Result<(StatusCode, Json<TeamMember>), AppError> {
    user.require(&[Role::Admin])?;
    validate(&payload)?;
    check_salary(payload.salary)?;
    check_staff_role(payload.role)?;

    let new_user = hash_new_user(
        &payload.email,
        &payload.first_name,
        &payload.last_name,
        payload.phone.clone(),
        &payload.password,
        payload.role,
    )?;

    let member = state
        .repo
        .create_team_member_with_user(new_user, payload)
        .await?;

    tracing::info!(team_member_id = %member.id, admin_id = %user.id, "team member created");
    Ok((StatusCode::CREATED, Json(member)))
}

/// update_team_member
///
/// [Authenticated Route] Admins may change every field. A team member may
/// edit its own position and department; salary and hire date stay admin-only.
#[utoipa::path(
    put,
    path = "/api/team/{id}",
    params(("id" = Uuid, Path, description = "Team member id")),
    request_body = UpdateTeamMemberRequest,
    responses(
        (status = 200, description = "Team member updated", body = TeamMember),
        (status = 400, description = "Invalid data", body = ErrorBody),
        (status = 403, description = "Not allowed to change this record or field", body = ErrorBody),
        (status = 404, description = "Not found", body = ErrorBody)
    )
)]
pub async fn update_team_member(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateTeamMemberRequest>,
) -> Result<Json<TeamMember>, AppError> {
    user.require(&[Role::Admin, Role::Team])?;

    if user.role == Role::Team {
        let own = own_team_member(&state, &user).await?;
        ensure_own(own.id, id)?;
        if payload.touches_admin_fields() {
            return Err(AppError::Forbidden(
                "Only an admin can change salary or hire date".to_string(),
            ));
        }
    }

    validate(&payload)?;
    check_salary(payload.salary)?;

    let member = state
        .repo
        .update_team_member(id, payload)
        .await?
        .ok_or_else(|| AppError::not_found("Team member"))?;
    Ok(Json(member))
}

/// delete_team_member
///
/// [Admin Route] Removes the member, its assignments and its login.
#[utoipa::path(
    delete,
    path = "/api/team/{id}",
    params(("id" = Uuid, Path, description = "Team member id")),
    responses(
        (status = 200, description = "Team member deleted", body = MessageResponse),
        (status = 404, description = "Not found", body = ErrorBody)
    )
)]
pub async fn delete_team_member(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<MessageResponse>, AppError> {
    user.require(&[Role::Admin])?;

    if !state.repo.delete_team_member(id).await? {
        return Err(AppError::not_found("Team member"));
    }

    tracing::info!(team_member_id = %id, admin_id = %user.id, "team member deleted");
    Ok(Json(MessageResponse::new("Team member deleted successfully")))
}
