use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use uuid::Uuid;

use super::{own_team_member, validate};
use crate::{
    AppState,
    auth::AuthUser,
    error::{AppError, ErrorBody},
    models::{
        CreateAssignmentRequest, CreateProjectRequest, MessageResponse, Project,
        ProjectAssignment, Role, UpdateProjectRequest,
    },
};

fn check_schedule(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Result<(), AppError> {
    match (start, end) {
        (Some(start), Some(end)) if end < start => Err(AppError::validation(
            "end_date",
            "End date must not be before the start date",
        )),
        _ => Ok(()),
    }
}

fn check_budget(budget: Option<Decimal>) -> Result<(), AppError> {
    match budget {
        Some(b) if b < Decimal::ZERO => Err(AppError::validation(
            "budget",
            "Budget must not be negative",
        )),
        _ => Ok(()),
    }
}

async fn find_project(state: &AppState, id: Uuid) -> Result<Project, AppError> {
    state
        .repo
        .get_project(id)
        .await?
        .ok_or_else(|| AppError::not_found("Project"))
}

/// 403 unless the team caller is assigned to `project_id`.
async fn ensure_assigned(
    state: &AppState,
    user: &AuthUser,
    project_id: Uuid,
) -> Result<(), AppError> {
    let member = own_team_member(state, user).await?;
    if state.repo.is_assigned(project_id, member.id).await? {
        Ok(())
    } else {
        Err(AppError::forbidden())
    }
}

/// list_projects
///
/// [Authenticated Route] Admins see every project; a team member sees the
/// projects it is assigned to. 404 when a team user has no team record.
#[utoipa::path(
    get,
    path = "/api/projects",
    responses(
        (status = 200, description = "Projects visible to the caller", body = [Project]),
        (status = 403, description = "Clients cannot list projects", body = ErrorBody),
        (status = 404, description = "Team member not found", body = ErrorBody)
    )
)]
pub async fn list_projects(
    user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<Project>>, AppError> {
    user.require(&[Role::Admin, Role::Team])?;

    if user.is_admin() {
        return Ok(Json(state.repo.list_projects().await?));
    }

    let member = own_team_member(&state, &user).await?;
    let projects = state.repo.list_projects_by_team_member(member.id).await?;
    Ok(Json(projects))
}

#[utoipa::path(
    get,
    path = "/api/projects/{id}",
    params(("id" = Uuid, Path, description = "Project id")),
    responses(
        (status = 200, description = "Project", body = Project),
        (status = 403, description = "Not assigned to this project", body = ErrorBody),
        (status = 404, description = "Not found", body = ErrorBody)
    )
)]
pub async fn get_project(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Project>, AppError> {
    user.require(&[Role::Admin, Role::Team])?;

    // Scope check precedes the lookup.
    if user.role == Role::Team {
        ensure_assigned(&state, &user, id).await?;
    }

    Ok(Json(find_project(&state, id).await?))
}

/// create_project
///
/// [Admin Route] Status defaults to `planning`, progress to 0.
#[utoipa::path(
    post,
    path = "/api/projects",
    request_body = CreateProjectRequest,
    responses(
        (status = 201, description = "Project created", body = Project),
        (status = 400, description = "Invalid data", body = ErrorBody),
        (status = 409, description = "Unknown client", body = ErrorBody)
    )
)]
pub async fn create_project(
    user: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<CreateProjectRequest>,
) -> Result<(StatusCode, Json<Project>), AppError> {
    user.require(&[Role::Admin])?;
    validate(&payload)?;
    check_schedule(payload.start_date, payload.end_date)?;
    check_budget(payload.budget)?;

    let project = state.repo.create_project(payload).await?;

    tracing::info!(project_id = %project.id, admin_id = %user.id, "project created");
    Ok((StatusCode::CREATED, Json(project)))
}

/// update_project
///
/// [Authenticated Route] Admins may change any field. A team member may only
/// move `status` and `progress` of a project it is assigned to.
#[utoipa::path(
    put,
    path = "/api/projects/{id}",
    params(("id" = Uuid, Path, description = "Project id")),
    request_body = UpdateProjectRequest,
    responses(
        (status = 200, description = "Project updated", body = Project),
        (status = 400, description = "Invalid data", body = ErrorBody),
        (status = 403, description = "Not assigned, or field not editable by team", body = ErrorBody),
        (status = 404, description = "Not found", body = ErrorBody)
    )
)]
pub async fn update_project(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateProjectRequest>,
) -> Result<Json<Project>, AppError> {
    user.require(&[Role::Admin, Role::Team])?;

    if user.role == Role::Team {
        ensure_assigned(&state, &user, id).await?;
        if !payload.is_progress_only() {
            return Err(AppError::Forbidden(
                "Team members can only update status and progress".to_string(),
            ));
        }
    }

    let existing = find_project(&state, id).await?;

    validate(&payload)?;
    check_schedule(
        payload.start_date.or(existing.start_date),
        payload.end_date.or(existing.end_date),
    )?;
    check_budget(payload.budget)?;

    let project = state
        .repo
        .update_project(id, payload)
        .await?
        .ok_or_else(|| AppError::not_found("Project"))?;

    tracing::info!(project_id = %id, user_id = %user.id, status = %project.status, "project updated");
    Ok(Json(project))
}

#[utoipa::path(
    delete,
    path = "/api/projects/{id}",
    params(("id" = Uuid, Path, description = "Project id")),
    responses(
        (status = 200, description = "Project deleted", body = MessageResponse),
        (status = 404, description = "Not found", body = ErrorBody)
    )
)]
pub async fn delete_project(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<MessageResponse>, AppError> {
    user.require(&[Role::Admin])?;

    if !state.repo.delete_project(id).await? {
        return Err(AppError::not_found("Project"));
    }

    tracing::info!(project_id = %id, admin_id = %user.id, "project deleted");
    Ok(Json(MessageResponse::new("Project deleted successfully")))
}

// --- Assignments ---

#[utoipa::path(
    get,
    path = "/api/projects/{id}/assignments",
    params(("id" = Uuid, Path, description = "Project id")),
    responses(
        (status = 200, description = "Team members assigned to the project", body = [ProjectAssignment]),
        (status = 404, description = "Project not found", body = ErrorBody)
    )
)]
pub async fn list_assignments(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<ProjectAssignment>>, AppError> {
    user.require(&[Role::Admin])?;
    find_project(&state, id).await?;

    Ok(Json(state.repo.list_assignments(id).await?))
}

/// create_assignment
///
/// [Admin Route] Assigns a team member to a project. 409 when already assigned.
#[utoipa::path(
    post,
    path = "/api/projects/{id}/assignments",
    params(("id" = Uuid, Path, description = "Project id")),
    request_body = CreateAssignmentRequest,
    responses(
        (status = 201, description = "Assignment created", body = ProjectAssignment),
        (status = 404, description = "Project or team member not found", body = ErrorBody),
        (status = 409, description = "Already assigned", body = ErrorBody)
    )
)]
pub async fn create_assignment(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<CreateAssignmentRequest>,
) -> Result<(StatusCode, Json<ProjectAssignment>), AppError> {
    user.require(&[Role::Admin])?;
    validate(&payload)?;

    find_project(&state, id).await?;
    state
        .repo
        .get_team_member(payload.team_member_id)
        .await?
        .ok_or_else(|| AppError::not_found("Team member"))?;

    let assignment = state
        .repo
        .assign_team_member(id, payload.team_member_id, payload.role)
        .await?;

    tracing::info!(project_id = %id, team_member_id = %assignment.team_member_id, "team member assigned");
    Ok((StatusCode::CREATED, Json(assignment)))
}

#[utoipa::path(
    delete,
    path = "/api/projects/{id}/assignments/{team_member_id}",
    params(
        ("id" = Uuid, Path, description = "Project id"),
        ("team_member_id" = Uuid, Path, description = "Team member id")
    ),
    responses(
        (status = 200, description = "Assignment removed", body = MessageResponse),
        (status = 404, description = "Assignment not found", body = ErrorBody)
    )
)]
pub async fn delete_assignment(
    user: AuthUser,
    State(state): State<AppState>,
    Path((id, team_member_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<MessageResponse>, AppError> {
    user.require(&[Role::Admin])?;

    if !state.repo.unassign_team_member(id, team_member_id).await? {
        return Err(AppError::not_found("Assignment"));
    }

    Ok(Json(MessageResponse::new("Assignment removed successfully")))
}
