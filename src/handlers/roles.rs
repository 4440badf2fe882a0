use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use uuid::Uuid;

use super::validate;
use crate::{
    AppState,
    auth::AuthUser,
    error::{AppError, ErrorBody, FieldError},
    models::{
        CreateRoleRequest, MessageResponse, Permission, Role, UpdateRoleRequest, UserRole,
    },
};

/// Role names are lowercase identifiers: `^[a-z_]+$`.
fn is_valid_role_name(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_ascii_lowercase() || c == '_')
}

fn check_role_fields(name: Option<&str>, permissions: Option<&[String]>) -> Result<(), AppError> {
    let mut errors = Vec::new();

    if let Some(name) = name
        && !is_valid_role_name(name)
    {
        errors.push(FieldError::new(
            "name",
            "Role name may only contain lowercase letters and underscores",
        ));
    }

    if let Some(permissions) = permissions {
        let unknown: Vec<&str> = permissions
            .iter()
            .filter(|p| p.parse::<Permission>().is_err())
            .map(String::as_str)
            .collect();
        if !unknown.is_empty() {
            errors.push(FieldError::new(
                "permissions",
                format!("Unknown permissions: {}", unknown.join(", ")),
            ));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(AppError::Validation(errors))
    }
}

async fn find_role(state: &AppState, id: Uuid) -> Result<UserRole, AppError> {
    state
        .repo
        .get_role(id)
        .await?
        .ok_or_else(|| AppError::not_found("Role"))
}

#[utoipa::path(
    get,
    path = "/api/admin/roles",
    responses((status = 200, description = "All roles, system roles first", body = [UserRole]))
)]
pub async fn list_roles(
    user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<UserRole>>, AppError> {
    user.require(&[Role::Admin])?;
    Ok(Json(state.repo.list_roles().await?))
}

#[utoipa::path(
    get,
    path = "/api/admin/roles/{id}",
    params(("id" = Uuid, Path, description = "Role id")),
    responses(
        (status = 200, description = "Role", body = UserRole),
        (status = 404, description = "Not found", body = ErrorBody)
    )
)]
pub async fn get_role(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<UserRole>, AppError> {
    user.require(&[Role::Admin])?;
    Ok(Json(find_role(&state, id).await?))
}

/// create_role
///
/// [Admin Route] Custom roles only; `is_system` is never set through the API.
#[utoipa::path(
    post,
    path = "/api/admin/roles",
    request_body = CreateRoleRequest,
    responses(
        (status = 201, description = "Role created", body = UserRole),
        (status = 400, description = "Invalid name or unknown permission", body = ErrorBody),
        (status = 409, description = "Role name taken", body = ErrorBody)
    )
)]
pub async fn create_role(
    user: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<CreateRoleRequest>,
) -> Result<(StatusCode, Json<UserRole>), AppError> {
    user.require(&[Role::Admin])?;
    validate(&payload)?;
    check_role_fields(
        Some(payload.name.as_str()),
        Some(payload.permissions.as_slice()),
    )?;

    let role = state.repo.create_role(payload).await?;

    tracing::info!(role = %role.name, admin_id = %user.id, "role created");
    Ok((StatusCode::CREATED, Json(role)))
}

/// update_role
///
/// [Admin Route] System roles keep their name; everything else is editable.
#[utoipa::path(
    put,
    path = "/api/admin/roles/{id}",
    params(("id" = Uuid, Path, description = "Role id")),
    request_body = UpdateRoleRequest,
    responses(
        (status = 200, description = "Role updated", body = UserRole),
        (status = 400, description = "Invalid name or unknown permission", body = ErrorBody),
        (status = 403, description = "System roles cannot be renamed", body = ErrorBody),
        (status = 404, description = "Not found", body = ErrorBody),
        (status = 409, description = "Role name taken", body = ErrorBody)
    )
)]
pub async fn update_role(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateRoleRequest>,
) -> Result<Json<UserRole>, AppError> {
    user.require(&[Role::Admin])?;

    let existing = find_role(&state, id).await?;
    if existing.is_system
        && payload
            .name
            .as_deref()
            .is_some_and(|name| name != existing.name)
    {
        return Err(AppError::Forbidden(
            "System roles cannot be renamed".to_string(),
        ));
    }

    validate(&payload)?;
    check_role_fields(payload.name.as_deref(), payload.permissions.as_deref())?;

    let role = state
        .repo
        .update_role(id, payload)
        .await?
        .ok_or_else(|| AppError::not_found("Role"))?;
    Ok(Json(role))
}

#[utoipa::path(
    delete,
    path = "/api/admin/roles/{id}",
    params(("id" = Uuid, Path, description = "Role id")),
    responses(
        (status = 200, description = "Role deleted", body = MessageResponse),
        (status = 403, description = "System roles cannot be deleted", body = ErrorBody),
        (status = 404, description = "Not found", body = ErrorBody)
    )
)]
pub async fn delete_role(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<MessageResponse>, AppError> {
    user.require(&[Role::Admin])?;

    let existing = find_role(&state, id).await?;
    if existing.is_system {
        return Err(AppError::Forbidden(
            "System roles cannot be deleted".to_string(),
        ));
    }

    if !state.repo.delete_role(id).await? {
        return Err(AppError::not_found("Role"));
    }

    tracing::info!(role = %existing.name, admin_id = %user.id, "role deleted");
    Ok(Json(MessageResponse::new("Role deleted successfully")))
}

/// list_permissions
///
/// [Admin Route] The permission catalog roles are built from.
#[utoipa::path(
    get,
    path = "/api/admin/permissions",
    responses((status = 200, description = "Permission catalog", body = [Permission]))
)]
pub async fn list_permissions(user: AuthUser) -> Result<Json<Vec<Permission>>, AppError> {
    user.require(&[Role::Admin])?;
    Ok(Json(Permission::ALL.to_vec()))
}
