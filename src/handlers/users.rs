use axum::{
    Json,
    extract::{Path, State},
};
use uuid::Uuid;

use crate::{
    AppState,
    auth::AuthUser,
    error::{AppError, ErrorBody},
    models::{Role, SetUserActiveRequest, UserProfile},
};

#[utoipa::path(
    get,
    path = "/api/admin/users",
    responses((status = 200, description = "Every user, newest first", body = [UserProfile]))
)]
pub async fn list_users(
    user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<UserProfile>>, AppError> {
    user.require(&[Role::Admin])?;

    let users = state.repo.list_users().await?;
    Ok(Json(users.iter().map(UserProfile::from).collect()))
}

/// set_user_active
///
/// [Admin Route] Deactivated users cannot log in and lose access on their
/// next request. Admins cannot deactivate themselves.
#[utoipa::path(
    put,
    path = "/api/admin/users/{id}/active",
    params(("id" = Uuid, Path, description = "User id")),
    request_body = SetUserActiveRequest,
    responses(
        (status = 200, description = "User updated", body = UserProfile),
        (status = 400, description = "Cannot deactivate yourself", body = ErrorBody),
        (status = 404, description = "Not found", body = ErrorBody)
    )
)]
pub async fn set_user_active(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<SetUserActiveRequest>,
) -> Result<Json<UserProfile>, AppError> {
    user.require(&[Role::Admin])?;

    if id == user.id && !payload.active {
        return Err(AppError::BadRequest(
            "You cannot deactivate your own account".to_string(),
        ));
    }

    let updated = state
        .repo
        .set_user_active(id, payload.active)
        .await?
        .ok_or_else(|| AppError::not_found("User"))?;

    tracing::info!(user_id = %id, active = payload.active, admin_id = %user.id, "user activation changed");
    Ok(Json(UserProfile::from(&updated)))
}
