use axum::{Json, extract::State};
use tower_sessions::Session;

use super::normalize_email;
use crate::{
    AppState,
    auth::{AuthUser, SESSION_USER_KEY, SessionUser, verify_password},
    error::{AppError, ErrorBody},
    models::{LoginRequest, LoginResponse, MessageResponse, UserProfile},
};

/// login
///
/// [Public Route] Verifies the credentials and binds the user to the session.
/// The session id is rotated on success to prevent fixation.
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = LoginResponse),
        (status = 400, description = "Missing email or password", body = ErrorBody),
        (status = 401, description = "Invalid credentials or inactive user", body = ErrorBody)
    )
)]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let email = normalize_email(&payload.email);
    if email.is_empty() || payload.password.is_empty() {
        return Err(AppError::BadRequest(
            "Email and password are required".to_string(),
        ));
    }

    let invalid = || AppError::Unauthorized("Invalid credentials".to_string());

    let user = state
        .repo
        .get_user_by_email(&email)
        .await?
        .ok_or_else(invalid)?;

    if !user.active {
        return Err(AppError::Unauthorized("User is inactive".to_string()));
    }

    let password_ok = user
        .password_hash
        .as_deref()
        .is_some_and(|hash| verify_password(&payload.password, hash));
    if !password_ok {
        tracing::info!(user_id = %user.id, "login rejected: wrong password");
        return Err(invalid());
    }

    session.cycle_id().await?;
    session
        .insert(SESSION_USER_KEY, SessionUser::from(&user))
        .await?;

    tracing::info!(user_id = %user.id, role = %user.role, "user logged in");

    Ok(Json(LoginResponse {
        message: "Login successful".to_string(),
        user: UserProfile::from(&user),
    }))
}

/// logout
///
/// [Public Route] Destroys the session. Succeeds even without a session.
#[utoipa::path(
    post,
    path = "/api/auth/logout",
    responses(
        (status = 200, description = "Logged out", body = MessageResponse),
        (status = 500, description = "Session store failure", body = ErrorBody)
    )
)]
pub async fn logout(session: Session) -> Result<Json<MessageResponse>, AppError> {
    session.flush().await?;
    Ok(Json(MessageResponse::new("Logged out successfully")))
}

/// current_user
///
/// [Authenticated Route] The caller's public profile.
#[utoipa::path(
    get,
    path = "/api/auth/user",
    responses(
        (status = 200, description = "Current user", body = UserProfile),
        (status = 401, description = "Not authenticated", body = ErrorBody)
    )
)]
pub async fn current_user(user: AuthUser) -> Json<UserProfile> {
    Json(user.profile)
}
