//! HTTP handlers, one module per resource.
//!
//! Admin-only handlers sit behind the admin route layer and still call
//! `AuthUser::require`, so every handler is safe on its own.

use uuid::Uuid;
use validator::Validate;

use crate::{
    AppState,
    auth::{AuthUser, hash_password},
    error::AppError,
    models::{Client, NewUser, Role, TeamMember},
};

pub mod auth;
pub mod clients;
pub mod health;
pub mod invoices;
pub mod projects;
pub mod roles;
pub mod settings;
pub mod stats;
pub mod team;
pub mod users;

/// Run derive-based validation, mapping failures to a 400 with field errors.
pub(crate) fn validate<T: Validate>(payload: &T) -> Result<(), AppError> {
    payload.validate().map_err(AppError::from)
}

/// Emails are compared case-insensitively by storing them lowercased.
pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Build the user row for a new client or team member, hashing the password.
pub(crate) fn hash_new_user(
    email: &str,
    first_name: &str,
    last_name: &str,
    phone: Option<String>,
    password: &str,
    role: Role,
) -> Result<NewUser, AppError> {
    Ok(NewUser {
        email: normalize_email(email),
        first_name: Some(first_name.trim().to_owned()),
        last_name: Some(last_name.trim().to_owned()),
        phone: phone.filter(|p| !p.trim().is_empty()),
        password_hash: hash_password(password)?,
        role,
    })
}

/// The Client row linked to a client-role caller.
pub(crate) async fn own_client(state: &AppState, user: &AuthUser) -> Result<Client, AppError> {
    state
        .repo
        .get_client_by_user(user.id)
        .await?
        .ok_or_else(|| AppError::not_found("Client"))
}

/// The TeamMember row linked to a team-role caller.
pub(crate) async fn own_team_member(
    state: &AppState,
    user: &AuthUser,
) -> Result<TeamMember, AppError> {
    state
        .repo
        .get_team_member_by_user(user.id)
        .await?
        .ok_or_else(|| AppError::not_found("Team member"))
}

/// 403 unless the caller's own tenant row is `id`.
pub(crate) fn ensure_own(own_id: Uuid, id: Uuid) -> Result<(), AppError> {
    if own_id == id {
        Ok(())
    } else {
        Err(AppError::forbidden())
    }
}
