use axum::{
    Json,
    extract::{Path, State},
};
use serde_json::{Map, Value};

use crate::{
    AppState,
    auth::AuthUser,
    error::{AppError, ErrorBody, FieldError},
    models::{MessageResponse, NewSetting, Role},
    settings::{encode_setting_value, resolve_settings},
};

const MAX_KEY_LEN: usize = 100;

async fn resolved(state: &AppState) -> Result<Json<Map<String, Value>>, AppError> {
    let rows = state.repo.list_settings().await?;
    Ok(Json(resolve_settings(&rows)))
}

/// get_public_settings
///
/// [Public Route] Branding settings for the login page and layout.
#[utoipa::path(
    get,
    path = "/api/system/settings",
    responses((status = 200, description = "Resolved settings map (key -> typed value)"))
)]
pub async fn get_public_settings(
    State(state): State<AppState>,
) -> Result<Json<Map<String, Value>>, AppError> {
    resolved(&state).await
}

#[utoipa::path(
    get,
    path = "/api/admin/settings",
    responses(
        (status = 200, description = "Resolved settings map (key -> typed value)"),
        (status = 403, description = "Admins only", body = ErrorBody)
    )
)]
pub async fn get_admin_settings(
    user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Map<String, Value>>, AppError> {
    user.require(&[Role::Admin])?;
    resolved(&state).await
}

/// update_settings
///
/// [Admin Route] Upserts every `{key: value}` pair of the body in one batch:
/// either all keys are stored or none. The stored type follows the JSON type
/// of the value.
#[utoipa::path(
    put,
    path = "/api/admin/settings",
    responses(
        (status = 200, description = "Resolved settings map after the update"),
        (status = 400, description = "Empty or oversized key", body = ErrorBody)
    )
)]
pub async fn update_settings(
    user: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<Map<String, Value>>,
) -> Result<Json<Map<String, Value>>, AppError> {
    user.require(&[Role::Admin])?;

    let invalid: Vec<FieldError> = payload
        .keys()
        .filter(|key| key.trim().is_empty() || key.len() > MAX_KEY_LEN)
        .map(|key| FieldError::new(key.as_str(), "Setting key must be 1-100 characters"))
        .collect();
    if !invalid.is_empty() {
        return Err(AppError::Validation(invalid));
    }

    let batch: Vec<NewSetting> = payload
        .iter()
        .map(|(key, value)| {
            let (stored, setting_type) = encode_setting_value(value);
            NewSetting {
                key: key.trim().to_string(),
                value: stored,
                setting_type,
            }
        })
        .collect();
    state.repo.set_settings(&batch).await?;

    tracing::info!(count = payload.len(), admin_id = %user.id, "settings updated");
    resolved(&state).await
}

#[utoipa::path(
    delete,
    path = "/api/admin/settings/{key}",
    params(("key" = String, Path, description = "Setting key")),
    responses(
        (status = 200, description = "Setting deleted", body = MessageResponse),
        (status = 404, description = "Not found", body = ErrorBody)
    )
)]
pub async fn delete_setting(
    user: AuthUser,
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    user.require(&[Role::Admin])?;

    if !state.repo.delete_setting(&key).await? {
        return Err(AppError::not_found("Setting"));
    }

    Ok(Json(MessageResponse::new("Setting deleted successfully")))
}
