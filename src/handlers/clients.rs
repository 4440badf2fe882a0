use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use uuid::Uuid;

use super::{ensure_own, hash_new_user, own_client, validate};
use crate::{
    AppState,
    auth::AuthUser,
    error::{AppError, ErrorBody},
    models::{Client, CreateClientRequest, MessageResponse, Role, UpdateClientRequest},
};

/// list_clients
///
/// [Authenticated Route] Admins see every client; a client sees only its own
/// record as a list of one.
#[utoipa::path(
    get,
    path = "/api/clients",
    responses(
        (status = 200, description = "Clients visible to the caller", body = [Client]),
        (status = 403, description = "Team members cannot list clients", body = ErrorBody)
    )
)]
pub async fn list_clients(
    user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<Client>>, AppError> {
    user.require(&[Role::Admin, Role::Client])?;

    if user.is_admin() {
        return Ok(Json(state.repo.list_clients().await?));
    }

    let client = own_client(&state, &user).await?;
    Ok(Json(vec![client]))
}

/// get_client
///
/// [Authenticated Route] Admins read any client; a client only its own.
#[utoipa::path(
    get,
    path = "/api/clients/{id}",
    params(("id" = Uuid, Path, description = "Client id")),
    responses(
        (status = 200, description = "Client", body = Client),
        (status = 403, description = "Not the caller's record", body = ErrorBody),
        (status = 404, description = "Not found", body = ErrorBody)
    )
)]
pub async fn get_client(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Client>, AppError> {
    user.require(&[Role::Admin, Role::Client])?;

    if user.role == Role::Client {
        let own = own_client(&state, &user).await?;
        ensure_own(own.id, id)?;
        return Ok(Json(own));
    }

    let client = state
        .repo
        .get_client(id)
        .await?
        .ok_or_else(|| AppError::not_found("Client"))?;
    Ok(Json(client))
}

/// create_client
///
/// [Admin Route] Creates the login user (role `client`) and the client record
/// in one transaction.
#[utoipa::path(
    post,
    path = "/api/clients",
    request_body = CreateClientRequest,
    responses(
        (status = 201, description = "Client created", body = Client),
        (status = 400, description = "Invalid data", body = ErrorBody),
        (status = 409, description = "Email already in use", body = ErrorBody)
    )
)]
pub async fn create_client(
    user: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<CreateClientRequest>,
) -> Result<(StatusCode, Json<Client>), AppError> {
    user.require(&[Role::Admin])?;
    validate(&payload)?;

    let new_user = hash_new_user(
        &payload.email,
        &payload.first_name,
        &payload.last_name,
        payload.phone.clone(),
        &payload.password,
        Role::Client,
    )?;

    let client = state
        .repo
        .create_client_with_user(new_user, payload)
        .await?;

    tracing::info!(client_id = %client.id, admin_id = %user.id, "client created");
    Ok((StatusCode::CREATED, Json(client)))
}

/// update_client
///
/// [Authenticated Route] Partial update. Admins edit any client; a client
/// edits only its own record.
#[utoipa::path(
    put,
    path = "/api/clients/{id}",
    params(("id" = Uuid, Path, description = "Client id")),
    request_body = UpdateClientRequest,
    responses(
        (status = 200, description = "Client updated", body = Client),
        (status = 400, description = "Invalid data", body = ErrorBody),
        (status = 403, description = "Not the caller's record", body = ErrorBody),
        (status = 404, description = "Not found", body = ErrorBody)
    )
)]
pub async fn update_client(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateClientRequest>,
) -> Result<Json<Client>, AppError> {
    user.require(&[Role::Admin, Role::Client])?;

    if user.role == Role::Client {
        let own = own_client(&state, &user).await?;
        ensure_own(own.id, id)?;
    }

    validate(&payload)?;

    let client = state
        .repo
        .update_client(id, payload)
        .await?
        .ok_or_else(|| AppError::not_found("Client"))?;
    Ok(Json(client))
}

/// delete_client
///
/// [Admin Route] Deletes the client and its login. 409 while projects or
/// invoices still reference the client.
#[utoipa::path(
    delete,
    path = "/api/clients/{id}",
    params(("id" = Uuid, Path, description = "Client id")),
    responses(
        (status = 200, description = "Client deleted", body = MessageResponse),
        (status = 404, description = "Not found", body = ErrorBody),
        (status = 409, description = "Client still has projects or invoices", body = ErrorBody)
    )
)]
pub async fn delete_client(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<MessageResponse>, AppError> {
    user.require(&[Role::Admin])?;

    if !state.repo.delete_client(id).await? {
        return Err(AppError::not_found("Client"));
    }

    tracing::info!(client_id = %id, admin_id = %user.id, "client deleted");
    Ok(Json(MessageResponse::new("Client deleted successfully")))
}
