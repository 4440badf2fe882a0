use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use uuid::Uuid;

use super::{ensure_own, own_client, validate};
use crate::{
    AppState,
    auth::AuthUser,
    error::{AppError, ErrorBody, FieldError},
    models::{CreateInvoiceRequest, Invoice, MessageResponse, Role, UpdateInvoiceRequest},
};

/// Amount and date rules `validator` cannot express on decimals and dates.
fn check_terms(
    amount: Option<Decimal>,
    issue_date: Option<NaiveDate>,
    due_date: Option<NaiveDate>,
) -> Result<(), AppError> {
    let mut errors = Vec::new();

    if amount.is_some_and(|a| a <= Decimal::ZERO) {
        errors.push(FieldError::new("amount", "Amount must be greater than zero"));
    }
    if let (Some(issue), Some(due)) = (issue_date, due_date)
        && due < issue
    {
        errors.push(FieldError::new(
            "due_date",
            "Due date must not be before the issue date",
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(AppError::Validation(errors))
    }
}

/// list_invoices
///
/// [Authenticated Route] Admins see every invoice; a client sees only its own.
/// 404 when a client user has no client record.
#[utoipa::path(
    get,
    path = "/api/invoices",
    responses(
        (status = 200, description = "Invoices visible to the caller", body = [Invoice]),
        (status = 403, description = "Team members cannot list invoices", body = ErrorBody),
        (status = 404, description = "Client not found", body = ErrorBody)
    )
)]
pub async fn list_invoices(
    user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<Invoice>>, AppError> {
    user.require(&[Role::Admin, Role::Client])?;

    if user.is_admin() {
        return Ok(Json(state.repo.list_invoices().await?));
    }

    let client = own_client(&state, &user).await?;
    let invoices = state.repo.list_invoices_by_client(client.id).await?;
    Ok(Json(invoices))
}

#[utoipa::path(
    get,
    path = "/api/invoices/{id}",
    params(("id" = Uuid, Path, description = "Invoice id")),
    responses(
        (status = 200, description = "Invoice", body = Invoice),
        (status = 403, description = "Not one of the caller's invoices", body = ErrorBody),
        (status = 404, description = "Not found", body = ErrorBody)
    )
)]
pub async fn get_invoice(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Invoice>, AppError> {
    user.require(&[Role::Admin, Role::Client])?;

    let invoice = state.repo.get_invoice(id).await?;

    if user.role == Role::Client {
        // Missing and foreign invoices look the same to a client.
        let own = own_client(&state, &user).await?;
        let owner = invoice.as_ref().map_or(Uuid::nil(), |i| i.client_id);
        ensure_own(own.id, owner)?;
    }

    invoice
        .map(Json)
        .ok_or_else(|| AppError::not_found("Invoice"))
}

/// create_invoice
///
/// [Admin Route] Status defaults to `draft`. Invoice numbers are unique (409).
#[utoipa::path(
    post,
    path = "/api/invoices",
    request_body = CreateInvoiceRequest,
    responses(
        (status = 201, description = "Invoice created", body = Invoice),
        (status = 400, description = "Invalid data", body = ErrorBody),
        (status = 409, description = "Duplicate number or unknown client/project", body = ErrorBody)
    )
)]
pub async fn create_invoice(
    user: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<CreateInvoiceRequest>,
) -> Result<(StatusCode, Json<Invoice>), AppError> {
    user.require(&[Role::Admin])?;
    validate(&payload)?;
    check_terms(payload.amount, payload.issue_date, payload.due_date)?;

    let invoice = state.repo.create_invoice(payload).await?;

    tracing::info!(invoice_id = %invoice.id, number = %invoice.number, "invoice created");
    Ok((StatusCode::CREATED, Json(invoice)))
}

/// update_invoice
///
/// [Admin Route] Partial update. Any status may be set; transitions are not
/// restricted.
#[utoipa::path(
    put,
    path = "/api/invoices/{id}",
    params(("id" = Uuid, Path, description = "Invoice id")),
    request_body = UpdateInvoiceRequest,
    responses(
        (status = 200, description = "Invoice updated", body = Invoice),
        (status = 400, description = "Invalid data", body = ErrorBody),
        (status = 404, description = "Not found", body = ErrorBody),
        (status = 409, description = "Duplicate number or unknown client/project", body = ErrorBody)
    )
)]
pub async fn update_invoice(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateInvoiceRequest>,
) -> Result<Json<Invoice>, AppError> {
    user.require(&[Role::Admin])?;
    validate(&payload)?;

    let existing = state
        .repo
        .get_invoice(id)
        .await?
        .ok_or_else(|| AppError::not_found("Invoice"))?;

    check_terms(
        payload.amount,
        Some(payload.issue_date.unwrap_or(existing.issue_date)),
        Some(payload.due_date.unwrap_or(existing.due_date)),
    )?;

    let invoice = state
        .repo
        .update_invoice(id, payload)
        .await?
        .ok_or_else(|| AppError::not_found("Invoice"))?;

    tracing::info!(invoice_id = %id, status = %invoice.status, "invoice updated");
    Ok(Json(invoice))
}

#[utoipa::path(
    delete,
    path = "/api/invoices/{id}",
    params(("id" = Uuid, Path, description = "Invoice id")),
    responses(
        (status = 200, description = "Invoice deleted", body = MessageResponse),
        (status = 404, description = "Not found", body = ErrorBody)
    )
)]
pub async fn delete_invoice(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<MessageResponse>, AppError> {
    user.require(&[Role::Admin])?;

    if !state.repo.delete_invoice(id).await? {
        return Err(AppError::not_found("Invoice"));
    }

    tracing::info!(invoice_id = %id, admin_id = %user.id, "invoice deleted");
    Ok(Json(MessageResponse::new("Invoice deleted successfully")))
}
