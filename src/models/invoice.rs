use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use super::ParseEnumError;

/// InvoiceStatus
///
/// Transitions between statuses are not enforced: an admin may set any
/// status at any time.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS, ToSchema,
)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum InvoiceStatus {
    #[default]
    Draft,
    Sent,
    Paid,
    Overdue,
    Cancelled,
}

impl InvoiceStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Sent => "sent",
            Self::Paid => "paid",
            Self::Overdue => "overdue",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InvoiceStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(Self::Draft),
            "sent" => Ok(Self::Sent),
            "paid" => Ok(Self::Paid),
            "overdue" => Ok(Self::Overdue),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(ParseEnumError::new("invoice status", other)),
        }
    }
}

impl TryFrom<String> for InvoiceStatus {
    type Error = ParseEnumError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Invoice
///
/// A row of `invoices`. Always belongs to a client, optionally to a project.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Invoice {
    pub id: Uuid,
    pub number: String,
    pub client_id: Uuid,
    pub project_id: Option<Uuid>,
    #[ts(type = "string")]
    pub amount: Decimal,
    #[sqlx(try_from = "String")]
    pub status: InvoiceStatus,
    #[ts(type = "string")]
    pub issue_date: NaiveDate,
    #[ts(type = "string")]
    pub due_date: NaiveDate,
    #[ts(type = "string | null")]
    pub paid_date: Option<NaiveDate>,
    pub description: Option<String>,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

/// CreateInvoiceRequest
///
/// Input payload for POST /api/invoices. Amount positivity and date ordering
/// are checked by the handler.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS, ToSchema, Validate)]
#[serde(rename_all = "camelCase", default)]
#[ts(export)]
pub struct CreateInvoiceRequest {
    #[validate(length(min = 1, max = 50, message = "Invoice number is required"))]
    pub number: String,
    #[validate(required(message = "Client is required"))]
    pub client_id: Option<Uuid>,
    pub project_id: Option<Uuid>,
    #[validate(required(message = "Amount is required"))]
    #[ts(type = "string | number | null")]
    pub amount: Option<Decimal>,
    pub status: InvoiceStatus,
    #[validate(required(message = "Issue date is required"))]
    #[ts(type = "string | null")]
    pub issue_date: Option<NaiveDate>,
    #[validate(required(message = "Due date is required"))]
    #[ts(type = "string | null")]
    pub due_date: Option<NaiveDate>,
    #[ts(type = "string | null")]
    pub paid_date: Option<NaiveDate>,
    pub description: Option<String>,
}

/// UpdateInvoiceRequest
///
/// Partial update for PUT /api/invoices/{id}.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct UpdateInvoiceRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, max = 50))]
    pub number: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_id: Option<Uuid>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<Uuid>,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[ts(type = "string | number | null")]
    pub amount: Option<Decimal>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<InvoiceStatus>,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[ts(type = "string | null")]
    pub issue_date: Option<NaiveDate>,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[ts(type = "string | null")]
    pub due_date: Option<NaiveDate>,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[ts(type = "string | null")]
    pub paid_date: Option<NaiveDate>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}
