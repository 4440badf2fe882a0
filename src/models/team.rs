use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use super::Role;

/// TeamMember
///
/// A row of `team_members`, enriched with the linked user's email and names.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct TeamMember {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub position: Option<String>,
    pub department: Option<String>,
    #[ts(type = "string | null")]
    pub salary: Option<Decimal>,
    #[ts(type = "string | null")]
    pub hire_date: Option<NaiveDate>,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,

    #[sqlx(default)]
    pub email: Option<String>,
    #[sqlx(default)]
    pub first_name: Option<String>,
    #[sqlx(default)]
    pub last_name: Option<String>,
}

/// CreateTeamMemberRequest
///
/// Input payload for POST /api/team: user data plus the team-specific fields.
/// `salary` must be positive when present; the handler checks it because
/// `validator` has no decimal range support.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Validate)]
#[serde(rename_all = "camelCase", default)]
#[ts(export)]
pub struct CreateTeamMemberRequest {
    #[validate(length(min = 1, max = 100, message = "First name is required"))]
    pub first_name: String,
    #[validate(length(min = 1, max = 100, message = "Last name is required"))]
    pub last_name: String,
    #[validate(email(message = "Invalid email"))]
    pub email: String,
    #[validate(length(max = 20))]
    pub phone: Option<String>,
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
    pub role: Role,

    #[validate(length(min = 1, max = 100, message = "Position is required"))]
    pub position: String,
    #[validate(length(min = 1, max = 100, message = "Department is required"))]
    pub department: String,
    #[ts(type = "string | number | null")]
    pub salary: Option<Decimal>,
    #[ts(type = "string | null")]
    pub hire_date: Option<NaiveDate>,
}

impl Default for CreateTeamMemberRequest {
    fn default() -> Self {
        Self {
            first_name: String::new(),
            last_name: String::new(),
            email: String::new(),
            phone: None,
            password: String::new(),
            role: Role::Team,
            position: String::new(),
            department: String::new(),
            salary: None,
            hire_date: None,
        }
    }
}

/// UpdateTeamMemberRequest
///
/// Partial update for PUT /api/team/{id}. Team members editing their own
/// record may only send `position` and `department`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct UpdateTeamMemberRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, max = 100))]
    pub position: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, max = 100))]
    pub department: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[ts(type = "string | number | null")]
    pub salary: Option<Decimal>,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[ts(type = "string | null")]
    pub hire_date: Option<NaiveDate>,
}

impl UpdateTeamMemberRequest {
    /// True when the payload touches fields only an admin may change.
    pub fn touches_admin_fields(&self) -> bool {
        self.salary.is_some() || self.hire_date.is_some()
    }
}
