use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use super::ParseEnumError;

/// Permission
///
/// The catalog of permission names a [`UserRole`] may carry. Stored in the
/// database as the dotted string form (`clients.view`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub enum Permission {
    #[serde(rename = "dashboard.view")]
    DashboardView,
    #[serde(rename = "users.view")]
    UsersView,
    #[serde(rename = "users.create")]
    UsersCreate,
    #[serde(rename = "users.edit")]
    UsersEdit,
    #[serde(rename = "users.delete")]
    UsersDelete,
    #[serde(rename = "clients.view")]
    ClientsView,
    #[serde(rename = "clients.create")]
    ClientsCreate,
    #[serde(rename = "clients.edit")]
    ClientsEdit,
    #[serde(rename = "clients.delete")]
    ClientsDelete,
    #[serde(rename = "team.view")]
    TeamView,
    #[serde(rename = "team.create")]
    TeamCreate,
    #[serde(rename = "team.edit")]
    TeamEdit,
    #[serde(rename = "team.delete")]
    TeamDelete,
    #[serde(rename = "projects.view")]
    ProjectsView,
    #[serde(rename = "projects.create")]
    ProjectsCreate,
    #[serde(rename = "projects.edit")]
    ProjectsEdit,
    #[serde(rename = "projects.delete")]
    ProjectsDelete,
    #[serde(rename = "invoices.view")]
    InvoicesView,
    #[serde(rename = "invoices.create")]
    InvoicesCreate,
    #[serde(rename = "invoices.edit")]
    InvoicesEdit,
    #[serde(rename = "invoices.delete")]
    InvoicesDelete,
    #[serde(rename = "settings.view")]
    SettingsView,
    #[serde(rename = "settings.edit")]
    SettingsEdit,
    #[serde(rename = "reports.view")]
    ReportsView,
}

impl Permission {
    pub const ALL: [Permission; 24] = [
        Self::DashboardView,
        Self::UsersView,
        Self::UsersCreate,
        Self::UsersEdit,
        Self::UsersDelete,
        Self::ClientsView,
        Self::ClientsCreate,
        Self::ClientsEdit,
        Self::ClientsDelete,
        Self::TeamView,
        Self::TeamCreate,
        Self::TeamEdit,
        Self::TeamDelete,
        Self::ProjectsView,
        Self::ProjectsCreate,
        Self::ProjectsEdit,
        Self::ProjectsDelete,
        Self::InvoicesView,
        Self::InvoicesCreate,
        Self::InvoicesEdit,
        Self::InvoicesDelete,
        Self::SettingsView,
        Self::SettingsEdit,
        Self::ReportsView,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::DashboardView => "dashboard.view",
            Self::UsersView => "users.view",
            Self::UsersCreate => "users.create",
            Self::UsersEdit => "users.edit",
            Self::UsersDelete => "users.delete",
            Self::ClientsView => "clients.view",
            Self::ClientsCreate => "clients.create",
            Self::ClientsEdit => "clients.edit",
            Self::ClientsDelete => "clients.delete",
            Self::TeamView => "team.view",
            Self::TeamCreate => "team.create",
            Self::TeamEdit => "team.edit",
            Self::TeamDelete => "team.delete",
            Self::ProjectsView => "projects.view",
            Self::ProjectsCreate => "projects.create",
            Self::ProjectsEdit => "projects.edit",
            Self::ProjectsDelete => "projects.delete",
            Self::InvoicesView => "invoices.view",
            Self::InvoicesCreate => "invoices.create",
            Self::InvoicesEdit => "invoices.edit",
            Self::InvoicesDelete => "invoices.delete",
            Self::SettingsView => "settings.view",
            Self::SettingsEdit => "settings.edit",
            Self::ReportsView => "reports.view",
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Permission {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| ParseEnumError::new("permission", s))
    }
}

/// UserRole
///
/// A named permission set from `user_roles`. System roles (admin, team,
/// client) are seeded by the migration and are protected from deletion and
/// renaming.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct UserRole {
    pub id: Uuid,
    pub name: String,
    pub display_name: String,
    pub description: Option<String>,
    pub permissions: Vec<String>,
    pub is_system: bool,
    pub active: bool,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

/// CreateRoleRequest
///
/// Input payload for POST /api/admin/roles. The name pattern (`^[a-z_]+$`)
/// and the permission catalog are checked by the handler.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Validate)]
#[serde(rename_all = "camelCase", default)]
#[ts(export)]
pub struct CreateRoleRequest {
    #[validate(length(min = 1, max = 50, message = "Role name is required"))]
    pub name: String,
    #[validate(length(min = 1, max = 100, message = "Display name is required"))]
    pub display_name: String,
    pub description: Option<String>,
    pub permissions: Vec<String>,
    pub active: bool,
}

impl Default for CreateRoleRequest {
    fn default() -> Self {
        Self {
            name: String::new(),
            display_name: String::new(),
            description: None,
            permissions: Vec::new(),
            active: true,
        }
    }
}

/// UpdateRoleRequest
///
/// Partial update for PUT /api/admin/roles/{id}.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct UpdateRoleRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, max = 50))]
    pub name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, max = 100))]
    pub display_name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub permissions: Option<Vec<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
}
