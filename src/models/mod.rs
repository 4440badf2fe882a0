//! API and database schemas.
//!
//! Row types derive `FromRow` and map 1:1 onto the tables in `migrations/`.
//! Enum columns are stored as TEXT and decoded through `TryFrom<String>`, so
//! every enum here exposes `as_str()` for binding and a matching parser.

use thiserror::Error;

pub mod client;
pub mod invoice;
pub mod project;
pub mod role;
pub mod settings;
pub mod stats;
pub mod team;
pub mod user;

pub use client::{Client, CreateClientRequest, UpdateClientRequest};
pub use invoice::{CreateInvoiceRequest, Invoice, InvoiceStatus, UpdateInvoiceRequest};
pub use project::{
    CreateAssignmentRequest, CreateProjectRequest, Project, ProjectAssignment, ProjectStatus,
    UpdateProjectRequest,
};
pub use role::{CreateRoleRequest, Permission, UpdateRoleRequest, UserRole};
pub use settings::{NewSetting, SettingType, SystemSetting};
pub use stats::{AdminDashboardStats, ClientStats, TeamStats};
pub use team::{CreateTeamMemberRequest, TeamMember, UpdateTeamMemberRequest};
pub use user::{
    LoginRequest, LoginResponse, MessageResponse, NewUser, Role, SetUserActiveRequest, User,
    UserProfile,
};

/// Raised when a TEXT column or a path/query value holds an unknown enum variant.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid {kind}: {value}")]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}

impl ParseEnumError {
    pub(crate) fn new(kind: &'static str, value: impl Into<String>) -> Self {
        Self {
            kind,
            value: value.into(),
        }
    }
}
