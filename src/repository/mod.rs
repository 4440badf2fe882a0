use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{
    AdminDashboardStats, Client, ClientStats, CreateClientRequest, CreateInvoiceRequest,
    CreateProjectRequest, CreateRoleRequest, CreateTeamMemberRequest, Invoice, NewSetting, NewUser,
    Project, ProjectAssignment, SystemSetting, TeamMember, TeamStats, UpdateClientRequest,
    UpdateInvoiceRequest, UpdateProjectRequest, UpdateRoleRequest, UpdateTeamMemberRequest, User,
    UserRole,
};

mod postgres;

pub use postgres::PostgresRepository;

/// Errors raised by the persistence layer.
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Unique or foreign-key constraint violation.
    #[error("{0}")]
    Conflict(String),
}

pub type RepoResult<T> = Result<T, RepositoryError>;

/// Repository Trait
///
/// The contract for every persistence operation. Handlers only talk to this
/// trait, so tests can swap the Postgres implementation for an in-memory one.
///
/// Lookups return `Ok(None)` / `Ok(false)` for missing rows; `Err` is reserved
/// for conflicts and genuine database failures.
#[async_trait]
pub trait Repository: Send + Sync {
    /// Cheap round trip used by the readiness probe.
    async fn ping(&self) -> RepoResult<()>;

    // --- Users ---
    async fn get_user(&self, id: Uuid) -> RepoResult<Option<User>>;
    async fn get_user_by_email(&self, email: &str) -> RepoResult<Option<User>>;
    async fn list_users(&self) -> RepoResult<Vec<User>>;
    async fn create_user(&self, user: NewUser) -> RepoResult<User>;
    async fn set_user_active(&self, id: Uuid, active: bool) -> RepoResult<Option<User>>;

    // --- Clients ---
    async fn list_clients(&self) -> RepoResult<Vec<Client>>;
    async fn get_client(&self, id: Uuid) -> RepoResult<Option<Client>>;
    async fn get_client_by_user(&self, user_id: Uuid) -> RepoResult<Option<Client>>;
    /// Inserts the user and the client row in one transaction.
    async fn create_client_with_user(
        &self,
        user: NewUser,
        req: CreateClientRequest,
    ) -> RepoResult<Client>;
    async fn update_client(&self, id: Uuid, req: UpdateClientRequest)
    -> RepoResult<Option<Client>>;
    /// Deletes the client and its user. Conflict when projects/invoices still reference it.
    async fn delete_client(&self, id: Uuid) -> RepoResult<bool>;

    // --- Team ---
    async fn list_team_members(&self) -> RepoResult<Vec<TeamMember>>;
    async fn get_team_member(&self, id: Uuid) -> RepoResult<Option<TeamMember>>;
    async fn get_team_member_by_user(&self, user_id: Uuid) -> RepoResult<Option<TeamMember>>;
    /// Inserts the user and the team member row in one transaction.
    async fn create_team_member_with_user(
        &self,
        user: NewUser,
        req: CreateTeamMemberRequest,
    ) -> RepoResult<TeamMember>;
    async fn update_team_member(
        &self,
        id: Uuid,
        req: UpdateTeamMemberRequest,
    ) -> RepoResult<Option<TeamMember>>;
    async fn delete_team_member(&self, id: Uuid) -> RepoResult<bool>;

    // --- Projects ---
    async fn list_projects(&self) -> RepoResult<Vec<Project>>;
    async fn list_projects_by_team_member(&self, team_member_id: Uuid) -> RepoResult<Vec<Project>>;
    async fn get_project(&self, id: Uuid) -> RepoResult<Option<Project>>;
    async fn create_project(&self, req: CreateProjectRequest) -> RepoResult<Project>;
    async fn update_project(
        &self,
        id: Uuid,
        req: UpdateProjectRequest,
    ) -> RepoResult<Option<Project>>;
    async fn delete_project(&self, id: Uuid) -> RepoResult<bool>;

    // --- Assignments ---
    async fn is_assigned(&self, project_id: Uuid, team_member_id: Uuid) -> RepoResult<bool>;
    async fn list_assignments(&self, project_id: Uuid) -> RepoResult<Vec<ProjectAssignment>>;
    async fn assign_team_member(
        &self,
        project_id: Uuid,
        team_member_id: Uuid,
        role: Option<String>,
    ) -> RepoResult<ProjectAssignment>;
    async fn unassign_team_member(&self, project_id: Uuid, team_member_id: Uuid)
    -> RepoResult<bool>;

    // --- Invoices ---
    async fn list_invoices(&self) -> RepoResult<Vec<Invoice>>;
    async fn list_invoices_by_client(&self, client_id: Uuid) -> RepoResult<Vec<Invoice>>;
    async fn get_invoice(&self, id: Uuid) -> RepoResult<Option<Invoice>>;
    async fn create_invoice(&self, req: CreateInvoiceRequest) -> RepoResult<Invoice>;
    async fn update_invoice(
        &self,
        id: Uuid,
        req: UpdateInvoiceRequest,
    ) -> RepoResult<Option<Invoice>>;
    async fn delete_invoice(&self, id: Uuid) -> RepoResult<bool>;

    // --- Dashboard stats ---
    async fn admin_stats(&self) -> RepoResult<AdminDashboardStats>;
    async fn client_stats(&self, client_id: Uuid) -> RepoResult<ClientStats>;
    async fn team_stats(&self, team_member_id: Uuid) -> RepoResult<TeamStats>;

    // --- System settings ---
    async fn list_settings(&self) -> RepoResult<Vec<SystemSetting>>;
    /// Insert or overwrite every setting by key. All or nothing.
    async fn set_settings(&self, settings: &[NewSetting]) -> RepoResult<Vec<SystemSetting>>;
    async fn delete_setting(&self, key: &str) -> RepoResult<bool>;

    // --- Roles ---
    async fn list_roles(&self) -> RepoResult<Vec<UserRole>>;
    async fn get_role(&self, id: Uuid) -> RepoResult<Option<UserRole>>;
    async fn create_role(&self, req: CreateRoleRequest) -> RepoResult<UserRole>;
    async fn update_role(&self, id: Uuid, req: UpdateRoleRequest) -> RepoResult<Option<UserRole>>;
    /// Never deletes system roles.
    async fn delete_role(&self, id: Uuid) -> RepoResult<bool>;
}

/// RepositoryState
///
/// The concrete type used to share the persistence layer across the application state.
pub type RepositoryState = Arc<dyn Repository>;
