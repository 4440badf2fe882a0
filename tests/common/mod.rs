//! Shared test scaffolding: an in-memory `Repository`, seeding helpers and a
//! router wired to an in-memory session store.
#![allow(dead_code)]

use std::sync::{
    Arc, Mutex, OnceLock,
    atomic::{AtomicBool, Ordering},
};

use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use business_portal::{
    AppConfig, AppState,
    auth::{AuthUser, hash_password},
    create_router,
    models::{
        AdminDashboardStats, Client, ClientStats, CreateClientRequest, CreateInvoiceRequest,
        CreateProjectRequest, CreateRoleRequest, CreateTeamMemberRequest, Invoice, InvoiceStatus,
        NewSetting, NewUser, Project, ProjectAssignment, ProjectStatus, Role, SettingType,
        SystemSetting, TeamMember, TeamStats, UpdateClientRequest, UpdateInvoiceRequest,
        UpdateProjectRequest, UpdateRoleRequest, UpdateTeamMemberRequest, User, UserRole,
    },
    repository::{RepoResult, Repository, RepositoryError, RepositoryState},
    session::create_session_layer,
};
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use serde_json::Value;
use tower::ServiceExt;
use tower_sessions::{MemoryStore, SessionStore};
use uuid::Uuid;

/// Every seeded account uses this password.
pub const PASSWORD: &str = "password123";

/// Argon2 is slow in debug builds; hash the shared password once.
pub fn password_hash() -> String {
    static HASH: OnceLock<String> = OnceLock::new();
    HASH.get_or_init(|| hash_password(PASSWORD).expect("hashing works"))
        .clone()
}

#[derive(Default)]
struct Store {
    users: Vec<User>,
    clients: Vec<Client>,
    team: Vec<TeamMember>,
    projects: Vec<Project>,
    assignments: Vec<ProjectAssignment>,
    invoices: Vec<Invoice>,
    settings: Vec<SystemSetting>,
    roles: Vec<UserRole>,
}

impl Store {
    fn user(&self, id: Option<Uuid>) -> Option<&User> {
        id.and_then(|id| self.users.iter().find(|u| u.id == id))
    }

    fn with_user_client(&self, mut client: Client) -> Client {
        if let Some(user) = self.user(client.user_id) {
            client.email = Some(user.email.clone());
            client.first_name = user.first_name.clone();
            client.last_name = user.last_name.clone();
        }
        client
    }

    fn with_user_member(&self, mut member: TeamMember) -> TeamMember {
        if let Some(user) = self.user(member.user_id) {
            member.email = Some(user.email.clone());
            member.first_name = user.first_name.clone();
            member.last_name = user.last_name.clone();
        }
        member
    }

    fn insert_user(&mut self, new: NewUser) -> RepoResult<User> {
        if self.users.iter().any(|u| u.email == new.email) {
            return Err(RepositoryError::Conflict("email already exists".into()));
        }
        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            email: new.email,
            first_name: new.first_name,
            last_name: new.last_name,
            phone: new.phone,
            profile_image_url: None,
            password_hash: Some(new.password_hash),
            role: new.role,
            active: true,
            created_at: now,
            updated_at: now,
        };
        self.users.push(user.clone());
        Ok(user)
    }

    fn assigned_projects(&self, team_member_id: Uuid) -> Vec<Project> {
        self.projects
            .iter()
            .filter(|p| {
                self.assignments
                    .iter()
                    .any(|a| a.project_id == p.id && a.team_member_id == team_member_id)
            })
            .cloned()
            .collect()
    }
}

/// In-memory `Repository` mirroring the constraint behavior of the Postgres one.
#[derive(Default)]
pub struct InMemoryRepository {
    store: Mutex<Store>,
    unavailable: AtomicBool,
    rejected_setting: Mutex<Option<String>>,
}

impl InMemoryRepository {
    pub fn new() -> Arc<Self> {
        let repo = Self::default();
        {
            let mut store = repo.store.lock().unwrap();
            for (name, display) in [("admin", "Administrator"), ("team", "Team"), ("client", "Client")] {
                store.roles.push(UserRole {
                    id: Uuid::new_v4(),
                    name: name.into(),
                    display_name: display.into(),
                    description: None,
                    permissions: vec!["dashboard.view".into()],
                    is_system: true,
                    active: true,
                    created_at: Utc::now(),
                    updated_at: Utc::now(),
                });
            }
        }
        Arc::new(repo)
    }

    /// Make `ping` fail, as if the database were unreachable.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Make any settings batch containing `key` fail, as a database error would.
    pub fn reject_setting(&self, key: &str) {
        *self.rejected_setting.lock().unwrap() = Some(key.to_string());
    }

    pub fn setting_value(&self, key: &str) -> Option<String> {
        self.store
            .lock()
            .unwrap()
            .settings
            .iter()
            .find(|s| s.setting_key == key)
            .and_then(|s| s.setting_value.clone())
    }

    // --- Seeding ---

    pub fn seed_user(&self, email: &str, role: Role, active: bool) -> User {
        let mut store = self.store.lock().unwrap();
        let mut user = store
            .insert_user(NewUser {
                email: email.into(),
                first_name: Some("Test".into()),
                last_name: Some(role.to_string()),
                phone: None,
                password_hash: password_hash(),
                role,
            })
            .expect("unique email");
        if !active {
            user.active = false;
            if let Some(stored) = store.users.iter_mut().find(|u| u.id == user.id) {
                stored.active = false;
            }
        }
        user
    }

    pub fn seed_client(&self, email: &str) -> (User, Client) {
        let user = self.seed_user(email, Role::Client, true);
        let mut store = self.store.lock().unwrap();
        let client = Client {
            id: Uuid::new_v4(),
            user_id: Some(user.id),
            company_name: Some(format!("{email} Ltd")),
            created_at: Utc::now(),
            updated_at: Utc::now(),
            ..Default::default()
        };
        store.clients.push(client.clone());
        let client = store.with_user_client(client);
        (user, client)
    }

    pub fn seed_team_member(&self, email: &str) -> (User, TeamMember) {
        let user = self.seed_user(email, Role::Team, true);
        let mut store = self.store.lock().unwrap();
        let member = TeamMember {
            id: Uuid::new_v4(),
            user_id: Some(user.id),
            position: Some("Developer".into()),
            department: Some("Engineering".into()),
            salary: Some(Decimal::new(500000, 2)),
            hire_date: NaiveDate::from_ymd_opt(2024, 1, 15),
            created_at: Utc::now(),
            updated_at: Utc::now(),
            ..Default::default()
        };
        store.team.push(member.clone());
        let member = store.with_user_member(member);
        (user, member)
    }

    pub fn seed_project(&self, name: &str, client_id: Option<Uuid>, status: ProjectStatus) -> Project {
        let project = Project {
            id: Uuid::new_v4(),
            name: name.into(),
            client_id,
            status,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            ..Default::default()
        };
        self.store.lock().unwrap().projects.push(project.clone());
        project
    }

    pub fn seed_assignment(&self, project_id: Uuid, team_member_id: Uuid) {
        self.store.lock().unwrap().assignments.push(ProjectAssignment {
            id: Uuid::new_v4(),
            project_id,
            team_member_id,
            role: None,
            assigned_at: Utc::now(),
        });
    }

    pub fn seed_invoice(
        &self,
        number: &str,
        client_id: Uuid,
        amount: Decimal,
        status: InvoiceStatus,
        due_date: NaiveDate,
    ) -> Invoice {
        let invoice = Invoice {
            id: Uuid::new_v4(),
            number: number.into(),
            client_id,
            amount,
            status,
            issue_date: due_date - chrono::Duration::days(30),
            due_date,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            ..Default::default()
        };
        self.store.lock().unwrap().invoices.push(invoice.clone());
        invoice
    }

    pub fn seed_setting(&self, key: &str, value: &str, setting_type: SettingType) {
        self.store.lock().unwrap().settings.push(SystemSetting {
            id: Uuid::new_v4(),
            setting_key: key.into(),
            setting_value: Some(value.into()),
            setting_type,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        });
    }

    pub fn system_role_id(&self, name: &str) -> Uuid {
        self.store
            .lock()
            .unwrap()
            .roles
            .iter()
            .find(|r| r.name == name)
            .map(|r| r.id)
            .expect("system role seeded")
    }

    pub fn user_count(&self) -> usize {
        self.store.lock().unwrap().users.len()
    }
}

#[async_trait]
impl Repository for InMemoryRepository {
    async fn ping(&self) -> RepoResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            Err(RepositoryError::Database(sqlx::Error::PoolTimedOut))
        } else {
            Ok(())
        }
    }

    async fn get_user(&self, id: Uuid) -> RepoResult<Option<User>> {
        Ok(self.store.lock().unwrap().user(Some(id)).cloned())
    }

    async fn get_user_by_email(&self, email: &str) -> RepoResult<Option<User>> {
        let store = self.store.lock().unwrap();
        Ok(store.users.iter().find(|u| u.email == email).cloned())
    }

    async fn list_users(&self) -> RepoResult<Vec<User>> {
        Ok(self.store.lock().unwrap().users.clone())
    }

    async fn create_user(&self, user: NewUser) -> RepoResult<User> {
        self.store.lock().unwrap().insert_user(user)
    }

    async fn set_user_active(&self, id: Uuid, active: bool) -> RepoResult<Option<User>> {
        let mut store = self.store.lock().unwrap();
        Ok(store.users.iter_mut().find(|u| u.id == id).map(|u| {
            u.active = active;
            u.clone()
        }))
    }

    async fn list_clients(&self) -> RepoResult<Vec<Client>> {
        let store = self.store.lock().unwrap();
        Ok(store
            .clients
            .iter()
            .cloned()
            .map(|c| store.with_user_client(c))
            .collect())
    }

    async fn get_client(&self, id: Uuid) -> RepoResult<Option<Client>> {
        let store = self.store.lock().unwrap();
        Ok(store
            .clients
            .iter()
            .find(|c| c.id == id)
            .cloned()
            .map(|c| store.with_user_client(c)))
    }

    async fn get_client_by_user(&self, user_id: Uuid) -> RepoResult<Option<Client>> {
        let store = self.store.lock().unwrap();
        Ok(store
            .clients
            .iter()
            .find(|c| c.user_id == Some(user_id))
            .cloned()
            .map(|c| store.with_user_client(c)))
    }

    async fn create_client_with_user(
        &self,
        user: NewUser,
        req: CreateClientRequest,
    ) -> RepoResult<Client> {
        let mut store = self.store.lock().unwrap();
        let created = store.insert_user(user)?;
        let client = Client {
            id: Uuid::new_v4(),
            user_id: Some(created.id),
            company_name: req.company_name,
            phone: req.phone,
            address: req.address,
            city: req.city,
            state: req.state,
            zip_code: req.zip_code,
            tax_id: req.tax_id,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            ..Default::default()
        };
        store.clients.push(client.clone());
        Ok(store.with_user_client(client))
    }

    async fn update_client(
        &self,
        id: Uuid,
        req: UpdateClientRequest,
    ) -> RepoResult<Option<Client>> {
        let mut store = self.store.lock().unwrap();
        let Some(client) = store.clients.iter_mut().find(|c| c.id == id) else {
            return Ok(None);
        };
        if req.company_name.is_some() {
            client.company_name = req.company_name;
        }
        if req.phone.is_some() {
            client.phone = req.phone;
        }
        if req.address.is_some() {
            client.address = req.address;
        }
        if req.city.is_some() {
            client.city = req.city;
        }
        if req.state.is_some() {
            client.state = req.state;
        }
        if req.zip_code.is_some() {
            client.zip_code = req.zip_code;
        }
        if req.tax_id.is_some() {
            client.tax_id = req.tax_id;
        }
        client.updated_at = Utc::now();
        let client = client.clone();
        Ok(Some(store.with_user_client(client)))
    }

    async fn delete_client(&self, id: Uuid) -> RepoResult<bool> {
        let mut store = self.store.lock().unwrap();
        let Some(pos) = store.clients.iter().position(|c| c.id == id) else {
            return Ok(false);
        };
        let referenced = store.projects.iter().any(|p| p.client_id == Some(id))
            || store.invoices.iter().any(|i| i.client_id == id);
        if referenced {
            return Err(RepositoryError::Conflict(
                "client still has projects or invoices".into(),
            ));
        }
        let client = store.clients.remove(pos);
        store.users.retain(|u| Some(u.id) != client.user_id);
        Ok(true)
    }

    async fn list_team_members(&self) -> RepoResult<Vec<TeamMember>> {
        let store = self.store.lock().unwrap();
        Ok(store
            .team
            .iter()
            .cloned()
            .map(|m| store.with_user_member(m))
            .collect())
    }

    async fn get_team_member(&self, id: Uuid) -> RepoResult<Option<TeamMember>> {
        let store = self.store.lock().unwrap();
        Ok(store
            .team
            .iter()
            .find(|m| m.id == id)
            .cloned()
            .map(|m| store.with_user_member(m)))
    }

    async fn get_team_member_by_user(&self, user_id: Uuid) -> RepoResult<Option<TeamMember>> {
        let store = self.store.lock().unwrap();
        Ok(store
            .team
            .iter()
            .find(|m| m.user_id == Some(user_id))
            .cloned()
            .map(|m| store.with_user_member(m)))
    }

    async fn create_team_member_with_user(
        &self,
        user: NewUser,
        req: CreateTeamMemberRequest,
    ) -> RepoResult<TeamMember> {
        let mut store = self.store.lock().unwrap();
        let created = store.insert_user(user)?;
        let member = TeamMember {
            id: Uuid::new_v4(),
            user_id: Some(created.id),
            position: Some(req.position),
            department: Some(req.department),
            salary: req.salary,
            hire_date: Some(req.hire_date.unwrap_or_else(|| Utc::now().date_naive())),
            created_at: Utc::now(),
            updated_at: Utc::now(),
            ..Default::default()
        };
        store.team.push(member.clone());
        Ok(store.with_user_member(member))
    }

    async fn update_team_member(
        &self,
        id: Uuid,
        req: UpdateTeamMemberRequest,
    ) -> RepoResult<Option<TeamMember>> {
        let mut store = self.store.lock().unwrap();
        let Some(member) = store.team.iter_mut().find(|m| m.id == id) else {
            return Ok(None);
        };
        if req.position.is_some() {
            member.position = req.position;
        }
        if req.department.is_some() {
            member.department = req.department;
        }
        if req.salary.is_some() {
            member.salary = req.salary;
        }
        if req.hire_date.is_some() {
            member.hire_date = req.hire_date;
        }
        member.updated_at = Utc::now();
        let member = member.clone();
        Ok(Some(store.with_user_member(member)))
    }

    async fn delete_team_member(&self, id: Uuid) -> RepoResult<bool> {
        let mut store = self.store.lock().unwrap();
        let Some(pos) = store.team.iter().position(|m| m.id == id) else {
            return Ok(false);
        };
        let member = store.team.remove(pos);
        store.assignments.retain(|a| a.team_member_id != id);
        store.users.retain(|u| Some(u.id) != member.user_id);
        Ok(true)
    }

    async fn list_projects(&self) -> RepoResult<Vec<Project>> {
        Ok(self.store.lock().unwrap().projects.clone())
    }

    async fn list_projects_by_team_member(&self, team_member_id: Uuid) -> RepoResult<Vec<Project>> {
        Ok(self.store.lock().unwrap().assigned_projects(team_member_id))
    }

    async fn get_project(&self, id: Uuid) -> RepoResult<Option<Project>> {
        let store = self.store.lock().unwrap();
        Ok(store.projects.iter().find(|p| p.id == id).cloned())
    }

    async fn create_project(&self, req: CreateProjectRequest) -> RepoResult<Project> {
        let mut store = self.store.lock().unwrap();
        if let Some(client_id) = req.client_id {
            if !store.clients.iter().any(|c| c.id == client_id) {
                return Err(RepositoryError::Conflict("client does not exist".into()));
            }
        }
        let project = Project {
            id: Uuid::new_v4(),
            name: req.name,
            description: req.description,
            client_id: req.client_id,
            status: req.status,
            start_date: req.start_date,
            end_date: req.end_date,
            budget: req.budget,
            progress: req.progress,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        store.projects.push(project.clone());
        Ok(project)
    }

    async fn update_project(
        &self,
        id: Uuid,
        req: UpdateProjectRequest,
    ) -> RepoResult<Option<Project>> {
        let mut store = self.store.lock().unwrap();
        let Some(project) = store.projects.iter_mut().find(|p| p.id == id) else {
            return Ok(None);
        };
        if let Some(name) = req.name {
            project.name = name;
        }
        if req.description.is_some() {
            project.description = req.description;
        }
        if req.client_id.is_some() {
            project.client_id = req.client_id;
        }
        if let Some(status) = req.status {
            project.status = status;
        }
        if req.start_date.is_some() {
            project.start_date = req.start_date;
        }
        if req.end_date.is_some() {
            project.end_date = req.end_date;
        }
        if req.budget.is_some() {
            project.budget = req.budget;
        }
        if let Some(progress) = req.progress {
            project.progress = progress;
        }
        project.updated_at = Utc::now();
        Ok(Some(project.clone()))
    }

    async fn delete_project(&self, id: Uuid) -> RepoResult<bool> {
        let mut store = self.store.lock().unwrap();
        let before = store.projects.len();
        store.projects.retain(|p| p.id != id);
        store.assignments.retain(|a| a.project_id != id);
        for invoice in store.invoices.iter_mut().filter(|i| i.project_id == Some(id)) {
            invoice.project_id = None;
        }
        Ok(store.projects.len() < before)
    }

    async fn is_assigned(&self, project_id: Uuid, team_member_id: Uuid) -> RepoResult<bool> {
        let store = self.store.lock().unwrap();
        Ok(store
            .assignments
            .iter()
            .any(|a| a.project_id == project_id && a.team_member_id == team_member_id))
    }

    async fn list_assignments(&self, project_id: Uuid) -> RepoResult<Vec<ProjectAssignment>> {
        let store = self.store.lock().unwrap();
        Ok(store
            .assignments
            .iter()
            .filter(|a| a.project_id == project_id)
            .cloned()
            .collect())
    }

    async fn assign_team_member(
        &self,
        project_id: Uuid,
        team_member_id: Uuid,
        role: Option<String>,
    ) -> RepoResult<ProjectAssignment> {
        let mut store = self.store.lock().unwrap();
        if store
            .assignments
            .iter()
            .any(|a| a.project_id == project_id && a.team_member_id == team_member_id)
        {
            return Err(RepositoryError::Conflict(
                "team member is already assigned to this project".into(),
            ));
        }
        let assignment = ProjectAssignment {
            id: Uuid::new_v4(),
            project_id,
            team_member_id,
            role,
            assigned_at: Utc::now(),
        };
        store.assignments.push(assignment.clone());
        Ok(assignment)
    }

    async fn unassign_team_member(
        &self,
        project_id: Uuid,
        team_member_id: Uuid,
    ) -> RepoResult<bool> {
        let mut store = self.store.lock().unwrap();
        let before = store.assignments.len();
        store
            .assignments
            .retain(|a| !(a.project_id == project_id && a.team_member_id == team_member_id));
        Ok(store.assignments.len() < before)
    }

    async fn list_invoices(&self) -> RepoResult<Vec<Invoice>> {
        Ok(self.store.lock().unwrap().invoices.clone())
    }

    async fn list_invoices_by_client(&self, client_id: Uuid) -> RepoResult<Vec<Invoice>> {
        let store = self.store.lock().unwrap();
        Ok(store
            .invoices
            .iter()
            .filter(|i| i.client_id == client_id)
            .cloned()
            .collect())
    }

    async fn get_invoice(&self, id: Uuid) -> RepoResult<Option<Invoice>> {
        let store = self.store.lock().unwrap();
        Ok(store.invoices.iter().find(|i| i.id == id).cloned())
    }

    async fn create_invoice(&self, req: CreateInvoiceRequest) -> RepoResult<Invoice> {
        let mut store = self.store.lock().unwrap();
        if store.invoices.iter().any(|i| i.number == req.number) {
            return Err(RepositoryError::Conflict(
                "invoice number already exists".into(),
            ));
        }
        let client_id = req.client_id.unwrap_or_default();
        if !store.clients.iter().any(|c| c.id == client_id) {
            return Err(RepositoryError::Conflict(
                "client or project does not exist".into(),
            ));
        }
        let invoice = Invoice {
            id: Uuid::new_v4(),
            number: req.number,
            client_id,
            project_id: req.project_id,
            amount: req.amount.unwrap_or_default(),
            status: req.status,
            issue_date: req.issue_date.unwrap_or_default(),
            due_date: req.due_date.unwrap_or_default(),
            paid_date: req.paid_date,
            description: req.description,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        store.invoices.push(invoice.clone());
        Ok(invoice)
    }

    async fn update_invoice(
        &self,
        id: Uuid,
        req: UpdateInvoiceRequest,
    ) -> RepoResult<Option<Invoice>> {
        let mut store = self.store.lock().unwrap();
        if let Some(number) = &req.number {
            if store.invoices.iter().any(|i| &i.number == number && i.id != id) {
                return Err(RepositoryError::Conflict(
                    "invoice number already exists".into(),
                ));
            }
        }
        let Some(invoice) = store.invoices.iter_mut().find(|i| i.id == id) else {
            return Ok(None);
        };
        if let Some(number) = req.number {
            invoice.number = number;
        }
        if let Some(client_id) = req.client_id {
            invoice.client_id = client_id;
        }
        if req.project_id.is_some() {
            invoice.project_id = req.project_id;
        }
        if let Some(amount) = req.amount {
            invoice.amount = amount;
        }
        if let Some(status) = req.status {
            invoice.status = status;
        }
        if let Some(issue_date) = req.issue_date {
            invoice.issue_date = issue_date;
        }
        if let Some(due_date) = req.due_date {
            invoice.due_date = due_date;
        }
        if req.paid_date.is_some() {
            invoice.paid_date = req.paid_date;
        }
        if req.description.is_some() {
            invoice.description = req.description;
        }
        invoice.updated_at = Utc::now();
        Ok(Some(invoice.clone()))
    }

    async fn delete_invoice(&self, id: Uuid) -> RepoResult<bool> {
        let mut store = self.store.lock().unwrap();
        let before = store.invoices.len();
        store.invoices.retain(|i| i.id != id);
        Ok(store.invoices.len() < before)
    }

    async fn admin_stats(&self) -> RepoResult<AdminDashboardStats> {
        let store = self.store.lock().unwrap();
        Ok(AdminDashboardStats {
            total_clients: store.clients.len() as i64,
            total_revenue: store
                .invoices
                .iter()
                .filter(|i| i.status == InvoiceStatus::Paid)
                .map(|i| i.amount)
                .sum(),
            active_projects: store
                .projects
                .iter()
                .filter(|p| p.status == ProjectStatus::Active)
                .count() as i64,
            team_members: store.team.len() as i64,
        })
    }

    async fn client_stats(&self, client_id: Uuid) -> RepoResult<ClientStats> {
        let store = self.store.lock().unwrap();
        let open: Vec<&Invoice> = store
            .invoices
            .iter()
            .filter(|i| i.client_id == client_id && i.status == InvoiceStatus::Sent)
            .collect();
        Ok(ClientStats {
            pending_invoices: open.len() as i64,
            total_open: open.iter().map(|i| i.amount).sum(),
            next_due: open.iter().map(|i| i.due_date).min(),
        })
    }

    async fn team_stats(&self, team_member_id: Uuid) -> RepoResult<TeamStats> {
        let store = self.store.lock().unwrap();
        let projects = store.assigned_projects(team_member_id);
        let today = Utc::now().date_naive();
        let count = |status: &[ProjectStatus], today_only: bool| {
            projects
                .iter()
                .filter(|p| status.contains(&p.status))
                .filter(|p| !today_only || p.updated_at.date_naive() == today)
                .count() as i64
        };
        Ok(TeamStats {
            active_projects: count(&[ProjectStatus::Active], false),
            pending_tasks: count(&[ProjectStatus::Planning, ProjectStatus::OnHold], false),
            completed_today: count(&[ProjectStatus::Completed], true),
        })
    }

    async fn list_settings(&self) -> RepoResult<Vec<SystemSetting>> {
        Ok(self.store.lock().unwrap().settings.clone())
    }

    async fn set_settings(&self, settings: &[NewSetting]) -> RepoResult<Vec<SystemSetting>> {
        let rejected = self.rejected_setting.lock().unwrap().clone();
        if settings.iter().any(|s| Some(&s.key) == rejected.as_ref()) {
            return Err(RepositoryError::Database(sqlx::Error::PoolTimedOut));
        }

        let mut store = self.store.lock().unwrap();
        let mut saved = Vec::with_capacity(settings.len());
        for new in settings {
            let row = match store.settings.iter_mut().find(|s| s.setting_key == new.key) {
                Some(existing) => {
                    existing.setting_value = new.value.clone();
                    existing.setting_type = new.setting_type;
                    existing.updated_at = Utc::now();
                    existing.clone()
                }
                None => {
                    let setting = SystemSetting {
                        id: Uuid::new_v4(),
                        setting_key: new.key.clone(),
                        setting_value: new.value.clone(),
                        setting_type: new.setting_type,
                        created_at: Utc::now(),
                        updated_at: Utc::now(),
                    };
                    store.settings.push(setting.clone());
                    setting
                }
            };
            saved.push(row);
        }
        Ok(saved)
    }

    async fn delete_setting(&self, key: &str) -> RepoResult<bool> {
        let mut store = self.store.lock().unwrap();
        let before = store.settings.len();
        store.settings.retain(|s| s.setting_key != key);
        Ok(store.settings.len() < before)
    }

    async fn list_roles(&self) -> RepoResult<Vec<UserRole>> {
        Ok(self.store.lock().unwrap().roles.clone())
    }

    async fn get_role(&self, id: Uuid) -> RepoResult<Option<UserRole>> {
        let store = self.store.lock().unwrap();
        Ok(store.roles.iter().find(|r| r.id == id).cloned())
    }

    async fn create_role(&self, req: CreateRoleRequest) -> RepoResult<UserRole> {
        let mut store = self.store.lock().unwrap();
        if store.roles.iter().any(|r| r.name == req.name) {
            return Err(RepositoryError::Conflict("role name already exists".into()));
        }
        let role = UserRole {
            id: Uuid::new_v4(),
            name: req.name,
            display_name: req.display_name,
            description: req.description,
            permissions: req.permissions,
            is_system: false,
            active: req.active,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        store.roles.push(role.clone());
        Ok(role)
    }

    async fn update_role(&self, id: Uuid, req: UpdateRoleRequest) -> RepoResult<Option<UserRole>> {
        let mut store = self.store.lock().unwrap();
        if let Some(name) = &req.name {
            if store.roles.iter().any(|r| &r.name == name && r.id != id) {
                return Err(RepositoryError::Conflict("role name already exists".into()));
            }
        }
        let Some(role) = store.roles.iter_mut().find(|r| r.id == id) else {
            return Ok(None);
        };
        if let Some(name) = req.name {
            role.name = name;
        }
        if let Some(display_name) = req.display_name {
            role.display_name = display_name;
        }
        if req.description.is_some() {
            role.description = req.description;
        }
        if let Some(permissions) = req.permissions {
            role.permissions = permissions;
        }
        if let Some(active) = req.active {
            role.active = active;
        }
        role.updated_at = Utc::now();
        Ok(Some(role.clone()))
    }

    async fn delete_role(&self, id: Uuid) -> RepoResult<bool> {
        let mut store = self.store.lock().unwrap();
        let before = store.roles.len();
        store.roles.retain(|r| r.id != id || r.is_system);
        Ok(store.roles.len() < before)
    }
}

// --- State & router helpers ---

pub fn create_test_state(repo: Arc<InMemoryRepository>) -> AppState {
    AppState {
        repo: repo as RepositoryState,
        config: AppConfig::default(),
    }
}

/// The full application router over an in-memory session store.
pub fn test_router(repo: Arc<InMemoryRepository>) -> Router {
    router_with_store(repo, MemoryStore::default())
}

/// The full application router over any session store.
pub fn router_with_store<S>(repo: Arc<InMemoryRepository>, store: S) -> Router
where
    S: SessionStore + Clone,
{
    let config = AppConfig::default();
    let sessions = create_session_layer(store, &config);
    create_router(create_test_state(repo), sessions)
}

pub fn auth_user(user: &User) -> AuthUser {
    AuthUser::from(user)
}

/// Send one request through the router, returning status and parsed JSON body
/// (`Value::Null` for empty or non-JSON bodies) plus any `Set-Cookie` value.
pub async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    cookie: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value, Option<String>) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let set_cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .map(str::to_owned);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

    (status, json, set_cookie)
}

/// Log in through the API and return the session cookie (`name=value`).
pub async fn login(app: &Router, email: &str) -> String {
    let (status, body, cookie) = send(
        app,
        Method::POST,
        "/api/auth/login",
        None,
        Some(serde_json::json!({ "email": email, "password": PASSWORD })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "login failed: {body}");
    cookie.expect("login sets the session cookie")
}
