use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use super::{RepoResult, Repository, RepositoryError};
use crate::models::{
    AdminDashboardStats, Client, ClientStats, CreateClientRequest, CreateInvoiceRequest,
    CreateProjectRequest, CreateRoleRequest, CreateTeamMemberRequest, Invoice, NewSetting, NewUser,
    Project, ProjectAssignment, SystemSetting, TeamMember, TeamStats, UpdateClientRequest,
    UpdateInvoiceRequest, UpdateProjectRequest, UpdateRoleRequest, UpdateTeamMemberRequest, User,
    UserRole,
};

const USER_COLUMNS: &str = "id, email, first_name, last_name, phone, profile_image_url, \
     password_hash, role, active, created_at, updated_at";

const PROJECT_COLUMNS: &str = "p.id, p.name, p.description, p.client_id, p.status, \
     p.start_date, p.end_date, p.budget, p.progress, p.created_at, p.updated_at";

const INVOICE_COLUMNS: &str = "id, number, client_id, project_id, amount, status, issue_date, \
     due_date, paid_date, description, created_at, updated_at";

const ROLE_COLUMNS: &str =
    "id, name, display_name, description, permissions, is_system, active, created_at, updated_at";

const SETTING_COLUMNS: &str =
    "id, setting_key, setting_value, setting_type, created_at, updated_at";

/// Maps constraint violations onto `Conflict`, everything else stays a database error.
fn classify(e: sqlx::Error, unique: &str, foreign_key: &str) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = e {
        if db_err.is_unique_violation() {
            return RepositoryError::Conflict(unique.to_owned());
        }
        if db_err.is_foreign_key_violation() {
            return RepositoryError::Conflict(foreign_key.to_owned());
        }
    }
    RepositoryError::Database(e)
}

/// PostgresRepository
///
/// The concrete implementation of the `Repository` trait, backed by PostgreSQL.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    /// Creates a new repository instance using the initialized connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn insert_user(
        tx: &mut sqlx::PgConnection,
        user: &NewUser,
    ) -> RepoResult<User> {
        sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (id, email, first_name, last_name, phone, password_hash, role, active) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, TRUE) \
             RETURNING {USER_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(&user.email)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.phone)
        .bind(&user.password_hash)
        .bind(user.role.as_str())
        .fetch_one(tx)
        .await
        .map_err(|e| classify(e, "email already exists", "invalid reference"))
    }
}

#[async_trait]
impl Repository for PostgresRepository {
    async fn ping(&self) -> RepoResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    // --- USERS ---

    async fn get_user(&self, id: Uuid) -> RepoResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn get_user_by_email(&self, email: &str) -> RepoResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn list_users(&self) -> RepoResult<Vec<User>> {
        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(users)
    }

    async fn create_user(&self, user: NewUser) -> RepoResult<User> {
        let mut conn = self.pool.acquire().await?;
        Self::insert_user(&mut conn, &user).await
    }

    async fn set_user_active(&self, id: Uuid, active: bool) -> RepoResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "UPDATE users SET active = $2, updated_at = NOW() WHERE id = $1 \
             RETURNING {USER_COLUMNS}"
        ))
        .bind(id)
        .bind(active)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    // --- CLIENTS ---

    async fn list_clients(&self) -> RepoResult<Vec<Client>> {
        let clients = sqlx::query_as::<_, Client>(
            r#"
            SELECT c.id, c.user_id, c.company_name, c.phone, c.address, c.city, c.state,
                   c.zip_code, c.tax_id, c.created_at, c.updated_at,
                   u.email, u.first_name, u.last_name
            FROM clients c
            LEFT JOIN users u ON u.id = c.user_id
            ORDER BY c.created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(clients)
    }

    async fn get_client(&self, id: Uuid) -> RepoResult<Option<Client>> {
        let client = sqlx::query_as::<_, Client>(
            r#"
            SELECT c.id, c.user_id, c.company_name, c.phone, c.address, c.city, c.state,
                   c.zip_code, c.tax_id, c.created_at, c.updated_at,
                   u.email, u.first_name, u.last_name
            FROM clients c
            LEFT JOIN users u ON u.id = c.user_id
            WHERE c.id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(client)
    }

    async fn get_client_by_user(&self, user_id: Uuid) -> RepoResult<Option<Client>> {
        let client = sqlx::query_as::<_, Client>(
            r#"
            SELECT c.id, c.user_id, c.company_name, c.phone, c.address, c.city, c.state,
                   c.zip_code, c.tax_id, c.created_at, c.updated_at,
                   u.email, u.first_name, u.last_name
            FROM clients c
            LEFT JOIN users u ON u.id = c.user_id
            WHERE c.user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(client)
    }

    /// create_client_with_user
    ///
    /// The user row and the client row commit together or not at all.
    async fn create_client_with_user(
        &self,
        user: NewUser,
        req: CreateClientRequest,
    ) -> RepoResult<Client> {
        let mut tx = self.pool.begin().await?;

        let created = Self::insert_user(&mut tx, &user).await?;

        let mut client = sqlx::query_as::<_, Client>(
            r#"
            INSERT INTO clients (id, user_id, company_name, phone, address, city, state, zip_code, tax_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING id, user_id, company_name, phone, address, city, state, zip_code, tax_id,
                      created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(created.id)
        .bind(&req.company_name)
        .bind(&req.phone)
        .bind(&req.address)
        .bind(&req.city)
        .bind(&req.state)
        .bind(&req.zip_code)
        .bind(&req.tax_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        client.email = Some(created.email);
        client.first_name = created.first_name;
        client.last_name = created.last_name;
        Ok(client)
    }

    /// update_client
    ///
    /// `COALESCE` keeps the stored value for every field the request leaves out.
    async fn update_client(
        &self,
        id: Uuid,
        req: UpdateClientRequest,
    ) -> RepoResult<Option<Client>> {
        let client = sqlx::query_as::<_, Client>(
            r#"
            WITH updated AS (
                UPDATE clients
                SET company_name = COALESCE($2, company_name),
                    phone = COALESCE($3, phone),
                    address = COALESCE($4, address),
                    city = COALESCE($5, city),
                    state = COALESCE($6, state),
                    zip_code = COALESCE($7, zip_code),
                    tax_id = COALESCE($8, tax_id),
                    updated_at = NOW()
                WHERE id = $1
                RETURNING *
            )
            SELECT c.id, c.user_id, c.company_name, c.phone, c.address, c.city, c.state,
                   c.zip_code, c.tax_id, c.created_at, c.updated_at,
                   u.email, u.first_name, u.last_name
            FROM updated c
            LEFT JOIN users u ON u.id = c.user_id
            "#,
        )
        .bind(id)
        .bind(req.company_name)
        .bind(req.phone)
        .bind(req.address)
        .bind(req.city)
        .bind(req.state)
        .bind(req.zip_code)
        .bind(req.tax_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(client)
    }

    /// delete_client
    ///
    /// Removes the client and its login. Projects and invoices reference clients
    /// with `ON DELETE RESTRICT`, so a client that still owns them is a conflict.
    async fn delete_client(&self, id: Uuid) -> RepoResult<bool> {
        let mut tx = self.pool.begin().await?;

        let user_id: Option<Option<Uuid>> =
            sqlx::query_scalar("DELETE FROM clients WHERE id = $1 RETURNING user_id")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await
                .map_err(|e| {
                    classify(
                        e,
                        "client already exists",
                        "client still has projects or invoices",
                    )
                })?;

        let Some(user_id) = user_id else {
            return Ok(false);
        };

        if let Some(user_id) = user_id {
            sqlx::query("DELETE FROM users WHERE id = $1")
                .bind(user_id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(true)
    }

    // --- TEAM ---

    async fn list_team_members(&self) -> RepoResult<Vec<TeamMember>> {
        let members = sqlx::query_as::<_, TeamMember>(
            r#"
            SELECT t.id, t.user_id, t.position, t.department, t.salary, t.hire_date,
                   t.created_at, t.updated_at, u.email, u.first_name, u.last_name
            FROM team_members t
            LEFT JOIN users u ON u.id = t.user_id
            ORDER BY t.created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(members)
    }

    async fn get_team_member(&self, id: Uuid) -> RepoResult<Option<TeamMember>> {
        let member = sqlx::query_as::<_, TeamMember>(
            r#"
            SELECT t.id, t.user_id, t.position, t.department, t.salary, t.hire_date,
                   t.created_at, t.updated_at, u.email, u.first_name, u.last_name
            FROM team_members t
            LEFT JOIN users u ON u.id = t.user_id
            WHERE t.id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(member)
    }

    async fn get_team_member_by_user(&self, user_id: Uuid) -> RepoResult<Option<TeamMember>> {
        let member = sqlx::query_as::<_, TeamMember>(
            r#"
            SELECT t.id, t.user_id, t.position, t.department, t.salary, t.hire_date,
                   t.created_at, t.updated_at, u.email, u.first_name, u.last_name
            FROM team_members t
            LEFT JOIN users u ON u.id = t.user_id
            WHERE t.user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(member)
    }

    async fn create_team_member_with_user(
        &self,
        user: NewUser,
        req: CreateTeamMemberRequest,
    ) -> RepoResult<TeamMember> {
        let mut tx = self.pool.begin().await?;

        let created = Self::insert_user(&mut tx, &user).await?;
        let hire_date: NaiveDate = req.hire_date.unwrap_or_else(|| Utc::now().date_naive());

        let mut member = sqlx::query_as::<_, TeamMember>(
            r#"
            INSERT INTO team_members (id, user_id, position, department, salary, hire_date)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, user_id, position, department, salary, hire_date, created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(created.id)
        .bind(&req.position)
        .bind(&req.department)
        .bind(req.salary)
        .bind(hire_date)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        member.email = Some(created.email);
        member.first_name = created.first_name;
        member.last_name = created.last_name;
        Ok(member)
    }

    async fn update_team_member(
        &self,
        id: Uuid,
        req: UpdateTeamMemberRequest,
    ) -> RepoResult<Option<TeamMember>> {
        let member = sqlx::query_as::<_, TeamMember>(
            r#"
            WITH updated AS (
                UPDATE team_members
                SET position = COALESCE($2, position),
                    department = COALESCE($3, department),
                    salary = COALESCE($4, salary),
                    hire_date = COALESCE($5, hire_date),
                    updated_at = NOW()
                WHERE id = $1
                RETURNING *
            )
            SELECT t.id, t.user_id, t.position, t.department, t.salary, t.hire_date,
                   t.created_at, t.updated_at, u.email, u.first_name, u.last_name
            FROM updated t
            LEFT JOIN users u ON u.id = t.user_id
            "#,
        )
        .bind(id)
        .bind(req.position)
        .bind(req.department)
        .bind(req.salary)
        .bind(req.hire_date)
        .fetch_optional(&self.pool)
        .await?;
        Ok(member)
    }

    /// delete_team_member
    ///
    /// Assignments cascade with the team member row; the login goes in the same transaction.
    async fn delete_team_member(&self, id: Uuid) -> RepoResult<bool> {
        let mut tx = self.pool.begin().await?;

        let user_id: Option<Option<Uuid>> =
            sqlx::query_scalar("DELETE FROM team_members WHERE id = $1 RETURNING user_id")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;

        let Some(user_id) = user_id else {
            return Ok(false);
        };

        if let Some(user_id) = user_id {
            sqlx::query("DELETE FROM users WHERE id = $1")
                .bind(user_id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(true)
    }

    // --- PROJECTS ---

    async fn list_projects(&self) -> RepoResult<Vec<Project>> {
        let projects = sqlx::query_as::<_, Project>(&format!(
            "SELECT {PROJECT_COLUMNS} FROM projects p ORDER BY p.created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(projects)
    }

    async fn list_projects_by_team_member(&self, team_member_id: Uuid) -> RepoResult<Vec<Project>> {
        let projects = sqlx::query_as::<_, Project>(&format!(
            "SELECT {PROJECT_COLUMNS} FROM projects p \
             JOIN project_assignments a ON a.project_id = p.id \
             WHERE a.team_member_id = $1 \
             ORDER BY p.created_at DESC"
        ))
        .bind(team_member_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(projects)
    }

    async fn get_project(&self, id: Uuid) -> RepoResult<Option<Project>> {
        let project = sqlx::query_as::<_, Project>(&format!(
            "SELECT {PROJECT_COLUMNS} FROM projects p WHERE p.id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(project)
    }

    async fn create_project(&self, req: CreateProjectRequest) -> RepoResult<Project> {
        sqlx::query_as::<_, Project>(&format!(
            "INSERT INTO projects AS p (id, name, description, client_id, status, start_date, \
                                        end_date, budget, progress) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
             RETURNING {PROJECT_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(&req.name)
        .bind(&req.description)
        .bind(req.client_id)
        .bind(req.status.as_str())
        .bind(req.start_date)
        .bind(req.end_date)
        .bind(req.budget)
        .bind(req.progress)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| classify(e, "project already exists", "client does not exist"))
    }

    async fn update_project(
        &self,
        id: Uuid,
        req: UpdateProjectRequest,
    ) -> RepoResult<Option<Project>> {
        sqlx::query_as::<_, Project>(&format!(
            "UPDATE projects AS p \
             SET name = COALESCE($2, name), \
                 description = COALESCE($3, description), \
                 client_id = COALESCE($4, client_id), \
                 status = COALESCE($5, status), \
                 start_date = COALESCE($6, start_date), \
                 end_date = COALESCE($7, end_date), \
                 budget = COALESCE($8, budget), \
                 progress = COALESCE($9, progress), \
                 updated_at = NOW() \
             WHERE p.id = $1 \
             RETURNING {PROJECT_COLUMNS}"
        ))
        .bind(id)
        .bind(req.name)
        .bind(req.description)
        .bind(req.client_id)
        .bind(req.status.map(|s| s.as_str()))
        .bind(req.start_date)
        .bind(req.end_date)
        .bind(req.budget)
        .bind(req.progress)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| classify(e, "project already exists", "client does not exist"))
    }

    async fn delete_project(&self, id: Uuid) -> RepoResult<bool> {
        let res = sqlx::query("DELETE FROM projects WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected() > 0)
    }

    // --- ASSIGNMENTS ---

    async fn is_assigned(&self, project_id: Uuid, team_member_id: Uuid) -> RepoResult<bool> {
        let assigned: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM project_assignments \
                            WHERE project_id = $1 AND team_member_id = $2)",
        )
        .bind(project_id)
        .bind(team_member_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(assigned)
    }

    async fn list_assignments(&self, project_id: Uuid) -> RepoResult<Vec<ProjectAssignment>> {
        let assignments = sqlx::query_as::<_, ProjectAssignment>(
            "SELECT id, project_id, team_member_id, role, assigned_at \
             FROM project_assignments WHERE project_id = $1 ORDER BY assigned_at",
        )
        .bind(project_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(assignments)
    }

    async fn assign_team_member(
        &self,
        project_id: Uuid,
        team_member_id: Uuid,
        role: Option<String>,
    ) -> RepoResult<ProjectAssignment> {
        sqlx::query_as::<_, ProjectAssignment>(
            "INSERT INTO project_assignments (id, project_id, team_member_id, role) \
             VALUES ($1, $2, $3, $4) \
             RETURNING id, project_id, team_member_id, role, assigned_at",
        )
        .bind(Uuid::new_v4())
        .bind(project_id)
        .bind(team_member_id)
        .bind(role)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            classify(
                e,
                "team member is already assigned to this project",
                "project or team member does not exist",
            )
        })
    }

    async fn unassign_team_member(
        &self,
        project_id: Uuid,
        team_member_id: Uuid,
    ) -> RepoResult<bool> {
        let res = sqlx::query(
            "DELETE FROM project_assignments WHERE project_id = $1 AND team_member_id = $2",
        )
        .bind(project_id)
        .bind(team_member_id)
        .execute(&self.pool)
        .await?;
        Ok(res.rows_affected() > 0)
    }

    // --- INVOICES ---

    async fn list_invoices(&self) -> RepoResult<Vec<Invoice>> {
        let invoices = sqlx::query_as::<_, Invoice>(&format!(
            "SELECT {INVOICE_COLUMNS} FROM invoices ORDER BY issue_date DESC, created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(invoices)
    }

    async fn list_invoices_by_client(&self, client_id: Uuid) -> RepoResult<Vec<Invoice>> {
        let invoices = sqlx::query_as::<_, Invoice>(&format!(
            "SELECT {INVOICE_COLUMNS} FROM invoices WHERE client_id = $1 \
             ORDER BY issue_date DESC, created_at DESC"
        ))
        .bind(client_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(invoices)
    }

    async fn get_invoice(&self, id: Uuid) -> RepoResult<Option<Invoice>> {
        let invoice = sqlx::query_as::<_, Invoice>(&format!(
            "SELECT {INVOICE_COLUMNS} FROM invoices WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(invoice)
    }

    /// create_invoice
    ///
    /// The handler has already validated that the required fields are present.
    async fn create_invoice(&self, req: CreateInvoiceRequest) -> RepoResult<Invoice> {
        sqlx::query_as::<_, Invoice>(&format!(
            "INSERT INTO invoices (id, number, client_id, project_id, amount, status, \
                                   issue_date, due_date, paid_date, description) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
             RETURNING {INVOICE_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(&req.number)
        .bind(req.client_id)
        .bind(req.project_id)
        .bind(req.amount.unwrap_or(Decimal::ZERO))
        .bind(req.status.as_str())
        .bind(req.issue_date)
        .bind(req.due_date)
        .bind(req.paid_date)
        .bind(&req.description)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            classify(
                e,
                "invoice number already exists",
                "client or project does not exist",
            )
        })
    }

    async fn update_invoice(
        &self,
        id: Uuid,
        req: UpdateInvoiceRequest,
    ) -> RepoResult<Option<Invoice>> {
        sqlx::query_as::<_, Invoice>(&format!(
            "UPDATE invoices \
             SET number = COALESCE($2, number), \
                 client_id = COALESCE($3, client_id), \
                 project_id = COALESCE($4, project_id), \
                 amount = COALESCE($5, amount), \
                 status = COALESCE($6, status), \
                 issue_date = COALESCE($7, issue_date), \
                 due_date = COALESCE($8, due_date), \
                 paid_date = COALESCE($9, paid_date), \
                 description = COALESCE($10, description), \
                 updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {INVOICE_COLUMNS}"
        ))
        .bind(id)
        .bind(req.number)
        .bind(req.client_id)
        .bind(req.project_id)
        .bind(req.amount)
        .bind(req.status.map(|s| s.as_str()))
        .bind(req.issue_date)
        .bind(req.due_date)
        .bind(req.paid_date)
        .bind(req.description)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            classify(
                e,
                "invoice number already exists",
                "client or project does not exist",
            )
        })
    }

    async fn delete_invoice(&self, id: Uuid) -> RepoResult<bool> {
        let res = sqlx::query("DELETE FROM invoices WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected() > 0)
    }

    // --- STATS ---

    /// admin_stats
    ///
    /// Compiles all dashboard counters in a single round trip.
    async fn admin_stats(&self) -> RepoResult<AdminDashboardStats> {
        let (total_clients, total_revenue, active_projects, team_members): (
            i64,
            Decimal,
            i64,
            i64,
        ) = sqlx::query_as(
            r#"
            SELECT
                (SELECT COUNT(*) FROM clients),
                (SELECT COALESCE(SUM(amount), 0) FROM invoices WHERE status = 'paid'),
                (SELECT COUNT(*) FROM projects WHERE status = 'active'),
                (SELECT COUNT(*) FROM team_members)
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(AdminDashboardStats {
            total_clients,
            total_revenue,
            active_projects,
            team_members,
        })
    }

    /// client_stats
    ///
    /// "Open" means invoices in status `sent`.
    async fn client_stats(&self, client_id: Uuid) -> RepoResult<ClientStats> {
        let (pending_invoices, total_open, next_due): (i64, Decimal, Option<NaiveDate>) =
            sqlx::query_as(
                r#"
                SELECT COUNT(*), COALESCE(SUM(amount), 0), MIN(due_date)
                FROM invoices
                WHERE client_id = $1 AND status = 'sent'
                "#,
            )
            .bind(client_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(ClientStats {
            pending_invoices,
            total_open,
            next_due,
        })
    }

    async fn team_stats(&self, team_member_id: Uuid) -> RepoResult<TeamStats> {
        let (active_projects, pending_tasks, completed_today): (i64, i64, i64) = sqlx::query_as(
            r#"
            SELECT
                COUNT(*) FILTER (WHERE p.status = 'active'),
                COUNT(*) FILTER (WHERE p.status IN ('planning', 'on_hold')),
                COUNT(*) FILTER (WHERE p.status = 'completed' AND p.updated_at::date = CURRENT_DATE)
            FROM projects p
            JOIN project_assignments a ON a.project_id = p.id
            WHERE a.team_member_id = $1
            "#,
        )
        .bind(team_member_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(TeamStats {
            active_projects,
            pending_tasks,
            completed_today,
        })
    }

    // --- SETTINGS ---

    async fn list_settings(&self) -> RepoResult<Vec<SystemSetting>> {
        let settings = sqlx::query_as::<_, SystemSetting>(&format!(
            "SELECT {SETTING_COLUMNS} FROM system_settings ORDER BY setting_key"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(settings)
    }

    /// set_settings
    ///
    /// One transaction for the whole batch, so a failing key leaves every
    /// other setting untouched.
    async fn set_settings(&self, settings: &[NewSetting]) -> RepoResult<Vec<SystemSetting>> {
        let mut tx = self.pool.begin().await?;
        let mut saved = Vec::with_capacity(settings.len());

        for setting in settings {
            let row = sqlx::query_as::<_, SystemSetting>(&format!(
                "INSERT INTO system_settings (id, setting_key, setting_value, setting_type) \
                 VALUES ($1, $2, $3, $4) \
                 ON CONFLICT (setting_key) DO UPDATE \
                 SET setting_value = EXCLUDED.setting_value, \
                     setting_type = EXCLUDED.setting_type, \
                     updated_at = NOW() \
                 RETURNING {SETTING_COLUMNS}"
            ))
            .bind(Uuid::new_v4())
            .bind(&setting.key)
            .bind(&setting.value)
            .bind(setting.setting_type.as_str())
            .fetch_one(&mut *tx)
            .await?;
            saved.push(row);
        }

        tx.commit().await?;
        Ok(saved)
    }

    async fn delete_setting(&self, key: &str) -> RepoResult<bool> {
        let res = sqlx::query("DELETE FROM system_settings WHERE setting_key = $1")
            .bind(key)
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected() > 0)
    }

    // --- ROLES ---

    async fn list_roles(&self) -> RepoResult<Vec<UserRole>> {
        let roles = sqlx::query_as::<_, UserRole>(&format!(
            "SELECT {ROLE_COLUMNS} FROM user_roles ORDER BY is_system DESC, name"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(roles)
    }

    async fn get_role(&self, id: Uuid) -> RepoResult<Option<UserRole>> {
        let role = sqlx::query_as::<_, UserRole>(&format!(
            "SELECT {ROLE_COLUMNS} FROM user_roles WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(role)
    }

    async fn create_role(&self, req: CreateRoleRequest) -> RepoResult<UserRole> {
        sqlx::query_as::<_, UserRole>(&format!(
            "INSERT INTO user_roles (id, name, display_name, description, permissions, is_system, active) \
             VALUES ($1, $2, $3, $4, $5, FALSE, $6) \
             RETURNING {ROLE_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(&req.name)
        .bind(&req.display_name)
        .bind(&req.description)
        .bind(&req.permissions)
        .bind(req.active)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| classify(e, "role name already exists", "invalid reference"))
    }

    async fn update_role(&self, id: Uuid, req: UpdateRoleRequest) -> RepoResult<Option<UserRole>> {
        sqlx::query_as::<_, UserRole>(&format!(
            "UPDATE user_roles \
             SET name = COALESCE($2, name), \
                 display_name = COALESCE($3, display_name), \
                 description = COALESCE($4, description), \
                 permissions = COALESCE($5, permissions), \
                 active = COALESCE($6, active), \
                 updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {ROLE_COLUMNS}"
        ))
        .bind(id)
        .bind(req.name)
        .bind(req.display_name)
        .bind(req.description)
        .bind(req.permissions)
        .bind(req.active)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| classify(e, "role name already exists", "invalid reference"))
    }

    async fn delete_role(&self, id: Uuid) -> RepoResult<bool> {
        let res = sqlx::query("DELETE FROM user_roles WHERE id = $1 AND is_system = FALSE")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected() > 0)
    }
}
