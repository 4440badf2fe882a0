use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utoipa::ToSchema;

/// AdminDashboardStats
///
/// Output schema for GET /api/admin/stats.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct AdminDashboardStats {
    pub total_clients: i64,
    /// Sum of the amounts of paid invoices.
    #[ts(type = "string")]
    pub total_revenue: Decimal,
    pub active_projects: i64,
    pub team_members: i64,
}

/// ClientStats
///
/// Output schema for GET /api/stats/client/{client_id}. Only invoices in
/// `sent` status count as open.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ClientStats {
    pub pending_invoices: i64,
    #[ts(type = "string")]
    pub total_open: Decimal,
    #[ts(type = "string | null")]
    pub next_due: Option<NaiveDate>,
}

/// TeamStats
///
/// Output schema for GET /api/stats/team/{team_member_id}, computed over the
/// member's assigned projects.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct TeamStats {
    pub active_projects: i64,
    /// Assigned projects still in planning or on hold.
    pub pending_tasks: i64,
    /// Assigned projects marked completed today.
    pub completed_today: i64,
}
