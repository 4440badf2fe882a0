//! Router Module Index
//!
//! Routes are split by the guard applied to them. The same path may appear in
//! more than one module with different methods (e.g. `GET /api/clients` is
//! authenticated, `POST /api/clients` is admin-only); the routers are merged.

/// Routes reachable without a session.
pub mod public;

/// Routes behind `auth_middleware`. Handlers scope data by the caller's role.
pub mod authenticated;

/// Routes behind `admin_middleware`.
pub mod admin;
