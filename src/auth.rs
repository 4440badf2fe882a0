use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use serde::{Deserialize, Serialize};
use tower_sessions::{Session, session::Error as SessionError};
use uuid::Uuid;

use crate::{
    error::AppError,
    models::{Role, User, UserProfile},
    repository::RepositoryState,
};

/// Session key under which the logged-in user is stored.
pub const SESSION_USER_KEY: &str = "current_user";

/// SessionUser
///
/// The snapshot written into the session on login. Only `id` is trusted on
/// later requests; role and active flag are always re-read from the database.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionUser {
    pub id: Uuid,
    pub email: String,
    pub role: Role,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

impl From<&User> for SessionUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            role: user.role,
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
        }
    }
}

/// AuthUser Extractor Result
///
/// The resolved identity of an authenticated request. Handlers use it to scope
/// data to the caller and to check the caller's role.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
    pub email: String,
    pub role: Role,
    /// Public profile as loaded for this request.
    pub profile: UserProfile,
}

impl AuthUser {
    /// Fails with 403 unless the caller's role is one of `allowed`.
    pub fn require(&self, allowed: &[Role]) -> Result<(), AppError> {
        if allowed.contains(&self.role) {
            Ok(())
        } else {
            Err(AppError::forbidden())
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

impl From<&User> for AuthUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            role: user.role,
            profile: UserProfile::from(user),
        }
    }
}

/// AuthUser Extractor Implementation
///
/// 1. Reuses the `AuthUser` a route guard already resolved for this request.
/// 2. Otherwise reads the `Session` inserted by `SessionManagerLayer`
///    and loads the stored `SessionUser`.
/// 3. Re-fetches the user row so role changes and deactivation apply immediately.
///
/// Rejection: 401 when there is no session user, or the user is gone or inactive;
/// 500 when the session store itself fails.
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    RepositoryState: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(resolved) = parts.extensions.get::<AuthUser>() {
            return Ok(resolved.clone());
        }

        let repo = RepositoryState::from_ref(state);

        let session = parts
            .extensions
            .get::<Session>()
            .cloned()
            .ok_or_else(AppError::unauthorized)?;

        let stored: Option<SessionUser> = match session.get(SESSION_USER_KEY).await {
            Ok(stored) => stored,
            // Undecodable session data is treated like no session at all.
            Err(SessionError::SerdeJson(_)) => None,
            Err(e) => return Err(AppError::Session(e)),
        };
        let stored = stored.ok_or_else(AppError::unauthorized)?;

        let user = repo
            .get_user(stored.id)
            .await?
            .ok_or_else(AppError::unauthorized)?;

        if !user.active {
            return Err(AppError::Unauthorized("User is inactive".to_string()));
        }

        Ok(AuthUser::from(&user))
    }
}

/// Hash a password using Argon2id (PHC string format).
pub fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(format!("password hashing failed: {e}")))
}

/// Verify a password against a stored hash. Malformed hashes never match.
pub fn verify_password(password: &str, hash: &str) -> bool {
    let Ok(parsed_hash) = PasswordHash::new(hash) else {
        return false;
    };

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}
