//! User model and authentication request/response types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Role string stored on the `users.role` column and carried in token
/// claims. The column CHECK constraint limits it to `user` / `admin`.
pub const ROLE_USER: &str = "user";
pub const ROLE_ADMIN: &str = "admin";

/// Represents a user record from the database.
///
/// One user owns at most one account; deleting a user cascades to its
/// account and that account's transactions.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,

    pub username: String,

    pub full_name: String,

    pub email: String,

    /// Argon2id hash of the login PIN. Never leaves the server.
    pub pin_hash: String,

    /// `user` or `admin`
    pub role: String,

    pub created_at: DateTime<Utc>,
}

/// Request body for `POST /auth/login`.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub pin: String,
}

/// Response body for a successful login.
///
/// The token is a signed bearer token carrying `{userId, role}` with a
/// one-hour expiry; protected routes trust its claims without re-verifying
/// credentials.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub user_id: Uuid,
    pub role: String,
    pub token: String,
}

/// Request body for `POST /auth/register`.
///
/// # JSON Example
///
/// ```json
/// {
///   "name": "Ada",
///   "lastName": "Lovelace",
///   "username": "ada",
///   "email": "ada@example.com",
///   "password": "4444",
///   "confirmPassword": "4444"
/// }
/// ```
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub name: String,
    pub last_name: String,
    pub username: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

/// Request body for `DELETE /accounts/by-username` (admin only).
///
/// The admin PIN is re-verified against the requesting admin's stored
/// credential hash before anything is deleted.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CloseAccountRequest {
    pub target_username: String,
    pub admin_pin: String,
}
