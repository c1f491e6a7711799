//! User entity model and DTOs.

use atelier_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A user row from the `users` table.
///
/// The password hash never leaves the server; it is skipped on
/// serialization.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct User {
    pub id: DbId,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub is_staff: bool,
    pub is_superuser: bool,
    pub is_active: bool,
    pub created_at: Timestamp,
}

impl User {
    /// The administrative capability: active staff or superusers may manage
    /// any application, categories, and reports.
    pub fn is_admin(&self) -> bool {
        self.is_active && (self.is_staff || self.is_superuser)
    }
}

/// DTO for creating a new user. Registration always creates a plain
/// customer account; the staff flags are only ever set out of band.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateUser {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password_hash: String,
}
