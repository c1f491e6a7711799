//! Category entity model and DTOs.

use atelier_core::types::DbId;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A category row from the `categories` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Category {
    pub id: DbId,
    pub name: String,
    pub slug: String,
}

/// A category together with the number of applications referencing it,
/// for the admin category list.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct CategoryWithCount {
    pub id: DbId,
    pub name: String,
    pub slug: String,
    pub application_count: i64,
}

/// DTO shared by category create and edit.
#[derive(Debug, Clone, Deserialize)]
pub struct UpsertCategory {
    pub name: String,
    pub slug: String,
}
