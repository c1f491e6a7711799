//! Application (work request) entity model and DTOs.

use atelier_core::error::CoreError;
use atelier_core::types::{DbId, Timestamp};
use atelier_core::workflow::ApplicationStatus;
use serde::Serialize;
use sqlx::FromRow;

/// An application row from the `applications` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Application {
    pub id: DbId,
    pub user_id: DbId,
    pub title: String,
    pub category_id: DbId,
    pub image_path: Option<String>,
    pub description: String,
    pub status: String,
    pub created: Timestamp,
    pub admin_comment: Option<String>,
    pub design_image_path: Option<String>,
}

impl Application {
    /// Decode the stored status text into the workflow enum.
    ///
    /// The CHECK constraint makes unknown values unreachable in practice;
    /// if one appears anyway it is an internal error, not a client fault.
    pub fn workflow_status(&self) -> Result<ApplicationStatus, CoreError> {
        ApplicationStatus::parse(&self.status).ok_or_else(|| {
            CoreError::Internal(format!(
                "Application {} has unknown status '{}'",
                self.id, self.status
            ))
        })
    }
}

/// DTO for creating a new application. Status is always forced to `new`
/// by the repository, regardless of anything the client sent.
#[derive(Debug, Clone)]
pub struct CreateApplication {
    pub user_id: DbId,
    pub title: String,
    pub category_id: DbId,
    pub image_path: String,
    pub description: String,
}

/// DTO for an owner edit. Only these four fields are mutable; owner and
/// status never change through this path. A `None` image keeps the
/// existing upload.
#[derive(Debug, Clone)]
pub struct UpdateApplicationDetails {
    pub title: String,
    pub category_id: DbId,
    pub image_path: Option<String>,
    pub description: String,
}

/// Filters for the admin report. `created_before` is exclusive so an
/// inclusive end date maps to midnight of the following day.
#[derive(Debug, Clone, Default)]
pub struct ReportFilter {
    pub status: Option<ApplicationStatus>,
    pub category_id: Option<DbId>,
    pub created_from: Option<Timestamp>,
    pub created_before: Option<Timestamp>,
}

/// Per-status application counts for the admin summary panel.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct StatusCounts {
    pub total: i64,
    pub new: i64,
    pub in_progress: i64,
    pub done: i64,
}
