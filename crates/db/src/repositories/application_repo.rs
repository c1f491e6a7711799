//! Repository for the `applications` table.
//!
//! Every mutation that depends on the workflow state repeats the state
//! guard in its `WHERE` clause, so a racing transition can never apply
//! twice: the second writer matches zero rows and reports a conflict.

use atelier_core::types::DbId;
use atelier_core::workflow::ApplicationStatus;
use sqlx::PgPool;

use crate::models::application::{
    Application, CreateApplication, ReportFilter, StatusCounts, UpdateApplicationDetails,
};

const COLUMNS: &str = "id, user_id, title, category_id, image_path, description, status, \
                        created, admin_comment, design_image_path";

/// Provides CRUD and workflow operations for applications.
pub struct ApplicationRepo;

impl ApplicationRepo {
    /// Insert a new application. Status is forced to `new` here, not taken
    /// from the caller.
    pub async fn create(
        pool: &PgPool,
        input: &CreateApplication,
    ) -> Result<Application, sqlx::Error> {
        let query = format!(
            "INSERT INTO applications (user_id, title, category_id, image_path, description, status)
             VALUES ($1, $2, $3, $4, $5, 'new')
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Application>(&query)
            .bind(input.user_id)
            .bind(&input.title)
            .bind(input.category_id)
            .bind(&input.image_path)
            .bind(&input.description)
            .fetch_one(pool)
            .await
    }

    /// Find an application by internal ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Application>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM applications WHERE id = $1");
        sqlx::query_as::<_, Application>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List a user's own applications, newest first, optionally filtered
    /// by status.
    pub async fn list_by_owner(
        pool: &PgPool,
        user_id: DbId,
        status: Option<ApplicationStatus>,
    ) -> Result<Vec<Application>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM applications
             WHERE user_id = $1 AND ($2::text IS NULL OR status = $2)
             ORDER BY created DESC"
        );
        sqlx::query_as::<_, Application>(&query)
            .bind(user_id)
            .bind(status.map(ApplicationStatus::as_str))
            .fetch_all(pool)
            .await
    }

    /// Apply an owner edit. Guarded on `status = 'new'`; a `None` image
    /// keeps the existing upload.
    ///
    /// Returns `None` if the row is missing or no longer `new`.
    pub async fn update_details(
        pool: &PgPool,
        id: DbId,
        input: &UpdateApplicationDetails,
    ) -> Result<Option<Application>, sqlx::Error> {
        let query = format!(
            "UPDATE applications SET
                title = $2,
                category_id = $3,
                image_path = COALESCE($4, image_path),
                description = $5
             WHERE id = $1 AND status = 'new'
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Application>(&query)
            .bind(id)
            .bind(&input.title)
            .bind(input.category_id)
            .bind(&input.image_path)
            .bind(&input.description)
            .fetch_optional(pool)
            .await
    }

    /// Transition `new -> in_progress`, recording the staff comment.
    ///
    /// Returns `None` if the row is missing or not currently `new`, in
    /// which case nothing was mutated.
    pub async fn set_in_progress(
        pool: &PgPool,
        id: DbId,
        admin_comment: &str,
    ) -> Result<Option<Application>, sqlx::Error> {
        let query = format!(
            "UPDATE applications SET status = 'in_progress', admin_comment = $2
             WHERE id = $1 AND status = 'new'
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Application>(&query)
            .bind(id)
            .bind(admin_comment)
            .fetch_optional(pool)
            .await
    }

    /// Transition `in_progress -> done`, recording the design image.
    ///
    /// Returns `None` if the row is missing or not currently `in_progress`.
    pub async fn set_done(
        pool: &PgPool,
        id: DbId,
        design_image_path: &str,
    ) -> Result<Option<Application>, sqlx::Error> {
        let query = format!(
            "UPDATE applications SET status = 'done', design_image_path = $2
             WHERE id = $1 AND status = 'in_progress'
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Application>(&query)
            .bind(id)
            .bind(design_image_path)
            .fetch_optional(pool)
            .await
    }

    /// Delete an application, permitted only while `new`.
    ///
    /// Returns `true` if a row was deleted.
    pub async fn delete_if_new(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM applications WHERE id = $1 AND status = 'new'")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// List all applications matching the report filters, newest first.
    pub async fn report(
        pool: &PgPool,
        filter: &ReportFilter,
    ) -> Result<Vec<Application>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM applications
             WHERE ($1::text IS NULL OR status = $1)
               AND ($2::bigint IS NULL OR category_id = $2)
               AND ($3::timestamptz IS NULL OR created >= $3)
               AND ($4::timestamptz IS NULL OR created < $4)
             ORDER BY created DESC"
        );
        sqlx::query_as::<_, Application>(&query)
            .bind(filter.status.map(ApplicationStatus::as_str))
            .bind(filter.category_id)
            .bind(filter.created_from)
            .bind(filter.created_before)
            .fetch_all(pool)
            .await
    }

    /// Per-status counts across all applications.
    pub async fn count_by_status(pool: &PgPool) -> Result<StatusCounts, sqlx::Error> {
        sqlx::query_as::<_, StatusCounts>(
            "SELECT
                COUNT(*) AS total,
                COUNT(*) FILTER (WHERE status = 'new') AS \"new\",
                COUNT(*) FILTER (WHERE status = 'in_progress') AS in_progress,
                COUNT(*) FILTER (WHERE status = 'done') AS done
             FROM applications",
        )
        .fetch_one(pool)
        .await
    }

    /// The most recently created `done` applications, for the landing page.
    pub async fn recent_done(pool: &PgPool, limit: i64) -> Result<Vec<Application>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM applications
             WHERE status = 'done'
             ORDER BY created DESC
             LIMIT $1"
        );
        sqlx::query_as::<_, Application>(&query)
            .bind(limit)
            .fetch_all(pool)
            .await
    }
}
