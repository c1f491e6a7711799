//! Repository for the `categories` table.

use atelier_core::types::DbId;
use sqlx::PgPool;

use crate::models::category::{Category, CategoryWithCount, UpsertCategory};

const COLUMNS: &str = "id, name, slug";

/// Provides CRUD operations for categories, including the cascade delete
/// that removes a category's applications with it.
pub struct CategoryRepo;

impl CategoryRepo {
    /// Insert a new category, returning the created row.
    pub async fn create(pool: &PgPool, input: &UpsertCategory) -> Result<Category, sqlx::Error> {
        let query =
            format!("INSERT INTO categories (name, slug) VALUES ($1, $2) RETURNING {COLUMNS}");
        sqlx::query_as::<_, Category>(&query)
            .bind(&input.name)
            .bind(&input.slug)
            .fetch_one(pool)
            .await
    }

    /// Find a category by internal ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Category>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM categories WHERE id = $1");
        sqlx::query_as::<_, Category>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List all categories ordered by name.
    pub async fn list(pool: &PgPool) -> Result<Vec<Category>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM categories ORDER BY name");
        sqlx::query_as::<_, Category>(&query).fetch_all(pool).await
    }

    /// List all categories with their application counts, ordered by name.
    pub async fn list_with_counts(pool: &PgPool) -> Result<Vec<CategoryWithCount>, sqlx::Error> {
        sqlx::query_as::<_, CategoryWithCount>(
            "SELECT c.id, c.name, c.slug, COUNT(a.id) AS application_count
             FROM categories c
             LEFT JOIN applications a ON a.category_id = c.id
             GROUP BY c.id, c.name, c.slug
             ORDER BY c.name",
        )
        .fetch_all(pool)
        .await
    }

    /// Whether a category with this slug exists, optionally excluding one
    /// record (the record being edited).
    pub async fn slug_exists(
        pool: &PgPool,
        slug: &str,
        exclude_id: Option<DbId>,
    ) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT EXISTS(
                 SELECT 1 FROM categories
                 WHERE slug = $1 AND ($2::bigint IS NULL OR id <> $2)
             )",
        )
        .bind(slug)
        .bind(exclude_id)
        .fetch_one(pool)
        .await
    }

    /// Update a category's name and slug.
    ///
    /// Returns `None` if no row with the given `id` exists.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpsertCategory,
    ) -> Result<Option<Category>, sqlx::Error> {
        let query = format!(
            "UPDATE categories SET name = $2, slug = $3 WHERE id = $1 RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Category>(&query)
            .bind(id)
            .bind(&input.name)
            .bind(&input.slug)
            .fetch_optional(pool)
            .await
    }

    /// Delete a category and every application referencing it, in one
    /// transaction. Irreversible.
    ///
    /// Returns the number of applications removed, or `None` if the
    /// category does not exist.
    pub async fn delete_cascade(pool: &PgPool, id: DbId) -> Result<Option<u64>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let applications_deleted = sqlx::query("DELETE FROM applications WHERE category_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        let categories_deleted = sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        if categories_deleted == 0 {
            tx.rollback().await?;
            return Ok(None);
        }

        tx.commit().await?;

        tracing::warn!(
            category_id = id,
            applications_deleted,
            "Category deleted with cascading application delete"
        );
        Ok(Some(applications_deleted))
    }
}
