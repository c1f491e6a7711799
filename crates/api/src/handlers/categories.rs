//! Handlers for categories: a public list for the submission form and the
//! admin-gated CRUD, including the cascade delete.

use atelier_core::error::CoreError;
use atelier_core::types::DbId;
use atelier_core::validation::FieldErrors;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;

use atelier_db::models::category::{Category, CategoryWithCount, UpsertCategory};
use atelier_db::repositories::CategoryRepo;

use crate::error::{AppError, AppResult};
use crate::middleware::rbac::RequireAdmin;
use crate::state::AppState;

/// Response for a category cascade delete.
#[derive(Debug, Serialize)]
pub struct CascadeDeleteResponse {
    pub message: String,
    /// How many applications were removed together with the category.
    pub applications_deleted: u64,
}

/// Trim name and slug, rejecting empty values.
fn validate_category(input: &UpsertCategory) -> Result<UpsertCategory, FieldErrors> {
    let mut errors = FieldErrors::new();

    let name = input.name.trim();
    if name.is_empty() {
        errors.add("name", "Name is required");
    }
    let slug = input.slug.trim();
    if slug.is_empty() {
        errors.add("slug", "Slug is required");
    }

    errors.into_result()?;
    Ok(UpsertCategory {
        name: name.to_string(),
        slug: slug.to_string(),
    })
}

/// GET /api/v1/categories
///
/// Public list, ordered by name; the submission form needs it before login
/// state is known.
pub async fn list(State(state): State<AppState>) -> AppResult<Json<Vec<Category>>> {
    let categories = CategoryRepo::list(&state.pool).await?;
    Ok(Json(categories))
}

/// GET /api/v1/admin/categories
pub async fn list_with_counts(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> AppResult<Json<Vec<CategoryWithCount>>> {
    let categories = CategoryRepo::list_with_counts(&state.pool).await?;
    Ok(Json(categories))
}

/// POST /api/v1/admin/categories
pub async fn create(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Json(input): Json<UpsertCategory>,
) -> AppResult<(StatusCode, Json<Category>)> {
    let input = validate_category(&input).map_err(AppError::from)?;

    if CategoryRepo::slug_exists(&state.pool, &input.slug, None).await? {
        return Err(AppError::Core(CoreError::Conflict(
            "A category with this slug already exists".into(),
        )));
    }

    let category = CategoryRepo::create(&state.pool, &input).await?;
    Ok((StatusCode::CREATED, Json(category)))
}

/// PUT /api/v1/admin/categories/{id}
///
/// Slug uniqueness excludes the record being edited.
pub async fn update(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<DbId>,
    Json(input): Json<UpsertCategory>,
) -> AppResult<Json<Category>> {
    let input = validate_category(&input).map_err(AppError::from)?;

    if CategoryRepo::slug_exists(&state.pool, &input.slug, Some(id)).await? {
        return Err(AppError::Core(CoreError::Conflict(
            "A category with this slug already exists".into(),
        )));
    }

    let category = CategoryRepo::update(&state.pool, id, &input)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Category",
            id,
        }))?;
    Ok(Json(category))
}

/// DELETE /api/v1/admin/categories/{id}
///
/// Destructive: removes every application in the category, then the
/// category itself, in one transaction. The repository logs the blast
/// radius; the response reports it.
pub async fn delete(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<DbId>,
) -> AppResult<Json<CascadeDeleteResponse>> {
    let applications_deleted = CategoryRepo::delete_cascade(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Category",
            id,
        }))?;

    tracing::info!(
        category_id = id,
        admin_id = admin.user_id,
        applications_deleted,
        "Category removed by administrator"
    );

    Ok(Json(CascadeDeleteResponse {
        message: "Category and its applications were deleted".to_string(),
        applications_deleted,
    }))
}
