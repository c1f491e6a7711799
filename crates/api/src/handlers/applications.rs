//! Handlers for the `/applications` resource: owner CRUD plus the staff
//! workflow transitions.
//!
//! Create, edit, and completion accept multipart forms because they carry
//! image uploads. Every workflow mutation validates the current status
//! through the transition table first, then the repository repeats the
//! guard in SQL so racing requests cannot apply a transition twice.

use atelier_core::error::CoreError;
use atelier_core::types::DbId;
use atelier_core::validation::{self, FieldErrors};
use atelier_core::workflow::{self, ApplicationStatus, WorkflowAction};
use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use atelier_db::models::application::{Application, CreateApplication, UpdateApplicationDetails};
use atelier_db::repositories::{ApplicationRepo, CategoryRepo};

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::RequireAdmin;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

/// Query parameters for the dashboard listing.
#[derive(Debug, Deserialize)]
pub struct DashboardParams {
    pub status: Option<String>,
}

/// Request body for `POST /applications/{id}/accept`.
#[derive(Debug, Deserialize)]
pub struct AcceptRequest {
    #[serde(default)]
    pub admin_comment: String,
}

/// An image file read out of a multipart form.
struct UploadedImage {
    content_type: String,
    data: Vec<u8>,
}

/// Raw fields of the application submission form, before validation.
#[derive(Default)]
struct ApplicationForm {
    title: Option<String>,
    category_id: Option<String>,
    description: Option<String>,
    image: Option<UploadedImage>,
}

/// Validated application form fields.
struct ValidApplicationForm {
    title: String,
    category_id: DbId,
    description: String,
    image: Option<UploadedImage>,
}

// ---------------------------------------------------------------------------
// Multipart parsing and form validation
// ---------------------------------------------------------------------------

/// Read the multipart fields of an application create/edit form.
async fn read_application_form(mut multipart: Multipart) -> Result<ApplicationForm, AppError> {
    let mut form = ApplicationForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "title" => {
                form.title = Some(read_text(field).await?);
            }
            "category_id" => {
                form.category_id = Some(read_text(field).await?);
            }
            "description" => {
                form.description = Some(read_text(field).await?);
            }
            "image" => {
                form.image = Some(read_image(field).await?);
            }
            _ => {} // ignore unknown fields
        }
    }

    Ok(form)
}

async fn read_text(field: axum::extract::multipart::Field<'_>) -> Result<String, AppError> {
    field
        .text()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))
}

async fn read_image(field: axum::extract::multipart::Field<'_>) -> Result<UploadedImage, AppError> {
    let content_type = field.content_type().unwrap_or("").to_string();
    let data = field
        .bytes()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?;
    Ok(UploadedImage {
        content_type,
        data: data.to_vec(),
    })
}

/// Validate the form fields, collecting every error before failing.
///
/// `image_required` is true on create; on edit an absent image keeps the
/// existing upload.
fn validate_application_form(
    form: ApplicationForm,
    image_required: bool,
) -> Result<ValidApplicationForm, FieldErrors> {
    let mut errors = FieldErrors::new();

    let title = form.title.as_deref().unwrap_or("").trim().to_string();
    if title.is_empty() {
        errors.add("title", "Title is required");
    }

    let category_id = match form.category_id.as_deref().map(str::trim) {
        None | Some("") => {
            errors.add("category_id", "Category is required");
            0
        }
        Some(raw) => match raw.parse::<DbId>() {
            Ok(id) => id,
            Err(_) => {
                errors.add("category_id", "Category must be a numeric id");
                0
            }
        },
    };

    match &form.image {
        Some(image) => {
            if let Err(msg) = validation::validate_image(&image.content_type, image.data.len()) {
                errors.add("image", msg);
            }
        }
        None if image_required => {
            errors.add("image", "An image is required");
        }
        None => {}
    }

    errors.into_result()?;

    Ok(ValidApplicationForm {
        title,
        category_id,
        description: form.description.unwrap_or_default(),
        image: form.image,
    })
}

/// Ensure the referenced category exists before persisting anything.
async fn ensure_category_exists(state: &AppState, category_id: DbId) -> AppResult<()> {
    CategoryRepo::find_by_id(&state.pool, category_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Category",
            id: category_id,
        }))?;
    Ok(())
}

/// Load an application or report 404.
async fn load_application(state: &AppState, id: DbId) -> AppResult<Application> {
    ApplicationRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Application",
            id,
        }))
}

// ---------------------------------------------------------------------------
// Owner handlers
// ---------------------------------------------------------------------------

/// POST /api/v1/applications
///
/// Multipart form: `title`, `category_id`, `description`, `image` (required).
/// Status is forced to `new`; the owner comes from the access token.
pub async fn create(
    State(state): State<AppState>,
    user: AuthUser,
    multipart: Multipart,
) -> AppResult<(StatusCode, Json<Application>)> {
    let form = read_application_form(multipart).await?;
    let valid = validate_application_form(form, true).map_err(AppError::from)?;

    ensure_category_exists(&state, valid.category_id).await?;

    // Validation guaranteed the image is present on create.
    let image = valid
        .image
        .ok_or_else(|| AppError::InternalError("validated form lost its image".into()))?;
    let image_path = state
        .media
        .save_application_image(&user.username, &image.content_type, &image.data)
        .await?;

    let application = ApplicationRepo::create(
        &state.pool,
        &CreateApplication {
            user_id: user.user_id,
            title: valid.title,
            category_id: valid.category_id,
            image_path,
            description: valid.description,
        },
    )
    .await?;

    tracing::info!(
        application_id = application.id,
        user_id = user.user_id,
        "Application created"
    );

    Ok((StatusCode::CREATED, Json(application)))
}

/// GET /api/v1/applications
///
/// The caller's own applications, newest first. An unknown `?status=` value
/// is ignored rather than rejected.
pub async fn dashboard(
    State(state): State<AppState>,
    user: AuthUser,
    Query(params): Query<DashboardParams>,
) -> AppResult<Json<Vec<Application>>> {
    let status = params
        .status
        .as_deref()
        .and_then(ApplicationStatus::parse);
    let applications = ApplicationRepo::list_by_owner(&state.pool, user.user_id, status).await?;
    Ok(Json(applications))
}

/// GET /api/v1/applications/{id}
///
/// Detail is visible to the owner and to administrators; everyone else is
/// forbidden.
pub async fn get_by_id(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<Json<Application>> {
    let application = load_application(&state, id).await?;

    if !user.owns(application.user_id) && !user.is_admin() {
        return Err(AppError::Core(CoreError::Forbidden(
            "No access to this application".into(),
        )));
    }

    Ok(Json(application))
}

/// PUT /api/v1/applications/{id}
///
/// Owner-only edit of title/category/image/description, permitted only
/// while the application is still `new`.
pub async fn update(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<DbId>,
    multipart: Multipart,
) -> AppResult<Json<Application>> {
    let application = load_application(&state, id).await?;

    if !user.owns(application.user_id) {
        return Err(AppError::Core(CoreError::Forbidden(
            "Only the owner may edit an application".into(),
        )));
    }

    let status = application.workflow_status()?;
    if !workflow::can_edit(status) {
        return Err(AppError::Core(CoreError::Conflict(format!(
            "Editing is only possible while the application is new (current status: {})",
            status.label()
        ))));
    }

    let form = read_application_form(multipart).await?;
    let valid = validate_application_form(form, false).map_err(AppError::from)?;

    ensure_category_exists(&state, valid.category_id).await?;

    let new_image_path = match &valid.image {
        Some(image) => Some(
            state
                .media
                .save_application_image(&user.username, &image.content_type, &image.data)
                .await?,
        ),
        None => None,
    };

    let updated = ApplicationRepo::update_details(
        &state.pool,
        id,
        &UpdateApplicationDetails {
            title: valid.title,
            category_id: valid.category_id,
            image_path: new_image_path.clone(),
            description: valid.description,
        },
    )
    .await?;

    let Some(updated) = updated else {
        // The state guard in SQL rejected a concurrent transition; the
        // upload has no row pointing at it, so drop it.
        if let Some(path) = &new_image_path {
            state.media.discard(path).await;
        }
        return Err(AppError::Core(CoreError::Conflict(
            "Application status changed concurrently".into(),
        )));
    };

    // A replacement orphans the previous upload.
    if new_image_path.is_some() {
        if let Some(old) = &application.image_path {
            state.media.discard(old).await;
        }
    }

    Ok(Json(updated))
}

/// DELETE /api/v1/applications/{id}
///
/// Owner-only, permitted only while the application is still `new`.
pub async fn delete(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    let application = load_application(&state, id).await?;

    if !user.owns(application.user_id) {
        return Err(AppError::Core(CoreError::Forbidden(
            "Only the owner may delete an application".into(),
        )));
    }

    let status = application.workflow_status()?;
    if !workflow::can_delete(status) {
        return Err(AppError::Core(CoreError::Conflict(format!(
            "Deletion is only possible while the application is new (current status: {})",
            status.label()
        ))));
    }

    let deleted = ApplicationRepo::delete_if_new(&state.pool, id).await?;
    if !deleted {
        return Err(AppError::Core(CoreError::Conflict(
            "Application status changed concurrently".into(),
        )));
    }

    if let Some(path) = &application.image_path {
        state.media.discard(path).await;
    }

    tracing::info!(application_id = id, user_id = user.user_id, "Application deleted");
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Staff workflow handlers
// ---------------------------------------------------------------------------

/// POST /api/v1/applications/{id}/accept
///
/// Admin-only transition `new -> in_progress`. Requires a non-empty comment.
pub async fn accept(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<DbId>,
    Json(input): Json<AcceptRequest>,
) -> AppResult<Json<Application>> {
    let comment = match validation::validate_admin_comment(&input.admin_comment) {
        Ok(comment) => comment,
        Err(msg) => {
            let mut errors = FieldErrors::new();
            errors.add("admin_comment", msg);
            return Err(errors.into());
        }
    };

    let application = load_application(&state, id).await?;
    let current = application.workflow_status()?;
    workflow::transition(current, WorkflowAction::Accept)?;

    let updated = ApplicationRepo::set_in_progress(&state.pool, id, &comment)
        .await?
        .ok_or_else(|| {
            AppError::Core(CoreError::Conflict(
                "Application status changed concurrently".into(),
            ))
        })?;

    tracing::info!(
        application_id = id,
        admin_id = admin.user_id,
        "Application accepted into work"
    );

    Ok(Json(updated))
}

/// POST /api/v1/applications/{id}/complete
///
/// Admin-only transition `in_progress -> done`. Multipart form with a
/// required `design_image` upload.
pub async fn complete(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<DbId>,
    mut multipart: Multipart,
) -> AppResult<Json<Application>> {
    let mut design_image: Option<UploadedImage> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        if field.name() == Some("design_image") {
            design_image = Some(read_image(field).await?);
        }
    }

    let mut errors = FieldErrors::new();
    match &design_image {
        Some(image) => {
            if let Err(msg) = validation::validate_image(&image.content_type, image.data.len()) {
                errors.add("design_image", msg);
            }
        }
        None => errors.add("design_image", "A finished-design image must be uploaded"),
    }
    errors.into_result().map_err(AppError::from)?;

    let application = load_application(&state, id).await?;
    let current = application.workflow_status()?;
    workflow::transition(current, WorkflowAction::Complete)?;

    let image = design_image
        .ok_or_else(|| AppError::InternalError("validated form lost its image".into()))?;
    let design_image_path = state
        .media
        .save_design_image(id, &image.content_type, &image.data)
        .await?;

    let updated = ApplicationRepo::set_done(&state.pool, id, &design_image_path).await?;
    let Some(updated) = updated else {
        state.media.discard(&design_image_path).await;
        return Err(AppError::Core(CoreError::Conflict(
            "Application status changed concurrently".into(),
        )));
    };

    tracing::info!(
        application_id = id,
        admin_id = admin.user_id,
        "Application completed"
    );

    Ok(Json(updated))
}
