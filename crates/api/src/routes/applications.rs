//! Route definitions for the `/applications` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::applications;
use crate::state::AppState;

/// Routes mounted at `/applications`.
///
/// ```text
/// GET    /               -> dashboard (own applications)
/// POST   /               -> create (multipart)
/// GET    /{id}           -> get_by_id
/// PUT    /{id}           -> update (multipart)
/// DELETE /{id}           -> delete
/// POST   /{id}/accept    -> accept (admin)
/// POST   /{id}/complete  -> complete (admin, multipart)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(applications::dashboard).post(applications::create),
        )
        .route(
            "/{id}",
            get(applications::get_by_id)
                .put(applications::update)
                .delete(applications::delete),
        )
        .route("/{id}/accept", post(applications::accept))
        .route("/{id}/complete", post(applications::complete))
}
