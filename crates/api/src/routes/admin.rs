//! Route definitions for the admin-gated surface: category management and
//! reporting.

use axum::routing::get;
use axum::Router;

use crate::handlers::{categories, reports};
use crate::state::AppState;

/// Routes mounted at `/admin`.
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/categories",
            get(categories::list_with_counts).post(categories::create),
        )
        .route(
            "/categories/{id}",
            axum::routing::put(categories::update).delete(categories::delete),
        )
        .route("/report", get(reports::report))
        .route("/summary", get(reports::summary))
}
