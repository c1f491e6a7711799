//! Route definitions for the `/api/v1` tree.

pub mod admin;
pub mod applications;
pub mod auth;
pub mod health;

use axum::routing::get;
use axum::Router;

use crate::handlers::{categories, reports};
use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /auth/register                         register (public)
/// /auth/login                            login (public)
/// /auth/refresh                          refresh (public)
/// /auth/logout                           logout (requires auth)
///
/// /home                                  landing data (public)
/// /categories                            category list (public)
///
/// /applications                          dashboard list, create (auth)
/// /applications/{id}                     detail, edit, delete (owner-gated)
/// /applications/{id}/accept              new -> in_progress (admin only)
/// /applications/{id}/complete            in_progress -> done (admin only)
///
/// /admin/categories                      list with counts, create (admin)
/// /admin/categories/{id}                 update, cascade delete (admin)
/// /admin/report                          filterable report (admin)
/// /admin/summary                         summary panel (admin)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .route("/home", get(reports::home))
        .route("/categories", get(categories::list))
        .nest("/applications", applications::router())
        .nest("/admin", admin::router())
}
