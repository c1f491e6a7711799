//! Read-only reporting: the public landing data and the admin report and
//! summary panel.

use axum::extract::{Query, State};
use axum::Json;
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use atelier_core::types::{DbId, Timestamp};
use atelier_core::workflow::ApplicationStatus;
use atelier_db::models::application::{Application, ReportFilter, StatusCounts};
use atelier_db::repositories::ApplicationRepo;

use crate::error::{AppError, AppResult};
use crate::middleware::rbac::RequireAdmin;
use crate::state::AppState;

/// How many finished designs the landing page shows.
const RECENT_DONE_LIMIT: i64 = 4;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Query parameters for the admin report.
#[derive(Debug, Deserialize)]
pub struct ReportParams {
    pub status: Option<String>,
    pub category: Option<DbId>,
    /// Inclusive start date, `YYYY-MM-DD`.
    pub start: Option<String>,
    /// Inclusive end date, `YYYY-MM-DD` (the whole day is included).
    pub end: Option<String>,
}

/// Public landing page data.
#[derive(Debug, Serialize)]
pub struct HomeResponse {
    pub recent_done: Vec<Application>,
    pub in_progress_count: i64,
}

/// Admin summary panel: the full listing plus per-status counts.
#[derive(Debug, Serialize)]
pub struct SummaryResponse {
    pub applications: Vec<Application>,
    pub counts: StatusCounts,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /api/v1/home
///
/// Public: the latest finished designs and how many requests are currently
/// in work.
pub async fn home(State(state): State<AppState>) -> AppResult<Json<HomeResponse>> {
    let recent_done = ApplicationRepo::recent_done(&state.pool, RECENT_DONE_LIMIT).await?;
    let counts = ApplicationRepo::count_by_status(&state.pool).await?;
    Ok(Json(HomeResponse {
        recent_done,
        in_progress_count: counts.in_progress,
    }))
}

/// GET /api/v1/admin/report
///
/// All applications, newest first, filterable by status, category, and an
/// inclusive date range.
pub async fn report(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Query(params): Query<ReportParams>,
) -> AppResult<Json<Vec<Application>>> {
    let filter = build_filter(&params)?;
    let applications = ApplicationRepo::report(&state.pool, &filter).await?;
    Ok(Json(applications))
}

/// GET /api/v1/admin/summary
pub async fn summary(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> AppResult<Json<SummaryResponse>> {
    let applications = ApplicationRepo::report(&state.pool, &ReportFilter::default()).await?;
    let counts = ApplicationRepo::count_by_status(&state.pool).await?;
    Ok(Json(SummaryResponse {
        applications,
        counts,
    }))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Translate query parameters into a repository filter.
///
/// The end date is inclusive of the whole day, so it becomes an exclusive
/// bound at midnight of the following day.
fn build_filter(params: &ReportParams) -> Result<ReportFilter, AppError> {
    let status = match params.status.as_deref() {
        None | Some("") => None,
        Some(raw) => Some(ApplicationStatus::parse(raw).ok_or_else(|| {
            AppError::BadRequest(format!(
                "Unknown status '{raw}'. Expected one of: new, in_progress, done"
            ))
        })?),
    };

    let created_from = params
        .start
        .as_deref()
        .map(|raw| parse_date(raw, "start"))
        .transpose()?
        .map(start_of_day);

    let created_before = params
        .end
        .as_deref()
        .map(|raw| parse_date(raw, "end"))
        .transpose()?
        .map(|date| {
            date.succ_opt()
                .map(start_of_day)
                .ok_or_else(|| AppError::BadRequest("End date out of range".into()))
        })
        .transpose()?;

    Ok(ReportFilter {
        status,
        category_id: params.category,
        created_from,
        created_before,
    })
}

fn parse_date(raw: &str, field: &str) -> Result<NaiveDate, AppError> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| AppError::BadRequest(format!("Invalid {field} date, expected YYYY-MM-DD")))
}

fn start_of_day(date: NaiveDate) -> Timestamp {
    date.and_time(NaiveTime::MIN).and_utc()
}
