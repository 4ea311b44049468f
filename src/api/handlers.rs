//! Request handlers for the API endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;

use super::AppState;
use super::types::{ClustersResponse, ErrorResponse, ScheduleResponse, SiteRecord, SitesQuery};
use crate::report::PlanningReport;

/// `GET /report` → 200 + full `PlanningReport` JSON
pub async fn get_report(State(state): State<Arc<AppState>>) -> Json<PlanningReport> {
    Json(state.report.clone())
}

/// Returns ranked sites, optionally truncated.
///
/// `GET /sites` → every site
/// `GET /sites?limit=N` → the first N sites
/// `GET /sites?limit=0` → 400 + `ErrorResponse`
pub async fn get_sites(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SitesQuery>,
) -> impl IntoResponse {
    let limit = query.limit.unwrap_or(usize::MAX);
    if limit == 0 {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "`limit` must be > 0".to_string(),
            }),
        ));
    }

    let sites: Vec<SiteRecord> = state
        .report
        .sites()
        .iter()
        .take(limit)
        .enumerate()
        .map(|(i, s)| SiteRecord::ranked(i, s))
        .collect();
    Ok(Json(sites))
}

/// `GET /clusters` → 200 + `ClustersResponse` JSON
pub async fn get_clusters(State(state): State<Arc<AppState>>) -> Json<ClustersResponse> {
    Json(ClustersResponse::from(&state.report))
}

/// `GET /schedule` → 200 + `ScheduleResponse` JSON
pub async fn get_schedule(State(state): State<Arc<AppState>>) -> Json<ScheduleResponse> {
    Json(ScheduleResponse::from(&state.report.schedule))
}
