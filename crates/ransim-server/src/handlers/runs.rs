//! Measurement run handlers: compute and store, list, fetch, delete.

use axum::extract::{Path, Query, State};
use axum::Json;

use ransim_storage::{ListRunsQuery, ReportFilter, ReportPage, RunHeader, RunPage};

use crate::error::ApiError;
use crate::schema::runs::{DeleteRunResponse, MeasurementRequest, MeasurementResponse};
use crate::service;
use crate::state::AppState;

/// Computes RSRP for the current topology and UEs and stores the reports.
///
/// `POST /measurement-reports`
pub async fn create_measurement_reports(
    State(state): State<AppState>,
    Json(req): Json<MeasurementRequest>,
) -> Result<Json<MeasurementResponse>, ApiError> {
    Ok(Json(service::run_measurements(&state, req).await?))
}

/// `GET /runs?limit=&offset=&sort_by=&desc=`
pub async fn list_runs(
    State(state): State<AppState>,
    Query(query): Query<ListRunsQuery>,
) -> Result<Json<RunPage>, ApiError> {
    let runs = state.runs.lock().await;
    Ok(Json(runs.list_runs(&query)?))
}

/// `GET /runs/{run_id}`
pub async fn get_run(
    State(state): State<AppState>,
    Path(run_id): Path<String>,
) -> Result<Json<RunHeader>, ApiError> {
    let runs = state.runs.lock().await;
    Ok(Json(runs.get_run(&run_id)?))
}

/// `GET /runs/{run_id}/reports?limit=&offset=&user_min=&user_max=`
pub async fn get_reports(
    State(state): State<AppState>,
    Path(run_id): Path<String>,
    Query(filter): Query<ReportFilter>,
) -> Result<Json<ReportPage>, ApiError> {
    let runs = state.runs.lock().await;
    Ok(Json(runs.get_reports(&run_id, &filter)?))
}

/// `DELETE /runs/{run_id}`
pub async fn delete_run(
    State(state): State<AppState>,
    Path(run_id): Path<String>,
) -> Result<Json<DeleteRunResponse>, ApiError> {
    let mut runs = state.runs.lock().await;
    let reports_deleted = runs.delete_run(&run_id)?;
    tracing::info!(run_id = %run_id, reports_deleted, "run deleted");
    Ok(Json(DeleteRunResponse {
        run_id,
        reports_deleted,
    }))
}
