//! Cell handlers: add, read, query, and the three update flavours.

use axum::extract::{Path, State};
use axum::Json;

use ransim_core::query::{CellQuery, QueryPage};
use ransim_core::table::CellRow;
use ransim_core::CellRef;

use crate::error::ApiError;
use crate::schema::cells::{
    AddCellRequest, AddCellResponse, BulkUpdateRequest, BulkUpdateResponse, CellUpdateRequest,
    CellsResponse, QueryUpdateRequest, QueryUpdateResponse, UpdatedCellView,
};
use crate::state::AppState;

/// `GET /cells`
pub async fn list_cells(State(state): State<AppState>) -> Json<CellsResponse> {
    let sim = state.guard.lock().await;
    Json(sim.cells())
}

/// `POST /cells`
pub async fn add_cell(
    State(state): State<AppState>,
    Json(req): Json<AddCellRequest>,
) -> Result<Json<AddCellResponse>, ApiError> {
    let mut sim = state.guard.mutate().await?;
    Ok(Json(sim.add_cell(req)?))
}

/// Looks a cell up by index or name.
///
/// `GET /cells/{cell}`
pub async fn get_cell(
    State(state): State<AppState>,
    Path(cell): Path<String>,
) -> Result<Json<CellRow>, ApiError> {
    let sim = state.guard.lock().await;
    Ok(Json(sim.cell(&CellRef::parse(&cell))?))
}

/// `POST /cells/query`
pub async fn query_cells(
    State(state): State<AppState>,
    Json(query): Json<CellQuery>,
) -> Json<QueryPage> {
    let sim = state.guard.lock().await;
    Json(sim.query(&query))
}

/// `POST /cells/update`
pub async fn update_cell(
    State(state): State<AppState>,
    Json(req): Json<CellUpdateRequest>,
) -> Result<Json<UpdatedCellView>, ApiError> {
    let mut sim = state.guard.mutate().await?;
    Ok(Json(sim.update_cell(&req)?))
}

/// `POST /cells/bulk-update`
pub async fn bulk_update(
    State(state): State<AppState>,
    Json(req): Json<BulkUpdateRequest>,
) -> Result<Json<BulkUpdateResponse>, ApiError> {
    let mut sim = state.guard.mutate().await?;
    Ok(Json(sim.bulk_update(&req)?))
}

/// `POST /cells/update-by-query`
pub async fn update_by_query(
    State(state): State<AppState>,
    Json(req): Json<QueryUpdateRequest>,
) -> Result<Json<QueryUpdateResponse>, ApiError> {
    let mut sim = state.guard.mutate().await?;
    Ok(Json(sim.update_by_query(&req)?))
}
