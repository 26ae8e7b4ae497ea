//! Scenario, status, UE and naming handlers.

use axum::extract::State;
use axum::Json;

use ransim_core::ScenarioConfig;

use crate::error::ApiError;
use crate::schema::cells::ArrayFields;
use crate::schema::simulation::{
    DropUesRequest, DropUesResponse, InitializeResponse, NamingRequest, NamingResponse,
    StatusResponse, UeInfoResponse,
};
use crate::state::AppState;

/// Replaces the simulation with a generated dual-band scenario.
///
/// `POST /initialize`
pub async fn initialize(
    State(state): State<AppState>,
    Json(config): Json<ScenarioConfig>,
) -> Result<Json<InitializeResponse>, ApiError> {
    let mut sim = state.guard.mutate().await?;
    Ok(Json(sim.initialize(config)?))
}

/// `GET /status`
pub async fn status(State(state): State<AppState>) -> Json<StatusResponse> {
    let computing = state.guard.is_computing();
    let sim = state.guard.lock().await;
    Json(sim.status(computing))
}

/// Re-drops every UE and clears the last result.
///
/// `POST /drop-ues`
pub async fn drop_ues(
    State(state): State<AppState>,
    Json(req): Json<DropUesRequest>,
) -> Result<Json<DropUesResponse>, ApiError> {
    let mut sim = state.guard.mutate().await?;
    Ok(Json(sim.drop_ues(req)?))
}

/// `GET /ues`
pub async fn ue_info(State(state): State<AppState>) -> Json<UeInfoResponse> {
    let sim = state.guard.lock().await;
    Json(sim.ue_info())
}

/// `GET /naming`
pub async fn get_naming(State(state): State<AppState>) -> Json<NamingResponse> {
    let sim = state.guard.lock().await;
    Json(sim.naming())
}

/// `POST /naming`
pub async fn set_naming(
    State(state): State<AppState>,
    Json(req): Json<NamingRequest>,
) -> Result<Json<NamingResponse>, ApiError> {
    let mut sim = state.guard.mutate().await?;
    Ok(Json(sim.set_naming(&req)?))
}

/// `POST /array-defaults`
pub async fn set_array_defaults(
    State(state): State<AppState>,
    Json(fields): Json<ArrayFields>,
) -> Result<Json<NamingResponse>, ApiError> {
    let mut sim = state.guard.mutate().await?;
    Ok(Json(sim.set_array_defaults(&fields)?))
}
