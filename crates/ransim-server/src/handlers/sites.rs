//! Site and sector handlers.
//!
//! `{site}` path segments accept a site index, uid, or name.

use axum::extract::{Path, State};
use axum::Json;

use ransim_core::SiteRef;

use crate::error::ApiError;
use crate::schema::sites::{
    AddSiteRequest, AddSiteResponse, RenameSiteRequest, SectorAzimuthRequest, SectorsResponse,
    SiteHeightRequest, SiteResponse, SitesResponse,
};
use crate::state::AppState;

/// `GET /sites`
pub async fn list_sites(State(state): State<AppState>) -> Json<SitesResponse> {
    let sim = state.guard.lock().await;
    Json(sim.sites())
}

/// Adds a site, optionally with its cells, as one change.
///
/// `POST /sites`
pub async fn add_site(
    State(state): State<AppState>,
    Json(req): Json<AddSiteRequest>,
) -> Result<Json<AddSiteResponse>, ApiError> {
    let mut sim = state.guard.mutate().await?;
    Ok(Json(sim.add_site(req)?))
}

/// `GET /sites/{site}`
pub async fn get_site(
    State(state): State<AppState>,
    Path(site): Path<String>,
) -> Result<Json<SiteResponse>, ApiError> {
    let sim = state.guard.lock().await;
    let site = sim.site(&SiteRef::parse(&site))?;
    Ok(Json(SiteResponse { site }))
}

/// `POST /sites/{site}/rename`
pub async fn rename_site(
    State(state): State<AppState>,
    Path(site): Path<String>,
    Json(req): Json<RenameSiteRequest>,
) -> Result<Json<SiteResponse>, ApiError> {
    let mut sim = state.guard.mutate().await?;
    let site = sim.rename_site(&SiteRef::parse(&site), req)?;
    Ok(Json(SiteResponse { site }))
}

/// `POST /sites/{site}/sectors/{sector_id}/azimuth`
pub async fn set_sector_azimuth(
    State(state): State<AppState>,
    Path((site, sector_id)): Path<(String, i64)>,
    Json(req): Json<SectorAzimuthRequest>,
) -> Result<Json<SiteResponse>, ApiError> {
    let mut sim = state.guard.mutate().await?;
    let site = sim.set_sector_azimuth(&SiteRef::parse(&site), sector_id, req.azimuth_deg)?;
    Ok(Json(SiteResponse { site }))
}

/// `POST /sites/{site}/height`
pub async fn set_site_height(
    State(state): State<AppState>,
    Path(site): Path<String>,
    Json(req): Json<SiteHeightRequest>,
) -> Result<Json<SiteResponse>, ApiError> {
    let mut sim = state.guard.mutate().await?;
    let site = sim.set_site_height(&SiteRef::parse(&site), req.height_m)?;
    Ok(Json(SiteResponse { site }))
}

/// `GET /sectors`
pub async fn list_sectors(State(state): State<AppState>) -> Json<SectorsResponse> {
    let sim = state.guard.lock().await;
    Json(sim.sectors())
}
