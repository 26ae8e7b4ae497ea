//! Router assembly for the ransim HTTP API.
//!
//! [`build_router`] wires all handler functions to their routes with
//! CORS and tracing middleware layers.

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

/// Builds the complete axum router with all API routes.
///
/// Routes use axum 0.8 `/{param}` path syntax. CORS is permissive so browser
/// dashboards on other origins can call the API.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::health))
        // Simulation lifecycle
        .route("/initialize", post(handlers::simulation::initialize))
        .route("/status", get(handlers::simulation::status))
        .route("/drop-ues", post(handlers::simulation::drop_ues))
        .route("/ues", get(handlers::simulation::ue_info))
        .route(
            "/naming",
            get(handlers::simulation::get_naming).post(handlers::simulation::set_naming),
        )
        .route(
            "/array-defaults",
            post(handlers::simulation::set_array_defaults),
        )
        // Sites and sectors
        .route(
            "/sites",
            get(handlers::sites::list_sites).post(handlers::sites::add_site),
        )
        .route("/sites/{site}", get(handlers::sites::get_site))
        .route("/sites/{site}/rename", post(handlers::sites::rename_site))
        .route(
            "/sites/{site}/sectors/{sector_id}/azimuth",
            post(handlers::sites::set_sector_azimuth),
        )
        .route("/sites/{site}/height", post(handlers::sites::set_site_height))
        .route("/sectors", get(handlers::sites::list_sectors))
        // Cells
        .route(
            "/cells",
            get(handlers::cells::list_cells).post(handlers::cells::add_cell),
        )
        .route("/cells/query", post(handlers::cells::query_cells))
        .route("/cells/update", post(handlers::cells::update_cell))
        .route("/cells/bulk-update", post(handlers::cells::bulk_update))
        .route(
            "/cells/update-by-query",
            post(handlers::cells::update_by_query),
        )
        .route("/cells/{cell}", get(handlers::cells::get_cell))
        // Measurement runs
        .route(
            "/measurement-reports",
            post(handlers::runs::create_measurement_reports),
        )
        .route("/runs", get(handlers::runs::list_runs))
        .route(
            "/runs/{run_id}",
            get(handlers::runs::get_run).delete(handlers::runs::delete_run),
        )
        .route("/runs/{run_id}/reports", get(handlers::runs::get_reports))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
