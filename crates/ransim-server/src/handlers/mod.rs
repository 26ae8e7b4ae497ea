//! HTTP handler modules for the ransim API.
//!
//! Handlers are thin: they parse the request, take the simulation lock (or
//! the mutation lock, which fails with 409 while a compute runs), delegate to
//! [`Simulation`](crate::service::Simulation), and return JSON.

pub mod cells;
pub mod runs;
pub mod simulation;
pub mod sites;

use axum::Json;

/// Liveness probe.
///
/// `GET /`
pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "service": "ransim",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
