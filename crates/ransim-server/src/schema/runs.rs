//! Measurement run request/response types.

use serde::{Deserialize, Serialize};

use ransim_compute::{ChunkSettings, LabelMode, MeasurementReport};
use ransim_core::table::CellRow;
use ransim_core::ScenarioConfig;

use super::FieldChecks;
use crate::error::ApiError;

fn default_threshold() -> f64 {
    -120.0
}

/// `POST /measurement-reports`
#[derive(Debug, Clone, Deserialize)]
pub struct MeasurementRequest {
    /// Human-readable run name.
    pub name: Option<String>,
    /// Defaults to the start time as `YYYY-MM-DD_HH-MM-SS`.
    pub run_id: Option<String>,
    #[serde(default = "default_threshold")]
    pub threshold_dbm: f64,
    #[serde(default)]
    pub label_mode: LabelMode,
    /// Include the reports in the response as well as storing them.
    #[serde(default)]
    pub return_payload: bool,
}

impl MeasurementRequest {
    pub fn check(&self) -> Result<(), ApiError> {
        let mut checks = FieldChecks::new();
        checks.finite("threshold_dbm", Some(self.threshold_dbm));
        if let Some(run_id) = &self.run_id {
            let ok = !run_id.is_empty()
                && run_id
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
            if !ok {
                checks.fail("run_id", "use letters, digits, '-', '_' or '.'");
            }
        }
        checks.finish()
    }
}

/// Metadata stored with each run.
#[derive(Debug, Clone, Serialize)]
pub struct RunMetadata {
    pub name: Option<String>,
    pub timestamp: String,
    pub unix_timestamp: i64,
    pub timestep: u64,
    pub num_users: usize,
    pub num_sites: usize,
    pub num_cells: usize,
    pub num_bands: usize,
    pub bands: Vec<String>,
    pub chunks: ChunkSettings,
    /// blake3 over the topology at compute time.
    pub topology_fingerprint: String,
    pub init_config: Option<ScenarioConfig>,
    pub cell_states_at_run: Vec<CellRow>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunAccess {
    pub metadata: String,
    pub reports: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct MeasurementResponse {
    pub run_id: String,
    pub status: &'static str,
    pub num_reports: usize,
    pub threshold_dbm: f64,
    pub label_mode: LabelMode,
    pub access: RunAccess,
    pub metadata: RunMetadata,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub measurement_reports: Option<Vec<MeasurementReport>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DeleteRunResponse {
    pub run_id: String,
    pub reports_deleted: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn defaults_threshold_and_label_mode() {
        let req: MeasurementRequest = serde_json::from_value(json!({ "name": "t" })).unwrap();
        assert_eq!(req.threshold_dbm, -120.0);
        assert_eq!(req.label_mode, LabelMode::Name);
        assert!(req.check().is_ok());
    }

    #[test]
    fn rejects_path_unsafe_run_id() {
        let req: MeasurementRequest =
            serde_json::from_value(json!({ "run_id": "a/b", "label_mode": "bxy" })).unwrap();
        assert_eq!(req.label_mode, LabelMode::Compact);
        assert!(matches!(req.check(), Err(ApiError::ValidationFailed(_))));
    }
}
