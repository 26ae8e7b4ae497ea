//! Simulation-level request/response types: initialize, status, UEs, naming.

use serde::{Deserialize, Serialize};

use ransim_compute::ChunkSettings;
use ransim_core::{
    AntennaArray, DropLayout, DropParams, DropRequest, NamingConfig, ScenarioConfig,
    SectorLabel, SiteKey,
};

use super::FieldChecks;
use crate::error::ApiError;

#[derive(Debug, Clone, Serialize)]
pub struct InitializeResponse {
    pub num_sites: usize,
    pub num_cells: usize,
    pub num_ues: usize,
    pub bands: Vec<String>,
    pub config: ScenarioConfig,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusResponse {
    pub num_sites: usize,
    pub num_cells: usize,
    pub num_ues: usize,
    pub num_bands: usize,
    pub bands: Vec<String>,
    pub chunks: ChunkSettings,
    pub timestep: u64,
    pub compute_in_progress: bool,
    pub has_results: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub init_config: Option<ScenarioConfig>,
}

/// `POST /drop-ues`. Replaces every UE and discards the last result.
#[derive(Debug, Clone, Deserialize)]
pub struct DropUesRequest {
    pub num_ue: usize,
    #[serde(default)]
    pub layout: DropLayout,
    pub center_x: Option<f64>,
    pub center_y: Option<f64>,
    pub radius_m: Option<f64>,
    pub box_pad_m: Option<f64>,
    pub height_m: Option<f64>,
    pub seed: Option<u64>,
}

impl DropUesRequest {
    pub fn into_request(self) -> Result<DropRequest, ApiError> {
        let mut checks = FieldChecks::new();
        if self.num_ue == 0 {
            checks.fail("num_ue", "must be at least 1");
        }
        checks.finite("center_x", self.center_x);
        checks.finite("center_y", self.center_y);
        if self.center_x.is_some() != self.center_y.is_some() {
            checks.fail("center_x", "center_x and center_y must be given together");
        }
        checks.positive("radius_m", self.radius_m);
        checks.finite("box_pad_m", self.box_pad_m);
        checks.finite("height_m", self.height_m);
        checks.finish()?;

        let mut request = DropRequest::new(self.num_ue);
        request.layout = self.layout;
        request.center = self.center_x.zip(self.center_y).map(|(x, y)| [x, y]);
        if let Some(radius_m) = self.radius_m {
            request.radius_m = radius_m;
        }
        if let Some(box_pad_m) = self.box_pad_m {
            request.box_pad_m = box_pad_m;
        }
        if let Some(height_m) = self.height_m {
            request.height_m = height_m;
        }
        if let Some(seed) = self.seed {
            request.seed = seed;
        }
        Ok(request)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DropUesResponse {
    pub num_ues: usize,
    pub drop_params: DropParams,
    pub results_cleared: bool,
}

/// Summary of the last compute, if it is still valid for the current UEs.
#[derive(Debug, Clone, Serialize)]
pub struct ResultInfo {
    pub run_id: String,
    pub rsrp_shape: [usize; 2],
    /// UEs with at least one finite reading.
    pub served_ues: usize,
    /// Serving-cell counts keyed by cell name, strongest first.
    pub serving_cells: Vec<(String, usize)>,
}

#[derive(Debug, Clone, Serialize)]
pub struct UeInfoResponse {
    pub num_ues: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub layout: Option<DropLayout>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub drop_params: Option<DropParams>,
    pub has_results: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub results: Option<ResultInfo>,
}

/// `POST /naming`. Unset fields keep their current value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NamingRequest {
    pub use_site: Option<SiteKey>,
    pub sector_mode: Option<SectorLabel>,
    pub pattern: Option<String>,
}

impl NamingRequest {
    pub fn merge(&self, current: &NamingConfig) -> Result<NamingConfig, ApiError> {
        Ok(NamingConfig::new(
            self.use_site.unwrap_or(current.site_key()),
            self.sector_mode.unwrap_or(current.sector_label()),
            self.pattern.as_deref().unwrap_or(current.pattern()),
        )?)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct NamingResponse {
    pub naming: NamingConfig,
    pub array_defaults: AntennaArray,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn drop_request_fills_defaults() {
        let req: DropUesRequest = serde_json::from_value(json!({
            "num_ue": 10, "layout": "disk", "center_x": 5.0, "center_y": -5.0, "seed": 3
        }))
        .unwrap();
        let request = req.into_request().unwrap();
        assert_eq!(request.layout, DropLayout::Disk);
        assert_eq!(request.center, Some([5.0, -5.0]));
        assert_eq!(request.seed, 3);
        assert_eq!(request.radius_m, DropRequest::new(1).radius_m);
    }

    #[test]
    fn drop_request_rejects_half_center() {
        let req: DropUesRequest =
            serde_json::from_value(json!({ "num_ue": 0, "center_x": 1.0 })).unwrap();
        match req.into_request() {
            Err(ApiError::ValidationFailed(errors)) => assert_eq!(errors.len(), 2),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn naming_merge_keeps_unset_fields() {
        let current = NamingConfig::default();
        let req = NamingRequest {
            sector_mode: Some(SectorLabel::Letters),
            ..Default::default()
        };
        let merged = req.merge(&current).unwrap();
        assert_eq!(merged.sector_label(), SectorLabel::Letters);
        assert_eq!(merged.pattern(), current.pattern());

        let bad = NamingRequest {
            pattern: Some("{band}{nope}".into()),
            ..Default::default()
        };
        assert!(bad.merge(&current).is_err());
    }
}
