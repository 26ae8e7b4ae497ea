//! Cell request/response types.

use serde::{Deserialize, Serialize};

use ransim_core::query::CellQuery;
use ransim_core::table::CellRow;
use ransim_core::{
    ArrayOverrides, CellRef, CellSpec, CellUpdate, Polarization, PolarizationType, SectorId,
    SiteRef,
};

use super::{default_true, FieldChecks};
use crate::error::ApiError;

/// Antenna array fields shared by add and update requests.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ArrayFields {
    pub bs_rows: Option<u32>,
    pub bs_cols: Option<u32>,
    pub bs_pol: Option<Polarization>,
    pub bs_pol_type: Option<PolarizationType>,
    #[serde(alias = "elem_v_spacing")]
    pub bs_vertical_spacing: Option<f64>,
    #[serde(alias = "elem_h_spacing")]
    pub bs_horizontal_spacing: Option<f64>,
    pub antenna_pattern: Option<String>,
}

impl ArrayFields {
    fn check(&self, checks: &mut FieldChecks) {
        checks.at_least_one("bs_rows", self.bs_rows);
        checks.at_least_one("bs_cols", self.bs_cols);
        checks.positive("bs_vertical_spacing", self.bs_vertical_spacing);
        checks.positive("bs_horizontal_spacing", self.bs_horizontal_spacing);
    }

    /// Checked overrides on their own, as for `POST /array-defaults`.
    pub fn to_overrides(&self) -> Result<ArrayOverrides, ApiError> {
        let mut checks = FieldChecks::new();
        self.check(&mut checks);
        checks.finish()?;
        Ok(self.overrides())
    }

    fn overrides(&self) -> ArrayOverrides {
        ArrayOverrides {
            rows: self.bs_rows,
            cols: self.bs_cols,
            polarization: self.bs_pol,
            polarization_type: self.bs_pol_type,
            vertical_spacing: self.bs_vertical_spacing,
            horizontal_spacing: self.bs_horizontal_spacing,
            pattern: self.antenna_pattern.clone(),
        }
    }
}

/// `POST /cells`
#[derive(Debug, Clone, Deserialize)]
pub struct AddCellRequest {
    /// Site index, uid, or name.
    #[serde(alias = "site_name")]
    pub site: SiteRef,
    pub sector_id: i64,
    pub band: String,
    pub fc_hz: Option<f64>,
    pub tilt_deg: Option<f64>,
    pub tx_rs_power_dbm: Option<f64>,
    pub roll_deg: Option<f64>,
    pub height_m: Option<f64>,
    #[serde(flatten)]
    pub array: ArrayFields,
    /// Explicit name instead of the naming pattern.
    pub cell_name: Option<String>,
    #[serde(alias = "sector_azimuth")]
    pub sector_azimuth_deg: Option<f64>,
}

impl AddCellRequest {
    pub fn into_spec(self) -> Result<CellSpec, ApiError> {
        let mut checks = FieldChecks::new();
        checks.positive("fc_hz", self.fc_hz);
        checks.within("tilt_deg", self.tilt_deg, -90.0, 90.0);
        checks.finite("tx_rs_power_dbm", self.tx_rs_power_dbm);
        checks.finite("roll_deg", self.roll_deg);
        checks.positive("height_m", self.height_m);
        checks.finite("sector_azimuth_deg", self.sector_azimuth_deg);
        self.array.check(&mut checks);
        checks.finish()?;

        Ok(CellSpec {
            site: self.site,
            sector: SectorId::new(self.sector_id)?,
            band: self.band,
            frequency_hz: self.fc_hz,
            tx_power_dbm: self.tx_rs_power_dbm,
            downtilt_deg: self.tilt_deg,
            roll_deg: self.roll_deg,
            height_m: self.height_m,
            array: self.array.overrides(),
            name: self.cell_name,
            sector_azimuth_deg: self.sector_azimuth_deg,
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AddCellResponse {
    pub cell_idx: usize,
    pub cell_name: String,
    pub site_name: String,
    pub sector_id: SectorId,
    pub band: String,
    pub sector_azimuth_deg: f64,
    pub azimuth_applied: bool,
    pub is_first_cell_on_sector: bool,
    pub bands_on_sector: Vec<String>,
    pub cell: CellRow,
}

/// Fields of a partial cell update.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CellFields {
    #[serde(alias = "site_name")]
    pub site: Option<SiteRef>,
    pub sector_id: Option<i64>,
    pub band: Option<String>,
    pub fc_hz: Option<f64>,
    pub tx_rs_power_dbm: Option<f64>,
    pub tilt_deg: Option<f64>,
    pub roll_deg: Option<f64>,
    pub height_m: Option<f64>,
    #[serde(flatten)]
    pub array: ArrayFields,
}

impl CellFields {
    pub fn to_update(&self) -> Result<CellUpdate, ApiError> {
        let mut checks = FieldChecks::new();
        checks.positive("fc_hz", self.fc_hz);
        checks.within("tilt_deg", self.tilt_deg, -90.0, 90.0);
        checks.finite("tx_rs_power_dbm", self.tx_rs_power_dbm);
        checks.finite("roll_deg", self.roll_deg);
        checks.positive("height_m", self.height_m);
        self.array.check(&mut checks);
        checks.finish()?;

        Ok(CellUpdate {
            site: self.site.clone(),
            sector: self.sector_id.map(SectorId::new).transpose()?,
            band: self.band.clone(),
            frequency_hz: self.fc_hz,
            tx_power_dbm: self.tx_rs_power_dbm,
            downtilt_deg: self.tilt_deg,
            roll_deg: self.roll_deg,
            height_m: self.height_m,
            array: self.array.overrides(),
        })
    }
}

/// `POST /cells/update`, and one item of a bulk update.
#[derive(Debug, Clone, Deserialize)]
pub struct CellUpdateRequest {
    pub cell_id: Option<usize>,
    pub cell_name: Option<String>,
    /// Re-derive the name when site, sector or band change.
    #[serde(default = "default_true")]
    pub rename: bool,
    #[serde(flatten)]
    pub fields: CellFields,
}

impl CellUpdateRequest {
    pub fn cell_ref(&self) -> Result<CellRef, ApiError> {
        match (self.cell_id, &self.cell_name) {
            (Some(id), None) => Ok(CellRef::Index(id)),
            (None, Some(name)) => Ok(CellRef::Name(name.clone())),
            _ => Err(ApiError::BadRequest(
                "exactly one of cell_id or cell_name is required".to_string(),
            )),
        }
    }

    /// How the request names its cell, for per-item results.
    pub fn identifier(&self) -> String {
        match (self.cell_id, &self.cell_name) {
            (Some(id), _) => format!("cell_id={}", id),
            (None, Some(name)) => format!("cell_name='{}'", name),
            (None, None) => "unknown".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct UpdatedCellView {
    pub cell_idx: usize,
    pub original_name: String,
    pub cell_name: String,
    pub moved: bool,
    pub updated_fields: Vec<&'static str>,
    pub cell: CellRow,
}

/// `POST /cells/bulk-update`
#[derive(Debug, Clone, Deserialize)]
pub struct BulkUpdateRequest {
    pub updates: Vec<CellUpdateRequest>,
    #[serde(default)]
    pub stop_on_error: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ItemError {
    /// Position in the request (bulk) or in the matched set (query).
    pub index: usize,
    pub identifier: String,
    pub error: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct BulkUpdateResponse {
    pub num_requested: usize,
    pub num_successful: usize,
    pub num_failed: usize,
    /// Set when `stop_on_error` cut the batch short.
    pub stopped_early: bool,
    pub results: Vec<UpdatedCellView>,
    pub errors: Vec<ItemError>,
    pub status: &'static str,
}

/// `POST /cells/update-by-query`
#[derive(Debug, Clone, Deserialize)]
pub struct QueryUpdateRequest {
    #[serde(flatten)]
    pub query: CellQuery,
    pub update: CellFields,
    #[serde(default)]
    pub stop_on_error: bool,
    #[serde(default = "default_true")]
    pub rename: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct QueryUpdateResponse {
    pub query_matched: usize,
    pub num_updated: usize,
    pub num_failed: usize,
    pub stopped_early: bool,
    pub results: Vec<UpdatedCellView>,
    pub errors: Vec<ItemError>,
    pub status: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct CellsResponse {
    pub cells: Vec<CellRow>,
    pub num_cells: usize,
}

/// `"success"`, `"partial"` or `"failed"` for a batch outcome.
pub fn batch_status(succeeded: usize, failed: usize) -> &'static str {
    match (succeeded, failed) {
        (_, 0) => "success",
        (0, _) => "failed",
        _ => "partial",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn add_cell_accepts_site_name_alias_and_array_fields() {
        let req: AddCellRequest = serde_json::from_value(json!({
            "site_name": "SITE0001A",
            "sector_id": 2,
            "band": "H",
            "fc_hz": 2.5e9,
            "tilt_deg": 6.0,
            "bs_rows": 8,
            "bs_cols": 1,
            "elem_v_spacing": 0.7
        }))
        .unwrap();
        let spec = req.into_spec().unwrap();
        assert_eq!(spec.site, SiteRef::Key("SITE0001A".into()));
        assert_eq!(spec.sector.index(), 2);
        assert_eq!(spec.array.rows, Some(8));
        assert_eq!(spec.array.vertical_spacing, Some(0.7));
        assert_eq!(spec.downtilt_deg, Some(6.0));
    }

    #[test]
    fn add_cell_reports_all_bad_numbers() {
        let req: AddCellRequest = serde_json::from_value(json!({
            "site": 0, "sector_id": 0, "band": "H",
            "fc_hz": -1.0, "tilt_deg": 120.0, "bs_rows": 0
        }))
        .unwrap();
        match req.into_spec() {
            Err(ApiError::ValidationFailed(errors)) => assert_eq!(errors.len(), 3),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn sector_out_of_range_is_bad_request() {
        let req: AddCellRequest = serde_json::from_value(json!({
            "site": 0, "sector_id": 3, "band": "H", "fc_hz": 2.5e9
        }))
        .unwrap();
        let err = req.into_spec().unwrap_err();
        assert_eq!(err.status(), axum::http::StatusCode::BAD_REQUEST);
    }

    #[test]
    fn update_request_needs_exactly_one_identifier() {
        let both: CellUpdateRequest = serde_json::from_value(json!({
            "cell_id": 0, "cell_name": "H11", "tilt_deg": 3.0
        }))
        .unwrap();
        assert!(both.cell_ref().is_err());

        let by_name: CellUpdateRequest =
            serde_json::from_value(json!({ "cell_name": "H11", "tilt_deg": 3.0 })).unwrap();
        assert_eq!(by_name.cell_ref().unwrap(), CellRef::Name("H11".into()));
        assert!(by_name.rename);
        assert_eq!(by_name.fields.to_update().unwrap().field_names(), vec!["tilt_deg"]);
    }

    #[test]
    fn query_update_splits_filters_and_fields() {
        let req: QueryUpdateRequest = serde_json::from_value(json!({
            "site_name": "SITE000*",
            "band": "H",
            "update": { "tilt_deg": 11.0, "tx_rs_power_dbm": 5.0 }
        }))
        .unwrap();
        assert_eq!(req.query.site_name.as_deref(), Some("SITE000*"));
        assert_eq!(req.query.band.as_deref(), Some("H"));
        assert!(req.query.has_filters());
        assert_eq!(req.update.tilt_deg, Some(11.0));
    }

    #[test]
    fn batch_status_labels() {
        assert_eq!(batch_status(3, 0), "success");
        assert_eq!(batch_status(0, 2), "failed");
        assert_eq!(batch_status(1, 1), "partial");
    }
}
