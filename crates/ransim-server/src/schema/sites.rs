//! Site request/response types.

use serde::{Deserialize, Serialize};

use ransim_core::table::{SectorSummary, SiteRow};
use ransim_core::{SiteRef, SiteSpec};

use super::cells::{AddCellRequest, ArrayFields};
use super::FieldChecks;
use crate::error::ApiError;

fn default_site_height() -> f64 {
    20.0
}

/// A cell created together with its site. The site is implied.
#[derive(Debug, Clone, Deserialize)]
pub struct SiteCellRequest {
    pub sector_id: i64,
    pub band: String,
    pub fc_hz: Option<f64>,
    pub tilt_deg: Option<f64>,
    pub tx_rs_power_dbm: Option<f64>,
    pub roll_deg: Option<f64>,
    pub height_m: Option<f64>,
    #[serde(flatten)]
    pub array: ArrayFields,
    pub cell_name: Option<String>,
}

impl SiteCellRequest {
    pub fn at(self, site: SiteRef) -> AddCellRequest {
        AddCellRequest {
            site,
            sector_id: self.sector_id,
            band: self.band,
            fc_hz: self.fc_hz,
            tilt_deg: self.tilt_deg,
            tx_rs_power_dbm: self.tx_rs_power_dbm,
            roll_deg: self.roll_deg,
            height_m: self.height_m,
            array: self.array,
            cell_name: self.cell_name,
            sector_azimuth_deg: None,
        }
    }
}

/// `POST /sites`
///
/// Without `name` and `uid` the site is named `SITE####A` with the next free
/// number.
#[derive(Debug, Clone, Deserialize)]
pub struct AddSiteRequest {
    pub x: f64,
    pub y: f64,
    #[serde(default = "default_site_height")]
    pub height_m: f64,
    #[serde(default, alias = "az0_deg")]
    pub azimuth_deg: f64,
    pub name: Option<String>,
    pub uid: Option<String>,
    #[serde(default)]
    pub cells: Vec<SiteCellRequest>,
}

impl AddSiteRequest {
    pub fn check(&self) -> Result<(), ApiError> {
        let mut checks = FieldChecks::new();
        checks.finite("x", Some(self.x));
        checks.finite("y", Some(self.y));
        checks.positive("height_m", Some(self.height_m));
        checks.finite("azimuth_deg", Some(self.azimuth_deg));
        checks.finish()
    }

    pub fn spec(&self, name: Option<String>, uid: Option<String>) -> SiteSpec {
        SiteSpec {
            x: self.x,
            y: self.y,
            height_m: self.height_m,
            azimuth_deg: self.azimuth_deg,
            name,
            uid,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AddedCellView {
    pub cell_idx: usize,
    pub cell_name: String,
    pub band: String,
    pub sector_id: u8,
}

#[derive(Debug, Clone, Serialize)]
pub struct AddSiteResponse {
    pub site_idx: usize,
    pub site_name: String,
    pub site_uid: String,
    /// Set when the name was generated.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub site_number: Option<u32>,
    pub sector_azimuths: [f64; 3],
    pub cells_added: Vec<AddedCellView>,
    pub num_cells_added: usize,
}

/// `POST /sites/{site}/rename`
#[derive(Debug, Clone, Deserialize)]
pub struct RenameSiteRequest {
    pub name: Option<String>,
    pub uid: Option<String>,
}

/// `POST /sites/{site}/sectors/{sector_id}/azimuth`
#[derive(Debug, Clone, Deserialize)]
pub struct SectorAzimuthRequest {
    pub azimuth_deg: f64,
}

/// `POST /sites/{site}/height`
#[derive(Debug, Clone, Deserialize)]
pub struct SiteHeightRequest {
    pub height_m: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SiteResponse {
    pub site: SiteRow,
}

#[derive(Debug, Clone, Serialize)]
pub struct SitesResponse {
    pub sites: Vec<SiteRow>,
    pub num_sites: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct SectorsResponse {
    pub sectors: Vec<SectorSummary>,
}
