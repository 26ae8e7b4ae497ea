//! Cell record, creation spec, and partial update.
//!
//! A [`Cell`] is a carrier on one sector of one site. The record is fully
//! typed: optional fields are explicit `Option`s with documented meaning, and
//! every constructor path runs the same validation.

use serde::{Deserialize, Serialize};

use crate::antenna::{AntennaArray, ArrayOverrides};
use crate::error::{ensure_finite, CoreError};
use crate::id::{SectorId, SiteIdx, SiteRef};
use crate::site::{validate_height, Site};

/// Default transmit reference-signal power in dBm.
pub const DEFAULT_TX_POWER_DBM: f64 = 0.0;

/// A cell: one carrier on one sector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    pub name: String,
    pub site: SiteIdx,
    pub sector: SectorId,
    /// Free-form band tag used for naming and reporting.
    pub band: String,
    pub frequency_hz: f64,
    pub tx_power_dbm: f64,
    /// Absent means 0 degrees at compute time.
    pub downtilt_deg: Option<f64>,
    pub roll_deg: f64,
    /// Absent means the site height.
    pub height_m: Option<f64>,
    pub array: AntennaArray,
}

impl Cell {
    pub fn effective_downtilt(&self) -> f64 {
        self.downtilt_deg.unwrap_or(0.0)
    }

    pub fn effective_height(&self, site: &Site) -> f64 {
        self.height_m.unwrap_or(site.height_m)
    }

    /// Carrier frequency in whole MHz, as used in labels and band lists.
    pub fn frequency_mhz(&self) -> i64 {
        (self.frequency_hz / 1e6).round() as i64
    }
}

/// Input for adding a cell. Unset fields take documented defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CellSpec {
    pub site: SiteRef,
    pub sector: SectorId,
    pub band: String,
    pub frequency_hz: Option<f64>,
    #[serde(default)]
    pub tx_power_dbm: Option<f64>,
    #[serde(default)]
    pub downtilt_deg: Option<f64>,
    #[serde(default)]
    pub roll_deg: Option<f64>,
    #[serde(default)]
    pub height_m: Option<f64>,
    #[serde(default)]
    pub array: ArrayOverrides,
    /// Explicit name; derived from the naming pattern when absent.
    #[serde(default)]
    pub name: Option<String>,
    /// Applied to the sector only when it has no cells yet.
    #[serde(default)]
    pub sector_azimuth_deg: Option<f64>,
}

impl CellSpec {
    pub fn new(site: impl Into<SiteRef>, sector: SectorId, band: &str, frequency_hz: f64) -> Self {
        CellSpec {
            site: site.into(),
            sector,
            band: band.to_string(),
            frequency_hz: Some(frequency_hz),
            tx_power_dbm: None,
            downtilt_deg: None,
            roll_deg: None,
            height_m: None,
            array: ArrayOverrides::default(),
            name: None,
            sector_azimuth_deg: None,
        }
    }

    pub fn with_downtilt(mut self, deg: f64) -> Self {
        self.downtilt_deg = Some(deg);
        self
    }

    pub fn with_tx_power(mut self, dbm: f64) -> Self {
        self.tx_power_dbm = Some(dbm);
        self
    }

    pub fn with_array(mut self, array: ArrayOverrides) -> Self {
        self.array = array;
        self
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    /// Builds the cell record (without its name) against `defaults`.
    pub(crate) fn build(
        &self,
        site: SiteIdx,
        defaults: &AntennaArray,
    ) -> Result<Cell, CoreError> {
        if self.band.trim().is_empty() {
            return Err(CoreError::MissingField { field: "band" });
        }
        let frequency_hz = self
            .frequency_hz
            .ok_or(CoreError::MissingField { field: "fc_hz" })?;
        validate_frequency(frequency_hz)?;
        let cell = Cell {
            name: String::new(),
            site,
            sector: self.sector,
            band: self.band.clone(),
            frequency_hz,
            tx_power_dbm: ensure_finite(
                "tx_rs_power_dbm",
                self.tx_power_dbm.unwrap_or(DEFAULT_TX_POWER_DBM),
            )?,
            downtilt_deg: self.downtilt_deg.map(validate_tilt).transpose()?,
            roll_deg: ensure_finite("roll_deg", self.roll_deg.unwrap_or(0.0))?,
            height_m: self.height_m.map(validate_height).transpose()?,
            array: self.array.apply(defaults)?,
        };
        Ok(cell)
    }
}

/// Partial update of a cell. `None` fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CellUpdate {
    #[serde(default)]
    pub site: Option<SiteRef>,
    #[serde(default)]
    pub sector: Option<SectorId>,
    #[serde(default)]
    pub band: Option<String>,
    #[serde(default)]
    pub frequency_hz: Option<f64>,
    #[serde(default)]
    pub tx_power_dbm: Option<f64>,
    #[serde(default)]
    pub downtilt_deg: Option<f64>,
    #[serde(default)]
    pub roll_deg: Option<f64>,
    #[serde(default)]
    pub height_m: Option<f64>,
    #[serde(default)]
    pub array: ArrayOverrides,
}

impl CellUpdate {
    pub fn downtilt(deg: f64) -> Self {
        CellUpdate {
            downtilt_deg: Some(deg),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.site.is_none()
            && self.sector.is_none()
            && self.band.is_none()
            && self.frequency_hz.is_none()
            && self.tx_power_dbm.is_none()
            && self.downtilt_deg.is_none()
            && self.roll_deg.is_none()
            && self.height_m.is_none()
            && self.array.is_empty()
    }

    /// Names of the fields this update touches, in a stable order.
    pub fn field_names(&self) -> Vec<&'static str> {
        let mut names = Vec::new();
        let checks: [(&'static str, bool); 15] = [
            ("site", self.site.is_some()),
            ("sector_id", self.sector.is_some()),
            ("band", self.band.is_some()),
            ("fc_hz", self.frequency_hz.is_some()),
            ("tx_rs_power_dbm", self.tx_power_dbm.is_some()),
            ("tilt_deg", self.downtilt_deg.is_some()),
            ("roll_deg", self.roll_deg.is_some()),
            ("height_m", self.height_m.is_some()),
            ("bs_rows", self.array.rows.is_some()),
            ("bs_cols", self.array.cols.is_some()),
            ("bs_pol", self.array.polarization.is_some()),
            ("bs_pol_type", self.array.polarization_type.is_some()),
            ("bs_vertical_spacing", self.array.vertical_spacing.is_some()),
            ("bs_horizontal_spacing", self.array.horizontal_spacing.is_some()),
            ("antenna_pattern", self.array.pattern.is_some()),
        ];
        for (name, present) in checks {
            if present {
                names.push(name);
            }
        }
        names
    }

    /// Request-shape checks that do not need the topology.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.is_empty() {
            return Err(CoreError::EmptyUpdate);
        }
        if self.array.rows.is_some() != self.array.cols.is_some() {
            return Err(CoreError::invalid(
                "bs_rows",
                "bs_rows and bs_cols must be updated together",
            ));
        }
        if matches!(&self.band, Some(b) if b.trim().is_empty()) {
            return Err(CoreError::MissingField { field: "band" });
        }
        Ok(())
    }

    /// Applies the non-positional fields to `cell`, validating each.
    pub(crate) fn apply_rf(&self, cell: &mut Cell) -> Result<(), CoreError> {
        if let Some(frequency_hz) = self.frequency_hz {
            cell.frequency_hz = validate_frequency(frequency_hz)?;
        }
        if let Some(dbm) = self.tx_power_dbm {
            cell.tx_power_dbm = ensure_finite("tx_rs_power_dbm", dbm)?;
        }
        if let Some(deg) = self.downtilt_deg {
            cell.downtilt_deg = Some(validate_tilt(deg)?);
        }
        if let Some(deg) = self.roll_deg {
            cell.roll_deg = ensure_finite("roll_deg", deg)?;
        }
        if let Some(height) = self.height_m {
            cell.height_m = Some(validate_height(height)?);
        }
        if !self.array.is_empty() {
            cell.array = self.array.apply(&cell.array)?;
        }
        Ok(())
    }
}

fn validate_frequency(frequency_hz: f64) -> Result<f64, CoreError> {
    if ensure_finite("fc_hz", frequency_hz)? <= 0.0 {
        return Err(CoreError::invalid("fc_hz", "must be positive"));
    }
    Ok(frequency_hz)
}

fn validate_tilt(deg: f64) -> Result<f64, CoreError> {
    if !(-90.0..=90.0).contains(&ensure_finite("tilt_deg", deg)?) {
        return Err(CoreError::invalid("tilt_deg", "must be within [-90, 90]"));
    }
    Ok(deg)
}
