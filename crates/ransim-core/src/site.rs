//! Site record and azimuth helpers.

use serde::{Deserialize, Serialize};

use crate::error::{ensure_finite, CoreError};
use crate::id::{SectorId, SECTORS_PER_SITE};

/// A physical site hosting up to three sectors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Site {
    pub uid: String,
    pub name: String,
    pub x: f64,
    pub y: f64,
    pub height_m: f64,
    /// Azimuth of each sector slot in degrees, each in `[0, 360)`.
    pub sector_azimuths: [f64; SECTORS_PER_SITE],
}

impl Site {
    pub fn azimuth(&self, sector: SectorId) -> f64 {
        self.sector_azimuths[sector.index()]
    }
}

/// Input for adding a site.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteSpec {
    pub x: f64,
    pub y: f64,
    pub height_m: f64,
    /// Azimuth of sector 0; sectors 1 and 2 follow at +120 and +240 degrees.
    pub azimuth_deg: f64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub uid: Option<String>,
}

impl SiteSpec {
    pub fn at(x: f64, y: f64) -> Self {
        SiteSpec {
            x,
            y,
            height_m: 20.0,
            azimuth_deg: 0.0,
            name: None,
            uid: None,
        }
    }

    pub fn named(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    pub(crate) fn validate(&self) -> Result<(), CoreError> {
        ensure_finite("x", self.x)?;
        ensure_finite("y", self.y)?;
        ensure_finite("azimuth_deg", self.azimuth_deg)?;
        validate_height(self.height_m)?;
        for (field, value) in [("name", &self.name), ("uid", &self.uid)] {
            if matches!(value, Some(v) if v.trim().is_empty()) {
                return Err(CoreError::invalid(field, "must not be empty"));
            }
        }
        Ok(())
    }
}

pub(crate) fn validate_height(height_m: f64) -> Result<f64, CoreError> {
    if ensure_finite("height_m", height_m)? < 0.0 {
        return Err(CoreError::invalid("height_m", "must not be negative"));
    }
    Ok(height_m)
}

/// Wraps an angle in degrees into `[0, 360)`.
pub fn normalize_azimuth(deg: f64) -> f64 {
    let wrapped = deg.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360.0 for tiny negative inputs
    if wrapped >= 360.0 {
        0.0
    } else {
        wrapped
    }
}

/// Tri-sector azimuths starting at `az0`, 120 degrees apart.
pub fn trisector_azimuths(az0: f64) -> [f64; SECTORS_PER_SITE] {
    [
        normalize_azimuth(az0),
        normalize_azimuth(az0 + 120.0),
        normalize_azimuth(az0 + 240.0),
    ]
}
