//! Base-station antenna-array descriptor.
//!
//! An [`AntennaArray`] fully describes a panel for evaluation purposes: row
//! and column counts, polarization, element spacing in wavelengths, and the
//! element pattern id. Two cells with equal descriptors on the same carrier
//! share one propagation evaluator.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{ensure_finite, CoreError};

/// Polarization mode of the array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Polarization {
    Single,
    Dual,
}

/// Polarization sub-type. Single-polarized arrays are always `V`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PolarizationType {
    V,
    H,
    VH,
    #[serde(rename = "cross")]
    Cross,
}

impl fmt::Display for Polarization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Polarization::Single => write!(f, "single"),
            Polarization::Dual => write!(f, "dual"),
        }
    }
}

impl fmt::Display for PolarizationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PolarizationType::V => write!(f, "V"),
            PolarizationType::H => write!(f, "H"),
            PolarizationType::VH => write!(f, "VH"),
            PolarizationType::Cross => write!(f, "cross"),
        }
    }
}

/// Full antenna-array descriptor of a cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AntennaArray {
    pub rows: u32,
    pub cols: u32,
    pub polarization: Polarization,
    pub polarization_type: PolarizationType,
    /// Vertical element spacing in wavelengths.
    pub vertical_spacing: f64,
    /// Horizontal element spacing in wavelengths.
    pub horizontal_spacing: f64,
    /// Element pattern id, e.g. `"38.901"` or `"iso"`.
    pub pattern: String,
}

impl Default for AntennaArray {
    fn default() -> Self {
        AntennaArray {
            rows: 4,
            cols: 4,
            polarization: Polarization::Dual,
            polarization_type: PolarizationType::VH,
            vertical_spacing: 0.5,
            horizontal_spacing: 0.5,
            pattern: "38.901".to_string(),
        }
    }
}

impl AntennaArray {
    /// Checks counts, spacings, pattern id and the polarization pairing.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.rows == 0 {
            return Err(CoreError::invalid("bs_rows", "must be at least 1"));
        }
        if self.cols == 0 {
            return Err(CoreError::invalid("bs_cols", "must be at least 1"));
        }
        for (field, spacing) in [
            ("bs_vertical_spacing", self.vertical_spacing),
            ("bs_horizontal_spacing", self.horizontal_spacing),
        ] {
            if ensure_finite(field, spacing)? <= 0.0 {
                return Err(CoreError::invalid(field, "must be positive"));
            }
        }
        if self.pattern.trim().is_empty() {
            return Err(CoreError::MissingField {
                field: "antenna_pattern",
            });
        }
        match (self.polarization, self.polarization_type) {
            (Polarization::Single, PolarizationType::V) => Ok(()),
            (Polarization::Single, other) => Err(CoreError::invalid(
                "bs_pol_type",
                format!("single polarization requires 'V', got '{}'", other),
            )),
            (Polarization::Dual, PolarizationType::VH | PolarizationType::Cross) => Ok(()),
            (Polarization::Dual, other) => Err(CoreError::invalid(
                "bs_pol_type",
                format!("dual polarization requires 'VH' or 'cross', got '{}'", other),
            )),
        }
    }
}

/// Per-field overrides applied on top of a base descriptor.
///
/// Used both when creating a cell (base = topology defaults) and when
/// updating one (base = the cell's current array).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArrayOverrides {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rows: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cols: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub polarization: Option<Polarization>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub polarization_type: Option<PolarizationType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vertical_spacing: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub horizontal_spacing: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
}

impl ArrayOverrides {
    pub fn is_empty(&self) -> bool {
        self.rows.is_none()
            && self.cols.is_none()
            && self.polarization.is_none()
            && self.polarization_type.is_none()
            && self.vertical_spacing.is_none()
            && self.horizontal_spacing.is_none()
            && self.pattern.is_none()
    }

    /// Returns `base` with every present override applied, validated.
    ///
    /// Switching to single polarization without naming a sub-type falls
    /// back to `V`, the only sub-type a single-polarized array can have.
    pub fn apply(&self, base: &AntennaArray) -> Result<AntennaArray, CoreError> {
        let mut array = base.clone();
        if let Some(rows) = self.rows {
            array.rows = rows;
        }
        if let Some(cols) = self.cols {
            array.cols = cols;
        }
        if let Some(polarization) = self.polarization {
            array.polarization = polarization;
            if polarization == Polarization::Single && self.polarization_type.is_none() {
                array.polarization_type = PolarizationType::V;
            }
        }
        if let Some(polarization_type) = self.polarization_type {
            array.polarization_type = polarization_type;
        }
        if let Some(spacing) = self.vertical_spacing {
            array.vertical_spacing = spacing;
        }
        if let Some(spacing) = self.horizontal_spacing {
            array.horizontal_spacing = spacing;
        }
        if let Some(pattern) = &self.pattern {
            array.pattern = pattern.clone();
        }
        array.validate()?;
        Ok(array)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_array_is_valid_dual_4x4() {
        let array = AntennaArray::default();
        array.validate().unwrap();
        assert_eq!((array.rows, array.cols, array.polarization), (4, 4, Polarization::Dual));
    }

    #[test]
    fn single_polarization_requires_v() {
        let array = AntennaArray {
            polarization: Polarization::Single,
            polarization_type: PolarizationType::VH,
            ..AntennaArray::default()
        };
        let err = array.validate().unwrap_err();
        assert_eq!(err.field(), Some("bs_pol_type"));
    }

    #[test]
    fn overrides_switching_to_single_default_to_v() {
        let overrides = ArrayOverrides {
            polarization: Some(Polarization::Single),
            ..Default::default()
        };
        let array = overrides.apply(&AntennaArray::default()).unwrap();
        assert_eq!(array.polarization_type, PolarizationType::V);
        assert_eq!(array.polarization, Polarization::Single);
    }

    #[test]
    fn overrides_reject_zero_rows() {
        let overrides = ArrayOverrides {
            rows: Some(0),
            ..Default::default()
        };
        assert!(overrides.apply(&AntennaArray::default()).is_err());
    }

    #[test]
    fn polarization_wire_names() {
        assert_eq!(serde_json::to_string(&Polarization::Dual).unwrap(), "\"dual\"");
        assert_eq!(serde_json::to_string(&PolarizationType::Cross).unwrap(), "\"cross\"");
        let vh: PolarizationType = serde_json::from_str("\"VH\"").unwrap();
        assert_eq!(vh, PolarizationType::VH);
    }
}
