//! Deterministic reference propagation model.
//!
//! Free-space path loss, a 3GPP TR 38.901 style element pattern, and the
//! array factor of an unsteered uniform planar array. UEs are isotropic and
//! their orientation, velocity, and state are ignored. Good enough to drive
//! the pipeline end to end and to make tilt, azimuth, and array size matter.

use std::f64::consts::PI;

use ransim_core::AntennaArray;

use crate::error::ComputeError;
use crate::evaluator::{EvaluatorFactory, GainMatrix, PropagationEvaluator};
use crate::geometry::{BsGeometry, Orientation, UeChunk};

const SPEED_OF_LIGHT: f64 = 299_792_458.0;
/// Links shorter than this are clamped to avoid the near-field singularity.
const MIN_DISTANCE_M: f64 = 1.0;

/// Element radiation pattern.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ElementPattern {
    Isotropic,
    /// Short dipole aligned with the local z axis.
    Dipole,
    /// TR 38.901 sector element: 65 degree beamwidth, 30 dB floor, 8 dBi peak.
    Tr38901,
}

impl ElementPattern {
    pub fn from_id(id: &str) -> Result<Self, ComputeError> {
        match id {
            "iso" | "isotropic" | "omni" => Ok(ElementPattern::Isotropic),
            "dipole" => Ok(ElementPattern::Dipole),
            "38.901" | "tr38901" => Ok(ElementPattern::Tr38901),
            other => Err(ComputeError::UnsupportedPattern {
                pattern: other.to_string(),
            }),
        }
    }

    /// Linear power gain at local zenith `theta` and azimuth `phi` (radians).
    pub fn gain(self, theta: f64, phi: f64) -> f64 {
        match self {
            ElementPattern::Isotropic => 1.0,
            ElementPattern::Dipole => 1.5 * theta.sin().powi(2),
            ElementPattern::Tr38901 => {
                let theta_deg = theta.to_degrees();
                let phi_deg = phi.to_degrees();
                let a_v = -(12.0 * ((theta_deg - 90.0) / 65.0).powi(2)).min(30.0);
                let a_h = -(12.0 * (phi_deg / 65.0).powi(2)).min(30.0);
                let a_db = -(-(a_v + a_h)).min(30.0);
                10f64.powf((8.0 + a_db) / 10.0)
            }
        }
    }
}

/// Normalized array-factor power of `n` elements with phase step `psi`.
/// Equals `n` at broadside.
fn array_factor(n: u32, psi: f64) -> f64 {
    if n <= 1 {
        return 1.0;
    }
    let half = psi / 2.0;
    let denom = half.sin();
    if denom.abs() < 1e-12 {
        return n as f64;
    }
    let num = (n as f64 * half).sin();
    num * num / (n as f64 * denom * denom)
}

/// Rotates a world-frame direction into the antenna frame (boresight = +x).
fn to_local(v: [f64; 3], o: &Orientation) -> [f64; 3] {
    let (sy, cy) = o.yaw.sin_cos();
    let (sp, cp) = o.pitch.sin_cos();
    let (sr, cr) = o.roll.sin_cos();
    // inverse yaw
    let a = [cy * v[0] + sy * v[1], -sy * v[0] + cy * v[1], v[2]];
    // inverse elevation
    let b = [cp * a[0] + sp * a[2], a[1], -sp * a[0] + cp * a[2]];
    // inverse roll
    [b[0], cr * b[1] + sr * b[2], -sr * b[1] + cr * b[2]]
}

/// Evaluator for one carrier and array.
#[derive(Debug, Clone)]
pub struct ReferenceEvaluator {
    wavelength_m: f64,
    pattern: ElementPattern,
    rows: u32,
    cols: u32,
    vertical_spacing: f64,
    horizontal_spacing: f64,
}

impl ReferenceEvaluator {
    pub fn new(frequency_hz: f64, array: &AntennaArray) -> Result<Self, ComputeError> {
        if !(frequency_hz.is_finite() && frequency_hz > 0.0) {
            return Err(ComputeError::Evaluator {
                reason: format!("invalid carrier frequency {}", frequency_hz),
            });
        }
        Ok(ReferenceEvaluator {
            wavelength_m: SPEED_OF_LIGHT / frequency_hz,
            pattern: ElementPattern::from_id(&array.pattern)?,
            rows: array.rows,
            cols: array.cols,
            vertical_spacing: array.vertical_spacing,
            horizontal_spacing: array.horizontal_spacing,
        })
    }

    fn link_gain(&self, bs: [f64; 3], o: &Orientation, ue: [f64; 3]) -> f64 {
        let delta = [ue[0] - bs[0], ue[1] - bs[1], ue[2] - bs[2]];
        let raw = (delta[0].powi(2) + delta[1].powi(2) + delta[2].powi(2)).sqrt();
        let distance = raw.max(MIN_DISTANCE_M);
        let path_gain = (self.wavelength_m / (4.0 * PI * distance)).powi(2);
        if raw == 0.0 {
            return path_gain;
        }

        let dir = [delta[0] / raw, delta[1] / raw, delta[2] / raw];
        let local = to_local(dir, o);
        let theta = local[2].clamp(-1.0, 1.0).acos();
        let phi = local[1].atan2(local[0]);

        let element = self.pattern.gain(theta, phi);
        let af_v = array_factor(self.rows, 2.0 * PI * self.vertical_spacing * theta.cos());
        let af_h = array_factor(
            self.cols,
            2.0 * PI * self.horizontal_spacing * theta.sin() * phi.sin(),
        );
        path_gain * element * af_v * af_h
    }
}

impl PropagationEvaluator for ReferenceEvaluator {
    fn evaluate(&mut self, bs: &BsGeometry, ues: &UeChunk<'_>) -> Result<GainMatrix, ComputeError> {
        let mut data = Vec::with_capacity(ues.len() * bs.len());
        for ue in ues.positions {
            for (pos, orientation) in bs.positions.iter().zip(&bs.orientations) {
                data.push(self.link_gain(*pos, orientation, *ue));
            }
        }
        GainMatrix::new(ues.len(), bs.len(), data)
    }
}

/// Factory for [`ReferenceEvaluator`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReferenceFactory;

impl EvaluatorFactory for ReferenceFactory {
    fn build(
        &self,
        frequency_hz: f64,
        array: &AntennaArray,
    ) -> Result<Box<dyn PropagationEvaluator>, ComputeError> {
        Ok(Box::new(ReferenceEvaluator::new(frequency_hz, array)?))
    }
}
