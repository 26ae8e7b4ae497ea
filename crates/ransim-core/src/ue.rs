//! Seeded UE drops.
//!
//! A drop replaces the whole UE population at once. Positions are drawn from
//! a ChaCha8 stream seeded by the request, so the same request against the
//! same sites always yields the same UEs.

use std::f64::consts::PI;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::error::{ensure_finite, CoreError};
use crate::site::Site;

/// Spatial layout of a drop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DropLayout {
    /// Uniform over a disk around `center`.
    Disk,
    /// Uniform over the site bounding box, padded by `box_pad_m`.
    #[default]
    Box,
}

/// Parameters of a UE drop, as requested.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DropRequest {
    pub num_ue: usize,
    #[serde(default)]
    pub layout: DropLayout,
    /// Disk center. Defaults to the mean site position, or the origin.
    #[serde(default)]
    pub center: Option<[f64; 2]>,
    #[serde(default = "default_radius")]
    pub radius_m: f64,
    #[serde(default = "default_box_pad")]
    pub box_pad_m: f64,
    #[serde(default = "default_ue_height")]
    pub height_m: f64,
    #[serde(default = "default_seed")]
    pub seed: u64,
}

fn default_radius() -> f64 {
    500.0
}

fn default_box_pad() -> f64 {
    500.0
}

fn default_ue_height() -> f64 {
    1.5
}

fn default_seed() -> u64 {
    7
}

impl DropRequest {
    pub fn new(num_ue: usize) -> Self {
        DropRequest {
            num_ue,
            layout: DropLayout::default(),
            center: None,
            radius_m: default_radius(),
            box_pad_m: default_box_pad(),
            height_m: default_ue_height(),
            seed: default_seed(),
        }
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        if self.num_ue == 0 {
            return Err(CoreError::invalid("num_ue", "must be at least 1"));
        }
        if self.layout == DropLayout::Disk && ensure_finite("radius_m", self.radius_m)? <= 0.0 {
            return Err(CoreError::invalid("radius_m", "must be positive"));
        }
        if ensure_finite("box_pad_m", self.box_pad_m)? < 0.0 {
            return Err(CoreError::invalid("box_pad_m", "must not be negative"));
        }
        ensure_finite("height_m", self.height_m)?;
        if let Some([cx, cy]) = self.center {
            ensure_finite("center", cx)?;
            ensure_finite("center", cy)?;
        }
        Ok(())
    }
}

/// Axis-aligned bounds of a box drop.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoxBounds {
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
}

/// What was actually used to generate a drop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DropParams {
    pub num_ue: usize,
    pub layout: DropLayout,
    pub center: [f64; 2],
    #[serde(skip_serializing_if = "Option::is_none")]
    pub radius_m: Option<f64>,
    pub box_pad_m: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub box_bounds: Option<BoxBounds>,
    pub height_m: f64,
    pub seed: u64,
}

/// A full UE population. All arrays have length `params.num_ue`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UeDrop {
    pub positions: Vec<[f64; 3]>,
    /// Yaw, pitch, roll in radians.
    pub orientations: Vec<[f64; 3]>,
    pub velocities: Vec<[f64; 3]>,
    pub in_state: Vec<bool>,
    pub params: DropParams,
}

impl UeDrop {
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Ground-plane `(x, y)` of every UE.
    pub fn xy(&self) -> Vec<[f64; 2]> {
        self.positions.iter().map(|p| [p[0], p[1]]).collect()
    }
}

fn site_centroid(sites: &[Site]) -> [f64; 2] {
    if sites.is_empty() {
        return [0.0, 0.0];
    }
    let n = sites.len() as f64;
    [
        sites.iter().map(|s| s.x).sum::<f64>() / n,
        sites.iter().map(|s| s.y).sum::<f64>() / n,
    ]
}

fn span(values: impl Iterator<Item = f64>) -> (f64, f64) {
    values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    })
}

fn site_bounds(sites: &[Site], pad: f64) -> BoxBounds {
    if sites.is_empty() {
        return BoxBounds {
            x_min: -pad,
            x_max: pad,
            y_min: -pad,
            y_max: pad,
        };
    }
    let (x_lo, x_hi) = span(sites.iter().map(|s| s.x));
    let (y_lo, y_hi) = span(sites.iter().map(|s| s.y));
    BoxBounds {
        x_min: x_lo - pad,
        x_max: x_hi + pad,
        y_min: y_lo - pad,
        y_max: y_hi + pad,
    }
}

/// Generates a UE drop over `sites`.
///
/// UEs face `(pi, 0, 0)`, are stationary, and start outside any state.
pub fn drop_ues(request: &DropRequest, sites: &[Site]) -> Result<UeDrop, CoreError> {
    request.validate()?;
    let mut rng = ChaCha8Rng::seed_from_u64(request.seed);
    let n = request.num_ue;
    let center = request.center.unwrap_or_else(|| site_centroid(sites));

    let (xy, radius_m, box_bounds): (Vec<[f64; 2]>, _, _) = match request.layout {
        DropLayout::Disk => {
            // radii first, then angles
            let radii: Vec<f64> = (0..n)
                .map(|_| request.radius_m * rng.gen::<f64>().sqrt())
                .collect();
            let xy = radii
                .into_iter()
                .map(|r| {
                    let phi = 2.0 * PI * rng.gen::<f64>();
                    [center[0] + r * phi.cos(), center[1] + r * phi.sin()]
                })
                .collect();
            (xy, Some(request.radius_m), None)
        }
        DropLayout::Box => {
            let bounds = site_bounds(sites, request.box_pad_m);
            let xs: Vec<f64> = (0..n)
                .map(|_| bounds.x_min + (bounds.x_max - bounds.x_min) * rng.gen::<f64>())
                .collect();
            let xy = xs
                .into_iter()
                .map(|x| [x, bounds.y_min + (bounds.y_max - bounds.y_min) * rng.gen::<f64>()])
                .collect();
            (xy, None, Some(bounds))
        }
    };

    Ok(UeDrop {
        positions: xy.iter().map(|p| [p[0], p[1], request.height_m]).collect(),
        orientations: vec![[PI, 0.0, 0.0]; n],
        velocities: vec![[0.0; 3]; n],
        in_state: vec![false; n],
        params: DropParams {
            num_ue: n,
            layout: request.layout,
            center,
            radius_m,
            box_pad_m: request.box_pad_m,
            box_bounds,
            height_m: request.height_m,
            seed: request.seed,
        },
    })
}
