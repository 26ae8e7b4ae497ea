//! Base-station and UE geometry handed to evaluators.

use std::ops::Range;

use ransim_core::{Cell, CellIdx, Topology, UeDrop};

use crate::error::ComputeError;

/// Antenna orientation in radians.
///
/// `pitch` is an elevation angle: negative values point the boresight below
/// the horizon, so a downtilt of `t` degrees becomes a pitch of `-t`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Orientation {
    pub yaw: f64,
    pub pitch: f64,
    pub roll: f64,
}

impl Orientation {
    pub fn from_cell(azimuth_deg: f64, downtilt_deg: f64, roll_deg: f64) -> Self {
        Orientation {
            yaw: azimuth_deg.to_radians(),
            pitch: -downtilt_deg.to_radians(),
            roll: roll_deg.to_radians(),
        }
    }
}

/// Positions and orientations of one cell-chunk, in chunk order.
#[derive(Debug, Clone, PartialEq)]
pub struct BsGeometry {
    pub positions: Vec<[f64; 3]>,
    pub orientations: Vec<Orientation>,
}

impl BsGeometry {
    /// Derives geometry for `cells` from their sites.
    ///
    /// Height is the cell override if set, else the site height; yaw comes
    /// from the sector azimuth.
    pub fn for_cells(
        topology: &Topology,
        cells: &[(CellIdx, &Cell)],
    ) -> Result<Self, ComputeError> {
        let mut positions = Vec::with_capacity(cells.len());
        let mut orientations = Vec::with_capacity(cells.len());
        for (_, cell) in cells {
            let site = topology
                .site(cell.site)
                .ok_or_else(|| ComputeError::DanglingSite {
                    cell: cell.name.clone(),
                    site: cell.site.0,
                })?;
            positions.push([site.x, site.y, cell.effective_height(site)]);
            orientations.push(Orientation::from_cell(
                site.azimuth(cell.sector),
                cell.effective_downtilt(),
                cell.roll_deg,
            ));
        }
        Ok(BsGeometry {
            positions,
            orientations,
        })
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

/// A contiguous slice of the UE drop.
#[derive(Debug, Clone, Copy)]
pub struct UeChunk<'a> {
    pub positions: &'a [[f64; 3]],
    pub orientations: &'a [[f64; 3]],
    pub velocities: &'a [[f64; 3]],
    pub in_state: &'a [bool],
}

impl<'a> UeChunk<'a> {
    pub fn slice(ues: &'a UeDrop, range: Range<usize>) -> Self {
        UeChunk {
            positions: &ues.positions[range.clone()],
            orientations: &ues.orientations[range.clone()],
            velocities: &ues.velocities[range.clone()],
            in_state: &ues.in_state[range],
        }
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ransim_core::{CellSpec, SectorId, SiteIdx, SiteSpec};

    #[test]
    fn downtilt_is_negative_pitch() {
        let o = Orientation::from_cell(90.0, 10.0, 0.0);
        assert!((o.yaw - std::f64::consts::FRAC_PI_2).abs() < 1e-12);
        assert!((o.pitch + 10f64.to_radians()).abs() < 1e-12);
    }

    #[test]
    fn geometry_uses_sector_azimuth_and_height_override() {
        let mut topo = Topology::new();
        let mut spec = SiteSpec::at(100.0, -50.0);
        spec.azimuth_deg = 30.0;
        topo.add_site(spec).unwrap();
        topo.add_cell(CellSpec::new(SiteIdx(0), SectorId::ALL[1], "H", 2.5e9)).unwrap();
        let mut tall = CellSpec::new(SiteIdx(0), SectorId::ALL[2], "H", 2.5e9);
        tall.height_m = Some(35.0);
        topo.add_cell(tall).unwrap();

        let cells: Vec<_> = topo
            .cells()
            .iter()
            .enumerate()
            .map(|(i, c)| (CellIdx(i), c))
            .collect();
        let bs = BsGeometry::for_cells(&topo, &cells).unwrap();
        assert_eq!(bs.positions, vec![[100.0, -50.0, 20.0], [100.0, -50.0, 35.0]]);
        assert!((bs.orientations[0].yaw - 150f64.to_radians()).abs() < 1e-12);
        assert_eq!(bs.orientations[0].pitch, 0.0);
    }
}
