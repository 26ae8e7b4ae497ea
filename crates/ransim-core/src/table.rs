//! Flattened read views over the topology.
//!
//! These rows are what listing endpoints and run metadata serialize: each
//! cell row carries its site's identity, the sector azimuth, and the
//! effective height, so a consumer never has to join against the site list.

use serde::Serialize;

use crate::antenna::{Polarization, PolarizationType};
use crate::id::{CellIdx, SectorId, SiteIdx, SECTORS_PER_SITE};
use crate::naming::SectorLabel;
use crate::topology::{active_sectors, Topology};

/// One cell, joined with its site.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CellRow {
    pub cell_idx: CellIdx,
    pub cell_name: String,
    pub site_idx: SiteIdx,
    pub site_uid: String,
    pub site_name: String,
    pub sector_id: SectorId,
    pub sector_label: String,
    pub azimuth_deg: f64,
    pub band: String,
    pub fc_hz: f64,
    pub fc_mhz: i64,
    pub fc_ghz: f64,
    pub tx_rs_power_dbm: f64,
    pub tilt_deg: Option<f64>,
    pub roll_deg: f64,
    /// Effective height: the cell override, else the site height.
    pub height_m: f64,
    pub height_override: bool,
    pub x: f64,
    pub y: f64,
    pub bs_rows: u32,
    pub bs_cols: u32,
    pub bs_pol: Polarization,
    pub bs_pol_type: PolarizationType,
    pub bs_vertical_spacing: f64,
    pub bs_horizontal_spacing: f64,
    pub antenna_pattern: String,
}

/// One site with its cell count and active sectors.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SiteRow {
    pub site_idx: SiteIdx,
    pub uid: String,
    pub name: String,
    pub x: f64,
    pub y: f64,
    pub height_m: f64,
    pub sector_azimuths: [f64; SECTORS_PER_SITE],
    pub active_sectors: [bool; SECTORS_PER_SITE],
    pub num_cells: usize,
}

/// Per-sector rollup: bands present and tilt spread.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SectorSummary {
    pub site_idx: SiteIdx,
    pub site_name: String,
    pub sector_id: SectorId,
    pub azimuth_deg: f64,
    pub num_cells: usize,
    pub bands_mhz: Vec<i64>,
    pub tilt_min: Option<f64>,
    pub tilt_max: Option<f64>,
}

pub fn cell_row(topology: &Topology, idx: CellIdx) -> Option<CellRow> {
    let cell = topology.cell(idx)?;
    let site = topology.site(cell.site)?;
    Some(CellRow {
        cell_idx: idx,
        cell_name: cell.name.clone(),
        site_idx: cell.site,
        site_uid: site.uid.clone(),
        site_name: site.name.clone(),
        sector_id: cell.sector,
        sector_label: SectorLabel::OneBased.render(cell.sector),
        azimuth_deg: site.azimuth(cell.sector),
        band: cell.band.clone(),
        fc_hz: cell.frequency_hz,
        fc_mhz: cell.frequency_mhz(),
        fc_ghz: cell.frequency_hz / 1e9,
        tx_rs_power_dbm: cell.tx_power_dbm,
        tilt_deg: cell.downtilt_deg,
        roll_deg: cell.roll_deg,
        height_m: cell.effective_height(site),
        height_override: cell.height_m.is_some(),
        x: site.x,
        y: site.y,
        bs_rows: cell.array.rows,
        bs_cols: cell.array.cols,
        bs_pol: cell.array.polarization,
        bs_pol_type: cell.array.polarization_type,
        bs_vertical_spacing: cell.array.vertical_spacing,
        bs_horizontal_spacing: cell.array.horizontal_spacing,
        antenna_pattern: cell.array.pattern.clone(),
    })
}

pub fn cell_rows(topology: &Topology) -> Vec<CellRow> {
    (0..topology.cells().len())
        .filter_map(|i| cell_row(topology, CellIdx(i)))
        .collect()
}

pub fn site_rows(topology: &Topology) -> Vec<SiteRow> {
    topology
        .sites()
        .iter()
        .enumerate()
        .map(|(i, site)| SiteRow {
            site_idx: SiteIdx(i),
            uid: site.uid.clone(),
            name: site.name.clone(),
            x: site.x,
            y: site.y,
            height_m: site.height_m,
            sector_azimuths: site.sector_azimuths,
            active_sectors: active_sectors(topology.cells(), SiteIdx(i)),
            num_cells: topology.cells().iter().filter(|c| c.site.0 == i).count(),
        })
        .collect()
}

/// Summaries for active sectors only, in site then sector order.
pub fn sector_summaries(topology: &Topology) -> Vec<SectorSummary> {
    let mut out = Vec::new();
    for (i, site) in topology.sites().iter().enumerate() {
        for sector in SectorId::ALL {
            let cells: Vec<_> = topology
                .cells()
                .iter()
                .filter(|c| c.site.0 == i && c.sector == sector)
                .collect();
            if cells.is_empty() {
                continue;
            }
            let mut bands_mhz: Vec<i64> = cells.iter().map(|c| c.frequency_mhz()).collect();
            bands_mhz.sort_unstable();
            bands_mhz.dedup();
            let tilts = cells.iter().map(|c| c.effective_downtilt());
            out.push(SectorSummary {
                site_idx: SiteIdx(i),
                site_name: site.name.clone(),
                sector_id: sector,
                azimuth_deg: site.azimuth(sector),
                num_cells: cells.len(),
                bands_mhz,
                tilt_min: tilts.clone().reduce(f64::min),
                tilt_max: tilts.reduce(f64::max),
            });
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::CellSpec;
    use crate::site::SiteSpec;

    fn topology() -> Topology {
        let mut topo = Topology::new();
        topo.add_site(SiteSpec::at(10.0, 20.0).named("A")).unwrap();
        topo.add_site(SiteSpec::at(0.0, 0.0).named("B")).unwrap();
        topo.add_cell(CellSpec::new(SiteIdx(0), SectorId::ALL[0], "H", 2.5e9).with_downtilt(9.0))
            .unwrap();
        topo.add_cell(CellSpec::new(SiteIdx(0), SectorId::ALL[0], "L", 6e8).with_downtilt(3.0))
            .unwrap();
        topo.add_cell(CellSpec::new(SiteIdx(0), SectorId::ALL[2], "L", 6e8)).unwrap();
        topo
    }

    #[test]
    fn cell_rows_join_site_fields() {
        let rows = cell_rows(&topology());
        assert_eq!(rows.len(), 3);
        let row = &rows[0];
        assert_eq!(row.cell_name, "HA1");
        assert_eq!(row.site_name, "A");
        assert_eq!((row.x, row.y), (10.0, 20.0));
        assert_eq!(row.fc_mhz, 2500);
        assert_eq!(row.height_m, 20.0);
        assert!(!row.height_override);
        assert_eq!(rows[2].azimuth_deg, 240.0);
    }

    #[test]
    fn site_rows_count_cells() {
        let rows = site_rows(&topology());
        assert_eq!(rows[0].num_cells, 3);
        assert_eq!(rows[0].active_sectors, [true, false, true]);
        assert_eq!(rows[1].num_cells, 0);
    }

    #[test]
    fn sector_summaries_skip_inactive_sectors() {
        let summaries = sector_summaries(&topology());
        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].bands_mhz, vec![600, 2500]);
        assert_eq!(summaries[0].tilt_min, Some(3.0));
        assert_eq!(summaries[0].tilt_max, Some(9.0));
        assert_eq!(summaries[1].tilt_min, Some(0.0));
    }

    #[test]
    fn cell_table_naming_columns() {
        #[derive(Serialize)]
        struct NameColumns {
            cell_name: String,
            site_name: String,
            sector_label: String,
            band: String,
            fc_mhz: i64,
        }

        let view: Vec<NameColumns> = cell_rows(&topology())
            .into_iter()
            .map(|r| NameColumns {
                cell_name: r.cell_name,
                site_name: r.site_name,
                sector_label: r.sector_label,
                band: r.band,
                fc_mhz: r.fc_mhz,
            })
            .collect();
        insta::assert_json_snapshot!(view, @r###"
        [
          {
            "cell_name": "HA1",
            "site_name": "A",
            "sector_label": "1",
            "band": "H",
            "fc_mhz": 2500
          },
          {
            "cell_name": "LA1",
            "site_name": "A",
            "sector_label": "1",
            "band": "L",
            "fc_mhz": 600
          },
          {
            "cell_name": "LA3",
            "site_name": "A",
            "sector_label": "3",
            "band": "L",
            "fc_mhz": 600
          }
        ]
        "###);
    }
}
