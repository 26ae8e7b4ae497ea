//! Cell filtering, sorting, and pagination.
//!
//! A [`CellQuery`] is a conjunction of optional filters over [`CellRow`]s.
//! Name filters accept `*` wildcards; numeric filters come as exact values
//! or inclusive ranges. A cell with no downtilt never matches a tilt filter.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::antenna::Polarization;
use crate::table::{cell_rows, CellRow};
use crate::topology::Topology;

const FC_GHZ_TOLERANCE: f64 = 1e-3;
const TILT_TOLERANCE: f64 = 1e-9;

/// Sort key for query results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    #[default]
    CellIdx,
    CellName,
    SiteName,
    Band,
    FcHz,
    TiltDeg,
    TxRsPowerDbm,
}

/// Filters plus paging. Every unset field matches everything.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CellQuery {
    pub cell_name: Option<String>,
    /// Matches the site name or uid.
    pub site_name: Option<String>,
    pub band: Option<String>,
    pub sector_id: Option<u8>,
    pub site_idx: Option<usize>,
    pub bs_rows: Option<u32>,
    pub bs_cols: Option<u32>,
    pub bs_pol: Option<Polarization>,
    pub antenna_pattern: Option<String>,
    pub fc_ghz: Option<f64>,
    pub fc_ghz_min: Option<f64>,
    pub fc_ghz_max: Option<f64>,
    pub tilt_deg: Option<f64>,
    pub tilt_min: Option<f64>,
    pub tilt_max: Option<f64>,
    pub power_min: Option<f64>,
    pub power_max: Option<f64>,
    pub limit: Option<usize>,
    pub offset: usize,
    pub sort_by: SortField,
    pub sort_desc: bool,
}

/// One page of matching cells.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryPage {
    pub cells: Vec<CellRow>,
    pub num_results: usize,
    pub total_matches: usize,
    pub offset: usize,
    pub limit: Option<usize>,
}

/// `*` matches any run of characters; everything else is literal.
pub fn wildcard_match(pattern: &str, text: &str) -> bool {
    let p: Vec<char> = pattern.chars().collect();
    let t: Vec<char> = text.chars().collect();
    let (mut pi, mut ti) = (0, 0);
    let mut star: Option<(usize, usize)> = None;
    while ti < t.len() {
        if pi < p.len() && p[pi] == '*' {
            star = Some((pi, ti));
            pi += 1;
        } else if pi < p.len() && p[pi] == t[ti] {
            pi += 1;
            ti += 1;
        } else if let Some((sp, st)) = star {
            pi = sp + 1;
            ti = st + 1;
            star = Some((sp, st + 1));
        } else {
            return false;
        }
    }
    p[pi..].iter().all(|&c| c == '*')
}

fn within(value: f64, min: Option<f64>, max: Option<f64>) -> bool {
    min.map_or(true, |m| value >= m) && max.map_or(true, |m| value <= m)
}

impl CellQuery {
    /// Whether any filter (as opposed to paging/sort) is set.
    pub fn has_filters(&self) -> bool {
        let filters = CellQuery {
            limit: None,
            offset: 0,
            sort_by: SortField::default(),
            sort_desc: false,
            ..self.clone()
        };
        filters != CellQuery::default()
    }

    pub fn matches(&self, row: &CellRow) -> bool {
        if let Some(pattern) = &self.cell_name {
            if !wildcard_match(pattern, &row.cell_name) {
                return false;
            }
        }
        if let Some(pattern) = &self.site_name {
            if !wildcard_match(pattern, &row.site_name) && !wildcard_match(pattern, &row.site_uid) {
                return false;
            }
        }
        if matches!(&self.band, Some(band) if *band != row.band) {
            return false;
        }
        if matches!(self.sector_id, Some(s) if s as usize != row.sector_id.index()) {
            return false;
        }
        if matches!(self.site_idx, Some(s) if s != row.site_idx.0) {
            return false;
        }
        if matches!(self.bs_rows, Some(r) if r != row.bs_rows)
            || matches!(self.bs_cols, Some(c) if c != row.bs_cols)
            || matches!(self.bs_pol, Some(p) if p != row.bs_pol)
            || matches!(&self.antenna_pattern, Some(p) if *p != row.antenna_pattern)
        {
            return false;
        }
        if matches!(self.fc_ghz, Some(f) if (f - row.fc_ghz).abs() > FC_GHZ_TOLERANCE) {
            return false;
        }
        if !within(row.fc_ghz, self.fc_ghz_min, self.fc_ghz_max) {
            return false;
        }
        let tilt_filtered =
            self.tilt_deg.is_some() || self.tilt_min.is_some() || self.tilt_max.is_some();
        if tilt_filtered {
            let Some(tilt) = row.tilt_deg else {
                return false;
            };
            if matches!(self.tilt_deg, Some(t) if (t - tilt).abs() > TILT_TOLERANCE) {
                return false;
            }
            if !within(tilt, self.tilt_min, self.tilt_max) {
                return false;
            }
        }
        within(row.tx_rs_power_dbm, self.power_min, self.power_max)
    }

    fn compare(&self, a: &CellRow, b: &CellRow) -> Ordering {
        match self.sort_by {
            SortField::CellIdx => a.cell_idx.cmp(&b.cell_idx),
            SortField::CellName => a.cell_name.cmp(&b.cell_name),
            SortField::SiteName => a.site_name.cmp(&b.site_name),
            SortField::Band => a.band.cmp(&b.band),
            SortField::FcHz => a.fc_hz.total_cmp(&b.fc_hz),
            // untilted cells sort before any tilt
            SortField::TiltDeg => match (a.tilt_deg, b.tilt_deg) {
                (Some(x), Some(y)) => x.total_cmp(&y),
                (x, y) => x.is_some().cmp(&y.is_some()),
            },
            SortField::TxRsPowerDbm => a.tx_rs_power_dbm.total_cmp(&b.tx_rs_power_dbm),
        }
    }

    /// All matching rows in sort order, without paging.
    pub fn matching_rows(&self, topology: &Topology) -> Vec<CellRow> {
        let mut rows: Vec<CellRow> = cell_rows(topology)
            .into_iter()
            .filter(|row| self.matches(row))
            .collect();
        // stable sort keeps cell order among equal keys
        rows.sort_by(|a, b| {
            let ord = self.compare(a, b);
            if self.sort_desc {
                ord.reverse()
            } else {
                ord
            }
        });
        rows
    }

    pub fn run(&self, topology: &Topology) -> QueryPage {
        let rows = self.matching_rows(topology);
        let total_matches = rows.len();
        let cells: Vec<CellRow> = rows
            .into_iter()
            .skip(self.offset)
            .take(self.limit.unwrap_or(usize::MAX))
            .collect();
        QueryPage {
            num_results: cells.len(),
            cells,
            total_matches,
            offset: self.offset,
            limit: self.limit,
        }
    }
}
