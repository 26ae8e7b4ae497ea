//! Dense RSRP matrix and its column metadata.

use serde::Serialize;

use ransim_core::{CellIdx, SectorId, SiteIdx};

/// Identity and RF parameters of the cell behind one matrix column, captured
/// at compute time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnMeta {
    pub cell_idx: CellIdx,
    pub name: String,
    pub band: String,
    pub fc_hz: f64,
    pub tx_rs_power_dbm: f64,
    pub site_idx: SiteIdx,
    pub sector_id: SectorId,
    pub azimuth_deg: f64,
    pub tilt_deg: f64,
    pub roll_deg: f64,
    pub height_m: f64,
}

/// `U x C` received power in dBm, row-major by UE.
#[derive(Debug, Clone, PartialEq)]
pub struct RsrpMatrix {
    num_ues: usize,
    num_cells: usize,
    data: Vec<f64>,
}

impl RsrpMatrix {
    /// All entries start at negative infinity until written.
    pub fn new(num_ues: usize, num_cells: usize) -> Self {
        RsrpMatrix {
            num_ues,
            num_cells,
            data: vec![f64::NEG_INFINITY; num_ues * num_cells],
        }
    }

    pub fn num_ues(&self) -> usize {
        self.num_ues
    }

    pub fn num_cells(&self) -> usize {
        self.num_cells
    }

    pub fn get(&self, ue: usize, cell: usize) -> f64 {
        self.data[ue * self.num_cells + cell]
    }

    pub fn set(&mut self, ue: usize, cell: usize, dbm: f64) {
        self.data[ue * self.num_cells + cell] = dbm;
    }

    pub fn row(&self, ue: usize) -> &[f64] {
        &self.data[ue * self.num_cells..(ue + 1) * self.num_cells]
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }
}

/// Output of one compute: the matrix plus one [`ColumnMeta`] per column.
#[derive(Debug, Clone, PartialEq)]
pub struct ComputeResult {
    pub matrix: RsrpMatrix,
    pub columns: Vec<ColumnMeta>,
}

impl ComputeResult {
    /// Column position of `cell`, if it was part of this compute.
    pub fn column_of(&self, cell: CellIdx) -> Option<usize> {
        self.columns.iter().position(|c| c.cell_idx == cell)
    }

    /// Index of the strongest column for each UE.
    pub fn best_columns(&self) -> Vec<Option<usize>> {
        (0..self.matrix.num_ues())
            .map(|u| {
                self.matrix
                    .row(u)
                    .iter()
                    .enumerate()
                    .filter(|(_, v)| v.is_finite())
                    .max_by(|a, b| a.1.total_cmp(b.1))
                    .map(|(c, _)| c)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_are_contiguous() {
        let mut m = RsrpMatrix::new(2, 3);
        m.set(1, 2, -80.0);
        m.set(1, 0, -90.0);
        assert_eq!(m.row(1), &[-90.0, f64::NEG_INFINITY, -80.0]);
        assert_eq!(m.get(0, 0), f64::NEG_INFINITY);
    }

    #[test]
    fn best_columns_pick_strongest() {
        let mut matrix = RsrpMatrix::new(2, 2);
        matrix.set(0, 0, -100.0);
        matrix.set(0, 1, -70.0);
        let result = ComputeResult {
            matrix,
            columns: Vec::new(),
        };
        assert_eq!(result.best_columns(), vec![Some(1), None]);
    }
}
