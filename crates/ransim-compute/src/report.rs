//! Sparse measurement reports.
//!
//! [`ReportCompressor`] turns each matrix row into a map of `label -> dBm`
//! holding only the cells at or above the threshold. Labels are either the
//! stored cell name or a compact `b{site}{sector}` tag (1-based). Compact
//! labels collide when a sector carries several bands, so every repeat of a
//! label gets a `_<MHz>MHz` suffix while the first keeps the bare label.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::matrix::{ColumnMeta, ComputeResult};

/// How report entries are labelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LabelMode {
    /// The cell's stored name.
    #[default]
    Name,
    /// `b{site_idx + 1}{sector_id + 1}`.
    #[serde(alias = "bxy")]
    Compact,
}

impl LabelMode {
    pub fn as_str(self) -> &'static str {
        match self {
            LabelMode::Name => "name",
            LabelMode::Compact => "compact",
        }
    }
}

/// Formats the report user id for UE row `index`.
pub fn user_id(index: usize) -> String {
    format!("user_{:06}", index)
}

/// One UE's thresholded readings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasurementReport {
    pub user_id: String,
    #[serde(skip)]
    pub ue_index: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    #[serde(flatten)]
    pub readings: IndexMap<String, f64>,
}

/// Unique labels for `columns`, in column order.
pub fn column_labels(columns: &[ColumnMeta], mode: LabelMode) -> Vec<String> {
    let mut labels: Vec<String> = Vec::with_capacity(columns.len());
    for column in columns {
        let base = match mode {
            LabelMode::Name => column.name.clone(),
            LabelMode::Compact => format!(
                "b{}{}",
                column.site_idx.0 + 1,
                column.sector_id.index() + 1
            ),
        };
        let mut label = base.clone();
        if labels.contains(&label) {
            label = format!("{}_{}MHz", base, (column.fc_hz / 1e6).round() as i64);
            // same site, sector and carrier twice: fall back to a counter
            let mut n = 2;
            while labels.contains(&label) {
                label = format!("{}_{}MHz_{}", base, (column.fc_hz / 1e6).round() as i64, n);
                n += 1;
            }
        }
        labels.push(label);
    }
    labels
}

/// Thresholds and labels matrix rows.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReportCompressor {
    pub threshold_dbm: f64,
    pub label_mode: LabelMode,
}

impl ReportCompressor {
    pub fn new(threshold_dbm: f64, label_mode: LabelMode) -> Self {
        ReportCompressor {
            threshold_dbm,
            label_mode,
        }
    }

    /// One report per UE row. `ue_xy`, when given, must have one entry per
    /// row and adds `x`/`y` to each report.
    pub fn compress(
        &self,
        result: &ComputeResult,
        ue_xy: Option<&[[f64; 2]]>,
    ) -> Vec<MeasurementReport> {
        let labels = column_labels(&result.columns, self.label_mode);
        (0..result.matrix.num_ues())
            .map(|u| {
                let readings = result
                    .matrix
                    .row(u)
                    .iter()
                    .zip(&labels)
                    .filter(|(dbm, _)| **dbm >= self.threshold_dbm)
                    .map(|(dbm, label)| (label.clone(), *dbm))
                    .collect();
                let xy = ue_xy.and_then(|xy| xy.get(u));
                MeasurementReport {
                    user_id: user_id(u),
                    ue_index: u,
                    x: xy.map(|p| p[0]),
                    y: xy.map(|p| p[1]),
                    readings,
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::RsrpMatrix;
    use ransim_core::{CellIdx, SectorId, SiteIdx};

    fn column(idx: usize, name: &str, site: usize, sector: i64, fc_hz: f64) -> ColumnMeta {
        ColumnMeta {
            cell_idx: CellIdx(idx),
            name: name.to_string(),
            band: String::new(),
            fc_hz,
            tx_rs_power_dbm: 0.0,
            site_idx: SiteIdx(site),
            sector_id: SectorId::new(sector).unwrap(),
            azimuth_deg: 0.0,
            tilt_deg: 0.0,
            roll_deg: 0.0,
            height_m: 20.0,
        }
    }

    fn result(values: &[&[f64]], columns: Vec<ColumnMeta>) -> ComputeResult {
        let mut matrix = RsrpMatrix::new(values.len(), columns.len());
        for (u, row) in values.iter().enumerate() {
            for (c, v) in row.iter().enumerate() {
                matrix.set(u, c, *v);
            }
        }
        ComputeResult { matrix, columns }
    }

    #[test]
    fn threshold_keeps_only_strong_cells() {
        let r = result(
            &[&[-80.0, -130.0]],
            vec![column(0, "H11", 0, 0, 2.5e9), column(1, "H12", 0, 1, 2.5e9)],
        );
        let reports = ReportCompressor::new(-120.0, LabelMode::Name).compress(&r, None);
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].readings.len(), 1);
        assert_eq!(reports[0].readings["H11"], -80.0);
    }

    #[test]
    fn threshold_is_inclusive() {
        let r = result(&[&[-120.0]], vec![column(0, "H11", 0, 0, 2.5e9)]);
        let reports = ReportCompressor::new(-120.0, LabelMode::Name).compress(&r, None);
        assert_eq!(reports[0].readings.len(), 1);
    }

    #[test]
    fn compact_labels_disambiguate_by_frequency() {
        let columns = vec![column(0, "H11", 0, 0, 2.5e9), column(1, "L11", 0, 0, 6e8)];
        let labels = column_labels(&columns, LabelMode::Compact);
        assert_eq!(labels, vec!["b11", "b11_600MHz"]);
    }

    #[test]
    fn repeated_carrier_gets_counter() {
        let columns = vec![
            column(0, "a", 1, 2, 6e8),
            column(1, "b", 1, 2, 6e8),
            column(2, "c", 1, 2, 6e8),
        ];
        let labels = column_labels(&columns, LabelMode::Compact);
        assert_eq!(labels, vec!["b23", "b23_600MHz", "b23_600MHz_2"]);
    }

    #[test]
    fn reports_serialize_flat_with_positions() {
        let r = result(
            &[&[-70.0], &[-150.0]],
            vec![column(0, "H11", 0, 0, 2.5e9)],
        );
        let xy = [[1.0, 2.0], [3.0, 4.0]];
        let reports = ReportCompressor::new(-120.0, LabelMode::Name).compress(&r, Some(&xy));
        let json = serde_json::to_value(&reports).unwrap();
        assert_eq!(
            json,
            serde_json::json!([
                { "user_id": "user_000000", "x": 1.0, "y": 2.0, "H11": -70.0 },
                { "user_id": "user_000001", "x": 3.0, "y": 4.0 }
            ])
        );
        assert_eq!(reports[1].ue_index, 1);
    }

    #[test]
    fn label_mode_accepts_bxy_alias() {
        let mode: LabelMode = serde_json::from_str("\"bxy\"").unwrap();
        assert_eq!(mode, LabelMode::Compact);
    }
}
