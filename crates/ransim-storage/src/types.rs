//! Storage-layer types for runs and their reports.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use ransim_compute::{LabelMode, MeasurementReport};

/// Default page size for run listings.
pub const DEFAULT_RUN_LIMIT: usize = 50;

/// Everything needed to write one run.
#[derive(Debug, Clone)]
pub struct NewRun {
    pub run_id: String,
    pub created_at: DateTime<Utc>,
    pub threshold_dbm: f64,
    pub label_mode: LabelMode,
    pub metadata: serde_json::Value,
    pub reports: Vec<MeasurementReport>,
}

/// Stored run header; `metadata` is an opaque JSON document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunHeader {
    pub run_id: String,
    pub created_at: DateTime<Utc>,
    pub threshold_dbm: f64,
    pub label_mode: LabelMode,
    pub num_reports: usize,
    pub metadata: serde_json::Value,
}

impl RunHeader {
    pub fn of(run: &NewRun) -> Self {
        RunHeader {
            run_id: run.run_id.clone(),
            created_at: run.created_at,
            threshold_dbm: run.threshold_dbm,
            label_mode: run.label_mode,
            num_reports: run.reports.len(),
            metadata: run.metadata.clone(),
        }
    }
}

/// One persisted per-UE report. `key` is `run_id:user_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredReport {
    pub key: String,
    pub run_id: String,
    pub user_id: String,
    pub ue_index: usize,
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub readings: IndexMap<String, f64>,
}

impl StoredReport {
    pub fn from_report(run_id: &str, report: &MeasurementReport) -> Self {
        StoredReport {
            key: format!("{}:{}", run_id, report.user_id),
            run_id: run_id.to_string(),
            user_id: report.user_id.clone(),
            ue_index: report.ue_index,
            x: report.x,
            y: report.y,
            readings: report.readings.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunSortField {
    #[default]
    CreatedAt,
    RunId,
    NumReports,
}

/// Paging and ordering for [`crate::RunStore::list_runs`]. Newest first by
/// default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListRunsQuery {
    pub limit: usize,
    pub offset: usize,
    pub sort_by: RunSortField,
    pub desc: bool,
}

impl Default for ListRunsQuery {
    fn default() -> Self {
        ListRunsQuery {
            limit: DEFAULT_RUN_LIMIT,
            offset: 0,
            sort_by: RunSortField::CreatedAt,
            desc: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunPage {
    pub runs: Vec<RunHeader>,
    pub total: usize,
    pub offset: usize,
    pub limit: usize,
}

/// Report paging with an inclusive UE index range.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportFilter {
    pub limit: Option<usize>,
    pub offset: usize,
    pub user_min: Option<usize>,
    pub user_max: Option<usize>,
}

impl ReportFilter {
    pub fn admits(&self, ue_index: usize) -> bool {
        self.user_min.map_or(true, |lo| ue_index >= lo)
            && self.user_max.map_or(true, |hi| ue_index <= hi)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportPage {
    pub run_id: String,
    pub reports: Vec<StoredReport>,
    pub total: usize,
    pub offset: usize,
    pub limit: Option<usize>,
}

#[cfg(test)]
pub(crate) fn sample_run(run_id: &str, num_ues: usize, minute: u32) -> NewRun {
    use chrono::TimeZone;

    let reports = (0..num_ues)
        .map(|u| MeasurementReport {
            user_id: ransim_compute::report::user_id(u),
            ue_index: u,
            x: Some(u as f64),
            y: Some(-(u as f64)),
            readings: IndexMap::from([("b11".to_string(), -70.0 - u as f64)]),
        })
        .collect();
    NewRun {
        run_id: run_id.to_string(),
        created_at: Utc.with_ymd_and_hms(2026, 3, 1, 12, minute, 0).unwrap(),
        threshold_dbm: -120.0,
        label_mode: LabelMode::Compact,
        metadata: serde_json::json!({ "timestep": 1 }),
        reports,
    }
}
