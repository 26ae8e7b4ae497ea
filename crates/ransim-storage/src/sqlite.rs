//! SQLite implementation of [`RunStore`].
//!
//! Headers live in `runs`, one row per UE report in `reports`. Metadata and
//! readings are JSON TEXT columns. Every write runs in a transaction.

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use ransim_compute::LabelMode;

use crate::error::StorageError;
use crate::traits::RunStore;
use crate::types::{
    ListRunsQuery, NewRun, ReportFilter, ReportPage, RunHeader, RunPage, RunSortField,
    StoredReport,
};

/// SQLite-backed implementation of [`RunStore`].
pub struct SqliteStore {
    conn: Connection,
}

/// Raw `runs` row before decoding.
type HeaderRow = (String, String, f64, String, i64, String);

const HEADER_COLUMNS: &str =
    "run_id, created_at, threshold_dbm, label_mode, num_reports, metadata_json";

impl SqliteStore {
    /// Opens (or creates) a SQLite database at `path`.
    pub fn new(path: &str) -> Result<Self, StorageError> {
        let conn = crate::schema::open_database(path)?;
        Ok(SqliteStore { conn })
    }

    /// Opens an in-memory SQLite database (for testing).
    pub fn in_memory() -> Result<Self, StorageError> {
        let conn = crate::schema::open_in_memory()?;
        Ok(SqliteStore { conn })
    }

    fn read_header(row: &rusqlite::Row<'_>) -> rusqlite::Result<HeaderRow> {
        Ok((
            row.get(0)?,
            row.get(1)?,
            row.get(2)?,
            row.get(3)?,
            row.get(4)?,
            row.get(5)?,
        ))
    }

    fn decode_header(raw: HeaderRow) -> Result<RunHeader, StorageError> {
        let (run_id, created_at, threshold_dbm, label_mode, num_reports, metadata_json) = raw;
        let created_at = DateTime::parse_from_rfc3339(&created_at)
            .map_err(|e| StorageError::IntegrityError {
                reason: format!("run {}: bad created_at '{}': {}", run_id, created_at, e),
            })?
            .with_timezone(&Utc);
        let label_mode: LabelMode =
            serde_json::from_value(serde_json::Value::String(label_mode))?;
        Ok(RunHeader {
            run_id,
            created_at,
            threshold_dbm,
            label_mode,
            num_reports: num_reports as usize,
            metadata: serde_json::from_str(&metadata_json)?,
        })
    }

    fn sort_column(field: RunSortField) -> &'static str {
        match field {
            RunSortField::CreatedAt => "created_at",
            RunSortField::RunId => "run_id",
            RunSortField::NumReports => "num_reports",
        }
    }

    fn assert_run_exists(&self, run_id: &str) -> Result<(), StorageError> {
        let exists: bool = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM runs WHERE run_id = ?1)",
            params![run_id],
            |row| row.get(0),
        )?;
        if !exists {
            return Err(StorageError::RunNotFound(run_id.to_string()));
        }
        Ok(())
    }
}

/// `None` binds as NULL; SQLite treats a negative LIMIT as unbounded.
fn opt_i64(v: Option<usize>) -> Option<i64> {
    v.map(|n| n as i64)
}

impl RunStore for SqliteStore {
    fn put_run(&mut self, run: &NewRun) -> Result<RunHeader, StorageError> {
        let header = RunHeader::of(run);
        let metadata_json = serde_json::to_string(&run.metadata)?;
        let tx = self.conn.transaction()?;

        tx.execute("DELETE FROM reports WHERE run_id = ?1", params![run.run_id])?;
        tx.execute(
            "INSERT INTO runs (run_id, created_at, threshold_dbm, label_mode, num_reports, metadata_json)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT (run_id) DO UPDATE SET
                created_at = excluded.created_at,
                threshold_dbm = excluded.threshold_dbm,
                label_mode = excluded.label_mode,
                num_reports = excluded.num_reports,
                metadata_json = excluded.metadata_json",
            params![
                run.run_id,
                run.created_at.to_rfc3339_opts(SecondsFormat::Millis, true),
                run.threshold_dbm,
                run.label_mode.as_str(),
                run.reports.len() as i64,
                metadata_json,
            ],
        )?;
        {
            let mut stmt = tx.prepare_cached(
                "INSERT INTO reports (run_id, ue_index, user_id, x, y, readings_json)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )?;
            for report in &run.reports {
                let readings_json = serde_json::to_string(&report.readings)?;
                stmt.execute(params![
                    run.run_id,
                    report.ue_index as i64,
                    report.user_id,
                    report.x,
                    report.y,
                    readings_json,
                ])?;
            }
        }
        tx.commit()?;
        Ok(header)
    }

    fn list_runs(&self, query: &ListRunsQuery) -> Result<RunPage, StorageError> {
        let total: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM runs", [], |row| row.get(0))?;
        let dir = if query.desc { "DESC" } else { "ASC" };
        let sql = format!(
            "SELECT {} FROM runs ORDER BY {} {}, run_id {} LIMIT ?1 OFFSET ?2",
            HEADER_COLUMNS,
            Self::sort_column(query.sort_by),
            dir,
            dir
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map(
                params![query.limit as i64, query.offset as i64],
                Self::read_header,
            )?
            .collect::<Result<Vec<_>, _>>()?;
        let runs = rows
            .into_iter()
            .map(Self::decode_header)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(RunPage {
            runs,
            total: total as usize,
            offset: query.offset,
            limit: query.limit,
        })
    }

    fn get_run(&self, run_id: &str) -> Result<RunHeader, StorageError> {
        let sql = format!("SELECT {} FROM runs WHERE run_id = ?1", HEADER_COLUMNS);
        let raw = self
            .conn
            .query_row(&sql, params![run_id], Self::read_header)
            .optional()?
            .ok_or_else(|| StorageError::RunNotFound(run_id.to_string()))?;
        Self::decode_header(raw)
    }

    fn get_reports(
        &self,
        run_id: &str,
        filter: &ReportFilter,
    ) -> Result<ReportPage, StorageError> {
        self.assert_run_exists(run_id)?;
        let range = "run_id = ?1 AND (?2 IS NULL OR ue_index >= ?2) AND (?3 IS NULL OR ue_index <= ?3)";
        let lo = opt_i64(filter.user_min);
        let hi = opt_i64(filter.user_max);

        let total: i64 = self.conn.query_row(
            &format!("SELECT COUNT(*) FROM reports WHERE {}", range),
            params![run_id, lo, hi],
            |row| row.get(0),
        )?;

        let mut stmt = self.conn.prepare(&format!(
            "SELECT ue_index, user_id, x, y, readings_json FROM reports
             WHERE {} ORDER BY ue_index LIMIT ?4 OFFSET ?5",
            range
        ))?;
        let rows = stmt
            .query_map(
                params![
                    run_id,
                    lo,
                    hi,
                    opt_i64(filter.limit).unwrap_or(-1),
                    filter.offset as i64
                ],
                |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, Option<f64>>(2)?,
                        row.get::<_, Option<f64>>(3)?,
                        row.get::<_, String>(4)?,
                    ))
                },
            )?
            .collect::<Result<Vec<_>, _>>()?;

        let mut reports = Vec::with_capacity(rows.len());
        for (ue_index, user_id, x, y, readings_json) in rows {
            reports.push(StoredReport {
                key: format!("{}:{}", run_id, user_id),
                run_id: run_id.to_string(),
                user_id,
                ue_index: ue_index as usize,
                x,
                y,
                readings: serde_json::from_str(&readings_json)?,
            });
        }
        Ok(ReportPage {
            run_id: run_id.to_string(),
            reports,
            total: total as usize,
            offset: filter.offset,
            limit: filter.limit,
        })
    }

    fn delete_run(&mut self, run_id: &str) -> Result<usize, StorageError> {
        let tx = self.conn.transaction()?;
        let count: Option<i64> = tx
            .query_row(
                "SELECT num_reports FROM runs WHERE run_id = ?1",
                params![run_id],
                |row| row.get(0),
            )
            .optional()?;
        let count = count.ok_or_else(|| StorageError::RunNotFound(run_id.to_string()))?;
        tx.execute("DELETE FROM reports WHERE run_id = ?1", params![run_id])?;
        tx.execute("DELETE FROM runs WHERE run_id = ?1", params![run_id])?;
        tx.commit()?;
        Ok(count as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::sample_run;

    #[test]
    fn put_and_get_round_trip_header() {
        let mut store = SqliteStore::in_memory().unwrap();
        let run = sample_run("2026-03-01_12-00-00", 3, 0);
        let written = store.put_run(&run).unwrap();
        let read = store.get_run("2026-03-01_12-00-00").unwrap();
        assert_eq!(read, written);
        assert_eq!(read.label_mode, LabelMode::Compact);
        assert_eq!(read.metadata["timestep"], 1);
    }

    #[test]
    fn put_replaces_existing_reports() {
        let mut store = SqliteStore::in_memory().unwrap();
        store.put_run(&sample_run("r1", 5, 0)).unwrap();
        store.put_run(&sample_run("r1", 2, 0)).unwrap();

        let page = store.get_reports("r1", &ReportFilter::default()).unwrap();
        assert_eq!(page.total, 2);
        assert_eq!(store.get_run("r1").unwrap().num_reports, 2);
        assert_eq!(store.list_runs(&ListRunsQuery::default()).unwrap().total, 1);
    }

    #[test]
    fn reports_keep_readings_order_and_position() {
        let mut store = SqliteStore::in_memory().unwrap();
        store.put_run(&sample_run("r1", 3, 0)).unwrap();
        let page = store.get_reports("r1", &ReportFilter::default()).unwrap();
        let last = &page.reports[2];
        assert_eq!(last.key, "r1:user_000002");
        assert_eq!(last.x, Some(2.0));
        assert_eq!(last.y, Some(-2.0));
        assert_eq!(last.readings["b11"], -72.0);
    }

    #[test]
    fn report_filter_pages_within_user_range() {
        let mut store = SqliteStore::in_memory().unwrap();
        store.put_run(&sample_run("r1", 10, 0)).unwrap();
        let filter = ReportFilter {
            limit: Some(2),
            offset: 1,
            user_min: Some(3),
            user_max: Some(6),
        };
        let page = store.get_reports("r1", &filter).unwrap();
        assert_eq!(page.total, 4);
        let idx: Vec<usize> = page.reports.iter().map(|r| r.ue_index).collect();
        assert_eq!(idx, vec![4, 5]);
    }

    #[test]
    fn list_sorts_and_pages() {
        let mut store = SqliteStore::in_memory().unwrap();
        store.put_run(&sample_run("old", 1, 0)).unwrap();
        store.put_run(&sample_run("new", 3, 30)).unwrap();
        store.put_run(&sample_run("mid", 2, 10)).unwrap();

        let page = store.list_runs(&ListRunsQuery::default()).unwrap();
        let ids: Vec<&str> = page.runs.iter().map(|r| r.run_id.as_str()).collect();
        assert_eq!(ids, vec!["new", "mid", "old"]);

        let query = ListRunsQuery {
            limit: 10,
            offset: 0,
            sort_by: RunSortField::RunId,
            desc: false,
        };
        let page = store.list_runs(&query).unwrap();
        let ids: Vec<&str> = page.runs.iter().map(|r| r.run_id.as_str()).collect();
        assert_eq!(ids, vec!["mid", "new", "old"]);
    }

    #[test]
    fn delete_reports_count_and_missing_run() {
        let mut store = SqliteStore::in_memory().unwrap();
        store.put_run(&sample_run("r1", 4, 0)).unwrap();
        assert_eq!(store.delete_run("r1").unwrap(), 4);
        assert!(matches!(store.get_run("r1"), Err(StorageError::RunNotFound(_))));
        assert!(matches!(
            store.get_reports("r1", &ReportFilter::default()),
            Err(StorageError::RunNotFound(_))
        ));
        assert!(matches!(store.delete_run("r1"), Err(StorageError::RunNotFound(_))));
    }
}
