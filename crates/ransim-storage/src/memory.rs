//! In-memory implementation of [`RunStore`].

use indexmap::IndexMap;

use crate::error::StorageError;
use crate::traits::RunStore;
use crate::types::{
    ListRunsQuery, NewRun, ReportFilter, ReportPage, RunHeader, RunPage, RunSortField,
    StoredReport,
};

struct StoredRun {
    header: RunHeader,
    reports: Vec<StoredReport>,
}

/// Run store backed by an insertion-ordered map. Used by tests and by
/// servers started with the `memory` store.
#[derive(Default)]
pub struct InMemoryStore {
    runs: IndexMap<String, StoredRun>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        InMemoryStore::default()
    }

    fn stored(&self, run_id: &str) -> Result<&StoredRun, StorageError> {
        self.runs
            .get(run_id)
            .ok_or_else(|| StorageError::RunNotFound(run_id.to_string()))
    }
}

/// Orders headers per `query`, ties broken by run id.
pub(crate) fn sort_headers(headers: &mut [RunHeader], query: &ListRunsQuery) {
    headers.sort_by(|a, b| {
        let ord = match query.sort_by {
            RunSortField::CreatedAt => a.created_at.cmp(&b.created_at),
            RunSortField::RunId => a.run_id.cmp(&b.run_id),
            RunSortField::NumReports => a.num_reports.cmp(&b.num_reports),
        }
        .then_with(|| a.run_id.cmp(&b.run_id));
        if query.desc {
            ord.reverse()
        } else {
            ord
        }
    });
}

impl RunStore for InMemoryStore {
    fn put_run(&mut self, run: &NewRun) -> Result<RunHeader, StorageError> {
        let header = RunHeader::of(run);
        let mut reports: Vec<StoredReport> = run
            .reports
            .iter()
            .map(|r| StoredReport::from_report(&run.run_id, r))
            .collect();
        reports.sort_by_key(|r| r.ue_index);
        self.runs.insert(
            run.run_id.clone(),
            StoredRun {
                header: header.clone(),
                reports,
            },
        );
        Ok(header)
    }

    fn list_runs(&self, query: &ListRunsQuery) -> Result<RunPage, StorageError> {
        let mut headers: Vec<RunHeader> = self.runs.values().map(|r| r.header.clone()).collect();
        sort_headers(&mut headers, query);
        let total = headers.len();
        let runs = headers
            .into_iter()
            .skip(query.offset)
            .take(query.limit)
            .collect();
        Ok(RunPage {
            runs,
            total,
            offset: query.offset,
            limit: query.limit,
        })
    }

    fn get_run(&self, run_id: &str) -> Result<RunHeader, StorageError> {
        Ok(self.stored(run_id)?.header.clone())
    }

    fn get_reports(
        &self,
        run_id: &str,
        filter: &ReportFilter,
    ) -> Result<ReportPage, StorageError> {
        let stored = self.stored(run_id)?;
        let matching: Vec<&StoredReport> = stored
            .reports
            .iter()
            .filter(|r| filter.admits(r.ue_index))
            .collect();
        let total = matching.len();
        let reports = matching
            .into_iter()
            .skip(filter.offset)
            .take(filter.limit.unwrap_or(usize::MAX))
            .cloned()
            .collect();
        Ok(ReportPage {
            run_id: run_id.to_string(),
            reports,
            total,
            offset: filter.offset,
            limit: filter.limit,
        })
    }

    fn delete_run(&mut self, run_id: &str) -> Result<usize, StorageError> {
        let removed = self
            .runs
            .shift_remove(run_id)
            .ok_or_else(|| StorageError::RunNotFound(run_id.to_string()))?;
        Ok(removed.reports.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::sample_run;

    #[test]
    fn put_is_idempotent_on_run_id() {
        let mut store = InMemoryStore::new();
        store.put_run(&sample_run("r1", 5, 0)).unwrap();
        store.put_run(&sample_run("r1", 2, 0)).unwrap();

        let page = store.list_runs(&ListRunsQuery::default()).unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(store.get_run("r1").unwrap().num_reports, 2);
        let reports = store.get_reports("r1", &ReportFilter::default()).unwrap();
        assert_eq!(reports.total, 2);
        assert_eq!(reports.reports[1].key, "r1:user_000001");
    }

    #[test]
    fn list_defaults_to_newest_first() {
        let mut store = InMemoryStore::new();
        store.put_run(&sample_run("old", 1, 0)).unwrap();
        store.put_run(&sample_run("new", 3, 30)).unwrap();
        store.put_run(&sample_run("mid", 2, 10)).unwrap();

        let page = store.list_runs(&ListRunsQuery::default()).unwrap();
        let ids: Vec<&str> = page.runs.iter().map(|r| r.run_id.as_str()).collect();
        assert_eq!(ids, vec!["new", "mid", "old"]);

        let query = ListRunsQuery {
            limit: 1,
            offset: 1,
            sort_by: RunSortField::NumReports,
            desc: false,
        };
        let page = store.list_runs(&query).unwrap();
        assert_eq!(page.total, 3);
        assert_eq!(page.runs[0].run_id, "mid");
    }

    #[test]
    fn report_filter_uses_inclusive_user_range() {
        let mut store = InMemoryStore::new();
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
    fn delete_returns_report_count() {
        let mut store = InMemoryStore::new();
        store.put_run(&sample_run("r1", 4, 0)).unwrap();
        assert_eq!(store.delete_run("r1").unwrap(), 4);
        assert!(matches!(
            store.get_run("r1"),
            Err(StorageError::RunNotFound(id)) if id == "r1"
        ));
        assert!(store.delete_run("r1").is_err());
    }
}
