//! The [`RunStore`] trait defining the storage contract for measurement runs.

use crate::error::StorageError;
use crate::types::{ListRunsQuery, NewRun, ReportFilter, ReportPage, RunHeader, RunPage};

/// The storage contract for runs.
///
/// Synchronous; callers in async code hold it behind a mutex. Backends are
/// swappable without changing the service.
pub trait RunStore: Send {
    /// Writes a run. Idempotent on `run_id`: an existing run with the same id
    /// is replaced, header and reports together.
    fn put_run(&mut self, run: &NewRun) -> Result<RunHeader, StorageError>;

    fn list_runs(&self, query: &ListRunsQuery) -> Result<RunPage, StorageError>;

    fn get_run(&self, run_id: &str) -> Result<RunHeader, StorageError>;

    /// Reports of one run ordered by UE index.
    fn get_reports(&self, run_id: &str, filter: &ReportFilter)
        -> Result<ReportPage, StorageError>;

    /// Removes a run and returns how many reports it held.
    fn delete_run(&mut self, run_id: &str) -> Result<usize, StorageError>;
}
