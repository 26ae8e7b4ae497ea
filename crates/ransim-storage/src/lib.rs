//! Persistence for measurement runs.
//!
//! A run is one compute's thresholded reports plus a metadata document. The
//! [`RunStore`] trait is the storage contract; [`InMemoryStore`] and
//! [`SqliteStore`] are interchangeable backends.
//!
//! # Modules
//!
//! - [`error`]: StorageError enum
//! - [`types`]: run headers, stored reports, paging and filter types
//! - [`traits`]: RunStore trait definition
//! - [`memory`]: InMemoryStore implementation
//! - [`schema`]: migration setup for the SQLite backend
//! - [`sqlite`]: SqliteStore implementation
//! - [`hash`]: blake3 topology fingerprint

pub mod error;
pub mod hash;
pub mod memory;
pub mod schema;
pub mod sqlite;
pub mod traits;
pub mod types;

pub use error::StorageError;
pub use hash::topology_fingerprint;
pub use memory::InMemoryStore;
pub use sqlite::SqliteStore;
pub use traits::RunStore;
pub use types::{
    ListRunsQuery, NewRun, ReportFilter, ReportPage, RunHeader, RunPage, RunSortField,
    StoredReport,
};
