//! Core data model for the RAN simulator.
//!
//! This crate defines the network topology (sites, implicit sectors, cells),
//! cell naming, UE drops, and the typed records every other crate operates on.
//! It has no I/O and no async: all operations are plain functions and methods
//! over owned data, so the server can snapshot a [`Topology`] by cloning it.
//!
//! # Modules
//!
//! - [`id`]: index newtypes, [`SectorId`], and site/cell references
//! - [`error`]: CoreError enum with all failure modes
//! - [`antenna`]: antenna-array descriptor and partial overrides
//! - [`site`]: site record and azimuth helpers
//! - [`cell`]: cell record, creation spec, partial update
//! - [`naming`]: pattern-based cell naming
//! - [`topology`]: the topology store (add/update/resolve operations)
//! - [`table`]: flattened read views over the topology
//! - [`query`]: cell filtering, sorting, and pagination
//! - [`ue`]: seeded UE drops
//! - [`layout`]: clustered site placement
//! - [`scenario`]: one-shot dual-band network construction

pub mod antenna;
pub mod cell;
pub mod error;
pub mod id;
pub mod layout;
pub mod naming;
pub mod query;
pub mod scenario;
pub mod site;
pub mod table;
pub mod topology;
pub mod ue;

// Re-export key types for ergonomic use.
pub use antenna::{AntennaArray, ArrayOverrides, Polarization, PolarizationType};
pub use cell::{Cell, CellSpec, CellUpdate};
pub use error::CoreError;
pub use id::{CellIdx, CellRef, SectorId, SiteIdx, SiteRef, SECTORS_PER_SITE};
pub use naming::{NamingConfig, SectorLabel, SiteKey};
pub use scenario::{build_scenario, ScenarioConfig};
pub use site::{Site, SiteSpec};
pub use topology::{active_sectors, AddedCell, Topology, UpdatedCell};
pub use ue::{drop_ues, DropLayout, DropParams, DropRequest, UeDrop};
