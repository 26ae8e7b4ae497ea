//! Mutation/compute exclusion and the compute worker.
//!
//! - [`guard::ConcurrencyGuard`] serializes computes and rejects mutations
//!   while one is running
//! - [`worker::ComputeWorker`] runs compute jobs on a dedicated thread

pub mod guard;
pub mod worker;

pub use guard::{ComputeTicket, ConcurrencyGuard, CONFIG_LOCKED};
pub use worker::ComputeWorker;
