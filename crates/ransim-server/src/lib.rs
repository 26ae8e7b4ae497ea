//! HTTP/JSON API for the RAN simulation.
//!
//! Wraps one [`service::Simulation`] in a [`concurrency::ConcurrencyGuard`],
//! runs computes on a dedicated worker thread, and persists measurement runs
//! through a [`ransim_storage::RunStore`].

pub mod concurrency;
pub mod config;
pub mod error;
pub mod handlers;
pub mod router;
pub mod schema;
pub mod service;
pub mod state;
