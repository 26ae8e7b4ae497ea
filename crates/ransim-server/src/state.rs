//! Shared application state.
//!
//! [`AppState`] holds the guarded [`Simulation`], the compute worker, the run
//! store and the propagation model. Everything sits behind `Arc`, so axum can
//! clone the state cheaply into each handler.
//!
//! The run store has its own `tokio::sync::Mutex`, separate from the
//! simulation. Listing or fetching runs never waits on a topology edit, and
//! the `rusqlite::Connection` inside [`SqliteStore`] is `!Sync`, so it has to
//! sit behind a mutex anyway.

use std::sync::Arc;

use ransim_compute::{ChunkSettings, EvaluatorFactory, ReferenceFactory};
use ransim_storage::{InMemoryStore, RunStore, SqliteStore};

use crate::concurrency::{ConcurrencyGuard, ComputeWorker};
use crate::config::{ServerConfig, StoreKind};
use crate::error::ApiError;
use crate::service::Simulation;

#[derive(Clone)]
pub struct AppState {
    /// The simulation, behind the config lock and compute flag.
    pub guard: Arc<ConcurrencyGuard<Simulation>>,
    pub worker: Arc<ComputeWorker>,
    pub runs: Arc<tokio::sync::Mutex<Box<dyn RunStore>>>,
    pub evaluators: Arc<dyn EvaluatorFactory>,
}

impl AppState {
    /// State for the server binary: the configured store and the reference
    /// propagation model.
    pub fn new(config: &ServerConfig) -> Result<Self, ApiError> {
        let runs: Box<dyn RunStore> = match config.store {
            StoreKind::Sqlite => Box::new(SqliteStore::new(&config.db_path)?),
            StoreKind::Memory => Box::new(InMemoryStore::new()),
        };
        Self::assemble(runs, Arc::new(ReferenceFactory), config.chunks)
    }

    /// State backed by an in-memory SQLite database (for testing).
    pub fn in_memory() -> Result<Self, ApiError> {
        let runs = Box::new(SqliteStore::in_memory()?);
        Self::assemble(runs, Arc::new(ReferenceFactory), ServerConfig::default().chunks)
    }

    /// In-memory state with a custom propagation model.
    pub fn with_evaluator(evaluators: Arc<dyn EvaluatorFactory>) -> Result<Self, ApiError> {
        Self::assemble(
            Box::new(InMemoryStore::new()),
            evaluators,
            ServerConfig::default().chunks,
        )
    }

    fn assemble(
        runs: Box<dyn RunStore>,
        evaluators: Arc<dyn EvaluatorFactory>,
        chunks: ChunkSettings,
    ) -> Result<Self, ApiError> {
        Ok(AppState {
            guard: Arc::new(ConcurrencyGuard::new(Simulation::new(chunks))),
            worker: Arc::new(ComputeWorker::start()?),
            runs: Arc::new(tokio::sync::Mutex::new(runs)),
            evaluators,
        })
    }
}
