//! Chunked RSRP computation for ransim topologies.
//!
//! Turns a [`ransim_core::Topology`] plus a UE drop into a dense received
//! power matrix, then compresses it into sparse per-UE measurement reports.
//!
//! # Pipeline
//!
//! 1. [`planner`] groups cells by carrier and antenna descriptor, first-seen.
//! 2. [`engine`] builds one [`PropagationEvaluator`] per group and walks
//!    cell-chunks x UE-chunks, writing dBm values into an [`RsrpMatrix`].
//! 3. [`report`] thresholds and labels each matrix row.
//!
//! The propagation model itself sits behind the [`EvaluatorFactory`] trait;
//! [`reference`] provides a deterministic free-space implementation.

pub mod chunk;
pub mod engine;
pub mod error;
pub mod evaluator;
pub mod geometry;
pub mod matrix;
pub mod planner;
pub mod power;
pub mod reference;
pub mod report;

pub use chunk::{chunk_ranges, ChunkSettings};
pub use engine::ChunkedComputeEngine;
pub use error::ComputeError;
pub use evaluator::{EvaluatorFactory, GainMatrix, PropagationEvaluator};
pub use geometry::{BsGeometry, Orientation, UeChunk};
pub use matrix::{ColumnMeta, ComputeResult, RsrpMatrix};
pub use planner::{plan_groups, ComputeGroup, GroupKey};
pub use reference::ReferenceFactory;
pub use report::{LabelMode, MeasurementReport, ReportCompressor};
