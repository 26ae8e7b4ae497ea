//! Compute error types.

use thiserror::Error;

/// Errors produced while planning, evaluating, or assembling a matrix.
#[derive(Debug, Error)]
pub enum ComputeError {
    #[error("no UEs dropped: call drop-ues first")]
    NoUes,

    #[error("no sites in topology")]
    NoSites,

    #[error("no cells in topology")]
    NoCells,

    /// A cell points at a site index the topology does not have.
    #[error("cell '{cell}' references missing site {site}")]
    DanglingSite { cell: String, site: usize },

    /// The factory does not know the antenna pattern.
    #[error("unsupported antenna pattern '{pattern}'")]
    UnsupportedPattern { pattern: String },

    /// The evaluator itself failed.
    #[error("propagation evaluator failed: {reason}")]
    Evaluator { reason: String },

    /// The evaluator returned the wrong number of gains.
    #[error("evaluator returned {got} gains, expected {ues} UEs x {cells} cells")]
    GainShape { ues: usize, cells: usize, got: usize },
}

impl ComputeError {
    /// True for the "nothing to compute" failures that retrying cannot fix.
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            ComputeError::NoUes | ComputeError::NoSites | ComputeError::NoCells
        )
    }
}
