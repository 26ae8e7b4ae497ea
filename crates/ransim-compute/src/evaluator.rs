//! The propagation-evaluator seam.
//!
//! The engine never computes propagation itself. For each compute group it
//! asks an [`EvaluatorFactory`] for one [`PropagationEvaluator`] configured
//! for the group's carrier and antenna array, then feeds it chunks. Building
//! an evaluator is assumed to be the expensive step.

use ransim_core::AntennaArray;

use crate::error::ComputeError;
use crate::geometry::{BsGeometry, UeChunk};

/// Linear power gains, row-major `[ue][cell]`.
#[derive(Debug, Clone, PartialEq)]
pub struct GainMatrix {
    ues: usize,
    cells: usize,
    data: Vec<f64>,
}

impl GainMatrix {
    /// Wraps `data`, checking it holds exactly `ues * cells` values.
    pub fn new(ues: usize, cells: usize, data: Vec<f64>) -> Result<Self, ComputeError> {
        if data.len() != ues * cells {
            return Err(ComputeError::GainShape {
                ues,
                cells,
                got: data.len(),
            });
        }
        Ok(GainMatrix { ues, cells, data })
    }

    pub fn num_ues(&self) -> usize {
        self.ues
    }

    pub fn num_cells(&self) -> usize {
        self.cells
    }

    pub fn get(&self, ue: usize, cell: usize) -> f64 {
        self.data[ue * self.cells + cell]
    }
}

/// Computes link gains for one group's carrier and array.
pub trait PropagationEvaluator {
    /// Returns a `ues.len() x bs.len()` matrix of linear channel power gains.
    ///
    /// Must be deterministic for identical inputs.
    fn evaluate(&mut self, bs: &BsGeometry, ues: &UeChunk<'_>) -> Result<GainMatrix, ComputeError>;
}

/// Builds evaluators. Shared across threads by the server.
pub trait EvaluatorFactory: Send + Sync {
    fn build(
        &self,
        frequency_hz: f64,
        array: &AntennaArray,
    ) -> Result<Box<dyn PropagationEvaluator>, ComputeError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gain_matrix_checks_shape() {
        let m = GainMatrix::new(2, 3, vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0]).unwrap();
        assert_eq!(m.get(1, 0), 3.0);
        assert!(matches!(
            GainMatrix::new(2, 3, vec![0.0; 5]),
            Err(ComputeError::GainShape { got: 5, .. })
        ));
    }
}
