//! Immutable per-path solver inputs.

use nalgebra::DMatrix;

use crate::config::GridParams;
use crate::scaling::ScalingConstants;
use crate::sparse::SparseMatrix;

/// Everything that stays fixed across one lambda path.
///
/// Built once per path from the observation matrix and the solver
/// parameters; shared by every minimization along the path.
#[derive(Debug, Clone)]
pub struct SolverConstants {
    /// Observation matrix, one column per observation (p x n).
    pub x: DMatrix<f64>,
    /// Relative loss-change convergence threshold.
    pub eps_conv: f64,
    /// Centroid distance below which clusters fuse.
    pub eps_fusions: f64,
    /// Loss scaling multipliers.
    pub scaling: ScalingConstants,
    /// Iterations before step-doubling extrapolation kicks in.
    pub burn_in: usize,
    /// Iteration cap for a single minimization.
    pub max_iter: usize,
}

impl SolverConstants {
    /// Capture the inputs of one path.
    pub fn new(x: &DMatrix<f64>, w: &SparseMatrix, params: &GridParams) -> Self {
        Self {
            x: x.clone(),
            eps_conv: params.eps_conv,
            eps_fusions: params.eps_fusions,
            scaling: ScalingConstants::new(x, w, params.scale),
            burn_in: params.burn_in,
            max_iter: params.max_iter,
        }
    }
}
