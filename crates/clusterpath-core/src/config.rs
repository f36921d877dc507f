//! Run parameters for the two path modes.
//!
//! The solver does not defensively validate its inputs (see the crate
//! docs); `validate()` is offered for callers that want to reject bad
//! parameters upstream, before any solve starts.

use serde::{Deserialize, Serialize};

use crate::error::{ClusterpathError, Result};

/// Parameters shared by both path modes.
///
/// # Example
///
/// ```
/// use clusterpath_core::GridParams;
///
/// let params = GridParams::default();
/// assert_eq!(params.burn_in, 25);
/// assert!(params.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridParams {
    /// Relative loss-change threshold that ends a minimization.
    pub eps_conv: f64,
    /// Centroid distance below which clusters fuse.
    pub eps_fusions: f64,
    /// Normalize the loss with [`crate::scaling::ScalingConstants`].
    pub scale: bool,
    /// Retain a full per-lambda, per-observation centroid snapshot.
    pub save_clusterpath: bool,
    /// Iterations before step-doubling extrapolation kicks in.
    pub burn_in: usize,
    /// Iteration cap for a single minimization.
    pub max_iter: usize,
}

impl Default for GridParams {
    fn default() -> Self {
        Self {
            eps_conv: 1e-6,
            eps_fusions: 1e-6,
            scale: true,
            save_clusterpath: false,
            burn_in: 25,
            max_iter: 5000,
        }
    }
}

impl GridParams {
    /// Reject parameter values the solver would misbehave on.
    pub fn validate(&self) -> Result<()> {
        if !(self.eps_conv > 0.0) {
            return Err(ClusterpathError::InvalidParameter {
                parameter: "eps_conv",
                reason: format!("must be positive, got {}", self.eps_conv),
            });
        }
        if !(self.eps_fusions > 0.0) {
            return Err(ClusterpathError::InvalidParameter {
                parameter: "eps_fusions",
                reason: format!("must be positive, got {}", self.eps_fusions),
            });
        }
        if self.max_iter == 0 {
            return Err(ClusterpathError::InvalidParameter {
                parameter: "max_iter",
                reason: "must be at least 1".into(),
            });
        }
        Ok(())
    }
}

/// Parameters for the target-cluster-count search.
///
/// Targets are pursued from `target_high` down to `target_low`; for
/// each, phase 1 brackets a suitable lambda geometrically and phase 2
/// bisects to the smallest lambda attaining the count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetParams {
    /// Solver parameters shared with grid mode.
    pub solver: GridParams,
    /// Smallest cluster count to search for (inclusive).
    pub target_low: usize,
    /// Largest cluster count to search for (inclusive).
    pub target_high: usize,
    /// Probe budget for the geometric bracketing phase, per target.
    pub max_iter_phase_1: usize,
    /// Probe budget for the bisection phase, per target.
    pub max_iter_phase_2: usize,
    /// First lambda probed for the first target.
    pub lambda_init: f64,
    /// Geometric growth factor: each phase-1 probe multiplies lambda by `1 + factor`.
    pub factor: f64,
    /// Verbosity of search progress logging (0 = quiet).
    pub verbose: u8,
}

impl Default for TargetParams {
    fn default() -> Self {
        Self {
            solver: GridParams::default(),
            target_low: 1,
            target_high: 1,
            max_iter_phase_1: 2500,
            max_iter_phase_2: 2500,
            lambda_init: 0.01,
            factor: 0.025,
            verbose: 0,
        }
    }
}

impl TargetParams {
    /// Reject parameter values the solver would misbehave on.
    pub fn validate(&self) -> Result<()> {
        self.solver.validate()?;
        if self.target_low < 1 {
            return Err(ClusterpathError::InvalidParameter {
                parameter: "target_low",
                reason: "must be at least 1".into(),
            });
        }
        if self.target_high < self.target_low {
            return Err(ClusterpathError::InvalidParameter {
                parameter: "target_high",
                reason: format!(
                    "must be >= target_low ({} < {})",
                    self.target_high, self.target_low
                ),
            });
        }
        if !(self.lambda_init > 0.0) {
            return Err(ClusterpathError::InvalidParameter {
                parameter: "lambda_init",
                reason: format!("must be positive, got {}", self.lambda_init),
            });
        }
        if !(self.factor > 0.0) {
            return Err(ClusterpathError::InvalidParameter {
                parameter: "factor",
                reason: format!("must be positive, got {}", self.factor),
            });
        }
        Ok(())
    }
}
