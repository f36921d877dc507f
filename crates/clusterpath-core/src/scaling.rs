//! Loss-scaling constants.
//!
//! Scaling makes convergence tolerances and lambda ranges comparable
//! across data sets by normalizing the fit term with the data norm and
//! the penalty term with the total weight mass.

use nalgebra::DMatrix;

use crate::sparse::SparseMatrix;

/// The two multipliers applied to the loss terms.
///
/// With scaling disabled the loss is the plain
/// `0.5 ||X - M U^T||_F^2 + lambda * penalty` objective.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScalingConstants {
    /// Multiplier on the squared Frobenius fit term.
    pub kappa_eps: f64,
    /// Multiplier on the weighted fusion penalty.
    pub kappa_pen: f64,
}

impl ScalingConstants {
    /// Derive the constants from the data and weight matrix.
    ///
    /// When `scale` is set: `kappa_eps = 1 / (2 ||X||_F^2)` and
    /// `kappa_pen = 1 / (||X||_F * sum(W))`, where `sum(W)` runs over
    /// all stored entries of the weight matrix.
    pub fn new(x: &DMatrix<f64>, w: &SparseMatrix, scale: bool) -> Self {
        if scale {
            let norm_x = x.norm();
            Self {
                kappa_eps: 1.0 / (2.0 * norm_x * norm_x),
                kappa_pen: 1.0 / (norm_x * w.sum()),
            }
        } else {
            Self::default()
        }
    }
}

impl Default for ScalingConstants {
    fn default() -> Self {
        Self {
            kappa_eps: 0.5,
            kappa_pen: 1.0,
        }
    }
}
