//! Error types for clusterpath-core.
//!
//! The solver itself has a single externally visible failure mode:
//! cooperative cancellation. Malformed inputs (fewer than two
//! observations, empty or duplicate-keyed weight matrices) are
//! preconditions the caller must satisfy upstream; [`crate::config`]
//! offers opt-in `validate()` helpers for that purpose.

use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ClusterpathError>;

/// Errors produced by clusterpath-core.
#[derive(Debug, Error)]
pub enum ClusterpathError {
    /// The caller cancelled the solve through a [`crate::cancel::CancelToken`].
    ///
    /// Raised at most once per outer minimization iteration, always at a
    /// point where the clustering state is fully consistent.
    #[error("solve cancelled by caller")]
    Cancelled,

    /// A run parameter failed upstream validation.
    #[error("invalid parameter '{parameter}': {reason}")]
    InvalidParameter {
        /// Name of the offending parameter.
        parameter: &'static str,
        /// Why the value was rejected.
        reason: String,
    },
}
