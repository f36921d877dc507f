//! Convex clustering along the full regularization path.
//!
//! Given an observation matrix X (one column per observation) and a
//! sparse nonnegative symmetric weight matrix W, this crate minimizes
//!
//! ```text
//! kappa_eps * ||X - M U^T||_F^2
//!     + kappa_pen * lambda * sum over UWU_ij != 0, i < j of UWU_ij * ||m_i - m_j||
//! ```
//!
//! with a majorize-minimize solver that fuses clusters online as their
//! centroids meet, producing an agglomerative hierarchy (a standard
//! dendrogram merge table) as a by-product.
//!
//! # Architecture
//!
//! - [`sparse`]: compressed sparse column matrices for W and its
//!   cluster-level contraction UWU.
//! - [`solver`]: the MM update, loss, fusion engine and merge-table
//!   construction, all owned by [`solver::ClusteringState`].
//! - [`path`]: the lambda-path controller. [`clusterpath_grid`] solves
//!   a fixed lambda sequence with warm starts; [`clusterpath_target`]
//!   bracket-and-bisects lambda to hit exact cluster counts.
//! - [`weights`]: Gaussian-kernel weight construction from
//!   precomputed nearest-neighbor lists.
//!
//! # Preconditions
//!
//! The solver does not defensively validate its inputs: at least two
//! observations, a symmetric nonnegative weight matrix and unique
//! weight keys are the caller's responsibility (see
//! [`config::GridParams::validate`] for the opt-in parameter checks).
//!
//! # Example
//!
//! ```
//! use clusterpath_core::{clusterpath_grid, CancelToken, GridParams, SparseMatrix};
//! use nalgebra::DMatrix;
//!
//! // Two 1-D observations joined by a unit weight.
//! let x = DMatrix::from_column_slice(1, 2, &[0.0, 1.0]);
//! let w = SparseMatrix::from_triplets(2, 2, &[(1, 0, 1.0), (0, 1, 1.0)]);
//!
//! let params = GridParams {
//!     scale: false,
//!     ..GridParams::default()
//! };
//! let result = clusterpath_grid(&x, w, &[0.0, 2.0], &params, &CancelToken::new());
//!
//! assert_eq!(result.info[0].clusters, 2);
//! assert_eq!(result.info[1].clusters, 1);
//! ```

pub mod cancel;
pub mod config;
pub mod error;
pub mod path;
pub mod scaling;
pub mod solver;
pub mod sparse;
pub mod weights;

pub use cancel::CancelToken;
pub use config::{GridParams, TargetParams};
pub use error::{ClusterpathError, Result};
pub use path::{clusterpath_grid, clusterpath_target, ClusterpathResult, PathPoint};
pub use scaling::ScalingConstants;
pub use solver::{ClusteringState, SolverConstants};
pub use sparse::SparseMatrix;
pub use weights::{sparse_kernel_weights, KernelWeights};
