//! The majorize-minimize solver.
//!
//! [`ClusteringState`] owns everything that evolves during a solve and
//! implements the MM update and loss; [`fusion`] detects and applies
//! cluster fusions; [`merge`] turns fusion events into a standard
//! agglomerative merge table.

mod constants;
mod fusion;
mod merge;
mod state;

pub use constants::SolverConstants;
pub use merge::MergeLog;
pub use state::ClusteringState;
