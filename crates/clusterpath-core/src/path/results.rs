//! Accumulation of per-lambda snapshots into the final path result.

use nalgebra::DMatrix;

use crate::solver::ClusteringState;

/// Diagnostics of one recorded point on the path.
#[derive(Debug, Clone, PartialEq)]
pub struct PathPoint {
    /// Regularization strength of this point.
    pub lambda: f64,
    /// Loss reported by the minimization.
    pub loss: f64,
    /// Iterations the minimization used.
    pub iterations: usize,
    /// Cluster count after the minimization.
    pub clusters: usize,
}

/// Everything a path run produces.
#[derive(Debug, Clone)]
pub struct ClusterpathResult {
    /// Per-recorded-point p x n centroid snapshots, when requested.
    pub clusterpath: Option<Vec<DMatrix<f64>>>,
    /// One entry per recorded point, in recording order.
    pub info: Vec<PathPoint>,
    /// Binary merge rows accumulated across the whole path.
    pub merge_table: Vec<[i32; 2]>,
    /// Lambda at which each merge occurred.
    pub merge_heights: Vec<f64>,
    /// Whether the run was cut short by cooperative cancellation. All
    /// recorded points predate the cancellation and remain valid.
    pub interrupted: bool,
    /// Phase-1 minimizations performed (target mode, else 0).
    pub phase_1_solves: usize,
    /// Phase-2 minimizations performed (target mode, else 0).
    pub phase_2_solves: usize,
    /// Target cluster counts actually found (target mode, else 0).
    pub targets_found: usize,
}

/// Builds a [`ClusterpathResult`] one accepted solution at a time.
///
/// Merge rows are copied out of the live state's log at recording time;
/// `merge_index` remembers how far the copy has progressed so rollbacks
/// of the live state between recordings cannot corrupt the table.
#[derive(Debug)]
pub(crate) struct ResultCollector {
    snapshots: Option<Vec<DMatrix<f64>>>,
    info: Vec<PathPoint>,
    merge_table: Vec<[i32; 2]>,
    merge_heights: Vec<f64>,
    merge_index: usize,
}

impl ResultCollector {
    pub(crate) fn new(save_clusterpath: bool) -> Self {
        Self {
            snapshots: save_clusterpath.then(Vec::new),
            info: Vec::new(),
            merge_table: Vec::new(),
            merge_heights: Vec::new(),
            merge_index: 0,
        }
    }

    /// Record one accepted solution at `lambda`.
    pub(crate) fn add(&mut self, state: &ClusteringState, lambda: f64) {
        if let Some(snapshots) = &mut self.snapshots {
            snapshots.push(state.observation_centroids());
        }

        self.info.push(PathPoint {
            lambda,
            loss: state.loss,
            iterations: state.n_iterations,
            clusters: state.num_clusters(),
        });

        let log = state.merges();
        for row in self.merge_index..log.len() {
            self.merge_table.push(log.table()[row]);
            self.merge_heights.push(log.heights()[row]);
        }
        self.merge_index = log.len();
    }

    pub(crate) fn finalize(
        self,
        interrupted: bool,
        phase_1_solves: usize,
        phase_2_solves: usize,
        targets_found: usize,
    ) -> ClusterpathResult {
        ClusterpathResult {
            clusterpath: self.snapshots,
            info: self.info,
            merge_table: self.merge_table,
            merge_heights: self.merge_heights,
            interrupted,
            phase_1_solves,
            phase_2_solves,
            targets_found,
        }
    }
}
