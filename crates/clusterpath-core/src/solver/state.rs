//! Mutable clustering state and the MM minimization loop.

use nalgebra::DMatrix;
use tracing::debug;

use crate::cancel::CancelToken;
use crate::error::{ClusterpathError, Result};
use crate::sparse::SparseMatrix;

use super::constants::SolverConstants;
use super::fusion;
use super::merge::MergeLog;

/// Floor on centroid distances inside the MM update. Keeps the
/// surrogate weights finite when two centroids coincide before their
/// clusters fuse.
const DISTANCE_FLOOR: f64 = 1e-6;

/// Everything that evolves during a solve.
///
/// With c current clusters over n observations in p dimensions:
/// centroids `m` (p x c), aggregated sums `xu = X U` (p x c), the
/// cluster-level weights `uwu = U^T W U` (c x c sparse), per-cluster
/// sizes (summing to n at all times) and the per-observation cluster
/// assignment (the indicator U, stored as exactly one cluster index per
/// observation). `Clone` yields the fully independent value copy the
/// path controller relies on for warm-start checkpoints: probe solves
/// must never corrupt the checkpoint they may need to resume from.
#[derive(Debug, Clone)]
pub struct ClusteringState {
    pub(crate) m: DMatrix<f64>,
    pub(crate) xu: DMatrix<f64>,
    pub(crate) uwu: SparseMatrix,
    pub(crate) assignments: Vec<usize>,
    pub(crate) cluster_sizes: Vec<f64>,
    pub(crate) merges: MergeLog,
    /// Loss reported by the last minimization.
    pub loss: f64,
    /// Iterations used by the last minimization.
    pub n_iterations: usize,
}

impl ClusteringState {
    /// Fresh state: every observation its own cluster, centroids at the
    /// observations themselves.
    pub fn new(x: &DMatrix<f64>, w: SparseMatrix) -> Self {
        let n = x.ncols();
        Self {
            m: x.clone(),
            xu: x.clone(),
            uwu: w,
            assignments: (0..n).collect(),
            cluster_sizes: vec![1.0; n],
            merges: MergeLog::new(n),
            loss: 0.0,
            n_iterations: 0,
        }
    }

    /// Current number of clusters.
    pub fn num_clusters(&self) -> usize {
        self.m.ncols()
    }

    /// Cluster index of each original observation.
    pub fn assignments(&self) -> &[usize] {
        &self.assignments
    }

    /// The merge log built so far.
    pub fn merges(&self) -> &MergeLog {
        &self.merges
    }

    /// Squared Euclidean distance between the centroids of clusters `i` and `j`.
    pub(crate) fn centroid_distance_sq(&self, i: usize, j: usize) -> f64 {
        (self.m.column(i) - self.m.column(j)).norm_squared()
    }

    /// The convex clustering loss at the current centroids.
    ///
    /// Fit is `kappa_eps * ||X - M U^T||_F^2`; the penalty sums
    /// `UWU_ij * ||m_i - m_j||` over the strict upper triangle of the
    /// UWU sparsity pattern only, never densely over all cluster pairs.
    pub fn loss(&self, constants: &SolverConstants, lambda: f64) -> f64 {
        let mut fit = 0.0;
        for (obs, &cluster) in self.assignments.iter().enumerate() {
            fit += (constants.x.column(obs) - self.m.column(cluster)).norm_squared();
        }

        let mut penalty = 0.0;
        for j in 0..self.uwu.ncols() {
            for (i, w_ij) in self.uwu.col(j) {
                if i < j {
                    penalty += w_ij * self.centroid_distance_sq(i, j).sqrt();
                }
            }
        }

        constants.scaling.kappa_eps * fit + lambda * constants.scaling.kappa_pen * penalty
    }

    /// One majorize-minimize step in the reduced c-cluster space.
    ///
    /// After `burn_in` iterations the update is extrapolated with step
    /// doubling, `M <- 2 M_update - M`. That acceleration is a
    /// heuristic: it is not guaranteed monotone in the loss and is not
    /// required for correctness.
    pub(crate) fn update(&mut self, constants: &SolverConstants, lambda: f64, iter: usize) {
        let p = self.m.nrows();
        let c = self.m.ncols();

        let mut m_update = DMatrix::<f64>::zeros(p, c);
        let mut diagonal = vec![0.0; c];
        let gamma =
            lambda * constants.scaling.kappa_pen / (2.0 * constants.scaling.kappa_eps);

        // Surrogate contributions of every cluster pair coupled by UWU,
        // visited once through the strict lower triangle of the pattern.
        for j in 0..self.uwu.ncols() {
            for (i, w_ij) in self.uwu.col(j) {
                if i > j {
                    let dist = self.centroid_distance_sq(i, j).sqrt().max(DISTANCE_FLOOR);
                    let t = gamma * w_ij / dist;

                    for row in 0..p {
                        let v = t * (self.m[(row, i)] + self.m[(row, j)]);
                        m_update[(row, i)] += v;
                        m_update[(row, j)] += v;
                    }

                    diagonal[i] += t;
                    diagonal[j] += t;
                }
            }
        }

        m_update += &self.xu;

        for i in 0..c {
            let d = 2.0 * diagonal[i] + self.cluster_sizes[i];
            for row in 0..p {
                m_update[(row, i)] /= d;
            }
        }

        if iter > constants.burn_in {
            m_update = m_update * 2.0 - &self.m;
        }

        self.m = m_update;
    }

    /// Minimize the loss at `lambda`, fusing clusters along the way.
    ///
    /// Alternates MM updates with fusion passes (repeated until a pass
    /// reports no fusion) until the relative loss change drops to
    /// `eps_conv` or `max_iter` is reached. An iteration that fused
    /// clusters resets the previous-loss sentinel so the convergence
    /// test cannot trivially pass on a structurally changed state. A
    /// non-positive lambda performs zero iterations: the state keeps
    /// its warm-start centroids.
    ///
    /// The cancellation token is polled once per iteration, after the
    /// fusion loop, so honoring it never leaves the state mid-update.
    pub fn minimize(
        &mut self,
        constants: &SolverConstants,
        lambda: f64,
        cancel: &CancelToken,
    ) -> Result<()> {
        let mut iter = 0;
        let mut loss_1 = self.loss(constants, lambda);
        let mut loss_0 = (2.0 + constants.eps_conv) * loss_1;

        while (loss_0 - loss_1).abs() / loss_1 > constants.eps_conv
            && iter < constants.max_iter
            && lambda > 0.0
        {
            self.update(constants, lambda, iter);

            let mut clusters_fused = false;
            while fusion::fuse(self, constants.eps_fusions, lambda) {
                clusters_fused = true;
            }

            if clusters_fused {
                loss_1 = self.loss(constants, lambda);
                loss_0 = (2.0 + constants.eps_conv) * loss_1;
            } else {
                loss_0 = loss_1;
                loss_1 = self.loss(constants, lambda);
            }

            if cancel.is_cancelled() {
                return Err(ClusterpathError::Cancelled);
            }

            iter += 1;
        }

        self.n_iterations = iter;
        self.loss = loss_1;

        debug!(
            lambda,
            iterations = iter,
            loss = loss_1,
            clusters = self.num_clusters(),
            "minimization finished"
        );

        Ok(())
    }

    /// Per-observation centroids as a p x n matrix: column `o` is the
    /// centroid of the cluster observation `o` currently belongs to.
    pub fn observation_centroids(&self) -> DMatrix<f64> {
        let p = self.m.nrows();
        let n = self.assignments.len();
        let mut snapshot = DMatrix::<f64>::zeros(p, n);
        for (obs, &cluster) in self.assignments.iter().enumerate() {
            snapshot.set_column(obs, &self.m.column(cluster));
        }
        snapshot
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GridParams;

    fn pair_problem() -> (DMatrix<f64>, SparseMatrix) {
        // Two 1-D observations connected by a unit weight.
        let x = DMatrix::from_column_slice(1, 2, &[0.0, 1.0]);
        let triplets = [(1, 0, 1.0), (0, 1, 1.0)];
        let w = SparseMatrix::from_triplets(2, 2, &triplets);
        (x, w)
    }

    fn constants(x: &DMatrix<f64>, w: &SparseMatrix, eps_fusions: f64) -> SolverConstants {
        let params = GridParams {
            eps_fusions,
            scale: false,
            max_iter: 200,
            ..GridParams::default()
        };
        SolverConstants::new(x, w, &params)
    }

    #[test]
    fn test_nonpositive_lambda_performs_zero_iterations() {
        let (x, w) = pair_problem();
        let constants = constants(&x, &w, 1e-6);
        let mut state = ClusteringState::new(&x, w);
        let m_before = state.m.clone();

        state
            .minimize(&constants, 0.0, &CancelToken::new())
            .expect("not cancelled");

        assert_eq!(state.n_iterations, 0);
        assert_eq!(state.m, m_before, "warm-start centroids must be untouched");
        assert_eq!(state.num_clusters(), 2);

        state
            .minimize(&constants, -1.0, &CancelToken::new())
            .expect("not cancelled");
        assert_eq!(state.n_iterations, 0);
    }

    #[test]
    fn test_penalty_vanishes_at_lambda_zero() {
        let (x, w) = pair_problem();
        let constants = constants(&x, &w, 1e-6);
        let state = ClusteringState::new(&x, w);

        // M = X, so the fit is zero too: loss(0) must be exactly 0.
        assert_eq!(state.loss(&constants, 0.0), 0.0);
        assert!(state.loss(&constants, 1.0) > 0.0, "penalty is positive");
    }

    #[test]
    fn test_large_lambda_fuses_the_pair() {
        let (x, w) = pair_problem();
        let constants = constants(&x, &w, 1e-4);
        let mut state = ClusteringState::new(&x, w);

        // Distance 1, unit weight, unscaled loss: the pair fuses once
        // lambda exceeds 0.5; use a comfortable margin.
        state
            .minimize(&constants, 2.0, &CancelToken::new())
            .expect("not cancelled");

        assert_eq!(state.num_clusters(), 1);
        assert_eq!(state.cluster_sizes, vec![2.0]);
        assert!((state.m[(0, 0)] - 0.5).abs() < 1e-3, "fused centroid at the mean");
        assert_eq!(state.merges.len(), 1);
        assert!(state.loss >= 0.0);
    }

    #[test]
    fn test_update_survives_coincident_centroids() {
        // Two identical observations: centroid distance is 0 and only
        // the 1e-6 floor keeps the surrogate finite.
        let x = DMatrix::from_column_slice(1, 2, &[3.0, 3.0]);
        let triplets = [(1, 0, 1.0), (0, 1, 1.0)];
        let w = SparseMatrix::from_triplets(2, 2, &triplets);
        let constants = constants(&x, &w, 1e-8);
        let mut state = ClusteringState::new(&x, w);

        state.update(&constants, 0.5, 0);
        assert!(state.m.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_cancellation_aborts_first_iteration() {
        let (x, w) = pair_problem();
        let constants = constants(&x, &w, 1e-6);
        let mut state = ClusteringState::new(&x, w);

        let token = CancelToken::new();
        token.cancel();

        let result = state.minimize(&constants, 0.1, &token);
        assert!(matches!(result, Err(ClusterpathError::Cancelled)));
    }

    #[test]
    fn test_cluster_sizes_always_sum_to_n() {
        let x = DMatrix::from_column_slice(1, 4, &[0.0, 0.001, 0.002, 10.0]);
        let triplets = [
            (1, 0, 1.0),
            (0, 1, 1.0),
            (2, 1, 1.0),
            (1, 2, 1.0),
            (3, 2, 1.0),
            (2, 3, 1.0),
        ];
        let w = SparseMatrix::from_triplets(4, 4, &triplets);
        let constants = constants(&x, &w, 1e-3);
        let mut state = ClusteringState::new(&x, w);

        for &lambda in &[0.0, 0.01, 0.1, 1.0] {
            state
                .minimize(&constants, lambda, &CancelToken::new())
                .expect("not cancelled");
            let total: f64 = state.cluster_sizes.iter().sum();
            assert_eq!(total, 4.0, "sizes must sum to n after lambda = {lambda}");
            assert_eq!(state.assignments.len(), 4);
            assert!(state
                .assignments
                .iter()
                .all(|&c| c < state.num_clusters()));
        }
    }
}
