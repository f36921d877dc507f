//! The lambda-path controller.
//!
//! Two operating modes over the same solver core: [`clusterpath_grid`]
//! solves a caller-given lambda sequence with warm starts, and
//! [`clusterpath_target`] hunts lambdas that produce exact cluster
//! counts by geometric bracketing followed by bisection.

mod results;

pub use results::{ClusterpathResult, PathPoint};

use nalgebra::DMatrix;
use tracing::info;

use crate::cancel::CancelToken;
use crate::config::{GridParams, TargetParams};
use crate::solver::{ClusteringState, SolverConstants};
use crate::sparse::SparseMatrix;

use results::ResultCollector;

/// Lambdas beyond this ceiling abort the bracketing phase.
const LAMBDA_CEILING: f64 = 1e30;

/// Bisection stops once the bracket is narrower than this.
const BRACKET_TOLERANCE: f64 = 1e-6;

/// Nudge separating a new search from the previously accepted lambda.
const LAMBDA_NUDGE: f64 = 1e-8;

/// Solve the convex clustering problem along a fixed lambda grid.
///
/// Each lambda warm-starts from the previous solution. Fusions are
/// irreversible, so a non-ascending sequence is well-defined but
/// monotone-collapsing: it can never un-fuse clusters.
///
/// On cancellation the result carries every point recorded so far with
/// `interrupted` set.
pub fn clusterpath_grid(
    x: &DMatrix<f64>,
    w: SparseMatrix,
    lambdas: &[f64],
    params: &GridParams,
    cancel: &CancelToken,
) -> ClusterpathResult {
    let constants = SolverConstants::new(x, &w, params);
    let mut state = ClusteringState::new(x, w);
    let mut collector = ResultCollector::new(params.save_clusterpath);
    let mut interrupted = false;

    for &lambda in lambdas {
        // Only cancellation escapes the solver.
        if state.minimize(&constants, lambda, cancel).is_err() {
            interrupted = true;
            break;
        }
        collector.add(&state, lambda);
    }

    collector.finalize(interrupted, 0, 0, 0)
}

/// Search for the lambdas that produce exact cluster counts.
///
/// Targets run from `min(n - 1, target_high)` down to `target_low`.
/// Phase 1 grows lambda geometrically from the previous target's
/// accepted solution until the count reaches the target (an exact hit)
/// or jumps below it (a bracket). Phase 2 bisects for the smallest
/// lambda attaining the count, rolling the live state back to the last
/// "more clusters" checkpoint after every probe so probe solves never
/// leak into the carried-forward state. A failed bracket ends the whole
/// search: no finer target can be pursued without a consistent warm
/// start.
pub fn clusterpath_target(
    x: &DMatrix<f64>,
    w: SparseMatrix,
    params: &TargetParams,
    cancel: &CancelToken,
) -> ClusterpathResult {
    let n = x.ncols();
    let constants = SolverConstants::new(x, &w, &params.solver);
    let mut state = ClusteringState::new(x, w);
    let mut collector = ResultCollector::new(params.solver.save_clusterpath);

    let mut phase_1_solves = 0;
    let mut phase_2_solves = 0;
    let mut targets_found = 0;
    let mut interrupted = false;

    // Accepted lambda of the previous target; the next search resumes
    // just above it.
    let mut lambda_target = params.lambda_init / (1.0 + params.factor) - LAMBDA_NUDGE;
    let mut current_target = params.target_high.min(n.saturating_sub(1));

    // Seed the path: lambda = 0 performs zero iterations and leaves the
    // centroids at the observations.
    if state.minimize(&constants, 0.0, cancel).is_err() {
        return collector.finalize(true, 0, 0, 0);
    }

    // Accepted solution of the previous target, and the warm start to
    // fall back to while probing. Full value copies: probes must not
    // corrupt the checkpoints they may need to resume from.
    let mut state_target = state.clone();
    let mut state_lb = state.clone();

    if params.target_high == n {
        if params.verbose > 0 {
            info!(
                target_clusters = n,
                lambda = 0.0,
                "trivial target: every observation its own cluster"
            );
        }
        collector.add(&state_target, 0.0);
        targets_found += 1;
    }

    'targets: while current_target >= params.target_low {
        if params.verbose > 0 {
            info!(
                target_clusters = current_target,
                "phase 1: acquiring lower bound for lambda"
            );
        }

        state = state_target.clone();
        let mut lambda = (lambda_target + LAMBDA_NUDGE) * (1.0 + params.factor);
        let mut lambda_lb = lambda_target + LAMBDA_NUDGE;

        let mut target_found = false;
        let mut target_sandwiched = false;

        let mut iter = 0;
        while iter < params.max_iter_phase_1 && lambda < LAMBDA_CEILING {
            if state.minimize(&constants, lambda, cancel).is_err() {
                interrupted = true;
                break 'targets;
            }
            phase_1_solves += 1;

            let clusters = state.num_clusters();
            if params.verbose > 0 {
                info!(lambda, clusters, "phase 1 probe");
            }

            if clusters > current_target {
                // Warm start for the next, larger probe.
                state_lb = state.clone();
                lambda_lb = lambda;
                lambda *= 1.0 + params.factor;
            } else if clusters == current_target {
                state_target = state.clone();
                lambda_target = lambda;
                target_found = true;
                break;
            } else {
                target_sandwiched = true;
                break;
            }

            iter += 1;
        }

        if !target_found && !target_sandwiched {
            // Bracketing failed (budget or ceiling): abandon this and
            // every finer target.
            break;
        }

        // Either exit leaves `lambda` at the probe that closed the
        // bracket from above.
        let mut lambda_ub = lambda;

        if params.verbose > 0 {
            info!(
                target_clusters = current_target,
                lambda_lb,
                lambda_ub,
                "phase 2: refining lambda"
            );
        }

        // An exact phase-1 hit only needs the downward half of the
        // refinement budget to chase the smallest matching lambda.
        let mut iter = if target_found {
            params.max_iter_phase_2 / 2
        } else {
            0
        };

        while iter < params.max_iter_phase_2 && lambda_ub - lambda_lb > BRACKET_TOLERANCE {
            lambda = 0.5 * (lambda_lb + lambda_ub);

            if state.minimize(&constants, lambda, cancel).is_err() {
                interrupted = true;
                break 'targets;
            }
            phase_2_solves += 1;

            let clusters = state.num_clusters();
            if params.verbose > 0 {
                info!(lambda, clusters, "phase 2 probe");
            }

            if clusters > current_target {
                state_lb = state.clone();
                lambda_lb = lambda;
            } else if clusters == current_target {
                // Candidate accepted, but larger lambdas also matching
                // means the smallest one is still below: tighten the
                // upper bound and keep bisecting from the lower-bound
                // warm start.
                state_target = state.clone();
                lambda_target = lambda;
                lambda_ub = lambda;
                target_found = true;
                state = state_lb.clone();
            } else {
                lambda_ub = lambda;
                state = state_lb.clone();
            }

            iter += 1;
        }

        if target_found {
            if params.verbose > 0 {
                info!(
                    target_clusters = current_target,
                    lambda = lambda_target,
                    "target found"
                );
            }
            collector.add(&state_target, lambda_target);
            targets_found += 1;
        } else {
            // The bracket never produced an exact match (the count
            // jumped over the target): without a consistent warm start
            // no finer target can be reliably pursued either.
            break;
        }

        if current_target == 0 {
            break;
        }
        current_target -= 1;
    }

    collector.finalize(interrupted, phase_1_solves, phase_2_solves, targets_found)
}
