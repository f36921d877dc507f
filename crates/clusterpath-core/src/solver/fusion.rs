//! Cluster fusion: detection and state contraction.
//!
//! Detection is a single greedy pass over the UWU sparsity pattern in
//! column order: a not-yet-grouped cluster opens a group and pulls in
//! every higher-indexed neighbor within `eps_fusions` of its centroid.
//! The pass is one-hop and non-transitive: a chain of three mutually
//! eligible clusters visited in an unfavorable order may not fully
//! merge in one call. Callers repeat until no change; the transitive
//! closure emerges across calls.

use tracing::debug;

use crate::sparse::SparseMatrix;

use super::state::ClusteringState;

/// Greedy one-hop grouping of the current clusters.
///
/// Returns the new-group index of every current cluster (groups are
/// numbered in order of opening, so ascending by their lowest member)
/// and the number of groups.
fn fusion_groups(state: &ClusteringState, eps_fusions: f64) -> (Vec<usize>, usize) {
    let c = state.num_clusters();
    let eps_sq = eps_fusions * eps_fusions;

    const UNGROUPED: usize = usize::MAX;
    let mut group = vec![UNGROUPED; c];
    let mut n_groups = 0;

    for j in 0..c {
        if group[j] == UNGROUPED {
            group[j] = n_groups;
            n_groups += 1;

            for (i, _w_ij) in state.uwu.col(j) {
                // Any higher-indexed neighbor within reach joins j's
                // group, even if an earlier opener had already claimed
                // it.
                if i > j && state.centroid_distance_sq(i, j) <= eps_sq {
                    group[i] = group[j];
                }
            }
        }
    }

    (group, n_groups)
}

/// Detect and apply one round of fusions. Returns whether any happened.
///
/// On fusion the whole state contracts consistently: UWU becomes
/// G^T UWU G, XU becomes XU G, centroids become the size-weighted
/// averages of their merged clusters, and every multi-way fusion is
/// forwarded to the merge log with the current lambda as height.
pub(crate) fn fuse(state: &mut ClusteringState, eps_fusions: f64, lambda: f64) -> bool {
    let c_old = state.num_clusters();
    let (group, c_new) = fusion_groups(state, eps_fusions);
    if c_new >= c_old {
        return false;
    }

    // Contract the aggregated weights, folding duplicate keys.
    let mut triplets = Vec::with_capacity(state.uwu.nnz());
    for j in 0..c_old {
        for (i, w_ij) in state.uwu.col(j) {
            triplets.push((group[i], group[j], w_ij));
        }
    }
    let uwu_new = SparseMatrix::from_triplets_summed(c_new, c_new, triplets);

    // Contract XU, sizes and the size-weighted centroids.
    let p = state.m.nrows();
    let mut xu_new = nalgebra::DMatrix::<f64>::zeros(p, c_new);
    let mut m_new = nalgebra::DMatrix::<f64>::zeros(p, c_new);
    let mut sizes_new = vec![0.0; c_new];
    let mut merged_from = vec![0usize; c_new];

    for i in 0..c_old {
        let g = group[i];
        sizes_new[g] += state.cluster_sizes[i];
        merged_from[g] += 1;
        for row in 0..p {
            xu_new[(row, g)] += state.xu[(row, i)];
            m_new[(row, g)] += state.m[(row, i)] * state.cluster_sizes[i];
        }
    }
    for g in 0..c_new {
        for row in 0..p {
            m_new[(row, g)] /= sizes_new[g];
        }
    }

    // Lowest original observation of each old cluster, for the merge log.
    let mut representative = vec![usize::MAX; c_old];
    for (obs, &cluster) in state.assignments.iter().enumerate() {
        if representative[cluster] == usize::MAX {
            representative[cluster] = obs;
        }
    }

    for g in 0..c_new {
        if merged_from[g] > 1 {
            let reps: Vec<usize> = (0..c_old)
                .filter(|&i| group[i] == g)
                .map(|i| representative[i])
                .collect();
            let members: Vec<usize> = state
                .assignments
                .iter()
                .enumerate()
                .filter(|&(_, &cluster)| group[cluster] == g)
                .map(|(obs, _)| obs)
                .collect();
            state.merges.record(&reps, &members, lambda);
        }
    }

    for cluster in state.assignments.iter_mut() {
        *cluster = group[*cluster];
    }
    state.uwu = uwu_new;
    state.xu = xu_new;
    state.m = m_new;
    state.cluster_sizes = sizes_new;

    debug!(
        lambda,
        clusters_before = c_old,
        clusters_after = c_new,
        "clusters fused"
    );

    true
}
