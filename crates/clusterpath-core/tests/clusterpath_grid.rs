//! Grid-mode integration tests: two tight pairs that fuse pairwise at
//! low lambda and collapse into one cluster at high lambda.

use clusterpath_core::{
    clusterpath_grid, sparse_kernel_weights, CancelToken, GridParams, SparseMatrix,
};
use nalgebra::DMatrix;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Four observations forming two tight pairs, large within-pair weight,
/// negligible cross-pair weight bridging the pairs.
fn two_pairs() -> (DMatrix<f64>, SparseMatrix) {
    let x = DMatrix::from_column_slice(2, 4, &[0.0, 0.0, 0.0, 0.01, 5.0, 5.0, 5.0, 5.01]);
    let triplets = [
        (1, 0, 1.0),
        (0, 1, 1.0),
        (2, 1, 0.01),
        (1, 2, 0.01),
        (3, 2, 1.0),
        (2, 3, 1.0),
    ];
    let w = SparseMatrix::from_triplets(4, 4, &triplets);
    (x, w)
}

fn params() -> GridParams {
    GridParams {
        eps_conv: 1e-6,
        eps_fusions: 1e-3,
        scale: false,
        save_clusterpath: true,
        burn_in: 25,
        max_iter: 500,
    }
}

#[test]
fn test_two_pairs_fuse_then_collapse() {
    let (x, w) = two_pairs();
    let lambdas = [0.0, 0.01, 800.0];

    let result = clusterpath_grid(&x, w, &lambdas, &params(), &CancelToken::new());

    assert!(!result.interrupted);
    assert_eq!(result.info.len(), 3);

    // lambda = 0: zero iterations, centroids stay at the data, loss 0.
    assert_eq!(result.info[0].clusters, 4);
    assert_eq!(result.info[0].iterations, 0);
    assert_eq!(result.info[0].loss, 0.0);

    // Low lambda fuses each tight pair; high lambda collapses the rest.
    assert_eq!(result.info[1].clusters, 2);
    assert_eq!(result.info[2].clusters, 1);

    // Cluster counts are non-increasing along an ascending grid.
    for pair in result.info.windows(2) {
        assert!(pair[1].clusters <= pair[0].clusters);
    }

    println!(
        "[PASS] clusters along the path: {:?}",
        result.info.iter().map(|p| p.clusters).collect::<Vec<_>>()
    );
}

#[test]
fn test_merge_table_is_a_valid_hierarchy() {
    let (x, w) = two_pairs();
    let lambdas = [0.0, 0.01, 800.0];

    let result = clusterpath_grid(&x, w, &lambdas, &params(), &CancelToken::new());

    // Exactly n - 1 rows for a full hierarchy.
    assert_eq!(result.merge_table.len(), 3);
    assert_eq!(result.merge_heights.len(), 3);

    // Each pair merged at the low lambda, the final merge at the high one.
    assert_eq!(result.merge_heights[0], 0.01);
    assert_eq!(result.merge_heights[1], 0.01);
    assert_eq!(result.merge_heights[2], 800.0);

    // The leaf ids -1..-4 appear exactly once across all entries.
    let mut leaves: Vec<i32> = result
        .merge_table
        .iter()
        .flatten()
        .copied()
        .filter(|&id| id < 0)
        .collect();
    leaves.sort_unstable();
    assert_eq!(leaves, vec![-4, -3, -2, -1]);

    // Internal node ids are 1-based rows created strictly before use.
    for (row, entry) in result.merge_table.iter().enumerate() {
        for &id in entry {
            if id > 0 {
                assert!(
                    (id as usize) <= row,
                    "row {row} references node {id} before creation"
                );
            }
        }
    }

    // The last merge joins the two pair-nodes.
    assert!(result.merge_table[2].iter().all(|&id| id > 0));
}

#[test]
fn test_clusterpath_snapshots_track_the_centroids() {
    let (x, w) = two_pairs();
    let lambdas = [0.0, 0.01, 800.0];

    let result = clusterpath_grid(&x, w, &lambdas, &params(), &CancelToken::new());
    let snapshots = result.clusterpath.expect("clusterpath requested");

    assert_eq!(snapshots.len(), 3);
    assert_eq!(snapshots[0].shape(), (2, 4));

    // At lambda = 0 the snapshot is the data itself.
    assert_eq!(snapshots[0], x);

    // Fully fused: all observations share one centroid near the mean.
    let last = &snapshots[2];
    for obs in 1..4 {
        assert_eq!(last.column(obs), last.column(0));
    }
    assert!((last[(0, 0)] - 2.5).abs() < 0.05);
    assert!((last[(1, 0)] - 2.505).abs() < 0.05);
}

#[test]
fn test_non_ascending_grid_is_monotone_collapsing() {
    let (x, w) = two_pairs();
    // Descending then re-ascending: fusions are irreversible, so the
    // later small lambdas cannot un-fuse what the first solve collapsed.
    let lambdas = [800.0, 0.01, 0.0, 800.0];

    let result = clusterpath_grid(&x, w, &lambdas, &params(), &CancelToken::new());

    assert!(!result.interrupted);
    assert_eq!(result.info.len(), 4);

    // The first, largest lambda already collapses everything.
    assert_eq!(result.info[0].clusters, 1);
    for pair in result.info.windows(2) {
        assert!(pair[1].clusters <= pair[0].clusters);
    }

    // The whole hierarchy was recorded by the first solve, all at its
    // lambda; the remaining points add nothing to the merge table.
    assert_eq!(result.merge_table.len(), 3);
    assert!(result.merge_heights.iter().all(|&h| h == 800.0));
}

#[test]
fn test_cancelled_token_interrupts_before_recording() {
    let (x, w) = two_pairs();
    let token = CancelToken::new();
    token.cancel();

    let result = clusterpath_grid(&x, w, &[0.01, 800.0], &params(), &token);

    assert!(result.interrupted);
    assert!(result.info.is_empty(), "no point may be recorded");
    assert!(result.merge_table.is_empty());
}

#[test]
fn test_two_blob_hierarchy_with_kernel_weights() {
    // Two jittered blobs of 10 points, weights from the kernel builder:
    // dense within a blob plus one weak bridge edge between them.
    let mut rng = StdRng::seed_from_u64(7);
    let n = 20;
    let mut data = Vec::with_capacity(2 * n);
    for i in 0..n {
        let center = if i < 10 { 0.0 } else { 5.0 };
        data.push(center + rng.gen_range(-0.25..0.25));
        data.push(center + rng.gen_range(-0.25..0.25));
    }
    let x = DMatrix::from_column_slice(2, n, &data);

    let mut neighbors = vec![Vec::new(); n];
    let mut distances = vec![Vec::new(); n];
    for i in 0..n {
        let blob = (i / 10) * 10;
        for j in blob..blob + 10 {
            if j != i {
                neighbors[i].push(j);
                distances[i].push((x.column(i) - x.column(j)).norm());
            }
        }
    }
    // A single bridge keeps the weight graph connected.
    neighbors[9].push(10);
    distances[9].push((x.column(9) - x.column(10)).norm());

    let weights = sparse_kernel_weights(&x, &neighbors, &distances, 0.1, false, false);
    let w = SparseMatrix::from_triplets(n, n, &weights.triplets);

    let lambdas = [0.0, 0.5, 2.0, 1e4];
    let result = clusterpath_grid(&x, w, &lambdas, &params(), &CancelToken::new());

    for pair in result.info.windows(2) {
        assert!(pair[1].clusters <= pair[0].clusters);
    }
    assert_eq!(result.info[0].clusters, n);
    assert_eq!(
        result.info.last().expect("recorded").clusters,
        1,
        "the bridge must eventually pull both blobs together"
    );

    // A full hierarchy: n - 1 merges, every leaf exactly once.
    assert_eq!(result.merge_table.len(), n - 1);
    let mut leaves: Vec<i32> = result
        .merge_table
        .iter()
        .flatten()
        .copied()
        .filter(|&id| id < 0)
        .collect();
    leaves.sort_unstable();
    let expected: Vec<i32> = (1..=n as i32).map(|i| -i).rev().collect();
    assert_eq!(leaves, expected);

    // Heights never decrease along an ascending-lambda path.
    for pair in result.merge_heights.windows(2) {
        assert!(pair[1] >= pair[0]);
    }

    println!(
        "[PASS] blob hierarchy complete: {} merges, final loss {:.6}",
        result.merge_table.len(),
        result.info.last().expect("recorded").loss
    );
}
