//! Merge table construction.
//!
//! Fusion events arrive as simultaneous k-way merges; standard
//! dendrogram consumers expect binary merges. A k-way fusion is
//! decomposed into k-1 sequential binary merges, chaining the
//! representatives (lowest original observation index of each previous
//! cluster) in ascending old-cluster order, so the resulting table is
//! deterministic for a given fusion sequence.

/// Node labels, merge rows and merge heights of the growing hierarchy.
///
/// Labels follow the standard agglomerative encoding: a negative label
/// `-(i + 1)` denotes the leaf for observation `i`, a positive label is
/// the 1-based row index of the merge-table entry that created the
/// internal node.
#[derive(Debug, Clone, PartialEq)]
pub struct MergeLog {
    /// Current node label of each original observation.
    labels: Vec<i32>,
    /// Binary merge rows, at most n - 1 of them over a full hierarchy.
    table: Vec<[i32; 2]>,
    /// Lambda at which each merge occurred.
    heights: Vec<f64>,
}

impl MergeLog {
    /// A log over `n` observations with every observation its own leaf.
    pub fn new(n: usize) -> Self {
        Self {
            labels: (0..n).map(|i| -(i as i32) - 1).collect(),
            table: Vec::with_capacity(n.saturating_sub(1)),
            heights: Vec::with_capacity(n.saturating_sub(1)),
        }
    }

    /// Record one k-way fusion at height `lambda`.
    ///
    /// `representatives` holds the lowest original observation index of
    /// each previous cluster, in ascending old-cluster order; `members`
    /// holds every original observation belonging to any of them. After
    /// the chained binary merges, all members are relabeled to the
    /// final internal node so later fusions involving any member
    /// resolve to the correct subtree.
    pub(crate) fn record(&mut self, representatives: &[usize], members: &[usize], lambda: f64) {
        debug_assert!(representatives.len() > 1, "fusion must involve >= 2 clusters");

        for k in 1..representatives.len() {
            let left = self.labels[representatives[k - 1]];
            let right = self.labels[representatives[k]];

            self.table.push([left, right]);
            self.heights.push(lambda);

            // 1-based id of the internal node this row created.
            let node = self.table.len() as i32;
            self.labels[representatives[k - 1]] = node;
            self.labels[representatives[k]] = node;
        }

        let node = self.table.len() as i32;
        for &obs in members {
            self.labels[obs] = node;
        }
    }

    /// Number of merge rows recorded so far.
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Whether no merge has been recorded yet.
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Recorded merge rows.
    pub fn table(&self) -> &[[i32; 2]] {
        &self.table
    }

    /// Lambda of each recorded merge.
    pub fn heights(&self) -> &[f64] {
        &self.heights
    }
}
