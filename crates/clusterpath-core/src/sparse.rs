//! Compressed sparse column matrices.
//!
//! The weight matrix W and its cluster-level contraction UWU are the
//! only sparse structures in the solver, and both are only ever read
//! column by column over their sparsity pattern. A minimal CSC layout
//! keeps those scans allocation-free.

/// Column-compressed sparse `f64` matrix.
///
/// Storage is the classic CSC triple: `col_ptr` (length `ncols + 1`)
/// delimits each column's slice of `row_ind` / `values`, with row
/// indices ascending within a column.
#[derive(Debug, Clone, PartialEq)]
pub struct SparseMatrix {
    nrows: usize,
    ncols: usize,
    col_ptr: Vec<usize>,
    row_ind: Vec<usize>,
    values: Vec<f64>,
}

impl SparseMatrix {
    /// Build from `(row, col, value)` triplets.
    ///
    /// The triplets must already be column-major sorted with unique
    /// `(row, col)` keys; this is a precondition, not a validated
    /// property. Duplicate keys are a caller error and the resulting
    /// matrix is unspecified (they are not summed).
    pub fn from_triplets(nrows: usize, ncols: usize, triplets: &[(usize, usize, f64)]) -> Self {
        let mut col_ptr = vec![0usize; ncols + 1];
        let mut row_ind = Vec::with_capacity(triplets.len());
        let mut values = Vec::with_capacity(triplets.len());

        for &(row, col, value) in triplets {
            col_ptr[col + 1] += 1;
            row_ind.push(row);
            values.push(value);
        }
        for j in 0..ncols {
            col_ptr[j + 1] += col_ptr[j];
        }

        Self {
            nrows,
            ncols,
            col_ptr,
            row_ind,
            values,
        }
    }

    /// Build from unsorted triplets, summing duplicate keys.
    ///
    /// Used for the cluster-level contraction G^T (UWU) G, where many
    /// old-cluster entries fold onto the same new-cluster key.
    pub fn from_triplets_summed(
        nrows: usize,
        ncols: usize,
        mut triplets: Vec<(usize, usize, f64)>,
    ) -> Self {
        triplets.sort_unstable_by(|a, b| (a.1, a.0).cmp(&(b.1, b.0)));

        let mut merged: Vec<(usize, usize, f64)> = Vec::with_capacity(triplets.len());
        for (row, col, value) in triplets {
            match merged.last_mut() {
                Some(last) if last.0 == row && last.1 == col => last.2 += value,
                _ => merged.push((row, col, value)),
            }
        }

        Self::from_triplets(nrows, ncols, &merged)
    }

    /// The n x n identity.
    pub fn identity(n: usize) -> Self {
        Self {
            nrows: n,
            ncols: n,
            col_ptr: (0..=n).collect(),
            row_ind: (0..n).collect(),
            values: vec![1.0; n],
        }
    }

    /// Number of rows.
    pub fn nrows(&self) -> usize {
        self.nrows
    }

    /// Number of columns.
    pub fn ncols(&self) -> usize {
        self.ncols
    }

    /// Number of stored entries.
    pub fn nnz(&self) -> usize {
        self.values.len()
    }

    /// Sum of all stored values.
    pub fn sum(&self) -> f64 {
        self.values.iter().sum()
    }

    /// Stored entries of column `j` as `(row, value)` pairs, row-ascending.
    pub fn col(&self, j: usize) -> impl Iterator<Item = (usize, f64)> + '_ {
        let range = self.col_ptr[j]..self.col_ptr[j + 1];
        self.row_ind[range.clone()]
            .iter()
            .copied()
            .zip(self.values[range].iter().copied())
    }

    /// Value at `(row, col)`, zero when not stored.
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.col(col)
            .find(|&(r, _)| r == row)
            .map(|(_, v)| v)
            .unwrap_or(0.0)
    }
}
