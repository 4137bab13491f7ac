//! Compressed Sparse Row (CSR) matrix.
//!
//! Square, `f64`-valued, and immutable once built. Every constructor either
//! produces a structurally valid matrix or returns an error, so the solver
//! kernels can index without re-checking the layout.

use crate::error::{Result, StabiloError};

/// Square sparse matrix in Compressed Sparse Row format.
#[derive(Debug, Clone, PartialEq)]
pub struct CsrMatrix {
    n: usize,
    /// Non-zero values, stored row by row.
    values: Vec<f64>,
    /// Column index for each non-zero value.
    col_indices: Vec<usize>,
    /// `row_pointers[i]` is the index into values/col_indices where row i starts.
    /// `row_pointers[n]` = total number of non-zeros.
    row_pointers: Vec<usize>,
}

impl CsrMatrix {
    /// Create an `n x n` matrix with no non-zero entries.
    pub fn new(n: usize) -> Self {
        Self {
            n,
            values: Vec::new(),
            col_indices: Vec::new(),
            row_pointers: vec![0; n + 1],
        }
    }

    /// Build the `n x n` identity matrix.
    pub fn identity(n: usize) -> Self {
        Self {
            n,
            values: vec![1.0; n],
            col_indices: (0..n).collect(),
            row_pointers: (0..=n).collect(),
        }
    }

    /// Adopt already-assembled CSR arrays after checking every structural
    /// invariant. Column order within a row is preserved as given.
    pub fn from_raw_parts(
        n: usize,
        row_pointers: Vec<usize>,
        col_indices: Vec<usize>,
        values: Vec<f64>,
    ) -> Result<Self> {
        if row_pointers.len() != n + 1 {
            return Err(StabiloError::InvalidMatrix(format!(
                "row_ptr has {} entries, expected n + 1 = {}",
                row_pointers.len(),
                n + 1
            )));
        }
        if row_pointers[0] != 0 {
            return Err(StabiloError::InvalidMatrix(format!(
                "row_ptr[0] = {} (expected 0)",
                row_pointers[0]
            )));
        }
        if let Some(pos) = row_pointers.windows(2).position(|w| w[1] < w[0]) {
            return Err(StabiloError::InvalidMatrix(format!(
                "row_ptr decreases at position {}",
                pos + 1
            )));
        }
        if col_indices.len() != values.len() {
            return Err(StabiloError::InvalidMatrix(format!(
                "col_idx has {} entries but values has {}",
                col_indices.len(),
                values.len()
            )));
        }
        if row_pointers[n] != values.len() {
            return Err(StabiloError::InvalidMatrix(format!(
                "row_ptr[n] = {} does not match nnz = {}",
                row_pointers[n],
                values.len()
            )));
        }
        for row in 0..n {
            for idx in row_pointers[row]..row_pointers[row + 1] {
                if col_indices[idx] >= n {
                    return Err(StabiloError::InvalidMatrix(format!(
                        "column index {} out of bounds in row {} (n = {})",
                        col_indices[idx], row, n
                    )));
                }
            }
        }

        Ok(Self {
            n,
            values,
            col_indices,
            row_pointers,
        })
    }

    /// Build an `n x n` matrix from (row, col, value) triplets.
    /// Duplicate entries at the same (row, col) are summed.
    ///
    /// Panics if a triplet lies outside the matrix.
    pub fn from_triplets(n: usize, triplets: &[(usize, usize, f64)]) -> Self {
        if triplets.is_empty() {
            return Self::new(n);
        }
        for &(row, col, _) in triplets {
            assert!(
                row < n && col < n,
                "triplet ({row}, {col}) out of bounds for {n}x{n} matrix"
            );
        }

        let mut indices: Vec<usize> = (0..triplets.len()).collect();
        indices.sort_by_key(|&i| (triplets[i].0, triplets[i].1));

        let mut values = Vec::with_capacity(triplets.len());
        let mut col_indices = Vec::with_capacity(triplets.len());
        let mut row_pointers = vec![0usize; n + 1];

        let first = indices[0];
        let (mut cur_row, mut cur_col, mut cur_val) = triplets[first];

        for &idx in &indices[1..] {
            let (row, col, val) = triplets[idx];
            if row == cur_row && col == cur_col {
                cur_val += val;
            } else {
                values.push(cur_val);
                col_indices.push(cur_col);
                row_pointers[cur_row + 1] += 1;
                cur_row = row;
                cur_col = col;
                cur_val = val;
            }
        }
        values.push(cur_val);
        col_indices.push(cur_col);
        row_pointers[cur_row + 1] += 1;

        // Per-row counts to cumulative offsets
        for i in 1..=n {
            row_pointers[i] += row_pointers[i - 1];
        }

        Self {
            n,
            values,
            col_indices,
            row_pointers,
        }
    }

    /// Matrix dimension.
    pub fn dim(&self) -> usize {
        self.n
    }

    /// Number of non-zero entries.
    pub fn nnz(&self) -> usize {
        self.values.len()
    }

    /// Fraction of stored entries, `nnz / n²`.
    pub fn density(&self) -> f64 {
        if self.n == 0 {
            return 0.0;
        }
        self.nnz() as f64 / (self.n as f64 * self.n as f64)
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn col_indices(&self) -> &[usize] {
        &self.col_indices
    }

    pub fn row_pointers(&self) -> &[usize] {
        &self.row_pointers
    }

    /// Inner product of row `row` with `x`, accumulated in stored column
    /// order. Every matvec implementation goes through this, which is what
    /// keeps sequential and parallel products bit-identical.
    #[inline]
    pub fn row_dot(&self, row: usize, x: &[f64]) -> f64 {
        let mut sum = 0.0;
        for idx in self.row_pointers[row]..self.row_pointers[row + 1] {
            sum += self.values[idx] * x[self.col_indices[idx]];
        }
        sum
    }

    /// Sparse matrix-vector multiply: y = A * x
    pub fn spmv(&self, x: &[f64]) -> Vec<f64> {
        assert_eq!(x.len(), self.n, "spmv dimension mismatch");
        (0..self.n).map(|row| self.row_dot(row, x)).collect()
    }

    /// Convert to dense matrix (row-major). For testing and small matrices only.
    pub fn to_dense(&self) -> Vec<Vec<f64>> {
        let mut dense = vec![vec![0.0; self.n]; self.n];
        for row in 0..self.n {
            for idx in self.row_pointers[row]..self.row_pointers[row + 1] {
                dense[row][self.col_indices[idx]] += self.values[idx];
            }
        }
        dense
    }
}
