//! Kernel backend abstraction for the iterative solver.
//!
//! Defines the `SolverBackend` trait: the vector kernels and the sparse
//! matrix-vector product that BiCGSTAB is written against. The sequential
//! and data-parallel backends implement the same mathematical contract, so
//! the solver never needs to know which one it is driving.

use crate::sparse::CsrMatrix;

use super::strategy::ExecutionStrategy;

/// Vector kernels plus SpMV over `f64` slices.
///
/// Every method panics when the slice lengths disagree; a mismatch is a bug
/// in the caller, never a runtime condition.
pub trait SolverBackend {
    /// The execution strategy this backend realises.
    fn strategy(&self) -> ExecutionStrategy;

    /// Sparse matrix-vector multiply: y = A * x (y fully overwritten)
    fn spmv(&self, matrix: &CsrMatrix, x: &[f64], y: &mut [f64]);

    /// Dot product: x . y
    fn dot(&self, x: &[f64], y: &[f64]) -> f64;

    /// Copy: dst = src
    fn copy(&self, src: &[f64], dst: &mut [f64]);

    /// Scale: x = alpha * x (in-place)
    fn scale(&self, alpha: f64, x: &mut [f64]);

    /// Fill: x[i] = value for every i
    fn fill(&self, value: f64, x: &mut [f64]);

    /// AXPY: y = alpha * x + y (in-place on y)
    fn axpy(&self, alpha: f64, x: &[f64], y: &mut [f64]);

    /// AXPBY: z = alpha * x + beta * y
    fn axpby(&self, alpha: f64, x: &[f64], beta: f64, y: &[f64], z: &mut [f64]);

    /// Euclidean norm: sqrt(x . x)
    fn norm(&self, x: &[f64]) -> f64 {
        self.dot(x, x).sqrt()
    }

    /// Create a new zero-initialized buffer of size n.
    fn new_buffer(&self, n: usize) -> Vec<f64> {
        vec![0.0; n]
    }
}

#[inline]
pub(crate) fn check_len(op: &str, a: usize, b: usize) {
    assert_eq!(a, b, "{op}: length mismatch ({a} vs {b})");
}
