//! Sequential kernel backend.
//!
//! Plain single-threaded loops. Fully deterministic, and the reference the
//! data-parallel backend is measured against.

use crate::sparse::CsrMatrix;

use super::backend::{check_len, SolverBackend};
use super::strategy::ExecutionStrategy;

/// Single-threaded implementation of `SolverBackend`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SequentialBackend;

impl SequentialBackend {
    pub fn new() -> Self {
        Self
    }
}

impl SolverBackend for SequentialBackend {
    fn strategy(&self) -> ExecutionStrategy {
        ExecutionStrategy::Sequential
    }

    fn spmv(&self, matrix: &CsrMatrix, x: &[f64], y: &mut [f64]) {
        check_len("spmv", x.len(), matrix.dim());
        check_len("spmv", y.len(), matrix.dim());
        for (row, yi) in y.iter_mut().enumerate() {
            *yi = matrix.row_dot(row, x);
        }
    }

    fn dot(&self, x: &[f64], y: &[f64]) -> f64 {
        check_len("dot", x.len(), y.len());
        let mut sum = 0.0;
        for (a, b) in x.iter().zip(y) {
            sum += a * b;
        }
        sum
    }

    fn copy(&self, src: &[f64], dst: &mut [f64]) {
        check_len("copy", src.len(), dst.len());
        dst.copy_from_slice(src);
    }

    fn scale(&self, alpha: f64, x: &mut [f64]) {
        for xi in x.iter_mut() {
            *xi *= alpha;
        }
    }

    fn fill(&self, value: f64, x: &mut [f64]) {
        x.fill(value);
    }

    fn axpy(&self, alpha: f64, x: &[f64], y: &mut [f64]) {
        check_len("axpy", x.len(), y.len());
        for (yi, xi) in y.iter_mut().zip(x) {
            *yi += alpha * xi;
        }
    }

    fn axpby(&self, alpha: f64, x: &[f64], beta: f64, y: &[f64], z: &mut [f64]) {
        check_len("axpby", x.len(), y.len());
        check_len("axpby", x.len(), z.len());
        for ((zi, xi), yi) in z.iter_mut().zip(x).zip(y) {
            *zi = alpha * xi + beta * yi;
        }
    }
}
