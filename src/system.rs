//! A linear system `Ax = b` with its in-place solution vector.

use crate::error::{Result, StabiloError};
use crate::sparse::CsrMatrix;

/// Owns the matrix, the right-hand side, and the solution vector the solver
/// updates in place.
#[derive(Debug, Clone)]
pub struct LinearSystem {
    pub(crate) a: CsrMatrix,
    pub(crate) b: Vec<f64>,
    pub(crate) x: Vec<f64>,
}

impl LinearSystem {
    /// Pair `a` with `b`; the solution starts at zero.
    pub fn new(a: CsrMatrix, b: Vec<f64>) -> Result<Self> {
        let n = a.dim();
        if b.len() != n {
            return Err(StabiloError::DimensionMismatch(format!(
                "matrix is {n}x{n}, rhs length is {}",
                b.len()
            )));
        }
        Ok(Self {
            a,
            b,
            x: vec![0.0; n],
        })
    }

    /// Replace the starting point of the next solve.
    pub fn with_initial_guess(mut self, x0: Vec<f64>) -> Result<Self> {
        if x0.len() != self.a.dim() {
            return Err(StabiloError::DimensionMismatch(format!(
                "initial guess length {} does not match dimension {}",
                x0.len(),
                self.a.dim()
            )));
        }
        self.x = x0;
        Ok(self)
    }

    pub fn dim(&self) -> usize {
        self.a.dim()
    }

    pub fn matrix(&self) -> &CsrMatrix {
        &self.a
    }

    pub fn rhs(&self) -> &[f64] {
        &self.b
    }

    pub fn solution(&self) -> &[f64] {
        &self.x
    }

    /// Zero the solution vector so the next solve starts from `x = 0`.
    pub fn reset_solution(&mut self) {
        self.x.fill(0.0);
    }

    /// True residual `||b - A*x||`, recomputed from scratch.
    pub fn residual_norm(&self) -> f64 {
        let ax = self.a.spmv(&self.x);
        self.b
            .iter()
            .zip(&ax)
            .map(|(bi, axi)| (bi - axi) * (bi - axi))
            .sum::<f64>()
            .sqrt()
    }

    /// `||b - A*x|| / ||b||`, with a zero `||b||` treated as 1.
    pub fn relative_residual(&self) -> f64 {
        let b_norm = self.b.iter().map(|v| v * v).sum::<f64>().sqrt();
        let b_norm = if b_norm == 0.0 { 1.0 } else { b_norm };
        self.residual_norm() / b_norm
    }
}
