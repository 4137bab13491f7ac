//! Linear-element Laplace system on the unit square.
//!
//! Assembles the discretized 2D Laplace problem on an `nx` by `ny` node grid
//! with Dirichlet values on the four sides. Boundary nodes become identity
//! rows; interior nodes carry a five-point stencil.

use serde::Serialize;

use crate::error::{Result, StabiloError};
use crate::sparse::CsrMatrix;
use crate::system::LinearSystem;

/// Dirichlet values per side of the unit square.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BoundaryValues {
    pub bottom: f64,
    pub right: f64,
    pub top: f64,
    pub left: f64,
}

impl Default for BoundaryValues {
    fn default() -> Self {
        Self {
            bottom: 0.0,
            right: 0.0,
            top: 1.0,
            left: 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Bottom,
    Right,
    Top,
    Left,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Boundary(Side),
    Interior,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LaplaceGrid {
    nx: usize,
    ny: usize,
    boundary: BoundaryValues,
}

impl LaplaceGrid {
    pub fn new(nx: usize, ny: usize) -> Result<Self> {
        for (name, value) in [("nx", nx), ("ny", ny)] {
            if value < 2 {
                return Err(StabiloError::InvalidParameter {
                    name,
                    value: value.to_string(),
                    expected: ">= 2",
                });
            }
        }
        Ok(Self {
            nx,
            ny,
            boundary: BoundaryValues::default(),
        })
    }

    pub fn with_boundary(mut self, boundary: BoundaryValues) -> Self {
        self.boundary = boundary;
        self
    }

    pub fn nx(&self) -> usize {
        self.nx
    }

    pub fn ny(&self) -> usize {
        self.ny
    }

    pub fn nodes(&self) -> usize {
        self.nx * self.ny
    }

    /// Row index of node `(i, j)`, `i < ny`, `j < nx`.
    pub fn node_index(&self, i: usize, j: usize) -> usize {
        i * self.nx + j
    }

    /// Corners resolve in the order bottom, right, top, left.
    pub fn classify(&self, i: usize, j: usize) -> NodeKind {
        if j == 0 {
            NodeKind::Boundary(Side::Bottom)
        } else if i == self.ny - 1 {
            NodeKind::Boundary(Side::Right)
        } else if j == self.nx - 1 {
            NodeKind::Boundary(Side::Top)
        } else if i == 0 {
            NodeKind::Boundary(Side::Left)
        } else {
            NodeKind::Interior
        }
    }

    fn boundary_value(&self, side: Side) -> f64 {
        match side {
            Side::Bottom => self.boundary.bottom,
            Side::Right => self.boundary.right,
            Side::Top => self.boundary.top,
            Side::Left => self.boundary.left,
        }
    }

    /// Build `A`, `b` and a zero `x`.
    ///
    /// Interior rows keep stencil order (west, south, self, north, east)
    /// rather than sorted column order.
    pub fn assemble(&self) -> Result<LinearSystem> {
        let n = self.nodes();
        let hx = 1.0 / (self.nx - 1) as f64;
        let hy = 1.0 / (self.ny - 1) as f64;
        let k_diag = (hy / hx + hx / hy) / 3.0;
        let k_ns = -(hy / hx) / 6.0;
        let k_ew = -(hx / hy) / 6.0;

        let interior = (self.nx - 2) * (self.ny - 2);
        let nnz = (n - interior) + 5 * interior;

        let mut row_pointers = Vec::with_capacity(n + 1);
        let mut col_indices = Vec::with_capacity(nnz);
        let mut values = Vec::with_capacity(nnz);
        let mut b = vec![0.0; n];

        row_pointers.push(0);
        for i in 0..self.ny {
            for j in 0..self.nx {
                let idx = self.node_index(i, j);
                match self.classify(i, j) {
                    NodeKind::Boundary(side) => {
                        col_indices.push(idx);
                        values.push(1.0);
                        b[idx] = self.boundary_value(side);
                    }
                    NodeKind::Interior => {
                        let stencil = [
                            (self.node_index(i, j - 1), k_ew),
                            (self.node_index(i - 1, j), k_ns),
                            (idx, k_diag),
                            (self.node_index(i + 1, j), k_ns),
                            (self.node_index(i, j + 1), k_ew),
                        ];
                        for (col, value) in stencil {
                            col_indices.push(col);
                            values.push(value);
                        }
                    }
                }
                row_pointers.push(col_indices.len());
            }
        }

        tracing::debug!(nx = self.nx, ny = self.ny, n, nnz, "assembled Laplace system");

        let a = CsrMatrix::from_raw_parts(n, row_pointers, col_indices, values)?;
        LinearSystem::new(a, b)
    }
}
