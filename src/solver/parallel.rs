//! Data-parallel kernel backend.
//!
//! Each kernel is its own fork-join region on a private rayon pool: the
//! index range is split into one contiguous block per worker, the blocks run
//! concurrently, and the call returns once every block is done. The pool is
//! owned by the backend, so the worker count of one solve never leaks into
//! another solve running in the same process.

use std::num::NonZeroUsize;

use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};

use crate::error::{Result, StabiloError};
use crate::sparse::CsrMatrix;

use super::backend::{check_len, SolverBackend};
use super::partition::RowPartition;
use super::strategy::ExecutionStrategy;

/// Fork-join implementation of `SolverBackend` with a fixed worker count.
#[derive(Debug)]
pub struct ParallelBackend {
    pool: ThreadPool,
    workers: NonZeroUsize,
}

impl ParallelBackend {
    /// Build a backend with its own pool of `workers` threads.
    pub fn new(workers: usize) -> Result<Self> {
        let workers = NonZeroUsize::new(workers).ok_or(StabiloError::InvalidParameter {
            name: "workers",
            value: "0".into(),
            expected: ">= 1",
        })?;
        let pool = ThreadPoolBuilder::new()
            .num_threads(workers.get())
            .thread_name(|i| format!("stabilo-worker-{i}"))
            .build()
            .map_err(|e| StabiloError::ThreadPool(e.to_string()))?;
        Ok(Self { pool, workers })
    }

    pub fn workers(&self) -> usize {
        self.workers.get()
    }

    fn block_len(&self, n: usize) -> usize {
        RowPartition::new(n, self.workers.get()).block_len()
    }
}

impl SolverBackend for ParallelBackend {
    fn strategy(&self) -> ExecutionStrategy {
        ExecutionStrategy::DataParallel {
            workers: self.workers,
        }
    }

    fn spmv(&self, matrix: &CsrMatrix, x: &[f64], y: &mut [f64]) {
        check_len("spmv", x.len(), matrix.dim());
        check_len("spmv", y.len(), matrix.dim());
        let block = self.block_len(y.len());
        self.pool.install(|| {
            y.par_chunks_mut(block)
                .enumerate()
                .for_each(|(k, rows)| {
                    let base = k * block;
                    for (offset, yi) in rows.iter_mut().enumerate() {
                        *yi = matrix.row_dot(base + offset, x);
                    }
                });
        });
    }

    fn dot(&self, x: &[f64], y: &[f64]) -> f64 {
        check_len("dot", x.len(), y.len());
        let block = self.block_len(x.len());
        let partials: Vec<f64> = self.pool.install(|| {
            x.par_chunks(block)
                .zip(y.par_chunks(block))
                .map(|(xs, ys)| {
                    let mut sum = 0.0;
                    for (a, b) in xs.iter().zip(ys) {
                        sum += a * b;
                    }
                    sum
                })
                .collect()
        });
        // Combine in block order so a given worker count always reduces
        // the same way.
        partials.into_iter().fold(0.0, |acc, p| acc + p)
    }

    fn copy(&self, src: &[f64], dst: &mut [f64]) {
        check_len("copy", src.len(), dst.len());
        let block = self.block_len(dst.len());
        self.pool.install(|| {
            dst.par_chunks_mut(block)
                .zip(src.par_chunks(block))
                .for_each(|(d, s)| d.copy_from_slice(s));
        });
    }

    fn scale(&self, alpha: f64, x: &mut [f64]) {
        let block = self.block_len(x.len());
        self.pool.install(|| {
            x.par_chunks_mut(block).for_each(|xs| {
                for xi in xs.iter_mut() {
                    *xi *= alpha;
                }
            });
        });
    }

    fn fill(&self, value: f64, x: &mut [f64]) {
        let block = self.block_len(x.len());
        self.pool.install(|| {
            x.par_chunks_mut(block).for_each(|xs| xs.fill(value));
        });
    }

    fn axpy(&self, alpha: f64, x: &[f64], y: &mut [f64]) {
        check_len("axpy", x.len(), y.len());
        let block = self.block_len(y.len());
        self.pool.install(|| {
            y.par_chunks_mut(block)
                .zip(x.par_chunks(block))
                .for_each(|(ys, xs)| {
                    for (yi, xi) in ys.iter_mut().zip(xs) {
                        *yi += alpha * xi;
                    }
                });
        });
    }

    fn axpby(&self, alpha: f64, x: &[f64], beta: f64, y: &[f64], z: &mut [f64]) {
        check_len("axpby", x.len(), y.len());
        check_len("axpby", x.len(), z.len());
        let block = self.block_len(z.len());
        self.pool.install(|| {
            z.par_chunks_mut(block)
                .zip(x.par_chunks(block))
                .zip(y.par_chunks(block))
                .for_each(|((zs, xs), ys)| {
                    for ((zi, xi), yi) in zs.iter_mut().zip(xs).zip(ys) {
                        *zi = alpha * xi + beta * yi;
                    }
                });
        });
    }
}
