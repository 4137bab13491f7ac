//! Index-range partitioning for the data-parallel kernels.
//!
//! Splits `0..n` into at most `workers` contiguous blocks of equal length
//! (the last block may be shorter). Each fork-join region hands one block to
//! each worker, so the blocks double as the reduction order for dot products.

/// Contiguous block partition of `0..n`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowPartition {
    block_len: usize,
}

impl RowPartition {
    /// Partition `n` indices across `workers` (treated as at least 1).
    pub fn new(n: usize, workers: usize) -> Self {
        let workers = workers.max(1);
        // Never zero: chunking APIs reject a zero block length.
        let block_len = n.div_ceil(workers).max(1);
        Self { block_len }
    }

    /// Length of every block except possibly the last.
    pub fn block_len(&self) -> usize {
        self.block_len
    }
}
