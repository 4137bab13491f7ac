//! Execution strategy selection.
//!
//! An `ExecutionStrategy` is a plain value handed to each solve. It decides
//! which backend the solve builds, and for the data-parallel case it carries
//! the worker count with it instead of relying on any global setting.

use std::fmt;
use std::num::NonZeroUsize;

use serde::Serialize;

use crate::error::{Result, StabiloError};

use super::cpu::SequentialBackend;
use super::parallel::ParallelBackend;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum ExecutionStrategy {
    #[default]
    Sequential,
    DataParallel { workers: NonZeroUsize },
}

impl ExecutionStrategy {
    /// Data-parallel strategy with `workers` threads; zero is rejected.
    pub fn parallel(workers: usize) -> Result<Self> {
        NonZeroUsize::new(workers)
            .map(|workers| Self::DataParallel { workers })
            .ok_or(StabiloError::InvalidParameter {
                name: "workers",
                value: workers.to_string(),
                expected: ">= 1",
            })
    }

    /// Threads used by the kernels (1 for sequential).
    pub fn worker_count(&self) -> usize {
        match self {
            Self::Sequential => 1,
            Self::DataParallel { workers } => workers.get(),
        }
    }

    pub fn is_parallel(&self) -> bool {
        matches!(self, Self::DataParallel { .. })
    }
}

impl fmt::Display for ExecutionStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sequential => write!(f, "sequential"),
            Self::DataParallel { workers } => write!(f, "parallel({workers})"),
        }
    }
}

/// The backend a strategy resolves to for one solve.
#[derive(Debug)]
pub enum StrategyBackend {
    Sequential(SequentialBackend),
    Parallel(ParallelBackend),
}

impl StrategyBackend {
    /// Build the backend for `strategy`. A parallel backend gets a fresh
    /// pool that lives exactly as long as the returned value.
    pub fn build(strategy: ExecutionStrategy) -> Result<Self> {
        match strategy {
            ExecutionStrategy::Sequential => Ok(Self::Sequential(SequentialBackend::new())),
            ExecutionStrategy::DataParallel { workers } => {
                Ok(Self::Parallel(ParallelBackend::new(workers.get())?))
            }
        }
    }
}
