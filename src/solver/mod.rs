//! Linear system solvers.

pub mod backend;
pub mod bicgstab;
pub mod cpu;
pub mod events;
pub mod parallel;
pub mod partition;
pub mod strategy;

use crate::error::Result;
use crate::system::LinearSystem;

pub use bicgstab::{
    bicgstab, BiCgStabConfig, OmegaCheck, ShadowResidual, SolveOutcome, SolveReport,
};
pub use events::SolverEvent;
pub use strategy::{ExecutionStrategy, StrategyBackend};

/// A solver for linear systems Ax = b.
pub trait LinearSolver {
    /// Solve in place: `system.x` is the starting point and receives the
    /// final iterate.
    fn solve(&self, system: &mut LinearSystem) -> Result<SolveReport>;
}

/// BiCGSTAB bound to a configuration and an execution strategy.
#[derive(Debug, Clone, Default)]
pub struct BiCgStabSolver {
    pub config: BiCgStabConfig,
    pub strategy: ExecutionStrategy,
}

impl BiCgStabSolver {
    pub fn new(config: BiCgStabConfig, strategy: ExecutionStrategy) -> Self {
        Self { config, strategy }
    }
}

impl LinearSolver for BiCgStabSolver {
    fn solve(&self, system: &mut LinearSystem) -> Result<SolveReport> {
        solve_with(system, &self.config, self.strategy)
    }
}

/// Sequential solve with the default shadow residual and omega check.
pub fn solve(
    system: &mut LinearSystem,
    max_iterations: usize,
    tolerance: f64,
) -> Result<SolveReport> {
    solve_with(
        system,
        &BiCgStabConfig::new(max_iterations, tolerance),
        ExecutionStrategy::Sequential,
    )
}

/// Data-parallel solve on a private pool of `workers` threads.
pub fn solve_parallel(
    system: &mut LinearSystem,
    max_iterations: usize,
    tolerance: f64,
    workers: usize,
) -> Result<SolveReport> {
    solve_with(
        system,
        &BiCgStabConfig::new(max_iterations, tolerance),
        ExecutionStrategy::parallel(workers)?,
    )
}

pub fn solve_with(
    system: &mut LinearSystem,
    config: &BiCgStabConfig,
    strategy: ExecutionStrategy,
) -> Result<SolveReport> {
    solve_observed(system, config, strategy, |_| {})
}

/// Like [`solve_with`], forwarding every [`SolverEvent`] to `observer`.
pub fn solve_observed(
    system: &mut LinearSystem,
    config: &BiCgStabConfig,
    strategy: ExecutionStrategy,
    observer: impl FnMut(&SolverEvent),
) -> Result<SolveReport> {
    config.validate()?;
    match StrategyBackend::build(strategy)? {
        StrategyBackend::Sequential(backend) => bicgstab(&backend, system, config, observer),
        StrategyBackend::Parallel(backend) => bicgstab(&backend, system, config, observer),
    }
}
