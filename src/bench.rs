//! Serial vs data-parallel benchmark over Laplace grids.
//!
//! For each grid the system is assembled once and solved sequentially, then
//! once per worker count, always from `x = 0`. A parallel run reports speedup
//! and efficiency against the sequential run only when both converged.

use std::time::Duration;

use serde::Serialize;

use crate::error::{Result, StabiloError};
use crate::grid::{BoundaryValues, LaplaceGrid};
use crate::solver::{self, BiCgStabConfig, ExecutionStrategy, SolveOutcome};
use crate::system::LinearSystem;

#[derive(Debug, Clone, PartialEq)]
pub struct BenchmarkPlan {
    /// `(nx, ny)` node counts.
    pub grids: Vec<(usize, usize)>,
    pub thread_counts: Vec<usize>,
    pub boundary: BoundaryValues,
    pub config: BiCgStabConfig,
}

impl Default for BenchmarkPlan {
    fn default() -> Self {
        Self {
            grids: vec![(10, 10), (14, 14), (20, 20)],
            thread_counts: vec![2, 4, 8],
            boundary: BoundaryValues::default(),
            config: BiCgStabConfig::default(),
        }
    }
}

/// One solve of one grid.
#[derive(Debug, Clone, Serialize)]
pub struct RunRecord {
    pub strategy: ExecutionStrategy,
    pub outcome: SolveOutcome,
    pub elapsed: Duration,
    /// `||b - A*x||` recomputed after the solve.
    pub true_residual: f64,
    pub speedup: Option<f64>,
    pub efficiency_pct: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GridBenchmark {
    pub nx: usize,
    pub ny: usize,
    pub nodes: usize,
    pub nnz: usize,
    /// `nnz / n²` of the assembled matrix.
    pub density: f64,
    pub serial: RunRecord,
    pub parallel: Vec<RunRecord>,
}

impl RunRecord {
    /// Fill speedup and efficiency against `serial`. Left empty unless both
    /// runs converged.
    fn compare_to(&mut self, serial: &RunRecord) {
        let secs = self.elapsed.as_secs_f64();
        if !(serial.outcome.is_converged() && self.outcome.is_converged()) || secs <= 0.0 {
            return;
        }
        let speedup = serial.elapsed.as_secs_f64() / secs;
        self.speedup = Some(speedup);
        self.efficiency_pct = Some(speedup / self.strategy.worker_count() as f64 * 100.0);
    }
}

impl GridBenchmark {
    /// Sequential run followed by the parallel runs.
    pub fn records(&self) -> impl Iterator<Item = &RunRecord> {
        std::iter::once(&self.serial).chain(&self.parallel)
    }
}

/// Results plus the settings that produced them.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BenchmarkReport {
    pub config: BiCgStabConfig,
    pub boundary: BoundaryValues,
    pub runs: Vec<GridBenchmark>,
}

impl BenchmarkPlan {
    pub fn validate(&self) -> Result<()> {
        self.config.validate()?;
        if self.grids.is_empty() {
            return Err(StabiloError::InvalidParameter {
                name: "grids",
                value: "[]".into(),
                expected: "at least one grid",
            });
        }
        for &(nx, ny) in &self.grids {
            LaplaceGrid::new(nx, ny)?;
        }
        for &workers in &self.thread_counts {
            ExecutionStrategy::parallel(workers)?;
        }
        Ok(())
    }

    pub fn run(&self) -> Result<BenchmarkReport> {
        self.validate()?;
        let mut report = BenchmarkReport {
            config: self.config.clone(),
            boundary: self.boundary,
            runs: Vec::with_capacity(self.grids.len()),
        };
        for &(nx, ny) in &self.grids {
            report.runs.push(self.run_grid(nx, ny)?);
        }
        Ok(report)
    }

    fn run_grid(&self, nx: usize, ny: usize) -> Result<GridBenchmark> {
        let _span = tracing::info_span!("grid", nx, ny).entered();
        let mut system = LaplaceGrid::new(nx, ny)?
            .with_boundary(self.boundary)
            .assemble()?;

        let serial = self.timed_solve(&mut system, ExecutionStrategy::Sequential)?;

        let mut parallel = Vec::with_capacity(self.thread_counts.len());
        for &workers in &self.thread_counts {
            let strategy = ExecutionStrategy::parallel(workers)?;
            let mut record = self.timed_solve(&mut system, strategy)?;
            record.compare_to(&serial);
            parallel.push(record);
        }

        Ok(GridBenchmark {
            nx,
            ny,
            nodes: system.dim(),
            nnz: system.matrix().nnz(),
            density: system.matrix().density(),
            serial,
            parallel,
        })
    }

    fn timed_solve(
        &self,
        system: &mut LinearSystem,
        strategy: ExecutionStrategy,
    ) -> Result<RunRecord> {
        system.reset_solution();
        let report = solver::solve_with(system, &self.config, strategy)?;
        let true_residual = system.residual_norm();
        tracing::info!(
            %strategy,
            outcome = %report.outcome,
            elapsed_s = report.elapsed.as_secs_f64(),
            true_residual,
            "solve finished"
        );
        Ok(RunRecord {
            strategy,
            outcome: report.outcome,
            elapsed: report.elapsed,
            true_residual,
            speedup: None,
            efficiency_pct: None,
        })
    }
}
