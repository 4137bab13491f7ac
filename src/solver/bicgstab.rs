//! Generic BiCGSTAB iterative solver.
//!
//! Implements unpreconditioned BiCGSTAB written against the `SolverBackend`
//! trait, so the same state machine runs on the sequential and the
//! data-parallel kernels.
//!
//! Two deliberate departures from the textbook method:
//!
//! * The shadow residual defaults to the constant vector of ones rather than
//!   `r0 = r`. With Dirichlet identity rows the support of `r` moves between
//!   iterations and `dot(r0, r)` collapses when `r0` is seeded from the first
//!   residual. [`ShadowResidual::InitialResidual`] restores the textbook
//!   choice.
//! * The omega breakdown test runs after `x` and `r` have already been
//!   updated with that omega ([`OmegaCheck::AfterUpdate`]).
//!   [`OmegaCheck::BeforeUpdate`] checks first and leaves `x` untouched.

use std::fmt;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::error::{Result, StabiloError};
use crate::system::LinearSystem;

use super::backend::SolverBackend;
use super::events::SolverEvent;
use super::strategy::ExecutionStrategy;

const MAX_ITERATIONS: usize = 10_000;
const TOLERANCE: f64 = 1e-8;

/// |rho| or |omega| below this ends the solve with a breakdown.
pub const BREAKDOWN_THRESHOLD: f64 = 1e-30;

/// How the fixed shadow residual `r0` is seeded.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum ShadowResidual {
    /// Every entry set to the given value.
    Constant(f64),
    /// Textbook choice: a copy of the initial residual.
    InitialResidual,
}

impl Default for ShadowResidual {
    fn default() -> Self {
        Self::Constant(1.0)
    }
}

impl ShadowResidual {
    fn seed<B: SolverBackend>(&self, backend: &B, r: &[f64], r0: &mut [f64]) {
        match *self {
            Self::Constant(value) => backend.fill(value, r0),
            Self::InitialResidual => backend.copy(r, r0),
        }
    }
}

/// Where the omega breakdown test sits relative to the x/r update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum OmegaCheck {
    #[default]
    AfterUpdate,
    BeforeUpdate,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BiCgStabConfig {
    pub max_iterations: usize,
    /// Relative tolerance on `||r|| / ||b||`.
    pub tolerance: f64,
    pub shadow: ShadowResidual,
    pub omega_check: OmegaCheck,
}

impl Default for BiCgStabConfig {
    fn default() -> Self {
        Self {
            max_iterations: MAX_ITERATIONS,
            tolerance: TOLERANCE,
            shadow: ShadowResidual::default(),
            omega_check: OmegaCheck::default(),
        }
    }
}

impl BiCgStabConfig {
    pub fn new(max_iterations: usize, tolerance: f64) -> Self {
        Self {
            max_iterations,
            tolerance,
            ..Self::default()
        }
    }

    pub fn with_shadow(mut self, shadow: ShadowResidual) -> Self {
        self.shadow = shadow;
        self
    }

    pub fn with_omega_check(mut self, omega_check: OmegaCheck) -> Self {
        self.omega_check = omega_check;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_iterations == 0 {
            return Err(StabiloError::InvalidParameter {
                name: "max_iterations",
                value: "0".into(),
                expected: ">= 1",
            });
        }
        if !self.tolerance.is_finite() || self.tolerance <= 0.0 {
            return Err(StabiloError::InvalidParameter {
                name: "tolerance",
                value: self.tolerance.to_string(),
                expected: "positive finite value",
            });
        }
        if let ShadowResidual::Constant(value) = self.shadow {
            if !value.is_finite() || value == 0.0 {
                return Err(StabiloError::InvalidParameter {
                    name: "shadow",
                    value: value.to_string(),
                    expected: "non-zero finite value",
                });
            }
        }
        Ok(())
    }
}

/// How a solve ended.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum SolveOutcome {
    Converged { iterations: usize, residual: f64 },
    RhoBreakdown { iteration: usize },
    OmegaBreakdown { iteration: usize },
    MaxIterExceeded { residual: f64 },
}

impl SolveOutcome {
    pub fn is_converged(&self) -> bool {
        matches!(self, Self::Converged { .. })
    }

    /// Iteration count for a converged solve.
    pub fn iterations(&self) -> Option<usize> {
        match *self {
            Self::Converged { iterations, .. } => Some(iterations),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Converged { .. } => "converged",
            Self::RhoBreakdown { .. } => "rho-breakdown",
            Self::OmegaBreakdown { .. } => "omega-breakdown",
            Self::MaxIterExceeded { .. } => "max-iter-exceeded",
        }
    }
}

impl fmt::Display for SolveOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Converged {
                iterations,
                residual,
            } => write!(f, "converged at iteration {iterations} (residual {residual:.2e})"),
            Self::RhoBreakdown { iteration } => write!(f, "rho breakdown at iteration {iteration}"),
            Self::OmegaBreakdown { iteration } => {
                write!(f, "omega breakdown at iteration {iteration}")
            }
            Self::MaxIterExceeded { residual } => {
                write!(f, "did not converge (residual {residual:.2e})")
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolveReport {
    pub outcome: SolveOutcome,
    /// Wall-clock time of the iteration, workspace allocation excluded.
    pub elapsed: Duration,
    pub strategy: ExecutionStrategy,
}

/// Scratch vectors for one solve. Dropped on every exit path.
struct Workspace {
    r: Vec<f64>,
    r0: Vec<f64>,
    p: Vec<f64>,
    v: Vec<f64>,
    s: Vec<f64>,
    t: Vec<f64>,
}

impl Workspace {
    fn new<B: SolverBackend>(backend: &B, n: usize) -> Self {
        Self {
            r: backend.new_buffer(n),
            r0: backend.new_buffer(n),
            p: backend.new_buffer(n),
            v: backend.new_buffer(n),
            s: backend.new_buffer(n),
            t: backend.new_buffer(n),
        }
    }
}

fn finish(
    outcome: SolveOutcome,
    event: SolverEvent,
    start: Instant,
    strategy: ExecutionStrategy,
    observer: &mut impl FnMut(&SolverEvent),
) -> SolveReport {
    let elapsed = start.elapsed();
    event.trace();
    observer(&event);
    SolveReport {
        outcome,
        elapsed,
        strategy,
    }
}

/// Solve `Ax = b` in place using BiCGSTAB.
///
/// `system.x` is the starting point (usually zero) and holds the final
/// iterate on return, whatever the outcome. `observer` receives one event
/// per completed iteration plus one terminal event.
pub fn bicgstab<B: SolverBackend>(
    backend: &B,
    system: &mut LinearSystem,
    config: &BiCgStabConfig,
    mut observer: impl FnMut(&SolverEvent),
) -> Result<SolveReport> {
    config.validate()?;

    let a = &system.a;
    let b = &system.b;
    let x = &mut system.x;
    let n = a.dim();
    let tol = config.tolerance;
    let strategy = backend.strategy();

    let _span = tracing::debug_span!("bicgstab", n, nnz = a.nnz(), %strategy).entered();

    let mut ws = Workspace::new(backend, n);
    let start = Instant::now();

    // r = b - A*x, with t as scratch for A*x
    backend.spmv(a, x, &mut ws.t);
    backend.axpby(1.0, b, -1.0, &ws.t, &mut ws.r);

    config.shadow.seed(backend, &ws.r, &mut ws.r0);
    backend.copy(&ws.r, &mut ws.p);

    let mut rho: f64 = 1.0;
    let mut alpha: f64 = 1.0;
    let mut omega: f64 = 1.0;

    let b_norm = backend.norm(b);
    let b_norm = if b_norm == 0.0 { 1.0 } else { b_norm };

    // Starting point already solves the system (b = 0 with x = 0, say).
    let initial = backend.norm(&ws.r) / b_norm;
    if initial < tol {
        return Ok(finish(
            SolveOutcome::Converged {
                iterations: 0,
                residual: initial,
            },
            SolverEvent::Converged {
                iteration: 0,
                residual: initial,
            },
            start,
            strategy,
            &mut observer,
        ));
    }

    for iter in 0..config.max_iterations {
        let rho_prev = rho;
        rho = backend.dot(&ws.r0, &ws.r);
        if rho.abs() < BREAKDOWN_THRESHOLD {
            return Ok(finish(
                SolveOutcome::RhoBreakdown { iteration: iter },
                SolverEvent::RhoBreakdown {
                    iteration: iter,
                    rho,
                },
                start,
                strategy,
                &mut observer,
            ));
        }

        if iter == 0 {
            backend.copy(&ws.r, &mut ws.p);
        } else {
            let beta = (rho / rho_prev) * (alpha / omega);
            // p = r + beta * (p - omega * v)
            backend.axpy(-omega, &ws.v, &mut ws.p);
            backend.scale(beta, &mut ws.p);
            backend.axpy(1.0, &ws.r, &mut ws.p);
        }

        // v = A * p
        backend.spmv(a, &ws.p, &mut ws.v);

        alpha = rho / backend.dot(&ws.r0, &ws.v);

        // s = r - alpha * v
        backend.axpby(1.0, &ws.r, -alpha, &ws.v, &mut ws.s);

        let s_rel = backend.norm(&ws.s) / b_norm;
        if s_rel < tol {
            backend.axpy(alpha, &ws.p, x);
            return Ok(finish(
                SolveOutcome::Converged {
                    iterations: iter,
                    residual: s_rel,
                },
                SolverEvent::Converged {
                    iteration: iter,
                    residual: s_rel,
                },
                start,
                strategy,
                &mut observer,
            ));
        }

        // t = A * s
        backend.spmv(a, &ws.s, &mut ws.t);

        omega = backend.dot(&ws.t, &ws.s) / backend.dot(&ws.t, &ws.t);

        let omega_degenerate = omega.abs() < BREAKDOWN_THRESHOLD;
        if omega_degenerate && config.omega_check == OmegaCheck::BeforeUpdate {
            return Ok(finish(
                SolveOutcome::OmegaBreakdown { iteration: iter },
                SolverEvent::OmegaBreakdown {
                    iteration: iter,
                    omega,
                },
                start,
                strategy,
                &mut observer,
            ));
        }

        // x = x + alpha * p + omega * s
        backend.axpy(alpha, &ws.p, x);
        backend.axpy(omega, &ws.s, x);

        // r = s - omega * t
        backend.axpby(1.0, &ws.s, -omega, &ws.t, &mut ws.r);

        let r_rel = backend.norm(&ws.r) / b_norm;
        if r_rel < tol {
            return Ok(finish(
                SolveOutcome::Converged {
                    iterations: iter + 1,
                    residual: r_rel,
                },
                SolverEvent::Converged {
                    iteration: iter + 1,
                    residual: r_rel,
                },
                start,
                strategy,
                &mut observer,
            ));
        }

        if omega_degenerate {
            return Ok(finish(
                SolveOutcome::OmegaBreakdown { iteration: iter },
                SolverEvent::OmegaBreakdown {
                    iteration: iter,
                    omega,
                },
                start,
                strategy,
                &mut observer,
            ));
        }

        let event = SolverEvent::IterationCompleted {
            iteration: iter,
            residual: r_rel,
        };
        event.trace();
        observer(&event);
    }

    let residual = backend.norm(&ws.r) / b_norm;
    Ok(finish(
        SolveOutcome::MaxIterExceeded { residual },
        SolverEvent::NotConverged {
            max_iterations: config.max_iterations,
            residual,
        },
        start,
        strategy,
        &mut observer,
    ))
}
