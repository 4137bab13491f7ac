//! Structured diagnostic events emitted by the solver.
//!
//! Every terminal state produces exactly one event, and every completed
//! iteration produces an `IterationCompleted`. Events go to the caller's
//! observer and are mirrored to `tracing`.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum SolverEvent {
    /// A full iteration ran without reaching a terminal state.
    IterationCompleted { iteration: usize, residual: f64 },
    /// `dot(r0, r)` collapsed below the breakdown threshold.
    RhoBreakdown { iteration: usize, rho: f64 },
    /// The stabilisation parameter collapsed below the breakdown threshold.
    OmegaBreakdown { iteration: usize, omega: f64 },
    /// Relative residual dropped below the tolerance.
    Converged { iteration: usize, residual: f64 },
    /// The iteration budget ran out.
    NotConverged { max_iterations: usize, residual: f64 },
}

impl SolverEvent {
    /// Whether this event ends the solve.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::IterationCompleted { .. })
    }

    pub(crate) fn trace(&self) {
        match *self {
            Self::IterationCompleted { iteration, residual } => {
                tracing::trace!(iteration, residual, "BiCGSTAB iteration");
            }
            Self::RhoBreakdown { iteration, rho } => {
                tracing::warn!(iteration, rho, "BiCGSTAB breakdown: rho ~ 0");
            }
            Self::OmegaBreakdown { iteration, omega } => {
                tracing::warn!(iteration, omega, "BiCGSTAB breakdown: omega ~ 0");
            }
            Self::Converged { iteration, residual } => {
                tracing::debug!(iteration, residual, "BiCGSTAB converged");
            }
            Self::NotConverged {
                max_iterations,
                residual,
            } => {
                tracing::warn!(max_iterations, residual, "BiCGSTAB did not converge");
            }
        }
    }
}
