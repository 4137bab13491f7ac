//! BiCGSTAB sparse linear solver with interchangeable sequential and
//! data-parallel kernels.

pub mod bench;
pub mod error;
pub mod grid;
pub mod output;
pub mod solver;
pub mod sparse;
pub mod system;

pub use error::{Result, StabiloError};
pub use solver::{
    solve, solve_parallel, BiCgStabConfig, ExecutionStrategy, SolveOutcome, SolveReport,
};
pub use sparse::CsrMatrix;
pub use system::LinearSystem;
