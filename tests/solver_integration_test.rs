//! End-to-end solver tests on assembled Laplace systems and small
//! hand-built matrices.

use approx::assert_abs_diff_eq;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use stabilo::grid::{BoundaryValues, LaplaceGrid};
use stabilo::solver::{
    self, BiCgStabConfig, BiCgStabSolver, ExecutionStrategy, LinearSolver, ShadowResidual,
    SolveOutcome, SolverEvent,
};
use stabilo::{CsrMatrix, LinearSystem, StabiloError};

const TOL: f64 = 1e-8;

fn laplace(nx: usize, ny: usize) -> LinearSystem {
    LaplaceGrid::new(nx, ny).unwrap().assemble().unwrap()
}

// ── Laplace end-to-end ────────────────────────────────────────────

#[test]
fn test_laplace_10x10_converges() {
    let mut sys = laplace(10, 10);
    let report = solver::solve(&mut sys, 10_000, TOL).unwrap();
    assert!(report.outcome.is_converged(), "{}", report.outcome);
    assert!(sys.relative_residual() < 1e-6);

    // Maximum principle: interior values lie between the boundary extremes.
    for &v in sys.solution() {
        assert!((-1e-6..=1.0 + 1e-6).contains(&v), "value {v} outside [0, 1]");
    }
}

#[test]
fn test_strategy_equivalence() {
    let mut reference = laplace(14, 14);
    let serial = solver::solve(&mut reference, 10_000, TOL).unwrap();
    assert!(serial.outcome.is_converged());

    for workers in [2, 4, 8] {
        let mut sys = laplace(14, 14);
        let report = solver::solve_parallel(&mut sys, 10_000, TOL, workers).unwrap();
        match report.outcome {
            SolveOutcome::Converged { residual, .. } => assert!(residual < TOL),
            other => panic!("workers = {workers}: {other}"),
        }
        assert!(sys.relative_residual() < 10.0 * TOL);
        // Dot products reduce in a different order, so iterates drift apart
        // by rounding only.
        for (a, b) in sys.solution().iter().zip(reference.solution()) {
            assert_abs_diff_eq!(*a, *b, epsilon = 1e-6);
        }
    }
}

#[test]
fn test_shadow_policy_on_laplace() {
    let textbook = BiCgStabConfig::default().with_shadow(ShadowResidual::InitialResidual);
    for n in [10, 14, 20] {
        // Seeding r0 from the first residual collapses rho on identity rows.
        let mut sys = laplace(n, n);
        let report =
            solver::solve_with(&mut sys, &textbook, ExecutionStrategy::Sequential).unwrap();
        assert!(
            matches!(report.outcome, SolveOutcome::RhoBreakdown { .. }),
            "{n}x{n}: {}",
            report.outcome
        );

        let mut sys = laplace(n, n);
        let report = solver::solve(&mut sys, 10_000, TOL).unwrap();
        assert!(report.outcome.is_converged(), "{n}x{n}: {}", report.outcome);
        assert!(sys.relative_residual() < 10.0 * TOL);
    }
}

#[test]
fn test_uniform_boundary_gives_constant_solution() {
    let boundary = BoundaryValues {
        bottom: 2.0,
        right: 2.0,
        top: 2.0,
        left: 2.0,
    };
    let mut sys = LaplaceGrid::new(8, 8)
        .unwrap()
        .with_boundary(boundary)
        .assemble()
        .unwrap();
    let report = solver::solve_parallel(&mut sys, 10_000, 1e-10, 3).unwrap();
    assert!(report.outcome.is_converged());
    for &v in sys.solution() {
        assert_abs_diff_eq!(v, 2.0, epsilon = 1e-6);
    }
}

// ── Edge cases ────────────────────────────────────────────────────

#[test]
fn test_zero_rhs() {
    for strategy in [ExecutionStrategy::Sequential, ExecutionStrategy::parallel(4).unwrap()] {
        let a = laplace(6, 6).matrix().clone();
        let mut sys = LinearSystem::new(a, vec![0.0; 36]).unwrap();
        let report = solver::solve_with(&mut sys, &BiCgStabConfig::default(), strategy).unwrap();
        match report.outcome {
            SolveOutcome::Converged { iterations, .. } => assert!(iterations <= 1),
            other => panic!("expected convergence, got {other}"),
        }
        assert!(sys.solution().iter().all(|v| v.abs() < 1e-12));
    }
}

#[test]
fn test_trivial_system() {
    let mut sys = LinearSystem::new(CsrMatrix::identity(1), vec![5.0]).unwrap();
    let report = solver::solve(&mut sys, 10, TOL).unwrap();
    assert!(report.outcome.iterations().unwrap() <= 1);
    assert_abs_diff_eq!(sys.solution()[0], 5.0, epsilon = 1e-12);
}

#[test]
fn test_random_diagonally_dominant() {
    let mut rng = StdRng::seed_from_u64(2024);
    let n = 120;
    let mut triplets = Vec::new();
    for i in 0..n {
        let mut off = 0.0;
        for _ in 0..4 {
            let j = rng.gen_range(0..n);
            if j != i {
                let v: f64 = rng.gen_range(-1.0..1.0);
                off += v.abs();
                triplets.push((i, j, v));
            }
        }
        triplets.push((i, i, off + 1.0));
    }
    let a = CsrMatrix::from_triplets(n, &triplets);
    let exact: Vec<f64> = (0..n).map(|_| rng.gen_range(-1.0..1.0)).collect();
    let b = a.spmv(&exact);

    let mut sys = LinearSystem::new(a, b).unwrap();
    let config = BiCgStabConfig::new(1_000, 1e-12).with_shadow(ShadowResidual::InitialResidual);
    let strategy = ExecutionStrategy::parallel(4).unwrap();
    let report = solver::solve_with(&mut sys, &config, strategy).unwrap();
    assert!(report.outcome.is_converged(), "{}", report.outcome);
    for (x, e) in sys.solution().iter().zip(&exact) {
        assert_abs_diff_eq!(*x, *e, epsilon = 1e-8);
    }
}

#[test]
fn test_max_iterations_exceeded() {
    let mut sys = laplace(20, 20);
    let report = solver::solve(&mut sys, 2, 1e-14).unwrap();
    match report.outcome {
        SolveOutcome::MaxIterExceeded { residual } => assert!(residual > 1e-14),
        other => panic!("unexpected outcome {other}"),
    }
}

#[test]
fn test_invalid_parameters() {
    let mut sys = laplace(4, 4);
    assert!(matches!(
        solver::solve(&mut sys, 0, TOL),
        Err(StabiloError::InvalidParameter { name: "max_iterations", .. })
    ));
    assert!(matches!(
        solver::solve(&mut sys, 10, -1.0),
        Err(StabiloError::InvalidParameter { name: "tolerance", .. })
    ));
    assert!(matches!(
        solver::solve_parallel(&mut sys, 10, TOL, 0),
        Err(StabiloError::InvalidParameter { name: "workers", .. })
    ));
    assert!(LinearSystem::new(CsrMatrix::identity(3), vec![1.0; 2]).is_err());
    assert!(CsrMatrix::from_raw_parts(2, vec![0, 1, 3], vec![0, 5, 1], vec![1.0; 3]).is_err());
}

// ── Diagnostics ───────────────────────────────────────────────────

#[test]
fn test_events_observed() {
    let mut sys = laplace(10, 10);
    let mut events = Vec::new();
    let report = solver::solve_observed(
        &mut sys,
        &BiCgStabConfig::default(),
        ExecutionStrategy::parallel(2).unwrap(),
        |e| events.push(*e),
    )
    .unwrap();

    let (last, rest) = events.split_last().expect("at least one event");
    assert!(last.is_terminal());
    assert!(rest.iter().all(|e| matches!(e, SolverEvent::IterationCompleted { .. })));
    match (last, report.outcome) {
        (
            SolverEvent::Converged { iteration, .. },
            SolveOutcome::Converged { iterations, .. },
        ) => assert_eq!(*iteration, iterations),
        other => panic!("unexpected terminal pair {other:?}"),
    }
}

#[test]
fn test_solver_trait() {
    let solver = BiCgStabSolver::new(
        BiCgStabConfig::default(),
        ExecutionStrategy::parallel(4).unwrap(),
    );
    let mut sys = laplace(10, 10);
    let report = solver.solve(&mut sys).unwrap();
    assert_eq!(report.strategy.worker_count(), 4);
    assert!(report.outcome.is_converged());
}
