//! Benchmark driver and report writers end-to-end.

use stabilo::bench::BenchmarkPlan;
use stabilo::output;
use stabilo::solver::BiCgStabConfig;

#[test]
fn test_benchmark_csv_report() {
    let plan = BenchmarkPlan {
        grids: vec![(10, 10), (12, 8)],
        thread_counts: vec![2, 4],
        ..BenchmarkPlan::default()
    };
    let report = plan.run().unwrap();
    assert_eq!(report.runs.len(), 2);

    for grid in &report.runs {
        assert!(grid.serial.outcome.is_converged());
        for record in &grid.parallel {
            assert!(record.outcome.is_converged());
            assert!(record.true_residual < 1e-6);
            let speedup = record.speedup.expect("serial run converged");
            let eff = record.efficiency_pct.unwrap();
            let workers = record.strategy.worker_count() as f64;
            assert!((eff - speedup / workers * 100.0).abs() < 1e-9);
        }
    }

    let mut buf = Vec::new();
    output::write_report_csv(&report, &mut buf).unwrap();
    let text = String::from_utf8(buf).unwrap();
    // header + 2 grids x (1 serial + 2 parallel)
    assert_eq!(text.lines().count(), 7);
    assert!(text.lines().skip(1).all(|l| l.contains(",converged,")));
    assert!(text.contains("12x8,96,"));
}

#[test]
fn test_benchmark_table_report() {
    let plan = BenchmarkPlan {
        grids: vec![(6, 6)],
        thread_counts: vec![2],
        config: BiCgStabConfig::new(500, 1e-8),
        ..BenchmarkPlan::default()
    };
    let report = plan.run().unwrap();
    let mut buf = Vec::new();
    output::write_report_table(&report, &mut buf).unwrap();
    let text = String::from_utf8(buf).unwrap();
    assert!(text.starts_with("Grid 6x6 (36 nodes"));
    assert!(text.contains("parallel(2)"));
}
