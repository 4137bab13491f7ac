//! Benchmark output formatting (aligned table, CSV and JSON).

use std::io::Write;

use crate::bench::{BenchmarkReport, GridBenchmark, RunRecord};
use crate::error::Result;

fn opt(value: Option<f64>, precision: usize) -> String {
    value.map_or_else(String::new, |v| format!("{v:.precision$}"))
}

fn iterations(record: &RunRecord) -> String {
    record
        .outcome
        .iterations()
        .map_or_else(String::new, |i| i.to_string())
}

/// Write the report as a human-readable table.
///
/// One block per grid: the sequential run first, then one line per worker
/// count, followed by the true residual of the sequential solution.
pub fn write_report_table<W: Write>(report: &BenchmarkReport, writer: &mut W) -> Result<()> {
    for (k, grid) in report.runs.iter().enumerate() {
        if k > 0 {
            writeln!(writer)?;
        }
        write_grid_table(grid, writer)?;
    }
    Ok(())
}

fn write_grid_table<W: Write>(grid: &GridBenchmark, writer: &mut W) -> Result<()> {
    writeln!(
        writer,
        "Grid {}x{} ({} nodes, {} nonzeros, {:.2}% dense)",
        grid.nx,
        grid.ny,
        grid.nodes,
        grid.nnz,
        grid.density * 100.0
    )?;
    writeln!(
        writer,
        "  {:<14} {:>7} {:>18} {:>6} {:>12} {:>9} {:>10}",
        "strategy", "threads", "outcome", "iters", "time (s)", "speedup", "eff (%)"
    )?;
    for record in grid.records() {
        writeln!(
            writer,
            "  {:<14} {:>7} {:>18} {:>6} {:>12.6} {:>9} {:>10}",
            record.strategy.to_string(),
            record.strategy.worker_count(),
            record.outcome.label(),
            iterations(record),
            record.elapsed.as_secs_f64(),
            opt(record.speedup, 2),
            opt(record.efficiency_pct, 1),
        )?;
    }
    writeln!(writer, "  ||b - Ax|| = {:.6e}", grid.serial.true_residual)?;
    Ok(())
}

/// Write the report as CSV, one row per solve.
///
/// Format:
/// ```csv
/// grid,nodes,nnz,density,strategy,threads,outcome,iterations,time_s,speedup,efficiency_pct,residual
/// 10x10,100,356,0.0356,sequential,1,converged,23,0.000412,,,3.1e-9
/// 10x10,100,356,0.0356,parallel(2),2,converged,23,0.000390,1.056,52.8,3.1e-9
/// ```
pub fn write_report_csv<W: Write>(report: &BenchmarkReport, writer: &mut W) -> Result<()> {
    writeln!(
        writer,
        "grid,nodes,nnz,density,strategy,threads,outcome,iterations,time_s,speedup,\
         efficiency_pct,residual"
    )?;
    for grid in &report.runs {
        for record in grid.records() {
            writeln!(
                writer,
                "{}x{},{},{},{:.4},{},{},{},{},{},{},{},{:e}",
                grid.nx,
                grid.ny,
                grid.nodes,
                grid.nnz,
                grid.density,
                record.strategy,
                record.strategy.worker_count(),
                record.outcome.label(),
                iterations(record),
                record.elapsed.as_secs_f64(),
                opt(record.speedup, 3),
                opt(record.efficiency_pct, 1),
                record.true_residual,
            )?;
        }
    }
    Ok(())
}

/// Write the whole report, settings included, as pretty-printed JSON.
pub fn write_report_json<W: Write>(report: &BenchmarkReport, writer: &mut W) -> Result<()> {
    serde_json::to_writer_pretty(&mut *writer, report)?;
    writeln!(writer)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::BoundaryValues;
    use crate::solver::{BiCgStabConfig, ExecutionStrategy, SolveOutcome};
    use std::time::Duration;

    fn report() -> BenchmarkReport {
        let serial = RunRecord {
            strategy: ExecutionStrategy::Sequential,
            outcome: SolveOutcome::Converged {
                iterations: 12,
                residual: 1e-9,
            },
            elapsed: Duration::from_millis(4),
            true_residual: 2.5e-9,
            speedup: None,
            efficiency_pct: None,
        };
        let parallel = RunRecord {
            strategy: ExecutionStrategy::parallel(2).unwrap(),
            elapsed: Duration::from_millis(2),
            speedup: Some(2.0),
            efficiency_pct: Some(100.0),
            ..serial.clone()
        };
        let stalled = RunRecord {
            strategy: ExecutionStrategy::parallel(4).unwrap(),
            outcome: SolveOutcome::RhoBreakdown { iteration: 3 },
            speedup: None,
            efficiency_pct: None,
            ..parallel.clone()
        };
        BenchmarkReport {
            config: BiCgStabConfig::default(),
            boundary: BoundaryValues::default(),
            runs: vec![GridBenchmark {
                nx: 10,
                ny: 10,
                nodes: 100,
                nnz: 356,
                density: 0.0356,
                serial,
                parallel: vec![parallel, stalled],
            }],
        }
    }

    #[test]
    fn csv_rows() {
        let mut buf = Vec::new();
        write_report_csv(&report(), &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("grid,nodes,nnz,density,strategy,threads"));
        assert_eq!(
            lines[1],
            "10x10,100,356,0.0356,sequential,1,converged,12,0.004,,,2.5e-9"
        );
        assert_eq!(
            lines[2],
            "10x10,100,356,0.0356,parallel(2),2,converged,12,0.002,2.000,100.0,2.5e-9"
        );
        assert_eq!(
            lines[3],
            "10x10,100,356,0.0356,parallel(4),4,rho-breakdown,,0.002,,,2.5e-9"
        );
        for line in &lines {
            assert_eq!(line.split(',').count(), 12);
        }
    }

    #[test]
    fn table_mentions_every_run() {
        let mut buf = Vec::new();
        write_report_table(&report(), &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.starts_with("Grid 10x10 (100 nodes, 356 nonzeros, 3.56% dense)"));
        assert!(text.contains("sequential"));
        assert!(text.contains("parallel(2)"));
        assert!(text.contains("rho-breakdown"));
        assert!(text.contains("||b - Ax||"));
    }

    #[test]
    fn json_carries_settings_and_runs() {
        let mut buf = Vec::new();
        write_report_json(&report(), &mut buf).unwrap();
        let json: serde_json::Value = serde_json::from_slice(&buf).unwrap();

        assert_eq!(json["config"]["max_iterations"], 10_000);
        assert_eq!(json["config"]["shadow"]["Constant"], 1.0);
        assert_eq!(json["config"]["omega_check"], "AfterUpdate");
        assert_eq!(json["boundary"]["top"], 1.0);

        let grid = &json["runs"][0];
        assert_eq!(grid["nnz"], 356);
        assert_eq!(grid["serial"]["strategy"], "Sequential");
        assert_eq!(grid["serial"]["outcome"]["Converged"]["iterations"], 12);
        assert!(grid["serial"]["speedup"].is_null());

        let parallel = &grid["parallel"];
        assert_eq!(parallel[0]["strategy"]["DataParallel"]["workers"], 2);
        assert_eq!(parallel[0]["speedup"], 2.0);
        assert_eq!(parallel[1]["outcome"]["RhoBreakdown"]["iteration"], 3);
    }
}
