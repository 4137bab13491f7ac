use clap::{Parser, ValueEnum};
use stabilo::bench::BenchmarkPlan;
use stabilo::output;
use stabilo::solver::{BiCgStabConfig, ShadowResidual};
use std::io;

/// BiCGSTAB benchmark on the 2D Laplace problem: sequential vs data-parallel
#[derive(Parser)]
#[command(name = "stabilo", version)]
struct Cli {
    /// Grid size as NXxNY (repeatable)
    #[arg(long = "grid", value_name = "NXxNY", value_parser = parse_grid,
          default_values = ["10x10", "14x14", "20x20"])]
    grids: Vec<(usize, usize)>,

    /// Worker counts for the parallel runs
    #[arg(long, value_delimiter = ',', default_values_t = [2, 4, 8])]
    threads: Vec<usize>,

    /// Iteration budget per solve
    #[arg(long, default_value_t = 10_000)]
    max_iter: usize,

    /// Relative residual tolerance
    #[arg(long, default_value_t = 1e-8)]
    tol: f64,

    /// Shadow residual policy
    #[arg(long, value_enum, default_value_t = Shadow::Constant)]
    shadow: Shadow,

    /// Emit CSV instead of a table
    #[arg(long, conflicts_with = "json")]
    csv: bool,

    /// Emit the full report, settings included, as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum Shadow {
    /// All-ones vector
    Constant,
    /// Copy of the initial residual
    Residual,
}

fn parse_grid(s: &str) -> Result<(usize, usize), String> {
    let (nx, ny) = s
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected NXxNY, got '{s}'"))?;
    let nx = nx.trim().parse().map_err(|e| format!("bad NX '{nx}': {e}"))?;
    let ny = ny.trim().parse().map_err(|e| format!("bad NY '{ny}': {e}"))?;
    Ok((nx, ny))
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let shadow = match cli.shadow {
        Shadow::Constant => ShadowResidual::Constant(1.0),
        Shadow::Residual => ShadowResidual::InitialResidual,
    };
    let plan = BenchmarkPlan {
        grids: cli.grids,
        thread_counts: cli.threads,
        config: BiCgStabConfig::new(cli.max_iter, cli.tol).with_shadow(shadow),
        ..BenchmarkPlan::default()
    };

    let report = plan.run().unwrap_or_else(|e| {
        eprintln!("Benchmark error: {}", e);
        std::process::exit(1);
    });

    let mut stdout = io::stdout();
    let written = if cli.json {
        output::write_report_json(&report, &mut stdout)
    } else if cli.csv {
        output::write_report_csv(&report, &mut stdout)
    } else {
        output::write_report_table(&report, &mut stdout)
    };
    written.unwrap_or_else(|e| {
        eprintln!("Output error: {}", e);
        std::process::exit(1);
    });
}
