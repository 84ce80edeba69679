//! fsbench: run the file I/O benchmark suite against a directory.
//!
//! Settings come from `FSBENCH_*` environment variables first; flags given on
//! the command line override them. `--quick` starts from a small preset
//! instead, which is useful for smoke-testing a mount point.

use anyhow::{Context, Result};
use clap::Parser;
use fsbench::{BenchConfig, BenchRunner, MIB};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "fsbench",
    version,
    about = "Measure sequential throughput, random IOPS and metadata rates",
    long_about = "
fsbench runs a fixed suite of file-system workloads inside a scratch
directory, repeats it several times and writes mean, standard deviation,
min and max of every metric to a JSON report.

The scratch directory is deleted and recreated at the start of every run
and removed at the end. Do not point it at a directory you want to keep.

Example:
    fsbench                                  # Default suite, 5 runs
    fsbench --quick                          # Small preset, 2 runs
    fsbench --scratch-dir /mnt/ssd/tmp --label ssd --output ssd.json
"
)]
struct Cli {
    /// Number of full suite passes
    #[arg(long)]
    runs: Option<usize>,

    /// MiB transferred by every sequential size class
    #[arg(long, value_name = "MIB")]
    total_mb: Option<u64>,

    /// Scratch directory (destroyed and recreated every run)
    #[arg(long, value_name = "DIR")]
    scratch_dir: Option<PathBuf>,

    /// Path of the JSON report
    #[arg(long, short = 'o', value_name = "FILE")]
    output: Option<PathBuf>,

    /// Label stored as the report name
    #[arg(long)]
    label: Option<String>,

    /// Seed for random offsets (reproducible access patterns)
    #[arg(long)]
    seed: Option<u64>,

    /// Use the small preset instead of the full-size defaults
    #[arg(long)]
    quick: bool,

    /// Only write the report; no console progress
    #[arg(long, short = 'q')]
    quiet: bool,

    /// Print raw per-run values under the aggregated table
    #[arg(long)]
    show_runs: bool,
}

impl Cli {
    fn config(&self) -> BenchConfig {
        let mut config = if self.quick {
            BenchConfig::quick()
        } else {
            BenchConfig::from_env()
        };

        if let Some(runs) = self.runs {
            config = config.runs(runs);
        }
        if let Some(mb) = self.total_mb {
            config = config.total_bytes(mb.saturating_mul(MIB));
        }
        if let Some(dir) = &self.scratch_dir {
            config = config.scratch_dir(dir);
        }
        if let Some(output) = &self.output {
            config = config.output_path(output);
        }
        if let Some(label) = &self.label {
            config = config.label(label);
        }
        if let Some(seed) = self.seed {
            config = config.seed(seed);
        }
        config.verbose(false)
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("fsbench=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = cli.config();
    config.validate().context("invalid benchmark configuration")?;
    let output = config.output_path.clone();

    let mut runner = BenchRunner::with_config(config);
    if !cli.quiet {
        runner.add_reporter(Box::new(
            fsbench::ConsoleReporter::new().show_all_runs(cli.show_runs),
        ));
    }

    let report = runner
        .run()
        .context("benchmark session failed")?;

    info!(
        runs = report.num_runs,
        tests = report.aggregated_statistics.len(),
        path = %output.display(),
        "benchmark complete"
    );
    Ok(())
}
