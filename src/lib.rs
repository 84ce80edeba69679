//! # fsbench
//!
//! A file-system I/O benchmark suite: sequential throughput, random-access
//! IOPS and small-file metadata rates, repeated over several runs and reduced
//! to summary statistics.
//!
//! Every workload runs inside a disposable scratch directory owned by the
//! session. Only the measured operation is timed; materializing inputs and
//! deleting outputs happen outside the timed region.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use fsbench::{BenchConfig, BenchRunner, MIB};
//!
//! let config = BenchConfig::new()
//!     .runs(3)
//!     .total_bytes(256 * MIB)
//!     .size_classes([16 * MIB, 64 * MIB])
//!     .scratch_dir("/mnt/nvme/fsbench_tmp")
//!     .output_path("nvme.json")
//!     .label("nvme");
//!
//! let report = BenchRunner::with_config(config).run()?;
//! for (test, stats) in &report.aggregated_statistics {
//!     if let Some(speed) = stats.get(fsbench::metric::SPEED_BYTES_PER_SEC) {
//!         println!("{test}: {:.0} B/s", speed.mean);
//!     }
//! }
//! # Ok::<(), fsbench::BenchError>(())
//! ```
//!
//! ## Features
//!
//! - **`hdr`**: p50/p99 latency for random workloads via HDR histogram

mod aggregate;
mod config;
mod context;
mod error;
mod latency;
mod report;
mod result;
mod runner;

pub mod workloads;

pub use aggregate::{summarize, Aggregator};
pub use config::{BenchConfig, RandomCase, GIB, KIB, MIB};
pub use context::{per_op_millis, rate, MeasureContext};
pub use error::{BenchError, Result};
pub use latency::LatencySamples;
pub use report::{format_size, format_speed, ConsoleReporter, Reporter};
pub use result::{
    metric, AggregateTable, AggregatedStat, BenchmarkReport, MetricRecord, RunResult,
    WorkloadConfig, WorkloadKind, SCHEMA_VERSION,
};
pub use runner::{BenchRunner, ScratchDir};
