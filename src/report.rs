//! Pluggable reporters for benchmark progress.
//!
//! Reporters observe a session; they never affect measurement and never fail
//! it. Persisting the report is done by the runner, not by a reporter.

use crate::config::BenchConfig;
use crate::result::{metric, BenchmarkReport, MetricRecord, RunResult, WorkloadKind};
use std::io::Write;
use std::sync::Mutex;

/// Trait for benchmark progress reporters.
pub trait Reporter: Send + Sync {
    /// Called once before the first run.
    fn suite_start(&self, _config: &BenchConfig) {}

    /// Called before each run; `run` is 1-based.
    fn run_start(&self, _run: usize, _total: usize) {}

    /// Called after each workload completes.
    fn workload_end(&self, _record: &MetricRecord) {}

    /// Called after each run completes.
    fn run_end(&self, _run: usize, _result: &RunResult) {}

    /// Called once the report has been written.
    fn suite_end(&self, _report: &BenchmarkReport) {}
}

/// Fixed width for the test column in console output.
const NAME_WIDTH: usize = 28;
const RULE: &str = "----------------------------------------------------------------------";

/// Console reporter that prints results to stdout.
///
/// Each message is written as one complete block under a lock.
pub struct ConsoleReporter {
    show_all_runs: bool,
    output_lock: Mutex<()>,
}

impl ConsoleReporter {
    pub fn new() -> Self {
        Self {
            show_all_runs: false,
            output_lock: Mutex::new(()),
        }
    }

    /// Show the raw per-run values under each aggregated line.
    pub fn show_all_runs(mut self, show: bool) -> Self {
        self.show_all_runs = show;
        self
    }

    fn write_stdout(&self, message: &str) {
        let _guard = self.output_lock.lock().unwrap_or_else(|e| e.into_inner());
        let mut stdout = std::io::stdout().lock();
        if let Err(e) = writeln!(stdout, "{}", message) {
            let _ = writeln!(std::io::stderr(), "Warning: failed to write to stdout: {}", e);
        }
    }

    /// One-line rendering of a record's headline metrics.
    fn format_record(record: &MetricRecord) -> String {
        let get = |name| record.get(name).unwrap_or(0.0);
        let duration = format!("{:.3}s", get(metric::DURATION_SEC));
        let headline = match record.workload.kind {
            WorkloadKind::SeqWrite | WorkloadKind::SeqRead => format!(
                "{} ({} file(s))",
                format_speed(get(metric::SPEED_BYTES_PER_SEC)),
                get(metric::NUM_FILES)
            ),
            WorkloadKind::RandWrite | WorkloadKind::RandRead => format!(
                "{:.2} IOPS, {:.3} ms avg",
                get(metric::IOPS),
                get(metric::AVG_LATENCY_MS)
            ),
            WorkloadKind::FileCreate | WorkloadKind::FileDelete => format!(
                "{:.2} files/s, {:.3} ms/file",
                get(metric::FILES_PER_SEC),
                get(metric::AVG_TIME_PER_FILE_MS)
            ),
        };
        format!(
            "  {:<width$} {:>10}  {}",
            record.test_id(),
            duration,
            headline,
            width = NAME_WIDTH
        )
    }

    /// Per-run summary: averages across size classes.
    fn format_run_summary(result: &RunResult) -> String {
        let mean_of = |kind: WorkloadKind, name: &str| -> Option<f64> {
            let values: Vec<f64> = result
                .iter()
                .filter(|(_, r)| r.workload.kind == kind)
                .filter_map(|(_, r)| r.get(name))
                .collect();
            (!values.is_empty()).then(|| values.iter().sum::<f64>() / values.len() as f64)
        };

        let mut lines = Vec::new();
        if let Some(v) = mean_of(WorkloadKind::SeqWrite, metric::SPEED_BYTES_PER_SEC) {
            lines.push(format!("  Average sequential write speed: {}", format_speed(v)));
        }
        if let Some(v) = mean_of(WorkloadKind::SeqRead, metric::SPEED_BYTES_PER_SEC) {
            lines.push(format!("  Average sequential read speed:  {}", format_speed(v)));
        }
        if let Some(v) = mean_of(WorkloadKind::RandWrite, metric::IOPS) {
            lines.push(format!("  Average random write IOPS:      {:.2}", v));
        }
        if let Some(v) = mean_of(WorkloadKind::RandRead, metric::IOPS) {
            lines.push(format!("  Average random read IOPS:       {:.2}", v));
        }
        if let Some(v) = mean_of(WorkloadKind::FileCreate, metric::FILES_PER_SEC) {
            lines.push(format!("  File creation rate:             {:.2} files/s", v));
        }
        if let Some(v) = mean_of(WorkloadKind::FileDelete, metric::FILES_PER_SEC) {
            lines.push(format!("  File deletion rate:             {:.2} files/s", v));
        }
        lines.join("\n")
    }

    fn format_aggregates(&self, report: &BenchmarkReport) -> String {
        let mut out = format!(
            "{RULE}\nAggregated results across {} run(s): {}\n{RULE}",
            report.num_runs, report.name
        );

        for (test_id, metrics) in &report.aggregated_statistics {
            let Some(kind) = report.tests.get(test_id).map(|t| t.kind) else {
                continue;
            };
            let shown: &[&str] = if kind.is_sequential() {
                &[metric::SPEED_BYTES_PER_SEC]
            } else if kind.is_random() {
                &[metric::IOPS, metric::AVG_LATENCY_MS]
            } else {
                &[metric::FILES_PER_SEC, metric::AVG_TIME_PER_FILE_MS]
            };

            for &name in shown {
                let Some(stat) = metrics.get(name) else {
                    continue;
                };
                let value = if name == metric::SPEED_BYTES_PER_SEC {
                    format!("{} ± {}", format_speed(stat.mean), format_speed(stat.std_dev))
                } else {
                    format!("{:.3} ± {:.3}", stat.mean, stat.std_dev)
                };
                out.push_str(&format!(
                    "\n  {:<width$} {:<20} {}",
                    test_id,
                    name,
                    value,
                    width = NAME_WIDTH
                ));
                if self.show_all_runs && stat.values.len() > 1 {
                    let runs: Vec<_> = stat.values.iter().map(|v| format!("{:.3}", v)).collect();
                    out.push_str(&format!("\n      runs: [{}]", runs.join(", ")));
                }
            }
        }
        out
    }
}

impl Default for ConsoleReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl Reporter for ConsoleReporter {
    fn suite_start(&self, config: &BenchConfig) {
        let header = format!(
            "{RULE}\nFile I/O benchmark: {}\nScratch directory: {}\nRuns: {}, data per sequential class: {}\n{RULE}",
            config.label,
            config.scratch_dir.display(),
            config.runs,
            format_size(config.total_bytes as f64)
        );
        self.write_stdout(&header);
    }

    fn run_start(&self, run: usize, total: usize) {
        self.write_stdout(&format!("\nRun {} of {}", run, total));
    }

    fn workload_end(&self, record: &MetricRecord) {
        self.write_stdout(&Self::format_record(record));
    }

    fn run_end(&self, run: usize, result: &RunResult) {
        let summary = Self::format_run_summary(result);
        self.write_stdout(&format!("Run {} summary:\n{}", run, summary));
    }

    fn suite_end(&self, report: &BenchmarkReport) {
        self.write_stdout(&self.format_aggregates(report));
    }
}

/// Human-readable size with base-1024 units, e.g. `10.00 MB`.
pub fn format_size(bytes: f64) -> String {
    let mut value = bytes;
    for unit in ["B", "KB", "MB", "GB"] {
        if value < 1024.0 {
            return format!("{:.2} {}", value, unit);
        }
        value /= 1024.0;
    }
    format!("{:.2} TB", value)
}

pub fn format_speed(bytes_per_sec: f64) -> String {
    format!("{}/s", format_size(bytes_per_sec))
}
