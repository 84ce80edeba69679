//! Multi-run aggregation.

use crate::result::{
    AggregateTable, AggregatedStat, BenchmarkReport, RunResult, WorkloadConfig, SCHEMA_VERSION,
};
use std::collections::BTreeMap;
use std::path::Path;

/// Accumulates run results for one session and reduces them to statistics.
///
/// Constructed empty, fed with [`record_run`](Self::record_run) after every
/// suite pass, and finalized once with [`finish`](Self::finish).
#[derive(Debug, Default)]
pub struct Aggregator {
    runs: Vec<RunResult>,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a completed run to the history.
    pub fn record_run(&mut self, run: RunResult) {
        self.runs.push(run);
    }

    pub fn runs(&self) -> &[RunResult] {
        &self.runs
    }

    pub fn len(&self) -> usize {
        self.runs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }

    /// Reduce every (test, metric) pair seen in any run.
    ///
    /// A metric missing from some runs is aggregated over the runs that have
    /// it; its `values` keep run order.
    pub fn aggregate(&self) -> AggregateTable {
        let mut series: BTreeMap<&str, BTreeMap<&str, Vec<f64>>> = BTreeMap::new();
        for run in &self.runs {
            for (test_id, record) in run.iter() {
                let metrics = series.entry(test_id).or_default();
                for (name, &value) in &record.metrics {
                    metrics.entry(name.as_str()).or_default().push(value);
                }
            }
        }

        series
            .into_iter()
            .map(|(test_id, metrics)| {
                let stats = metrics
                    .into_iter()
                    .filter_map(|(name, values)| {
                        summarize(values).map(|stat| (name.to_string(), stat))
                    })
                    .collect();
                (test_id.to_string(), stats)
            })
            .collect()
    }

    /// Structured parameters for every test identifier, first occurrence wins.
    pub fn tests(&self) -> BTreeMap<String, WorkloadConfig> {
        let mut tests = BTreeMap::new();
        for run in &self.runs {
            for (test_id, record) in run.iter() {
                tests
                    .entry(test_id.to_string())
                    .or_insert(record.workload);
            }
        }
        tests
    }

    /// Build the persisted report, consuming the run history.
    pub fn finish(self, name: impl Into<String>, test_directory: &Path) -> BenchmarkReport {
        BenchmarkReport {
            name: name.into(),
            schema_version: SCHEMA_VERSION,
            timestamp: chrono::Local::now()
                .format("%Y-%m-%d %H:%M:%S")
                .to_string(),
            test_directory: test_directory.display().to_string(),
            num_runs: self.runs.len(),
            tests: self.tests(),
            aggregated_statistics: self.aggregate(),
            all_runs: self.runs,
        }
    }
}

/// Mean, sample standard deviation, min and max of `values`.
///
/// Returns `None` for an empty series. Standard deviation is zero for fewer
/// than two samples.
pub fn summarize(values: Vec<f64>) -> Option<AggregatedStat> {
    if values.is_empty() {
        return None;
    }

    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let std_dev = if values.len() < 2 {
        0.0
    } else {
        let variance = values
            .iter()
            .map(|v| {
                let diff = v - mean;
                diff * diff
            })
            .sum::<f64>()
            / (n - 1.0);
        variance.sqrt()
    };
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    Some(AggregatedStat {
        mean,
        std_dev,
        min,
        max,
        values,
    })
}
