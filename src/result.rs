//! Result model: workload descriptions, per-run records and the persisted report.

use crate::error::{BenchError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

/// Current version of the persisted report layout.
pub const SCHEMA_VERSION: u32 = 1;

/// Metric names shared by the workloads and the persisted schema.
pub mod metric {
    pub const DURATION_SEC: &str = "duration_sec";
    pub const SPEED_BYTES_PER_SEC: &str = "speed_bytes_per_sec";
    pub const TOTAL_BYTES: &str = "total_bytes";
    pub const NUM_FILES: &str = "num_files";
    pub const BLOCKS_WRITTEN: &str = "blocks_written";
    pub const FILE_SIZE: &str = "file_size";
    pub const BLOCK_SIZE: &str = "block_size";
    pub const IOPS: &str = "iops";
    pub const AVG_LATENCY_MS: &str = "avg_latency_ms";
    pub const OPERATIONS: &str = "operations";
    pub const P50_LATENCY_MS: &str = "p50_latency_ms";
    pub const P99_LATENCY_MS: &str = "p99_latency_ms";
    pub const FILES_CREATED: &str = "files_created";
    pub const FILES_DELETED: &str = "files_deleted";
    pub const FILES_PER_SEC: &str = "files_per_sec";
    pub const AVG_TIME_PER_FILE_MS: &str = "avg_time_per_file_ms";
}

/// The six measured operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkloadKind {
    SeqWrite,
    SeqRead,
    RandWrite,
    RandRead,
    FileCreate,
    FileDelete,
}

impl WorkloadKind {
    /// Stable identifier prefix used by downstream consumers.
    pub fn prefix(self) -> &'static str {
        match self {
            WorkloadKind::SeqWrite => "seq_write",
            WorkloadKind::SeqRead => "seq_read",
            WorkloadKind::RandWrite => "rand_write",
            WorkloadKind::RandRead => "rand_read",
            WorkloadKind::FileCreate => "file_creation",
            WorkloadKind::FileDelete => "file_deletion",
        }
    }

    pub fn is_sequential(self) -> bool {
        matches!(self, WorkloadKind::SeqWrite | WorkloadKind::SeqRead)
    }

    pub fn is_random(self) -> bool {
        matches!(self, WorkloadKind::RandWrite | WorkloadKind::RandRead)
    }
}

impl fmt::Display for WorkloadKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WorkloadKind::SeqWrite => "sequential write",
            WorkloadKind::SeqRead => "sequential read",
            WorkloadKind::RandWrite => "random write",
            WorkloadKind::RandRead => "random read",
            WorkloadKind::FileCreate => "file creation",
            WorkloadKind::FileDelete => "file deletion",
        };
        f.write_str(name)
    }
}

/// Immutable description of one measured scenario.
///
/// Fields that do not apply to a kind are zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkloadConfig {
    pub kind: WorkloadKind,
    /// File size in bytes.
    pub file_size: u64,
    pub block_size: u64,
    /// Random operations per file.
    pub operations: u64,
    /// Files written or read by the scenario.
    pub file_count: u64,
}

impl WorkloadConfig {
    /// `file_count` files of `file_size` bytes each, streamed in `block_size` chunks.
    pub fn sequential_write(file_size: u64, block_size: u64, file_count: u64) -> Self {
        Self {
            kind: WorkloadKind::SeqWrite,
            file_size,
            block_size,
            operations: 0,
            file_count,
        }
    }

    pub fn sequential_read(file_size: u64, block_size: u64, file_count: u64) -> Self {
        Self {
            kind: WorkloadKind::SeqRead,
            ..Self::sequential_write(file_size, block_size, file_count)
        }
    }

    pub fn random_write(file_size: u64, block_size: u64, operations: u64) -> Self {
        Self {
            kind: WorkloadKind::RandWrite,
            file_size,
            block_size,
            operations,
            file_count: 1,
        }
    }

    pub fn random_read(file_size: u64, block_size: u64, operations: u64) -> Self {
        Self {
            kind: WorkloadKind::RandRead,
            ..Self::random_write(file_size, block_size, operations)
        }
    }

    pub fn file_create(file_count: u64, file_size: u64) -> Self {
        Self {
            kind: WorkloadKind::FileCreate,
            file_size,
            block_size: 0,
            operations: 0,
            file_count,
        }
    }

    /// Deletion takes no count: it deletes whatever the directory holds.
    pub fn file_delete() -> Self {
        Self {
            kind: WorkloadKind::FileDelete,
            file_size: 0,
            block_size: 0,
            operations: 0,
            file_count: 0,
        }
    }

    /// Stable external key, e.g. `seq_write_10485760` or `file_creation`.
    ///
    /// Sized kinds embed the file size for consumers that parse it back out.
    pub fn test_id(&self) -> String {
        match self.kind {
            WorkloadKind::FileCreate | WorkloadKind::FileDelete => self.kind.prefix().to_string(),
            _ => format!("{}_{}", self.kind.prefix(), self.file_size),
        }
    }
}

/// Output of one workload invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricRecord {
    pub workload: WorkloadConfig,
    pub metrics: BTreeMap<String, f64>,
}

impl MetricRecord {
    pub fn new(workload: WorkloadConfig) -> Self {
        Self {
            workload,
            metrics: BTreeMap::new(),
        }
    }

    /// Builder-style metric insertion.
    pub fn with(mut self, name: &str, value: f64) -> Self {
        self.metrics.insert(name.to_string(), value);
        self
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.metrics.get(name).copied()
    }

    pub fn test_id(&self) -> String {
        self.workload.test_id()
    }
}

/// One full pass of the suite, keyed by test identifier.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunResult {
    records: BTreeMap<String, MetricRecord>,
}

impl RunResult {
    pub(crate) fn insert(&mut self, record: MetricRecord) {
        self.records.insert(record.test_id(), record);
    }

    pub fn get(&self, test_id: &str) -> Option<&MetricRecord> {
        self.records.get(test_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &MetricRecord)> {
        self.records.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn test_ids(&self) -> impl Iterator<Item = &str> {
        self.records.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl FromIterator<MetricRecord> for RunResult {
    fn from_iter<I: IntoIterator<Item = MetricRecord>>(iter: I) -> Self {
        let mut run = RunResult::default();
        for record in iter {
            run.insert(record);
        }
        run
    }
}

/// Distribution of one (test, metric) pair across runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatedStat {
    pub mean: f64,
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
    /// Raw values in run order.
    pub values: Vec<f64>,
}

/// `test -> metric -> stat`
pub type AggregateTable = BTreeMap<String, BTreeMap<String, AggregatedStat>>;

/// Top-level persisted artifact of a multi-run session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkReport {
    /// Human-readable label used to group reports.
    pub name: String,
    pub schema_version: u32,
    /// Local time the report was generated, `%Y-%m-%d %H:%M:%S`.
    pub timestamp: String,
    pub test_directory: String,
    pub num_runs: usize,
    /// Structured parameters per test identifier.
    pub tests: BTreeMap<String, WorkloadConfig>,
    pub aggregated_statistics: AggregateTable,
    pub all_runs: Vec<RunResult>,
}

impl BenchmarkReport {
    /// Look up the aggregate for one test and metric.
    pub fn stat(&self, test_id: &str, metric: &str) -> Option<&AggregatedStat> {
        self.aggregated_statistics.get(test_id)?.get(metric)
    }

    /// Raw per-run values for one test and metric.
    pub fn series(&self, test_id: &str, metric: &str) -> Option<&[f64]> {
        self.stat(test_id, metric).map(|s| s.values.as_slice())
    }

    /// Write the report as pretty JSON, creating parent directories.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let persist = |source: std::io::Error| BenchError::Persist {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(persist)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json).map_err(persist)
    }

    /// Load a report from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| BenchError::Persist {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(serde_json::from_str(&content)?)
    }
}
