//! Configuration for a benchmark session.

use crate::error::{BenchError, Result};
use std::collections::HashSet;
use std::path::PathBuf;

pub const KIB: u64 = 1024;
pub const MIB: u64 = 1024 * KIB;
pub const GIB: u64 = 1024 * MIB;

/// One random-access scenario: a file of `file_size` bytes hit `operations` times.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RandomCase {
    pub file_size: u64,
    pub operations: u64,
}

impl RandomCase {
    pub fn new(file_size: u64, operations: u64) -> Self {
        Self {
            file_size,
            operations,
        }
    }
}

/// Configuration for a benchmark session.
#[derive(Debug, Clone)]
pub struct BenchConfig {
    /// Number of full suite passes to aggregate over.
    pub runs: usize,
    /// Bytes transferred by every sequential size class.
    pub total_bytes: u64,
    /// File sizes for the sequential ladder.
    pub size_classes: Vec<u64>,
    /// Chunk size for sequential reads and writes.
    pub seq_block_size: u64,
    /// Block size for random reads and writes.
    pub random_block_size: u64,
    pub random_cases: Vec<RandomCase>,
    /// Number of small files for the creation/deletion pair.
    pub metadata_files: u64,
    pub metadata_file_size: u64,
    /// Scratch directory. Destroyed and recreated at the start of every run.
    pub scratch_dir: PathBuf,
    /// Where the JSON report is written.
    pub output_path: PathBuf,
    /// Label stored as the report `name`.
    pub label: String,
    /// Seed for random offsets; entropy when unset.
    pub seed: Option<u64>,
    /// Print progress through the console reporter.
    pub verbose: bool,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            runs: 5,
            total_bytes: GIB,
            size_classes: vec![10 * MIB, 100 * MIB, 500 * MIB, GIB],
            seq_block_size: 64 * KIB,
            random_block_size: 4 * KIB,
            random_cases: vec![
                RandomCase::new(100 * MIB, 5000),
                RandomCase::new(500 * MIB, 10_000),
            ],
            metadata_files: 5000,
            metadata_file_size: 4 * KIB,
            scratch_dir: PathBuf::from("benchmark_temp"),
            output_path: PathBuf::from("benchmark_results.json"),
            label: "fsbench".to_string(),
            seed: None,
            verbose: true,
        }
    }
}

impl BenchConfig {
    /// Create a new config with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Small preset that finishes in seconds. Useful for smoke tests.
    pub fn quick() -> Self {
        Self {
            runs: 2,
            total_bytes: 16 * MIB,
            size_classes: vec![MIB, 4 * MIB],
            random_cases: vec![RandomCase::new(4 * MIB, 500)],
            metadata_files: 200,
            ..Self::default()
        }
    }

    /// Parse config from environment variables on top of the defaults.
    ///
    /// Supported variables:
    /// - `FSBENCH_RUNS`: number of suite passes (default: 5)
    /// - `FSBENCH_TOTAL_MB`: MiB transferred per sequential class (default: 1024)
    /// - `FSBENCH_SCRATCH_DIR`: scratch directory (default: `benchmark_temp`)
    /// - `FSBENCH_OUTPUT`: report path (default: `benchmark_results.json`)
    /// - `FSBENCH_LABEL`: report label
    /// - `FSBENCH_SEED`: fixed seed for random offsets
    /// - `FSBENCH_VERBOSE`: console progress (default: true)
    pub fn from_env() -> Self {
        let mut cfg = Self::default();

        if let Ok(v) = std::env::var("FSBENCH_RUNS") {
            if let Ok(n) = v.parse() {
                cfg.runs = n;
            }
        }
        if let Ok(v) = std::env::var("FSBENCH_TOTAL_MB") {
            if let Some(bytes) = v.parse::<u64>().ok().and_then(|mb| mb.checked_mul(MIB)) {
                cfg.total_bytes = bytes;
            }
        }
        if let Ok(v) = std::env::var("FSBENCH_SCRATCH_DIR") {
            cfg.scratch_dir = PathBuf::from(v);
        }
        if let Ok(v) = std::env::var("FSBENCH_OUTPUT") {
            cfg.output_path = PathBuf::from(v);
        }
        if let Ok(v) = std::env::var("FSBENCH_LABEL") {
            cfg.label = v;
        }
        if let Ok(v) = std::env::var("FSBENCH_SEED") {
            if let Ok(seed) = v.parse() {
                cfg.seed = Some(seed);
            }
        }
        if let Ok(v) = std::env::var("FSBENCH_VERBOSE") {
            cfg.verbose = v != "0" && !v.eq_ignore_ascii_case("false");
        }

        cfg
    }

    /// Set the number of suite passes.
    pub fn runs(mut self, n: usize) -> Self {
        self.runs = n;
        self
    }

    /// Set the bytes transferred per sequential size class.
    pub fn total_bytes(mut self, bytes: u64) -> Self {
        self.total_bytes = bytes;
        self
    }

    /// Replace the sequential size-class ladder.
    pub fn size_classes(mut self, classes: impl Into<Vec<u64>>) -> Self {
        self.size_classes = classes.into();
        self
    }

    pub fn seq_block_size(mut self, bytes: u64) -> Self {
        self.seq_block_size = bytes;
        self
    }

    pub fn random_block_size(mut self, bytes: u64) -> Self {
        self.random_block_size = bytes;
        self
    }

    /// Replace the random-access scenarios.
    pub fn random_cases(mut self, cases: impl Into<Vec<RandomCase>>) -> Self {
        self.random_cases = cases.into();
        self
    }

    /// Set the metadata population: `count` files of `file_size` bytes each.
    pub fn metadata(mut self, count: u64, file_size: u64) -> Self {
        self.metadata_files = count;
        self.metadata_file_size = file_size;
        self
    }

    pub fn scratch_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.scratch_dir = path.into();
        self
    }

    pub fn output_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_path = path.into();
        self
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Fix the seed for random offsets.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Set verbose output.
    pub fn verbose(mut self, v: bool) -> Self {
        self.verbose = v;
        self
    }

    /// Reject parameters that would make a workload meaningless or collide on
    /// a test identifier. Runs before anything touches the filesystem.
    pub fn validate(&self) -> Result<()> {
        if self.runs == 0 {
            return Err(invalid("runs must be at least 1"));
        }
        if self.total_bytes == 0 {
            return Err(invalid("total_bytes must be positive"));
        }
        if self.seq_block_size == 0 || self.random_block_size == 0 {
            return Err(invalid("block sizes must be positive"));
        }
        if self.scratch_dir.as_os_str().is_empty() {
            return Err(invalid("scratch_dir must not be empty"));
        }

        let mut seen = HashSet::new();
        for &class in &self.size_classes {
            if class == 0 {
                return Err(invalid("size classes must be positive"));
            }
            if !seen.insert(class) {
                return Err(invalid(format!("duplicate size class {class}")));
            }
        }

        let mut seen = HashSet::new();
        for case in &self.random_cases {
            if case.file_size < self.random_block_size {
                return Err(invalid(format!(
                    "random file of {} bytes is smaller than one {} byte block",
                    case.file_size, self.random_block_size
                )));
            }
            // Random test identifiers are keyed by file size only.
            if !seen.insert(case.file_size) {
                return Err(invalid(format!(
                    "duplicate random file size {}",
                    case.file_size
                )));
            }
        }

        Ok(())
    }
}

fn invalid(msg: impl Into<String>) -> BenchError {
    BenchError::InvalidConfig(msg.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_use_defaults_when_env_not_set() {
        let cfg = BenchConfig::default();
        assert_eq!(cfg.runs, 5);
        assert_eq!(cfg.total_bytes, GIB);
        assert_eq!(cfg.seq_block_size, 64 * KIB);
        assert_eq!(cfg.scratch_dir, PathBuf::from("benchmark_temp"));
        assert_eq!(cfg.output_path, PathBuf::from("benchmark_results.json"));
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn should_build_config_with_builder() {
        let cfg = BenchConfig::new()
            .runs(2)
            .total_bytes(10 * MIB)
            .size_classes([MIB])
            .metadata(50, 4 * KIB)
            .label("nvme")
            .seed(7)
            .verbose(false);

        assert_eq!(cfg.runs, 2);
        assert_eq!(cfg.size_classes, vec![MIB]);
        assert_eq!(cfg.metadata_files, 50);
        assert_eq!(cfg.label, "nvme");
        assert_eq!(cfg.seed, Some(7));
        assert!(!cfg.verbose);
    }

    #[test]
    fn should_reject_zero_runs() {
        let err = BenchConfig::new().runs(0).validate().unwrap_err();
        assert!(matches!(err, BenchError::InvalidConfig(_)));
    }

    #[test]
    fn should_reject_random_file_smaller_than_block() {
        let cfg = BenchConfig::new()
            .random_block_size(4 * KIB)
            .random_cases([RandomCase::new(KIB, 10)]);
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn should_reject_duplicate_random_sizes() {
        let cfg = BenchConfig::new()
            .random_cases([RandomCase::new(MIB, 10), RandomCase::new(MIB, 20)]);
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn should_ignore_total_mb_when_it_overflows() {
        std::env::set_var("FSBENCH_TOTAL_MB", u64::MAX.to_string());
        let overflowed = BenchConfig::from_env();
        std::env::set_var("FSBENCH_TOTAL_MB", "8");
        let parsed = BenchConfig::from_env();
        std::env::remove_var("FSBENCH_TOTAL_MB");

        assert_eq!(overflowed.total_bytes, GIB);
        assert_eq!(parsed.total_bytes, 8 * MIB);
    }

    #[test]
    fn should_accept_quick_preset() {
        assert!(BenchConfig::quick().validate().is_ok());
    }
}
