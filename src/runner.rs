//! Suite orchestration and the multi-run session.

use crate::aggregate::Aggregator;
use crate::config::BenchConfig;
use crate::error::{BenchError, Result};
use crate::report::{ConsoleReporter, Reporter};
use crate::result::{BenchmarkReport, RunResult, WorkloadConfig};
use crate::workloads::run_workload;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

/// Exclusively owned scratch directory, removed when dropped.
///
/// Creating it destroys any existing directory at the same path. Removal on
/// drop covers normal return, early `?` return and unwinding panics; a process
/// killed by a signal skips it and may leave the directory behind.
#[derive(Debug)]
pub struct ScratchDir {
    path: PathBuf,
}

impl ScratchDir {
    /// Clear and recreate `path`. A non-directory at `path` is a setup failure.
    pub fn create(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let setup = |source: io::Error| BenchError::Setup {
            path: path.clone(),
            source,
        };

        match fs::symlink_metadata(&path) {
            Ok(meta) if meta.is_dir() => fs::remove_dir_all(&path).map_err(setup)?,
            Ok(_) => {
                return Err(setup(io::Error::new(
                    io::ErrorKind::AlreadyExists,
                    "path exists and is not a directory",
                )))
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(setup(e)),
        }
        fs::create_dir_all(&path).map_err(setup)?;

        debug!(path = %path.display(), "scratch directory ready");
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ScratchDir {
    fn drop(&mut self) {
        match fs::remove_dir_all(&self.path) {
            Ok(()) => debug!(path = %self.path.display(), "scratch directory removed"),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => warn!(
                path = %self.path.display(),
                error = %e,
                "failed to remove scratch directory"
            ),
        }
    }
}

/// Runs the workload suite against a scratch directory and aggregates runs.
///
/// # Example
///
/// ```rust,no_run
/// use fsbench::{BenchConfig, BenchRunner};
///
/// let config = BenchConfig::quick().label("laptop-ssd");
/// let report = BenchRunner::with_config(config).run()?;
/// println!("{} runs written", report.num_runs);
/// # Ok::<(), fsbench::BenchError>(())
/// ```
pub struct BenchRunner {
    config: BenchConfig,
    rng: StdRng,
    reporters: Vec<Box<dyn Reporter>>,
}

impl BenchRunner {
    /// Create a runner with config from the environment.
    pub fn new() -> Self {
        Self::with_config(BenchConfig::from_env())
    }

    /// Create a runner with explicit config.
    pub fn with_config(config: BenchConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let mut reporters: Vec<Box<dyn Reporter>> = Vec::new();
        if config.verbose {
            reporters.push(Box::new(ConsoleReporter::new()));
        }

        Self {
            config,
            rng,
            reporters,
        }
    }

    pub fn config(&self) -> &BenchConfig {
        &self.config
    }

    /// Replace reporters with a custom set.
    pub fn reporters(&mut self, reporters: Vec<Box<dyn Reporter>>) -> &mut Self {
        self.reporters = reporters;
        self
    }

    /// Add an additional reporter.
    pub fn add_reporter(&mut self, reporter: Box<dyn Reporter>) -> &mut Self {
        self.reporters.push(reporter);
        self
    }

    /// Workloads of one suite pass, in execution order.
    ///
    /// Every sequential class moves `total_bytes` in total, as
    /// `total_bytes / class` files of `class` bytes each.
    pub fn plan(&self) -> Vec<WorkloadConfig> {
        let cfg = &self.config;
        let mut plan = Vec::new();

        for &class in &cfg.size_classes {
            plan.push(WorkloadConfig::sequential_write(
                class,
                cfg.seq_block_size,
                cfg.total_bytes / class,
            ));
        }
        for &class in &cfg.size_classes {
            plan.push(WorkloadConfig::sequential_read(
                class,
                cfg.seq_block_size,
                cfg.total_bytes / class,
            ));
        }
        for case in &cfg.random_cases {
            plan.push(WorkloadConfig::random_write(
                case.file_size,
                cfg.random_block_size,
                case.operations,
            ));
        }
        for case in &cfg.random_cases {
            plan.push(WorkloadConfig::random_read(
                case.file_size,
                cfg.random_block_size,
                case.operations,
            ));
        }
        plan.push(WorkloadConfig::file_create(
            cfg.metadata_files,
            cfg.metadata_file_size,
        ));
        plan.push(WorkloadConfig::file_delete());

        plan
    }

    /// Execute one full pass of the suite in a freshly created scratch
    /// directory. The first failing workload aborts the pass; the scratch
    /// directory is removed before the error reaches the caller.
    pub fn run_suite(&mut self) -> Result<RunResult> {
        self.config.validate()?;
        let plan = self.plan();
        let scratch = ScratchDir::create(&self.config.scratch_dir)?;

        let mut result = RunResult::default();
        for workload in &plan {
            let record = match run_workload(scratch.path(), workload, &mut self.rng) {
                Ok(record) => record,
                Err(e) => {
                    error!(test = %workload.test_id(), error = %e, "workload failed, aborting run");
                    return Err(e);
                }
            };
            for r in &self.reporters {
                r.workload_end(&record);
            }
            result.insert(record);
        }

        Ok(result)
    }

    /// Run the suite `config.runs` times, aggregate, and write the report to
    /// `config.output_path`.
    pub fn run(mut self) -> Result<BenchmarkReport> {
        self.config.validate()?;
        let total = self.config.runs;

        info!(
            runs = total,
            scratch_dir = %self.config.scratch_dir.display(),
            "starting benchmark session"
        );
        for r in &self.reporters {
            r.suite_start(&self.config);
        }

        let mut aggregator = Aggregator::new();
        for run in 1..=total {
            for r in &self.reporters {
                r.run_start(run, total);
            }
            let result = self.run_suite()?;
            info!(run, total, tests = result.len(), "run complete");
            for r in &self.reporters {
                r.run_end(run, &result);
            }
            aggregator.record_run(result);
        }

        let report = aggregator.finish(
            self.config.label.clone(),
            &absolute(&self.config.scratch_dir),
        );
        report.save(&self.config.output_path)?;
        info!(path = %self.config.output_path.display(), "report written");

        for r in &self.reporters {
            r.suite_end(&report);
        }
        Ok(report)
    }
}

impl Default for BenchRunner {
    fn default() -> Self {
        Self::new()
    }
}

fn absolute(path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    std::env::current_dir()
        .map(|cwd| cwd.join(path))
        .unwrap_or_else(|_| path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{RandomCase, KIB};
    use crate::result::metric;
    use crate::workloads::is_metadata_file;
    use std::sync::{Arc, Mutex};
    use tempfile::TempDir;

    fn small_config(root: &Path) -> BenchConfig {
        BenchConfig::new()
            .runs(2)
            .total_bytes(512 * KIB)
            .size_classes([128 * KIB, 256 * KIB])
            .seq_block_size(32 * KIB)
            .random_block_size(4 * KIB)
            .random_cases([RandomCase::new(64 * KIB, 16)])
            .metadata(20, KIB)
            .scratch_dir(root.join("scratch"))
            .output_path(root.join("out").join("benchmark_results.json"))
            .label("unit")
            .seed(1)
            .verbose(false)
    }

    #[derive(Default)]
    struct Recording {
        events: Arc<Mutex<Vec<String>>>,
    }

    impl Reporter for Recording {
        fn run_start(&self, run: usize, total: usize) {
            self.events.lock().unwrap().push(format!("run {run}/{total}"));
        }
        fn workload_end(&self, record: &crate::result::MetricRecord) {
            self.events.lock().unwrap().push(record.test_id());
        }
    }

    #[test]
    fn should_plan_every_workload_in_order() {
        let dir = TempDir::new().unwrap();
        let runner = BenchRunner::with_config(small_config(dir.path()));
        let ids: Vec<String> = runner.plan().iter().map(|w| w.test_id()).collect();

        assert_eq!(
            ids,
            vec![
                "seq_write_131072",
                "seq_write_262144",
                "seq_read_131072",
                "seq_read_262144",
                "rand_write_65536",
                "rand_read_65536",
                "file_creation",
                "file_deletion",
            ]
        );
    }

    #[test]
    fn should_normalize_total_bytes_across_size_classes() {
        let dir = TempDir::new().unwrap();
        let runner = BenchRunner::with_config(small_config(dir.path()));
        for w in runner.plan().iter().filter(|w| w.kind.is_sequential()) {
            assert_eq!(w.file_size * w.file_count, 512 * KIB);
        }
    }

    #[test]
    fn should_remove_scratch_dir_after_run() {
        let dir = TempDir::new().unwrap();
        let config = small_config(dir.path());
        let scratch = config.scratch_dir.clone();
        let mut runner = BenchRunner::with_config(config);
        runner.reporters(vec![]);

        let result = runner.run_suite().unwrap();

        assert_eq!(result.len(), 8);
        assert!(!scratch.exists());
        let deleted = result.get("file_deletion").unwrap();
        assert_eq!(deleted.get(metric::FILES_DELETED), Some(20.0));
    }

    #[test]
    fn should_replace_existing_scratch_contents() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("scratch");
        fs::create_dir_all(path.join("nested")).unwrap();
        fs::write(path.join("small_file_999.bin"), b"stale").unwrap();

        let scratch = ScratchDir::create(&path).unwrap();
        assert_eq!(fs::read_dir(scratch.path()).unwrap().count(), 0);
        drop(scratch);
        assert!(!path.exists());
    }

    #[test]
    fn should_fail_setup_when_path_is_a_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("occupied");
        fs::write(&path, b"not a directory").unwrap();

        let err = ScratchDir::create(&path).unwrap_err();
        assert!(matches!(err, BenchError::Setup { .. }));
        assert!(path.is_file());
    }

    /// Blocks the sequential write file name with a directory once the first
    /// workload has finished, so the next write fails mid-run.
    struct Obstruct {
        scratch: PathBuf,
    }

    impl Reporter for Obstruct {
        fn workload_end(&self, record: &crate::result::MetricRecord) {
            if record.test_id() == "seq_write_131072" {
                fs::create_dir(self.scratch.join("sequential_write_test.bin")).unwrap();
            }
        }
    }

    #[test]
    fn should_clean_up_when_a_workload_fails() {
        let dir = TempDir::new().unwrap();
        let config = small_config(dir.path());
        let scratch = config.scratch_dir.clone();
        let mut runner = BenchRunner::with_config(config);
        runner.reporters(vec![Box::new(Obstruct {
            scratch: scratch.clone(),
        })]);

        let err = runner.run_suite().unwrap_err();

        assert!(matches!(err, BenchError::Workload { ref test, .. } if test == "seq_write_262144"));
        assert!(!scratch.exists());
    }

    #[test]
    fn should_reject_invalid_config_before_touching_disk() {
        let dir = TempDir::new().unwrap();
        let config = small_config(dir.path()).seq_block_size(0);
        let scratch = config.scratch_dir.clone();

        let err = BenchRunner::with_config(config).run().unwrap_err();
        assert!(matches!(err, BenchError::InvalidConfig(_)));
        assert!(!scratch.exists());
    }

    #[test]
    fn should_persist_two_run_report() {
        let dir = TempDir::new().unwrap();
        let config = small_config(dir.path());
        let output = config.output_path.clone();
        let scratch = config.scratch_dir.clone();

        let recording = Recording::default();
        let events = Arc::clone(&recording.events);
        let mut runner = BenchRunner::with_config(config);
        runner.reporters(vec![Box::new(recording)]);

        let report = runner.run().unwrap();

        assert_eq!(report.num_runs, 2);
        assert_eq!(report.all_runs.len(), 2);
        assert!(!scratch.exists());

        let loaded = BenchmarkReport::load(&output).unwrap();
        assert_eq!(loaded, report);
        assert_eq!(loaded.name, "unit");
        assert!(Path::new(&loaded.test_directory).is_absolute());

        for (test_id, metrics) in &loaded.aggregated_statistics {
            assert!(loaded.tests.contains_key(test_id));
            for stat in metrics.values() {
                assert_eq!(stat.values.len(), 2, "{test_id}");
                assert!(stat.min <= stat.mean && stat.mean <= stat.max, "{test_id}");
            }
        }
        assert_eq!(
            loaded.stat("seq_write_131072", metric::FILE_SIZE).map(|s| s.mean),
            Some((128 * KIB) as f64)
        );

        let events = events.lock().unwrap();
        assert_eq!(events.first().map(String::as_str), Some("run 1/2"));
        assert_eq!(events.iter().filter(|e| e.starts_with("run ")).count(), 2);
        assert_eq!(events.len(), 2 + 2 * 8);
    }

    #[test]
    fn should_leave_no_metadata_files_in_scratch_between_workloads() {
        let dir = TempDir::new().unwrap();
        let scratch = ScratchDir::create(dir.path().join("s")).unwrap();
        let mut rng = StdRng::seed_from_u64(2);

        run_workload(scratch.path(), &WorkloadConfig::file_create(50, 4 * KIB), &mut rng).unwrap();
        let record =
            run_workload(scratch.path(), &WorkloadConfig::file_delete(), &mut rng).unwrap();

        assert_eq!(record.get(metric::FILES_DELETED), Some(50.0));
        let leftovers = fs::read_dir(scratch.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_str().is_some_and(is_metadata_file))
            .count();
        assert_eq!(leftovers, 0);
    }
}
