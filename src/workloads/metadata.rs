//! Small-file creation and deletion: metadata-bound workloads.

use super::{random_block, tag};
use crate::context::{per_op_millis, rate, MeasureContext};
use crate::error::Result;
use crate::result::{metric, MetricRecord, WorkloadConfig};
use rand::Rng;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

const PREFIX: &str = "small_file_";
const SUFFIX: &str = ".bin";

/// Name of the `index`-th file in the metadata population.
pub fn metadata_file_name(index: u64) -> String {
    format!("{PREFIX}{index}{SUFFIX}")
}

/// Whether `name` matches `small_file_*.bin`.
pub fn is_metadata_file(name: &str) -> bool {
    name.len() >= PREFIX.len() + SUFFIX.len() && name.starts_with(PREFIX) && name.ends_with(SUFFIX)
}

/// Create `file_count` files of `file_size` bytes, each opened, written in
/// full and closed before the next.
pub fn file_create<R: Rng + ?Sized>(
    dir: &Path,
    config: &WorkloadConfig,
    rng: &mut R,
) -> Result<MetricRecord> {
    file_create_inner(dir, config, rng).map_err(tag(config))
}

fn file_create_inner<R: Rng + ?Sized>(
    dir: &Path,
    config: &WorkloadConfig,
    rng: &mut R,
) -> io::Result<MetricRecord> {
    let data = random_block(rng, config.file_size);
    let paths: Vec<PathBuf> = (0..config.file_count)
        .map(|i| dir.join(metadata_file_name(i)))
        .collect();

    let mut ctx = MeasureContext::new();
    ctx.set_elements(config.file_count);
    ctx.measure(|| -> io::Result<()> {
        for path in &paths {
            let mut file = File::create(path)?;
            file.write_all(&data)?;
        }
        Ok(())
    })?;

    let elapsed = ctx.elapsed_secs();
    debug!(files = config.file_count, duration_sec = elapsed, "file creation complete");

    Ok(MetricRecord::new(*config)
        .with(metric::DURATION_SEC, elapsed)
        .with(metric::FILES_CREATED, config.file_count as f64)
        .with(metric::FILES_PER_SEC, ctx.elements_per_sec().unwrap_or(0.0))
        .with(
            metric::AVG_TIME_PER_FILE_MS,
            per_op_millis(elapsed, config.file_count),
        )
        .with(metric::FILE_SIZE, config.file_size as f64))
}

/// Delete every `small_file_*.bin` present in `dir`.
///
/// The population is discovered by listing the directory (not timed), so the
/// reported count is what was actually on disk, not what creation asked for.
pub fn file_delete(dir: &Path, config: &WorkloadConfig) -> Result<MetricRecord> {
    file_delete_inner(dir, config).map_err(tag(config))
}

fn file_delete_inner(dir: &Path, config: &WorkloadConfig) -> io::Result<MetricRecord> {
    let mut targets = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        if entry.file_name().to_str().is_some_and(is_metadata_file) {
            targets.push(entry.path());
        }
    }
    let found = targets.len() as u64;

    let mut ctx = MeasureContext::new();
    ctx.measure(|| -> io::Result<()> {
        for path in &targets {
            fs::remove_file(path)?;
        }
        Ok(())
    })?;

    let elapsed = ctx.elapsed_secs();
    debug!(files = found, duration_sec = elapsed, "file deletion complete");

    Ok(MetricRecord::new(*config)
        .with(metric::DURATION_SEC, elapsed)
        .with(metric::FILES_DELETED, found as f64)
        .with(metric::FILES_PER_SEC, rate(found, elapsed))
        .with(metric::AVG_TIME_PER_FILE_MS, per_op_millis(elapsed, found)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::KIB;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use tempfile::TempDir;

    fn matching_files(dir: &Path) -> usize {
        fs::read_dir(dir)
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_str().is_some_and(is_metadata_file))
            .count()
    }

    #[test]
    fn should_match_creation_naming_pattern() {
        assert!(is_metadata_file(&metadata_file_name(0)));
        assert!(is_metadata_file("small_file_123.bin"));
        assert!(!is_metadata_file("small_file_1.txt"));
        assert!(!is_metadata_file("sequential_write_test.bin"));
        assert!(!is_metadata_file("small_file_.bi"));
    }

    #[test]
    fn should_delete_every_created_file() {
        let dir = TempDir::new().unwrap();
        let mut rng = StdRng::seed_from_u64(11);

        let created = file_create(
            dir.path(),
            &WorkloadConfig::file_create(50, 4 * KIB),
            &mut rng,
        )
        .unwrap();
        assert_eq!(created.get(metric::FILES_CREATED), Some(50.0));
        assert_eq!(matching_files(dir.path()), 50);
        let size = fs::metadata(dir.path().join(metadata_file_name(0)))
            .unwrap()
            .len();
        assert_eq!(size, 4 * KIB);

        let deleted = file_delete(dir.path(), &WorkloadConfig::file_delete()).unwrap();
        assert_eq!(deleted.get(metric::FILES_DELETED), Some(50.0));
        assert_eq!(matching_files(dir.path()), 0);
    }

    #[test]
    fn should_report_discovered_count_when_population_diverges() {
        let dir = TempDir::new().unwrap();
        let mut rng = StdRng::seed_from_u64(11);
        file_create(dir.path(), &WorkloadConfig::file_create(10, 64), &mut rng).unwrap();

        // Something else removes two files and adds an unrelated one.
        fs::remove_file(dir.path().join(metadata_file_name(3))).unwrap();
        fs::remove_file(dir.path().join(metadata_file_name(7))).unwrap();
        fs::write(dir.path().join("unrelated.bin"), b"x").unwrap();

        let deleted = file_delete(dir.path(), &WorkloadConfig::file_delete()).unwrap();
        assert_eq!(deleted.get(metric::FILES_DELETED), Some(8.0));
        assert!(dir.path().join("unrelated.bin").exists());
    }

    #[test]
    fn should_report_zero_rate_when_nothing_to_delete() {
        let dir = TempDir::new().unwrap();
        let deleted = file_delete(dir.path(), &WorkloadConfig::file_delete()).unwrap();
        assert_eq!(deleted.get(metric::FILES_DELETED), Some(0.0));
        assert_eq!(deleted.get(metric::AVG_TIME_PER_FILE_MS), Some(0.0));
    }
}
