//! Workload primitives.
//!
//! Each primitive is a stateless function over a [`WorkloadConfig`] and the
//! scratch directory. Setup and teardown (materializing input files, deleting
//! output files) happen outside the timed region. I/O failures are returned as
//! [`BenchError::Workload`](crate::BenchError::Workload) carrying the test
//! identifier; nothing is retried.

mod metadata;
mod random;
mod sequential;

pub use metadata::{file_create, file_delete, is_metadata_file, metadata_file_name};
pub use random::{block_offsets, random_read, random_write};
pub use sequential::{sequential_read, sequential_write};

use crate::error::{BenchError, Result};
use crate::result::{MetricRecord, WorkloadConfig, WorkloadKind};
use rand::Rng;
use std::io::{self, Write};
use std::path::Path;

/// Run the primitive matching `config.kind`.
pub fn run_workload<R: Rng + ?Sized>(
    dir: &Path,
    config: &WorkloadConfig,
    rng: &mut R,
) -> Result<MetricRecord> {
    match config.kind {
        WorkloadKind::SeqWrite => sequential_write(dir, config, rng),
        WorkloadKind::SeqRead => sequential_read(dir, config, rng),
        WorkloadKind::RandWrite => random_write(dir, config, rng),
        WorkloadKind::RandRead => random_read(dir, config, rng),
        WorkloadKind::FileCreate => file_create(dir, config, rng),
        WorkloadKind::FileDelete => file_delete(dir, config),
    }
}

/// Attach the workload identity to an I/O failure.
fn tag(config: &WorkloadConfig) -> impl FnOnce(io::Error) -> BenchError + '_ {
    move |source| BenchError::workload(config.test_id(), source)
}

fn random_block<R: Rng + ?Sized>(rng: &mut R, len: u64) -> Vec<u8> {
    let mut block = vec![0u8; len as usize];
    rng.fill_bytes(&mut block);
    block
}

fn require_block_size(config: &WorkloadConfig) -> io::Result<()> {
    if config.block_size == 0 {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "block size must be positive",
        ));
    }
    Ok(())
}

/// Write `size` bytes by repeating `block`, the last chunk possibly short.
/// Returns the number of write calls issued.
fn fill_with_block(out: &mut impl Write, block: &[u8], size: u64) -> io::Result<u64> {
    let mut remaining = size;
    let mut blocks = 0;
    while remaining > 0 {
        let n = remaining.min(block.len() as u64) as usize;
        out.write_all(&block[..n])?;
        remaining -= n as u64;
        blocks += 1;
    }
    Ok(blocks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::result::metric;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn should_count_partial_last_block() {
        let mut out = Vec::new();
        let blocks = fill_with_block(&mut out, &[7u8; 4], 10).unwrap();
        assert_eq!(blocks, 3);
        assert_eq!(out.len(), 10);
    }

    #[test]
    fn should_write_nothing_when_size_is_zero() {
        let mut out = Vec::new();
        assert_eq!(fill_with_block(&mut out, &[1u8; 4], 0).unwrap(), 0);
        assert!(out.is_empty());
    }

    #[test]
    fn should_dispatch_on_kind() {
        let dir = tempfile::TempDir::new().unwrap();
        let mut rng = StdRng::seed_from_u64(1);

        let create = WorkloadConfig::file_create(3, 16);
        let record = run_workload(dir.path(), &create, &mut rng).unwrap();
        assert_eq!(record.get(metric::FILES_CREATED), Some(3.0));

        let delete = WorkloadConfig::file_delete();
        let record = run_workload(dir.path(), &delete, &mut rng).unwrap();
        assert_eq!(record.get(metric::FILES_DELETED), Some(3.0));
    }

    #[test]
    fn should_reject_zero_block_size() {
        let dir = tempfile::TempDir::new().unwrap();
        let mut rng = StdRng::seed_from_u64(1);
        let cfg = WorkloadConfig::sequential_write(1024, 0, 1);
        let err = run_workload(dir.path(), &cfg, &mut rng).unwrap_err();
        assert!(matches!(err, BenchError::Workload { ref test, .. } if test == "seq_write_1024"));
    }
}
