//! Sequential streaming workloads.

use super::{fill_with_block, random_block, require_block_size, tag};
use crate::context::MeasureContext;
use crate::error::Result;
use crate::result::{metric, MetricRecord, WorkloadConfig};
use rand::Rng;
use std::fs::{self, File};
use std::io::{self, BufWriter, Read, Write};
use std::path::Path;
use std::time::Duration;
use tracing::debug;

const WRITE_FILE: &str = "sequential_write_test.bin";
const READ_FILE: &str = "sequential_read_test.bin";

/// Stream `file_count` files of `file_size` bytes each, one at a time.
///
/// Each file is written by appending the same pre-generated block and then
/// forced to stable storage with `sync_all` before its timer stops. Deleting
/// the file is not timed. Reported duration is the sum over files.
pub fn sequential_write<R: Rng + ?Sized>(
    dir: &Path,
    config: &WorkloadConfig,
    rng: &mut R,
) -> Result<MetricRecord> {
    sequential_write_inner(dir, config, rng).map_err(tag(config))
}

fn sequential_write_inner<R: Rng + ?Sized>(
    dir: &Path,
    config: &WorkloadConfig,
    rng: &mut R,
) -> io::Result<MetricRecord> {
    require_block_size(config)?;
    let block = random_block(rng, config.block_size);
    let path = dir.join(WRITE_FILE);

    let mut total = Duration::ZERO;
    let mut blocks = 0;
    for _ in 0..config.file_count {
        let mut ctx = MeasureContext::new();
        blocks += ctx.measure(|| -> io::Result<u64> {
            let mut file = File::create(&path)?;
            let written = fill_with_block(&mut file, &block, config.file_size)?;
            file.sync_all()?;
            Ok(written)
        })?;
        total += ctx.elapsed();
        fs::remove_file(&path)?;
    }

    let total_bytes = config.file_size * config.file_count;
    let record = throughput_record(config, total, total_bytes)
        .with(metric::BLOCKS_WRITTEN, blocks as f64);
    debug!(
        test = %config.test_id(),
        files = config.file_count,
        blocks,
        duration_sec = total.as_secs_f64(),
        "sequential write complete"
    );
    Ok(record)
}

/// Materialize and then linearly read `file_count` files of `file_size` bytes.
///
/// Only the read pass is timed. The page cache is not dropped between the
/// write and the read, so the result is effective throughput including any
/// cache warmth.
pub fn sequential_read<R: Rng + ?Sized>(
    dir: &Path,
    config: &WorkloadConfig,
    rng: &mut R,
) -> Result<MetricRecord> {
    sequential_read_inner(dir, config, rng).map_err(tag(config))
}

fn sequential_read_inner<R: Rng + ?Sized>(
    dir: &Path,
    config: &WorkloadConfig,
    rng: &mut R,
) -> io::Result<MetricRecord> {
    require_block_size(config)?;
    let block = random_block(rng, config.block_size);
    let path = dir.join(READ_FILE);
    let mut buffer = vec![0u8; config.block_size as usize];

    let mut total = Duration::ZERO;
    let mut bytes_read = 0;
    for _ in 0..config.file_count {
        {
            let mut out = BufWriter::new(File::create(&path)?);
            fill_with_block(&mut out, &block, config.file_size)?;
            out.flush()?;
        }

        let mut ctx = MeasureContext::new();
        bytes_read += ctx.measure(|| -> io::Result<u64> {
            let mut file = File::open(&path)?;
            let mut read = 0;
            loop {
                match file.read(&mut buffer)? {
                    0 => break,
                    n => read += n as u64,
                }
            }
            Ok(read)
        })?;
        total += ctx.elapsed();
        fs::remove_file(&path)?;
    }

    debug!(
        test = %config.test_id(),
        files = config.file_count,
        bytes_read,
        duration_sec = total.as_secs_f64(),
        "sequential read complete"
    );
    Ok(throughput_record(config, total, bytes_read))
}

fn throughput_record(config: &WorkloadConfig, elapsed: Duration, bytes: u64) -> MetricRecord {
    let mut ctx = MeasureContext::new();
    ctx.record_duration(elapsed);
    ctx.set_bytes(bytes);

    MetricRecord::new(*config)
        .with(metric::DURATION_SEC, ctx.elapsed_secs())
        .with(metric::SPEED_BYTES_PER_SEC, ctx.bytes_per_sec().unwrap_or(0.0))
        .with(metric::TOTAL_BYTES, bytes as f64)
        .with(metric::NUM_FILES, config.file_count as f64)
        .with(metric::FILE_SIZE, config.file_size as f64)
        .with(metric::BLOCK_SIZE, config.block_size as f64)
}
