//! Block-aligned random-access workloads.

use super::{random_block, require_block_size, tag};
use crate::context::{per_op_millis, rate, MeasureContext};
use crate::error::Result;
use crate::latency::LatencySamples;
use crate::result::{metric, MetricRecord, WorkloadConfig};
use rand::Rng;
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::Path;
use std::time::Instant;
use tracing::debug;

const WRITE_FILE: &str = "random_write_test.bin";
const READ_FILE: &str = "random_read_test.bin";

/// Chunk used to fill the random-read file without holding it in memory.
const FILL_CHUNK: usize = 1024 * 1024;

/// Endless stream of uniformly drawn offsets `o` with `o % block_size == 0`
/// and `o <= file_size - block_size`. Repeats are allowed.
///
/// Callers must ensure `0 < block_size <= file_size`.
pub fn block_offsets<R: Rng + ?Sized>(
    rng: &mut R,
    file_size: u64,
    block_size: u64,
) -> impl Iterator<Item = u64> + '_ {
    let last_slot = (file_size - block_size) / block_size;
    std::iter::repeat_with(move || rng.gen_range(0..=last_slot) * block_size)
}

/// Write `operations` blocks at random aligned offsets into a sparse
/// pre-allocated file, then `sync_all` once. The flush is inside the timed
/// region; per-operation latency samples exclude it.
pub fn random_write<R: Rng + ?Sized>(
    dir: &Path,
    config: &WorkloadConfig,
    rng: &mut R,
) -> Result<MetricRecord> {
    random_write_inner(dir, config, rng).map_err(tag(config))
}

fn random_write_inner<R: Rng + ?Sized>(
    dir: &Path,
    config: &WorkloadConfig,
    rng: &mut R,
) -> io::Result<MetricRecord> {
    require_fits(config)?;
    let path = dir.join(WRITE_FILE);

    {
        let mut file = File::create(&path)?;
        file.seek(SeekFrom::Start(config.file_size - 1))?;
        file.write_all(&[0])?;
    }

    let block = random_block(rng, config.block_size);
    let offsets: Vec<u64> = block_offsets(rng, config.file_size, config.block_size)
        .take(config.operations as usize)
        .collect();

    let mut file = OpenOptions::new().read(true).write(true).open(&path)?;
    let mut samples = LatencySamples::with_capacity(offsets.len());
    let mut ctx = MeasureContext::new();
    ctx.measure_mut(&mut file, |file| -> io::Result<()> {
        for &offset in &offsets {
            let start = Instant::now();
            file.seek(SeekFrom::Start(offset))?;
            file.write_all(&block)?;
            samples.record(start.elapsed());
        }
        file.sync_all()
    })?;
    drop(file);
    fs::remove_file(&path)?;

    Ok(iops_record(config, &ctx, &samples))
}

/// Fill a file with random content, then read `operations` blocks at random
/// aligned offsets. No flush between reads.
pub fn random_read<R: Rng + ?Sized>(
    dir: &Path,
    config: &WorkloadConfig,
    rng: &mut R,
) -> Result<MetricRecord> {
    random_read_inner(dir, config, rng).map_err(tag(config))
}

fn random_read_inner<R: Rng + ?Sized>(
    dir: &Path,
    config: &WorkloadConfig,
    rng: &mut R,
) -> io::Result<MetricRecord> {
    require_fits(config)?;
    let path = dir.join(READ_FILE);

    {
        let mut out = BufWriter::new(File::create(&path)?);
        let mut chunk = vec![0u8; FILL_CHUNK];
        let mut remaining = config.file_size;
        while remaining > 0 {
            let n = remaining.min(FILL_CHUNK as u64) as usize;
            rng.fill_bytes(&mut chunk[..n]);
            out.write_all(&chunk[..n])?;
            remaining -= n as u64;
        }
        out.flush()?;
    }

    let offsets: Vec<u64> = block_offsets(rng, config.file_size, config.block_size)
        .take(config.operations as usize)
        .collect();

    let mut file = File::open(&path)?;
    let mut buffer = vec![0u8; config.block_size as usize];
    let mut samples = LatencySamples::with_capacity(offsets.len());
    let mut ctx = MeasureContext::new();
    ctx.measure_mut(&mut file, |file| -> io::Result<()> {
        for &offset in &offsets {
            let start = Instant::now();
            file.seek(SeekFrom::Start(offset))?;
            file.read_exact(&mut buffer)?;
            samples.record(start.elapsed());
        }
        Ok(())
    })?;
    drop(file);
    fs::remove_file(&path)?;

    Ok(iops_record(config, &ctx, &samples))
}

fn require_fits(config: &WorkloadConfig) -> io::Result<()> {
    require_block_size(config)?;
    if config.file_size < config.block_size {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!(
                "file of {} bytes cannot hold a {} byte block",
                config.file_size, config.block_size
            ),
        ));
    }
    Ok(())
}

fn iops_record(
    config: &WorkloadConfig,
    ctx: &MeasureContext,
    samples: &LatencySamples,
) -> MetricRecord {
    let elapsed = ctx.elapsed_secs();
    let operations = samples.len() as u64;
    let iops = rate(operations, elapsed);
    let avg_latency_ms = per_op_millis(elapsed, operations);

    debug!(
        test = %config.test_id(),
        operations,
        iops,
        avg_latency_ms,
        "random workload complete"
    );

    let record = MetricRecord::new(*config)
        .with(metric::DURATION_SEC, elapsed)
        .with(metric::IOPS, iops)
        .with(metric::AVG_LATENCY_MS, avg_latency_ms)
        .with(metric::OPERATIONS, operations as f64)
        .with(metric::FILE_SIZE, config.file_size as f64)
        .with(metric::BLOCK_SIZE, config.block_size as f64);
    samples.annotate(record)
}
