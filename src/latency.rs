//! Per-operation latency samples for random-access workloads.

use crate::result::{metric, MetricRecord};
use std::time::Duration;

/// Latency of each individual operation, in issue order.
#[derive(Debug, Default, Clone)]
pub struct LatencySamples {
    samples: Vec<Duration>,
}

impl LatencySamples {
    pub fn with_capacity(n: usize) -> Self {
        Self {
            samples: Vec::with_capacity(n),
        }
    }

    pub fn record(&mut self, latency: Duration) {
        self.samples.push(latency);
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Add percentile metrics to `record`. Without the `hdr` feature this is
    /// a no-op.
    pub fn annotate(&self, record: MetricRecord) -> MetricRecord {
        match self.percentiles_ms() {
            Some((p50, p99)) => record
                .with(metric::P50_LATENCY_MS, p50)
                .with(metric::P99_LATENCY_MS, p99),
            None => record,
        }
    }

    #[cfg(feature = "hdr")]
    fn percentiles_ms(&self) -> Option<(f64, f64)> {
        if self.samples.is_empty() {
            return None;
        }
        let mut hist = hdrhistogram::Histogram::<u64>::new(3).ok()?;
        for d in &self.samples {
            hist.record(d.as_nanos() as u64).ok()?;
        }
        let ms = |q: f64| hist.value_at_quantile(q) as f64 / 1_000_000.0;
        Some((ms(0.5), ms(0.99)))
    }

    #[cfg(not(feature = "hdr"))]
    fn percentiles_ms(&self) -> Option<(f64, f64)> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::result::WorkloadConfig;

    #[test]
    fn should_count_recorded_samples() {
        let mut samples = LatencySamples::with_capacity(4);
        assert!(samples.is_empty());
        samples.record(Duration::from_micros(10));
        samples.record(Duration::from_micros(20));
        assert_eq!(samples.len(), 2);
    }

    #[cfg(not(feature = "hdr"))]
    #[test]
    fn should_leave_record_untouched_without_hdr() {
        let mut samples = LatencySamples::default();
        samples.record(Duration::from_millis(1));
        let record = samples.annotate(MetricRecord::new(WorkloadConfig::file_delete()));
        assert!(record.metrics.is_empty());
    }

    #[cfg(feature = "hdr")]
    #[test]
    fn should_add_percentiles_with_hdr() {
        let mut samples = LatencySamples::default();
        for ms in 1..=100 {
            samples.record(Duration::from_millis(ms));
        }
        let record = samples.annotate(MetricRecord::new(WorkloadConfig::file_delete()));
        let p50 = record.get(metric::P50_LATENCY_MS).unwrap();
        let p99 = record.get(metric::P99_LATENCY_MS).unwrap();
        assert!((49.0..=51.0).contains(&p50));
        assert!(p99 >= p50);
    }
}
