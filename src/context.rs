//! Timing control for workload primitives.

use std::time::{Duration, Instant};

/// Context a workload uses to delimit its timed region.
///
/// Everything outside `measure` is setup or teardown and is not timed.
#[derive(Debug, Default)]
pub struct MeasureContext {
    duration: Option<Duration>,
    bytes: Option<u64>,
    elements: Option<u64>,
}

impl MeasureContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record bytes processed. Enables bytes/sec reporting.
    pub fn set_bytes(&mut self, bytes: u64) {
        self.bytes = Some(bytes);
    }

    /// Record operations processed. Enables ops/sec reporting.
    pub fn set_elements(&mut self, elements: u64) {
        self.elements = Some(elements);
    }

    /// Time a single operation. The closure's return value is passed through,
    /// so fallible bodies can be followed by `?`.
    ///
    /// ```rust
    /// # use fsbench::MeasureContext;
    /// let mut ctx = MeasureContext::new();
    /// let data = vec![0u8; 4096]; // not timed
    /// let sum: u64 = ctx.measure(|| data.iter().map(|&b| b as u64).sum());
    /// assert_eq!(sum, 0);
    /// assert!(ctx.elapsed_secs() >= 0.0);
    /// ```
    pub fn measure<F, R>(&mut self, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        let start = Instant::now();
        let result = f();
        self.duration = Some(start.elapsed());
        result
    }

    /// Time an operation on a mutable reference.
    pub fn measure_mut<F, T, R>(&mut self, target: &mut T, f: F) -> R
    where
        F: FnOnce(&mut T) -> R,
    {
        let start = Instant::now();
        let result = f(target);
        self.duration = Some(start.elapsed());
        result
    }

    /// Manually record a duration timed elsewhere.
    pub fn record_duration(&mut self, duration: Duration) {
        self.duration = Some(duration);
    }

    /// Measured duration, zero if nothing was measured.
    pub fn elapsed(&self) -> Duration {
        self.duration.unwrap_or_default()
    }

    pub fn elapsed_secs(&self) -> f64 {
        self.elapsed().as_secs_f64()
    }

    pub fn bytes_per_sec(&self) -> Option<f64> {
        self.bytes.map(|b| rate(b, self.elapsed_secs()))
    }

    pub fn elements_per_sec(&self) -> Option<f64> {
        self.elements.map(|e| rate(e, self.elapsed_secs()))
    }
}

/// `count / secs`, defined as zero when nothing measurable elapsed.
pub fn rate(count: u64, secs: f64) -> f64 {
    if secs > 0.0 {
        count as f64 / secs
    } else {
        0.0
    }
}

/// `secs / count` in milliseconds, zero for an empty batch.
pub fn per_op_millis(secs: f64, count: u64) -> f64 {
    if count > 0 {
        secs / count as f64 * 1000.0
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_measure_duration_when_called() {
        let mut ctx = MeasureContext::new();
        ctx.measure(|| std::thread::sleep(Duration::from_millis(10)));

        let d = ctx.elapsed();
        assert!(d >= Duration::from_millis(10));
        assert!(d < Duration::from_secs(5));
    }

    #[test]
    fn should_report_zero_rate_when_duration_is_zero() {
        let mut ctx = MeasureContext::new();
        ctx.record_duration(Duration::ZERO);
        ctx.set_bytes(1024);
        ctx.set_elements(10);
        assert_eq!(ctx.bytes_per_sec(), Some(0.0));
        assert_eq!(ctx.elements_per_sec(), Some(0.0));
    }

    #[test]
    fn should_divide_exactly_when_duration_positive() {
        let mut ctx = MeasureContext::new();
        ctx.record_duration(Duration::from_millis(500));
        ctx.set_bytes(1_000_000);
        assert_eq!(ctx.bytes_per_sec(), Some(1_000_000.0 / 0.5));
    }

    #[test]
    fn should_pass_through_errors_from_measured_body() {
        let mut ctx = MeasureContext::new();
        let res: std::io::Result<()> =
            ctx.measure(|| Err(std::io::Error::new(std::io::ErrorKind::Other, "boom")));
        assert!(res.is_err());
        assert!(ctx.elapsed() >= Duration::ZERO);
    }

    #[test]
    fn should_report_zero_latency_for_empty_batch() {
        assert_eq!(per_op_millis(1.0, 0), 0.0);
        assert_eq!(per_op_millis(1.0, 4), 250.0);
    }
}
