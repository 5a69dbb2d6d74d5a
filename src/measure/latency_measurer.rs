use hdrhistogram::Histogram;
use std::time::{Duration, Instant};

/// Statistics for latency measurements.
#[derive(Debug, Clone, Default)]
pub struct LatencyStats {
    /// Total number of samples.
    pub count: u64,
    /// Minimum latency in nanoseconds.
    pub min: u64,
    /// Maximum latency in nanoseconds.
    pub max: u64,
    /// Mean latency in nanoseconds.
    pub mean: f64,
    /// 50th percentile (median) latency in nanoseconds.
    pub p50: u64,
    /// 90th percentile latency in nanoseconds.
    pub p90: u64,
    /// 99th percentile latency in nanoseconds.
    pub p99: u64,
    /// 99.9th percentile latency in nanoseconds.
    pub p999: u64,
}

pub struct LatencyMeasurerGuard<'a> {
    measurer: &'a mut LatencyMeasurer,
    start: Option<Instant>,
}

impl Drop for LatencyMeasurerGuard<'_> {
    fn drop(&mut self) {
        if let Some(start) = self.start {
            self.measurer.record(start.elapsed());
        }
    }
}

/// Per-record latency measurer backed by an HdrHistogram.
///
/// Only every `sample_rate`-th measurement is recorded.
pub struct LatencyMeasurer {
    histogram: Histogram<u64>,
    sample_rate: u64,
    step: u64,
}

impl LatencyMeasurer {
    const MAX_NANOS: u64 = 1_000_000_000_000;

    pub fn new(sample_rate: u64) -> Self {
        assert!(sample_rate > 0, "sample_rate must be positive");
        // Range: 1ns to 1,000s, 3 significant figures
        let histogram = Histogram::<u64>::new_with_bounds(1, Self::MAX_NANOS, 3)
            .expect("histogram bounds are constant and valid");
        Self {
            histogram,
            sample_rate,
            step: 0,
        }
    }

    pub fn measure(&mut self, duration: Duration) {
        self.step += 1;
        if !self.step.is_multiple_of(self.sample_rate) {
            return;
        }
        self.record(duration);
    }

    fn record(&mut self, duration: Duration) {
        let nanos = (duration.as_nanos() as u64).clamp(1, Self::MAX_NANOS);
        self.histogram.saturating_record(nanos);
    }

    pub fn measure_with_guard(&mut self) -> LatencyMeasurerGuard<'_> {
        self.step += 1;
        let start = if self.step.is_multiple_of(self.sample_rate) {
            Some(Instant::now())
        } else {
            None
        };
        LatencyMeasurerGuard {
            measurer: self,
            start,
        }
    }

    pub fn reset(&mut self) {
        self.histogram.reset();
        self.step = 0;
    }

    pub fn get_stats(&self) -> LatencyStats {
        let count = self.histogram.len();
        if count == 0 {
            return LatencyStats::default();
        }

        LatencyStats {
            count,
            min: self.histogram.min(),
            max: self.histogram.max(),
            mean: self.histogram.mean(),
            p50: self.histogram.value_at_quantile(0.5),
            p90: self.histogram.value_at_quantile(0.9),
            p99: self.histogram.value_at_quantile(0.99),
            p999: self.histogram.value_at_quantile(0.999),
        }
    }

    pub fn format_stats(&self) -> String {
        let stats = self.get_stats();
        if stats.count == 0 {
            return "No stats collected yet".into();
        }

        format!(
            "\tmin={},\tmax={},\tmean={},\tp50={},\tp90={},\tp99={},\tp999={}",
            Self::format_duration(stats.min as f64),
            Self::format_duration(stats.max as f64),
            Self::format_duration(stats.mean),
            Self::format_duration(stats.p50 as f64),
            Self::format_duration(stats.p90 as f64),
            Self::format_duration(stats.p99 as f64),
            Self::format_duration(stats.p999 as f64),
        )
    }

    fn format_duration(nanos: f64) -> String {
        if nanos < 1000.0 {
            format!("{:.1}ns", nanos)
        } else if nanos < 1_000_000.0 {
            format!("{:.1}us", nanos / 1000.0)
        } else if nanos < 1_000_000_000.0 {
            format!("{:.1}ms", nanos / 1_000_000.0)
        } else {
            format!("{:.2}s", nanos / 1_000_000_000.0)
        }
    }
}
