//! Per-task timing sample buffers and descriptive statistics.
//!
//! Each periodic task owns exactly one [`TimingLog`] and is its only writer;
//! the buffer is read once, by the same task, at termination. No lock is
//! needed, and no sample is recorded after the buffer reaches capacity.

use statrs::statistics::Statistics;

/// What a task's samples measure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleKind {
    /// Gap between consecutive activation starts, milliseconds.
    Period,
    /// In-activation computation duration, milliseconds.
    Computation,
}

/// Append-only, capacity-capped sample buffer.
pub struct TimingLog {
    kind: SampleKind,
    capacity: usize,
    samples_ms: Vec<f64>,
}

impl TimingLog {
    pub fn new(kind: SampleKind, capacity: usize) -> Self {
        Self {
            kind,
            capacity,
            samples_ms: Vec::with_capacity(capacity),
        }
    }

    pub fn kind(&self) -> SampleKind {
        self.kind
    }

    /// Appends a sample; a silent no-op once the buffer is full.
    pub fn push(&mut self, sample_ms: f64) {
        if self.samples_ms.len() < self.capacity {
            self.samples_ms.push(sample_ms);
        }
    }

    pub fn len(&self) -> usize {
        self.samples_ms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples_ms.is_empty()
    }

    /// Statistics over the buffer, discarding the first sample: it measures
    /// the span since thread creation, not a true inter-activation gap or a
    /// representative computation, and would bias every aggregate.
    pub fn report(&self, nominal_ms: f64) -> Option<TimingStats> {
        TimingStats::from_samples(self.samples_ms.get(1..)?, nominal_ms)
    }
}

/// Mean, population variance/std-dev, min and max of one series.
#[derive(Debug, Clone, Copy)]
pub struct SeriesStats {
    pub mean: f64,
    pub variance: f64,
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
}

impl SeriesStats {
    fn over(data: &[f64]) -> Self {
        Self {
            mean: data.mean(),
            variance: data.population_variance(),
            std_dev: data.population_std_dev(),
            min: Statistics::min(data),
            max: Statistics::max(data),
        }
    }
}

/// Descriptive statistics of a sample series and of its jitter series
/// (`sample − nominal`).
#[derive(Debug, Clone, Copy)]
pub struct TimingStats {
    pub count: usize,
    pub nominal_ms: f64,
    pub raw: SeriesStats,
    pub jitter: SeriesStats,
}

impl TimingStats {
    /// `None` for an empty series; never divides by zero.
    pub fn from_samples(samples_ms: &[f64], nominal_ms: f64) -> Option<Self> {
        if samples_ms.is_empty() {
            return None;
        }
        let jitter: Vec<f64> = samples_ms.iter().map(|s| s - nominal_ms).collect();
        Some(Self {
            count: samples_ms.len(),
            nominal_ms,
            raw: SeriesStats::over(samples_ms),
            jitter: SeriesStats::over(&jitter),
        })
    }

    /// Period/jitter table, one row per metric.
    pub fn print_period_table(&self, task_name: &str) {
        println!();
        println!(
            "--- Timing analysis: {} (nominal {:.0} ms, {} samples) ---",
            task_name, self.nominal_ms, self.count
        );
        println!("| Metric   | Period T(k) [ms]  | Jitter J(k) [ms]  |");
        println!("|----------|-------------------|-------------------|");
        println!(
            "| Mean     | {:17.6} | {:17.6} |",
            self.raw.mean, self.jitter.mean
        );
        println!(
            "| Variance | {:17.6} | {:17.6} |",
            self.raw.variance, self.jitter.variance
        );
        println!(
            "| Std dev  | {:17.6} | {:17.6} |",
            self.raw.std_dev, self.jitter.std_dev
        );
        println!(
            "| Min      | {:17.6} | {:17.6} |",
            self.raw.min, self.jitter.min
        );
        println!(
            "| Max      | {:17.6} | {:17.6} |",
            self.raw.max, self.jitter.max
        );
        println!("-----------------------------------------------------");
    }

    /// Compact per-activation computation-time summary; the max is the
    /// task's estimated worst-case execution time.
    pub fn print_computation_summary(&self, task_name: &str) {
        println!();
        println!("--- Computation time: {} ({} samples) ---", task_name, self.count);
        println!("  min:  {:.6} ms", self.raw.min);
        println!("  mean: {:.6} ms", self.raw.mean);
        println!("  max:  {:.6} ms", self.raw.max);
    }
}
