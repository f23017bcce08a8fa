//! Statistics over a window of ingress events.

use crate::types::{ClockQualityMetrics, SyncIngressEvent};

const NANOS_PER_SEC_F64: f64 = 1_000_000_000.0;

/// Raw statistics of the valid events in a window.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct WindowStats {
    /// Valid events analysed.
    pub count: u32,
    /// Invalid events skipped.
    pub invalid: u32,
    /// Integer-truncated mean time error.
    pub mean_ns: i64,
    /// Smallest time error.
    pub min_ns: i64,
    /// Largest time error.
    pub max_ns: i64,
    /// Population standard deviation.
    pub std_dev_ns: f64,
    /// Root mean square of raw time error.
    pub rms_ns: f64,
    /// Least-squares slope of time error against seconds (ppb).
    pub slope_ppb: f64,
    /// Earliest timestamp among valid events.
    pub first_ns: u64,
    /// Latest timestamp among valid events.
    pub last_ns: u64,
    /// Largest `|time_error_ns|`.
    pub max_abs_ns: u64,
}

impl WindowStats {
    /// Whether every valid event lies within `±bound_ns`; false for an empty window.
    #[must_use]
    pub fn all_within(&self, bound_ns: i64) -> bool {
        self.count > 0 && self.max_abs_ns <= bound_ns.unsigned_abs()
    }

    /// Span between the earliest and latest valid event.
    #[must_use]
    pub fn span_ns(&self) -> u64 {
        self.last_ns.saturating_sub(self.first_ns)
    }

    /// Copy the statistical fields into a metrics snapshot.
    pub fn fill(&self, metrics: &mut ClockQualityMetrics) {
        metrics.total_measurements = self.count;
        metrics.invalid_measurements = self.invalid;
        metrics.mean_time_error_ns = self.mean_ns;
        metrics.min_time_error_ns = self.min_ns;
        metrics.max_time_error_ns = self.max_ns;
        metrics.std_dev_ns = self.std_dev_ns;
        metrics.rms_error_ns = self.rms_ns;
        metrics.frequency_stability_ppb = self.slope_ppb;
        metrics.meets_80ns_requirement = self.all_within(ClockQualityMetrics::BASELINE_ACCURACY_NS);
    }
}

/// Analyse the events yielded by `events`.
///
/// The iterator is walked twice; invalid events are counted but excluded.
#[must_use]
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
pub fn analyze<'a, I>(events: I) -> WindowStats
where
    I: Iterator<Item = &'a SyncIngressEvent> + Clone,
{
    let mut stats = WindowStats::default();
    let mut sum: i128 = 0;
    let mut sum_sq: i128 = 0;
    let mut min = i64::MAX;
    let mut max = i64::MIN;
    let mut first = u64::MAX;
    let mut last = 0u64;
    let mut count: u64 = 0;

    for event in events.clone() {
        if !event.is_valid {
            stats.invalid = stats.invalid.saturating_add(1);
            continue;
        }
        let e = event.time_error_ns;
        count += 1;
        sum += i128::from(e);
        sum_sq += i128::from(e) * i128::from(e);
        min = min.min(e);
        max = max.max(e);
        first = first.min(event.master_tx_ns);
        last = last.max(event.master_tx_ns);
        stats.max_abs_ns = stats.max_abs_ns.max(e.unsigned_abs());
    }

    if count == 0 {
        return stats;
    }

    let n = count as f64;
    let mean_exact = sum as f64 / n;

    // Second pass: centred moments for variance and the drift fit.
    let mean_x = {
        let total: f64 = events
            .clone()
            .filter(|e| e.is_valid)
            .map(|e| (e.master_tx_ns - first) as f64 / NANOS_PER_SEC_F64)
            .sum();
        total / n
    };
    let mut sq_dev = 0.0;
    let mut sxx = 0.0;
    let mut sxy = 0.0;
    for event in events.filter(|e| e.is_valid) {
        let y = event.time_error_ns as f64 - mean_exact;
        let x = (event.master_tx_ns - first) as f64 / NANOS_PER_SEC_F64 - mean_x;
        sq_dev += y * y;
        sxx += x * x;
        sxy += x * y;
    }

    stats.count = u32::try_from(count).unwrap_or(u32::MAX);
    stats.mean_ns = (sum / i128::from(count)) as i64;
    stats.min_ns = min;
    stats.max_ns = max;
    stats.std_dev_ns = (sq_dev / n).sqrt();
    stats.rms_ns = (sum_sq as f64 / n).sqrt();
    stats.slope_ppb = if sxx > f64::EPSILON { sxy / sxx } else { 0.0 };
    stats.first_ns = first;
    stats.last_ns = last;
    stats
}
