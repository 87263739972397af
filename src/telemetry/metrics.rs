//! Metrics collection for VCS queries and inspector operations.
//!
//! Provides in-memory metrics tracking with histograms for latency distribution.

use once_cell::sync::Lazy;
use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// Latency samples kept per histogram; older samples are evicted first.
pub const HISTOGRAM_CAPACITY: usize = 1024;

/// Global metrics instance.
pub static GLOBAL_METRICS: Lazy<Metrics> = Lazy::new(Metrics::new);

/// Centralized metrics collection.
pub struct Metrics {
    queries: Mutex<HashMap<String, QueryMetrics>>,
    operations: Mutex<HashMap<String, OperationMetrics>>,
}

impl Metrics {
    /// Create a new metrics instance.
    pub fn new() -> Self {
        Self {
            queries: Mutex::new(HashMap::new()),
            operations: Mutex::new(HashMap::new()),
        }
    }

    /// Record a guarded query (one `attempt_named` call).
    pub fn record_query(&self, name: &str, duration: Duration, success: bool) {
        let mut metrics = self.queries();
        let entry = metrics.entry(name.to_string()).or_default();
        entry.record(duration, success);
    }

    /// Record a top-level inspector operation.
    pub fn record_operation(&self, name: &str, duration: Duration) {
        let mut metrics = self.operations();
        let entry = metrics.entry(name.to_string()).or_default();
        entry.record(duration);
    }

    /// Get a snapshot of all metrics.
    pub fn snapshot(&self) -> MetricsSnapshot {
        let queries = self.queries().clone();
        let operations = self.operations().clone();

        MetricsSnapshot {
            queries,
            operations,
        }
    }

    /// Reset all metrics.
    pub fn reset(&self) {
        self.queries().clear();
        self.operations().clear();
    }

    // A panic while recording leaves the maps consistent, so a poisoned lock is reused
    fn queries(&self) -> MutexGuard<'_, HashMap<String, QueryMetrics>> {
        self.queries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn operations(&self) -> MutexGuard<'_, HashMap<String, OperationMetrics>> {
        self.operations.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Metrics for one named query.
#[derive(Debug, Clone)]
pub struct QueryMetrics {
    pub invocations: u64,
    pub successes: u64,
    pub failures: u64,
    pub total_duration: Duration,
    pub min_duration: Duration,
    pub max_duration: Duration,
    pub histogram: Histogram,
}

impl QueryMetrics {
    pub fn new() -> Self {
        Self {
            invocations: 0,
            successes: 0,
            failures: 0,
            total_duration: Duration::ZERO,
            min_duration: Duration::MAX,
            max_duration: Duration::ZERO,
            histogram: Histogram::new(),
        }
    }

    /// Record one invocation.
    pub fn record(&mut self, duration: Duration, success: bool) {
        self.invocations += 1;
        if success {
            self.successes += 1;
        } else {
            self.failures += 1;
        }
        self.total_duration += duration;
        self.min_duration = self.min_duration.min(duration);
        self.max_duration = self.max_duration.max(duration);
        self.histogram.record(duration);
    }

    /// Get average duration.
    pub fn avg_duration(&self) -> Duration {
        if self.invocations == 0 {
            Duration::ZERO
        } else {
            self.total_duration / self.invocations as u32
        }
    }

    /// Get success rate as a percentage.
    pub fn success_rate(&self) -> f64 {
        if self.invocations == 0 {
            100.0
        } else {
            (self.successes as f64 / self.invocations as f64) * 100.0
        }
    }
}

impl Default for QueryMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Metrics for inspector operations (`extract`, `ancestors`).
#[derive(Debug, Clone)]
pub struct OperationMetrics {
    pub count: u64,
    pub total_duration: Duration,
    pub histogram: Histogram,
}

impl OperationMetrics {
    pub fn new() -> Self {
        Self {
            count: 0,
            total_duration: Duration::ZERO,
            histogram: Histogram::new(),
        }
    }

    pub fn record(&mut self, duration: Duration) {
        self.count += 1;
        self.total_duration += duration;
        self.histogram.record(duration);
    }
}

impl Default for OperationMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Latency histogram over the most recent [`HISTOGRAM_CAPACITY`] samples.
///
/// Memory stays bounded no matter how often a long-lived host records.
#[derive(Debug, Clone, Default)]
pub struct Histogram {
    samples: VecDeque<Duration>,
    recorded: u64,
}

impl Histogram {
    pub fn new() -> Self {
        Self {
            samples: VecDeque::with_capacity(16),
            recorded: 0,
        }
    }

    pub fn record(&mut self, duration: Duration) {
        if self.samples.len() == HISTOGRAM_CAPACITY {
            self.samples.pop_front();
        }
        self.samples.push_back(duration);
        self.recorded += 1;
    }

    /// Samples currently retained (at most [`HISTOGRAM_CAPACITY`]).
    pub fn count(&self) -> usize {
        self.samples.len()
    }

    /// Samples recorded over the histogram's lifetime, evicted ones included.
    pub fn recorded(&self) -> u64 {
        self.recorded
    }

    /// Get the 50th percentile (median).
    pub fn p50(&self) -> Option<Duration> {
        self.percentile(50)
    }

    pub fn p90(&self) -> Option<Duration> {
        self.percentile(90)
    }

    pub fn p99(&self) -> Option<Duration> {
        self.percentile(99)
    }

    /// Get the specified percentile.
    pub fn percentile(&self, p: u8) -> Option<Duration> {
        if self.samples.is_empty() {
            return None;
        }

        let mut sorted: Vec<Duration> = self.samples.iter().copied().collect();
        sorted.sort_unstable();

        let index = (p as f64 / 100.0 * (sorted.len() - 1) as f64).round() as usize;
        Some(sorted[index.min(sorted.len() - 1)])
    }
}

/// Snapshot of all metrics at a point in time.
#[derive(Debug, Clone)]
pub struct MetricsSnapshot {
    pub queries: HashMap<String, QueryMetrics>,
    pub operations: HashMap<String, OperationMetrics>,
}

impl MetricsSnapshot {
    /// Format as a human-readable report.
    pub fn format_report(&self) -> String {
        let mut report = String::new();
        report.push_str("=== Metrics Report ===\n\n");

        if !self.queries.is_empty() {
            report.push_str("Queries:\n");
            let mut names: Vec<_> = self.queries.keys().collect();
            names.sort();
            for name in names {
                let metrics = &self.queries[name];
                report.push_str(&format!(
                    "  {}: {} calls, {:.1}% success, avg {:.2}ms\n",
                    name,
                    metrics.invocations,
                    metrics.success_rate(),
                    metrics.avg_duration().as_secs_f64() * 1000.0
                ));
            }
            report.push('\n');
        }

        if !self.operations.is_empty() {
            report.push_str("Operations:\n");
            let mut names: Vec<_> = self.operations.keys().collect();
            names.sort();
            for name in names {
                report.push_str(&format!("  {}: {} calls\n", name, self.operations[name].count));
            }
        }

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_metrics() {
        let mut metrics = QueryMetrics::new();
        metrics.record(Duration::from_millis(100), true);
        metrics.record(Duration::from_millis(200), true);
        metrics.record(Duration::from_millis(150), false);

        assert_eq!(metrics.invocations, 3);
        assert_eq!(metrics.successes, 2);
        assert_eq!(metrics.failures, 1);
        assert_eq!(metrics.min_duration, Duration::from_millis(100));
        assert_eq!(metrics.max_duration, Duration::from_millis(200));
        assert!(metrics.success_rate() > 66.0 && metrics.success_rate() < 67.0);
    }

    #[test]
    fn test_histogram_percentiles() {
        let mut hist = Histogram::new();
        assert!(hist.p50().is_none());

        for i in 1..=100 {
            hist.record(Duration::from_millis(i));
        }

        let p50 = hist.p50().unwrap().as_millis();
        assert!((49..=51).contains(&p50), "p50 was {p50}, expected ~50");
        assert!(hist.p99().unwrap() >= Duration::from_millis(99));
        assert_eq!(hist.count(), 100);
    }

    #[test]
    fn test_histogram_keeps_most_recent_samples() {
        let mut hist = Histogram::new();
        for i in 0..(HISTOGRAM_CAPACITY as u64 * 2 + 7) {
            hist.record(Duration::from_micros(i));
        }

        assert_eq!(hist.count(), HISTOGRAM_CAPACITY);
        assert_eq!(hist.recorded(), HISTOGRAM_CAPACITY as u64 * 2 + 7);
        // Oldest samples were evicted
        let min = hist.percentile(0).unwrap();
        assert_eq!(min, Duration::from_micros(HISTOGRAM_CAPACITY as u64 + 7));
    }

    #[test]
    fn test_query_histogram_is_bounded() {
        let metrics = Metrics::new();
        for _ in 0..(HISTOGRAM_CAPACITY + 500) {
            metrics.record_query("head_commit", Duration::from_micros(3), true);
        }

        let snapshot = metrics.snapshot();
        let query = &snapshot.queries["head_commit"];
        assert_eq!(query.invocations, (HISTOGRAM_CAPACITY + 500) as u64);
        assert_eq!(query.histogram.count(), HISTOGRAM_CAPACITY);
    }

    #[test]
    fn test_poisoned_lock_is_recovered() {
        let metrics = Metrics::new();
        metrics.record_query("before", Duration::ZERO, true);

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _guard = metrics.queries();
            panic!("poison the query map");
        }));
        assert!(result.is_err());

        metrics.record_query("after", Duration::ZERO, false);
        let snapshot = metrics.snapshot();
        assert!(snapshot.queries.contains_key("before"));
        assert!(snapshot.queries.contains_key("after"));
        metrics.reset();
    }

    #[test]
    fn test_local_metrics_report() {
        let metrics = Metrics::new();
        metrics.record_query("head_commit", Duration::from_millis(2), true);
        metrics.record_query("describe_latest_tag", Duration::from_millis(1), false);
        metrics.record_operation("extract", Duration::from_millis(5));

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.queries["describe_latest_tag"].failures, 1);

        let report = snapshot.format_report();
        assert!(report.contains("head_commit: 1 calls, 100.0% success"));
        assert!(report.contains("describe_latest_tag: 1 calls, 0.0% success"));
        assert!(report.contains("extract: 1 calls"));

        metrics.reset();
        assert!(metrics.snapshot().queries.is_empty());
    }

    #[test]
    fn test_global_metrics() {
        GLOBAL_METRICS.record_query("global_query", Duration::from_millis(10), true);
        GLOBAL_METRICS.record_operation("global_operation", Duration::ZERO);

        let snapshot = GLOBAL_METRICS.snapshot();
        assert!(snapshot.queries.contains_key("global_query"));
        assert!(snapshot.operations.contains_key("global_operation"));
    }
}
