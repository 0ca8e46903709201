//! Request statistics collected during a run

use std::collections::BTreeMap;
use std::time::Duration;

use hdrhistogram::Histogram;
use indexmap::IndexMap;
use tracing::warn;

use crate::profile::{TaskOutcome, TaskProfile};

/// Significant figures kept by every latency histogram
const SIGNIFICANT_FIGURES: u8 = 3;

/// Latency distribution for one task, in microseconds
#[derive(Debug, Clone)]
pub struct LatencyStats {
    histogram: Histogram<u64>,
}

impl Default for LatencyStats {
    fn default() -> Self {
        Self::new()
    }
}

impl LatencyStats {
    pub fn new() -> Self {
        // Auto-resizing histogram; only an out-of-range precision can fail
        let histogram =
            Histogram::new(SIGNIFICANT_FIGURES).expect("3 significant figures is a valid precision");
        Self { histogram }
    }

    pub fn record(&mut self, latency: Duration) {
        let micros = u64::try_from(latency.as_micros()).unwrap_or(u64::MAX);
        self.histogram.saturating_record(micros);
    }

    /// Fold another task's samples into this one
    pub fn merge(&mut self, other: &LatencyStats) {
        if let Err(e) = self.histogram.add(&other.histogram) {
            warn!("Failed to merge latency histograms: {}", e);
        }
    }

    pub fn len(&self) -> u64 {
        self.histogram.len()
    }

    pub fn is_empty(&self) -> bool {
        self.histogram.is_empty()
    }

    /// Calculate percentile (0-100)
    pub fn percentile(&self, p: f64) -> Option<Duration> {
        if self.is_empty() {
            return None;
        }
        let quantile = (p / 100.0).clamp(0.0, 1.0);
        Some(Duration::from_micros(
            self.histogram.value_at_quantile(quantile),
        ))
    }

    pub fn p50(&self) -> Option<Duration> {
        self.percentile(50.0)
    }

    pub fn p95(&self) -> Option<Duration> {
        self.percentile(95.0)
    }

    pub fn p99(&self) -> Option<Duration> {
        self.percentile(99.0)
    }

    pub fn min(&self) -> Option<Duration> {
        (!self.is_empty()).then(|| Duration::from_micros(self.histogram.min()))
    }

    pub fn max(&self) -> Option<Duration> {
        (!self.is_empty()).then(|| Duration::from_micros(self.histogram.max()))
    }

    pub fn mean(&self) -> Option<Duration> {
        (!self.is_empty()).then(|| Duration::from_secs_f64(self.histogram.mean() / 1_000_000.0))
    }
}

/// Counters for a single task
#[derive(Debug, Default, Clone)]
pub struct RequestStats {
    pub requests: u64,
    pub failures: u64,
    pub bytes: u64,
    pub latencies: LatencyStats,
}

impl RequestStats {
    fn record(&mut self, outcome: &TaskOutcome) {
        self.requests += 1;
        if !outcome.success() {
            self.failures += 1;
        }
        self.bytes += outcome.bytes;
        self.latencies.record(outcome.latency);
    }
}

/// Aggregated statistics for a whole run
#[derive(Debug, Default, Clone)]
pub struct RunStats {
    /// Per-task stats, in profile order
    pub tasks: IndexMap<String, RequestStats>,
    /// Count of outcomes per observed status ("200", "500", "connection_error", ...)
    pub observed: BTreeMap<String, u64>,
    /// Highest number of simultaneously running simulated clients
    pub peak_users: usize,
    /// Wall-clock duration of the run
    pub duration: Duration,
}

impl RunStats {
    /// Empty stats with one row per task in `profile`
    pub fn for_profile(profile: &TaskProfile) -> Self {
        let tasks = profile
            .tasks()
            .iter()
            .map(|t| (t.name.clone(), RequestStats::default()))
            .collect();
        Self {
            tasks,
            ..Default::default()
        }
    }

    pub fn record(&mut self, outcome: &TaskOutcome) {
        self.tasks
            .entry(outcome.task.clone())
            .or_default()
            .record(outcome);
        *self.observed.entry(outcome.observed.label()).or_default() += 1;
    }

    pub fn total_requests(&self) -> u64 {
        self.tasks.values().map(|s| s.requests).sum()
    }

    pub fn total_failures(&self) -> u64 {
        self.tasks.values().map(|s| s.failures).sum()
    }

    pub fn total_bytes(&self) -> u64 {
        self.tasks.values().map(|s| s.bytes).sum()
    }

    /// Latencies across every task
    pub fn aggregated_latencies(&self) -> LatencyStats {
        let mut all = LatencyStats::new();
        for stats in self.tasks.values() {
            all.merge(&stats.latencies);
        }
        all
    }

    pub fn requests_per_sec(&self) -> f64 {
        if self.duration.as_secs_f64() > 0.0 {
            self.total_requests() as f64 / self.duration.as_secs_f64()
        } else {
            0.0
        }
    }

    /// Fraction of requests that landed on `task`
    pub fn share(&self, task: &str) -> Option<f64> {
        let total = self.total_requests();
        if total == 0 {
            return None;
        }
        self.tasks
            .get(task)
            .map(|s| s.requests as f64 / total as f64)
    }
}
