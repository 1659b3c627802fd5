//! Latency histograms and hit/miss counters for the cache layer.
//! Histograms report p50/p95/p99 over a window of the most recent samples.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

/// A span measuring elapsed time from creation to explicit end.
pub struct TimingSpan {
    name: &'static str,
    start: Instant,
    registry: Arc<MetricsRegistry>,
}

impl TimingSpan {
    /// End the span, recording elapsed duration in microseconds.
    pub fn finish(self) -> f64 {
        let elapsed_us = self.start.elapsed().as_micros() as f64;
        self.registry.record(self.name, elapsed_us);
        elapsed_us
    }
}

/// The last `capacity` latency samples of one metric, plus a lifetime total.
struct LatencyWindow {
    samples: Vec<f64>,
    capacity: usize,
    next: usize,
    total: u64,
}

impl LatencyWindow {
    fn new(capacity: usize) -> Self {
        Self {
            samples: Vec::with_capacity(capacity),
            capacity: capacity.max(1),
            next: 0,
            total: 0,
        }
    }

    /// Overwrites the oldest sample once the window is full.
    fn push(&mut self, value: f64) {
        if self.samples.len() < self.capacity {
            self.samples.push(value);
        } else {
            self.samples[self.next] = value;
        }
        self.next = (self.next + 1) % self.capacity;
        self.total += 1;
    }

    /// Nearest-rank percentile over the current window; 0 when empty.
    fn percentile(&self, p: f64) -> f64 {
        let Some(last) = self.samples.len().checked_sub(1) else {
            return 0.0;
        };
        let rank = ((p / 100.0) * last as f64).round() as usize;
        let mut window = self.samples.clone();
        let (_, value, _) = window.select_nth_unstable_by(rank.min(last), f64::total_cmp);
        *value
    }
}

/// Stores histograms and counters for all named metrics.
pub struct MetricsRegistry {
    histograms: Mutex<HashMap<&'static str, LatencyWindow>>,
    counters: Mutex<HashMap<&'static str, u64>>,
    window: usize,
}

impl Default for MetricsRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsRegistry {
    pub fn new() -> Self {
        Self {
            histograms: Mutex::new(HashMap::new()),
            counters: Mutex::new(HashMap::new()),
            window: 512,
        }
    }

    /// Record a sample (in microseconds) for the named metric.
    pub fn record(&self, name: &'static str, value_us: f64) {
        let mut hists = self.histograms.lock();
        hists
            .entry(name)
            .or_insert_with(|| LatencyWindow::new(self.window))
            .push(value_us);
        tracing::trace!(metric = name, value_us = value_us, "metric_recorded");
    }

    pub fn increment(&self, name: &'static str) {
        *self.counters.lock().entry(name).or_insert(0) += 1;
    }

    pub fn count(&self, name: &str) -> u64 {
        self.counters.lock().get(name).copied().unwrap_or(0)
    }

    /// Start a timing span that records on finish.
    pub fn span(self: &Arc<Self>, name: &'static str) -> TimingSpan {
        TimingSpan {
            name,
            start: Instant::now(),
            registry: Arc::clone(self),
        }
    }

    /// Summaries of all histograms at p50/p95/p99.
    pub fn summary(&self) -> HashMap<String, MetricSummary> {
        let hists = self.histograms.lock();
        hists
            .iter()
            .map(|(&name, window)| {
                (
                    name.to_string(),
                    MetricSummary {
                        p50_us: window.percentile(50.0),
                        p95_us: window.percentile(95.0),
                        p99_us: window.percentile(99.0),
                        count: window.total,
                    },
                )
            })
            .collect()
    }

    pub fn counters(&self) -> HashMap<String, u64> {
        self.counters
            .lock()
            .iter()
            .map(|(&name, &n)| (name.to_string(), n))
            .collect()
    }

    pub fn reset(&self) {
        self.histograms.lock().clear();
        self.counters.lock().clear();
    }
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct MetricSummary {
    pub p50_us: f64,
    pub p95_us: f64,
    pub p99_us: f64,
    pub count: u64,
}

/// Well-known metric names (constants to avoid typos).
pub mod metric_names {
    pub const GENERATE: &str = "t_provider_generate";
    pub const TRANSLATE: &str = "t_provider_translate";
    pub const IMAGE_SEARCH: &str = "t_provider_image_search";
    pub const RESOLVE_RECIPE: &str = "t_resolve_recipe";
    pub const RESOLVE_LIST: &str = "t_resolve_list";

    pub const STORE_HIT: &str = "store_hit";
    pub const STORE_MISS: &str = "store_miss";
    pub const MEMO_HIT: &str = "memo_hit";
    pub const MEMO_MISS: &str = "memo_miss";
    pub const IMAGE_HIT: &str = "image_hit";
    pub const IMAGE_MISS: &str = "image_miss";
    pub const PROVIDER_FAILURE: &str = "provider_failure";
    pub const STALE_DISCARD: &str = "stale_discard";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percentiles_over_recorded_samples() {
        let registry = MetricsRegistry::new();
        for v in 1..=100 {
            registry.record(metric_names::GENERATE, v as f64);
        }
        let summary = registry.summary();
        let generate = &summary[metric_names::GENERATE];
        assert_eq!(generate.count, 100);
        assert_eq!(generate.p50_us, 51.0);
        assert_eq!(generate.p99_us, 99.0);
    }

    #[test]
    fn window_keeps_only_recent_samples() {
        let mut window = LatencyWindow::new(3);
        assert_eq!(window.percentile(50.0), 0.0);
        for v in [900.0, 10.0, 20.0, 30.0] {
            window.push(v);
        }
        assert_eq!(window.total, 4);
        assert_eq!(window.percentile(99.0), 30.0);
        assert_eq!(window.percentile(0.0), 10.0);
    }

    #[test]
    fn counters_accumulate_and_reset() {
        let registry = MetricsRegistry::new();
        registry.increment(metric_names::MEMO_HIT);
        registry.increment(metric_names::MEMO_HIT);
        assert_eq!(registry.count(metric_names::MEMO_HIT), 2);
        assert_eq!(registry.count(metric_names::MEMO_MISS), 0);
        registry.reset();
        assert_eq!(registry.count(metric_names::MEMO_HIT), 0);
    }
}
