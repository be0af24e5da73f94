//! Metrics sink: counters and durations reported by the orchestrator.
//!
//! The orchestrator only ever talks to the [`MetricsSink`] trait; it never
//! touches process-global state. [`MetricsRegistry`] is the in-process
//! implementation used by the server: lock-free atomics rendered in the
//! Prometheus text exposition format.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Content type of [`MetricsRegistry::render`].
pub const PROMETHEUS_CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

/// Histogram bucket upper bounds, in seconds.
const DURATION_BUCKETS: [f64; 14] = [
    0.005, 0.01, 0.025, 0.05, 0.075, 0.1, 0.25, 0.5, 0.75, 1.0, 2.5, 5.0, 7.5, 10.0,
];

/// Observability collaborator injected into the orchestrator.
///
/// Implementations must tolerate concurrent calls from many runs.
pub trait MetricsSink: Send + Sync {
    /// One workflow request entered the orchestrator.
    fn record_request(&self);

    /// One step failed or timed out.
    fn record_step_error(&self, agent: &str);

    /// End-to-end duration of a fully successful run.
    fn observe_duration(&self, elapsed: Duration);
}

/// Sink that discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopMetrics;

impl MetricsSink for NoopMetrics {
    fn record_request(&self) {}
    fn record_step_error(&self, _agent: &str) {}
    fn observe_duration(&self, _elapsed: Duration) {}
}

/// Atomic counters plus a fixed-bucket duration histogram.
#[derive(Debug)]
pub struct MetricsRegistry {
    requests_total: AtomicU64,
    agent_errors_total: AtomicU64,
    duration_buckets: [AtomicU64; DURATION_BUCKETS.len()],
    duration_count: AtomicU64,
    /// Sum of observed durations in microseconds
    duration_sum_micros: AtomicU64,
}

impl Default for MetricsRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsRegistry {
    pub fn new() -> Self {
        Self {
            requests_total: AtomicU64::new(0),
            agent_errors_total: AtomicU64::new(0),
            duration_buckets: std::array::from_fn(|_| AtomicU64::new(0)),
            duration_count: AtomicU64::new(0),
            duration_sum_micros: AtomicU64::new(0),
        }
    }

    pub fn requests_total(&self) -> u64 {
        self.requests_total.load(Ordering::Relaxed)
    }

    pub fn agent_errors_total(&self) -> u64 {
        self.agent_errors_total.load(Ordering::Relaxed)
    }

    pub fn duration_count(&self) -> u64 {
        self.duration_count.load(Ordering::Relaxed)
    }

    /// Render all metrics in the Prometheus text exposition format.
    pub fn render(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for MetricsRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "# HELP requests_total Total /process requests")?;
        writeln!(f, "# TYPE requests_total counter")?;
        writeln!(f, "requests_total {}", self.requests_total())?;

        writeln!(f, "# HELP agent_errors_total Count of agent failures/timeouts")?;
        writeln!(f, "# TYPE agent_errors_total counter")?;
        writeln!(f, "agent_errors_total {}", self.agent_errors_total())?;

        writeln!(f, "# HELP request_duration_seconds Time taken for process endpoint")?;
        writeln!(f, "# TYPE request_duration_seconds histogram")?;
        // Buckets are stored non-cumulatively; exposition is cumulative.
        let mut cumulative = 0u64;
        for (bound, bucket) in DURATION_BUCKETS.iter().zip(&self.duration_buckets) {
            cumulative += bucket.load(Ordering::Relaxed);
            writeln!(f, "request_duration_seconds_bucket{{le=\"{}\"}} {}", bound, cumulative)?;
        }
        let count = self.duration_count();
        writeln!(f, "request_duration_seconds_bucket{{le=\"+Inf\"}} {}", count)?;
        let sum = self.duration_sum_micros.load(Ordering::Relaxed) as f64 / 1_000_000.0;
        writeln!(f, "request_duration_seconds_sum {}", sum)?;
        writeln!(f, "request_duration_seconds_count {}", count)
    }
}

impl MetricsSink for MetricsRegistry {
    fn record_request(&self) {
        self.requests_total.fetch_add(1, Ordering::Relaxed);
    }

    fn record_step_error(&self, _agent: &str) {
        self.agent_errors_total.fetch_add(1, Ordering::Relaxed);
    }

    fn observe_duration(&self, elapsed: Duration) {
        let secs = elapsed.as_secs_f64();
        if let Some(idx) = DURATION_BUCKETS.iter().position(|bound| secs <= *bound) {
            self.duration_buckets[idx].fetch_add(1, Ordering::Relaxed);
        }
        self.duration_sum_micros
            .fetch_add(elapsed.as_micros() as u64, Ordering::Relaxed);
        self.duration_count.fetch_add(1, Ordering::Relaxed);
    }
}
