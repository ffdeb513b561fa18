//! Observability infrastructure for the adaptation engine
//!
//! Provides Prometheus metrics for the emitted signal and tick loop. Metrics
//! live in the default registry and are registered once per process.

use crate::models::{Direction, TickReport};
use prometheus::{
    register_gauge, register_histogram, register_int_counter, Gauge, Histogram, IntCounter,
};
use std::sync::OnceLock;

/// Histogram buckets for tick duration (in seconds)
const TICK_BUCKETS: &[f64] = &[
    0.00001, 0.00005, 0.0001, 0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5,
];

/// Global metrics instance (registered once)
static GLOBAL_METRICS: OnceLock<AdaptationMetricsInner> = OnceLock::new();

struct AdaptationMetricsInner {
    vector: Gauge,
    pivot_average: Gauge,
    throughput: Gauge,
    smoothed: Gauge,
    ticks: IntCounter,
    turndowns: IntCounter,
    debounced_drains: IntCounter,
    pivots_recorded: IntCounter,
    tick_duration_seconds: Histogram,
}

impl AdaptationMetricsInner {
    fn new() -> Self {
        Self {
            vector: register_gauge!(
                "throughput_adaptation_vector",
                "Most recent control vector in [-1, 1]"
            )
            .expect("Failed to register vector"),

            pivot_average: register_gauge!(
                "throughput_adaptation_pivot_average_bytes_per_second",
                "Mean throughput observed around buffer trend reversals"
            )
            .expect("Failed to register pivot_average"),

            throughput: register_gauge!(
                "throughput_adaptation_throughput_bytes_per_second",
                "Instantaneous throughput over the last tick"
            )
            .expect("Failed to register throughput"),

            smoothed: register_gauge!(
                "throughput_adaptation_smoothed_bytes_per_second",
                "Front-weighted average throughput"
            )
            .expect("Failed to register smoothed"),

            ticks: register_int_counter!(
                "throughput_adaptation_ticks_total",
                "Total number of estimation ticks"
            )
            .expect("Failed to register ticks"),

            turndowns: register_int_counter!(
                "throughput_adaptation_turndowns_total",
                "Drain-to-empty events accepted as a raise signal"
            )
            .expect("Failed to register turndowns"),

            debounced_drains: register_int_counter!(
                "throughput_adaptation_debounced_drains_total",
                "Drain-to-empty events suppressed by the debounce interval"
            )
            .expect("Failed to register debounced_drains"),

            pivots_recorded: register_int_counter!(
                "throughput_adaptation_pivots_recorded_total",
                "Throughput values captured into the pivot window"
            )
            .expect("Failed to register pivots_recorded"),

            tick_duration_seconds: register_histogram!(
                "throughput_adaptation_tick_duration_seconds",
                "Time spent computing one tick, excluding the callback",
                TICK_BUCKETS.to_vec()
            )
            .expect("Failed to register tick_duration_seconds"),
        }
    }
}

/// Adaptation metrics for Prometheus exposition
///
/// This is a lightweight handle to the global metrics instance.
/// Multiple clones share the same underlying metrics.
#[derive(Clone)]
pub struct AdaptationMetrics {
    _private: (),
}

impl Default for AdaptationMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl AdaptationMetrics {
    /// Create a new metrics handle (initializes global metrics if needed)
    pub fn new() -> Self {
        GLOBAL_METRICS.get_or_init(AdaptationMetricsInner::new);
        Self { _private: () }
    }

    fn inner(&self) -> &AdaptationMetricsInner {
        GLOBAL_METRICS.get_or_init(AdaptationMetricsInner::new)
    }

    /// Record everything a tick produced
    pub fn observe_tick(&self, report: &TickReport, duration_secs: f64) {
        let inner = self.inner();
        inner.ticks.inc();
        inner.tick_duration_seconds.observe(duration_secs);
        inner.throughput.set(report.throughput_bps);
        inner.smoothed.set(report.smoothed_bps);
        inner.vector.set(report.vector);
        inner.pivot_average.set(report.pivot_average);
        inner.pivots_recorded.inc_by(report.pivots_recorded as u64);

        if report.direction == Some(Direction::Raise) {
            inner.turndowns.inc();
        }
        if report.drain_debounced {
            inner.debounced_drains.inc();
        }
    }

    pub fn ticks(&self) -> u64 {
        self.inner().ticks.get()
    }

    pub fn turndowns(&self) -> u64 {
        self.inner().turndowns.get()
    }

    pub fn debounced_drains(&self) -> u64 {
        self.inner().debounced_drains.get()
    }

    pub fn pivots_recorded(&self) -> u64 {
        self.inner().pivots_recorded.get()
    }
}
