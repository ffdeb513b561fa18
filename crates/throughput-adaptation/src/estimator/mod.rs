//! Throughput estimation engine
//!
//! One call to [`AdaptationEngine::tick`] is one pass of the pipeline:
//! bandwidth estimation, turndown detection, vector synthesis. The engine is
//! clock-agnostic; the caller supplies the tick timestamp, and report
//! wall-clock times are derived from it.

mod bandwidth;
mod synth;
mod turndown;

#[cfg(test)]
mod tests;

pub use bandwidth::{BandwidthEstimator, BandwidthSample, WeightTable};
pub use synth::{magnitude, synthesize, MAX_MAGNITUDE, MIN_MAGNITUDE};
pub use turndown::{TurnObservation, TurndownDetector};

use crate::collector::SampleSnapshot;
use crate::config::AdaptationConfig;
use crate::models::{Direction, TickReport};
use chrono::{DateTime, Utc};
use std::time::Instant;
use tracing::{debug, trace};

/// Owns all estimation state that persists across ticks
#[derive(Debug, Clone)]
pub struct AdaptationEngine {
    bandwidth: BandwidthEstimator,
    detector: TurndownDetector,
    last_tick: Instant,
    /// Wall-clock anchor for `start`, used to stamp reports
    epoch: (Instant, DateTime<Utc>),
    /// Last emitted (vector, pivot average), reused when a tick has no buffer samples
    last_output: (f64, f64),
}

impl AdaptationEngine {
    /// Create an engine whose first interval starts at `start`
    pub fn new(config: &AdaptationConfig, start: Instant) -> Self {
        Self::with_epoch(config, start, Utc::now())
    }

    /// Create an engine whose `start` instant corresponds to wall-clock `started_at`
    pub fn with_epoch(
        config: &AdaptationConfig,
        start: Instant,
        started_at: DateTime<Utc>,
    ) -> Self {
        Self {
            bandwidth: BandwidthEstimator::new(
                config.bandwidth_samples,
                config.smoothing_ratio,
                config.min_elapsed(),
            ),
            detector: TurndownDetector::new(config.pivot_samples, config.debounce_interval()),
            last_tick: start,
            epoch: (start, started_at),
            last_output: (0.0, 0.0),
        }
    }

    /// Run one estimation pass over the samples drained for this tick
    pub fn tick(&mut self, now: Instant, snapshot: &SampleSnapshot) -> TickReport {
        let elapsed = now.saturating_duration_since(self.last_tick);
        self.last_tick = now;

        let total_sent_bytes = snapshot.total_sent();
        let bandwidth = self.bandwidth.record(total_sent_bytes, elapsed);

        let mut report = TickReport {
            vector: self.last_output.0,
            pivot_average: self.last_output.1,
            direction: None,
            throughput_bps: bandwidth.instantaneous,
            smoothed_bps: bandwidth.smoothed,
            elapsed_secs: bandwidth.elapsed_secs,
            total_sent_bytes,
            buffer_samples: snapshot.buffer.len(),
            pivot_samples: self.detector.pivots().len(),
            pivots_recorded: 0,
            drain_debounced: false,
            carried_forward: true,
            emitted_at: self.wall_clock(now).timestamp_millis(),
        };

        let Some((first, last)) = snapshot.buffer_bounds() else {
            debug!(
                total_sent = total_sent_bytes,
                elapsed_secs = bandwidth.elapsed_secs,
                throughput_bps = bandwidth.instantaneous,
                smoothed_bps = bandwidth.smoothed,
                vector = report.vector,
                "No buffer samples this tick, carrying previous output forward"
            );
            return report;
        };

        // Pivots captured during this tick only shape later ticks
        let pivot_reference = self.detector.pivots().mean();
        let latest = self.bandwidth.latest().unwrap_or(bandwidth.instantaneous);

        let observation = self
            .detector
            .observe(now, first, last, latest, bandwidth.instantaneous);

        if observation.debounced {
            debug!(buffer_first = first, "Drain to empty suppressed by debounce");
        } else if observation.direction == Direction::Raise {
            debug!(buffer_first = first, "Drain to empty accepted");
        }
        if observation.pivots_recorded > 0 {
            trace!(
                recorded = observation.pivots_recorded,
                pivots = self.detector.pivots().len(),
                "Recorded pivot throughput"
            );
        }

        let vector = synthesize(
            observation.direction,
            bandwidth.instantaneous,
            bandwidth.smoothed,
            pivot_reference,
        );
        self.detector.commit_vector(vector);

        let pivot_average = self.detector.pivot_average();
        self.last_output = (vector, pivot_average);

        report.vector = vector;
        report.pivot_average = pivot_average;
        report.direction = Some(observation.direction);
        report.pivot_samples = self.detector.pivots().len();
        report.pivots_recorded = observation.pivots_recorded;
        report.drain_debounced = observation.debounced;
        report.carried_forward = false;

        let buffer_delta = last as i64 - first as i64;
        debug!(
            total_sent = total_sent_bytes,
            elapsed_secs = bandwidth.elapsed_secs,
            throughput_bps = bandwidth.instantaneous,
            smoothed_bps = bandwidth.smoothed,
            buffer_delta = buffer_delta,
            pivot_average = pivot_average,
            vector = vector,
            "Tick complete"
        );

        report
    }

    pub fn bandwidth(&self) -> &BandwidthEstimator {
        &self.bandwidth
    }

    pub fn detector(&self) -> &TurndownDetector {
        &self.detector
    }

    /// Wall-clock time of `instant`, relative to the engine's start anchor
    pub fn wall_clock(&self, instant: Instant) -> DateTime<Utc> {
        let (start, started_at) = self.epoch;
        let offset = instant.saturating_duration_since(start);
        let offset = chrono::Duration::from_std(offset).unwrap_or_else(|_| chrono::Duration::zero());
        started_at + offset
    }

    /// Timestamp of the most recent tick
    pub fn last_tick(&self) -> Instant {
        self.last_tick
    }
}
