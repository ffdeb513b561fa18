//! Turndown detection
//!
//! Classifies the buffer trend of each tick from its first and last depth
//! readings and keeps a window of throughput values seen around trend
//! reversals ("pivots").

use crate::models::Direction;
use crate::window::BoundedWindow;
use std::time::{Duration, Instant};

/// Buffer trend detector with drain debounce and pivot tracking
#[derive(Debug, Clone)]
pub struct TurndownDetector {
    /// Minimum spacing between accepted drain events
    debounce: Duration,
    /// Set once the first drain to empty has been accepted
    seen_drain: bool,
    /// Time of the last accepted drain or fill event
    last_event: Option<Instant>,
    /// Signed vector emitted by the previous classified tick
    previous_vector: f64,
    pivots: BoundedWindow<f64>,
}

/// Result of observing one tick's buffer readings
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TurnObservation {
    pub direction: Direction,
    /// Buffer reached zero but the event fell inside the debounce interval
    pub debounced: bool,
    /// Number of pivots pushed during this observation
    pub pivots_recorded: usize,
}

impl TurndownDetector {
    pub fn new(pivot_capacity: usize, debounce: Duration) -> Self {
        Self {
            debounce,
            seen_drain: false,
            last_event: None,
            previous_vector: 0.0,
            pivots: BoundedWindow::new(pivot_capacity),
        }
    }

    /// Classify a tick and update the pivot window
    ///
    /// # Arguments
    /// * `now` - Tick timestamp
    /// * `first`, `last` - Earliest and latest buffer readings of the tick
    /// * `latest_bandwidth` - Front-most value of the bandwidth window
    /// * `throughput` - Instantaneous throughput computed this tick
    pub fn observe(
        &mut self,
        now: Instant,
        first: u64,
        last: u64,
        latest_bandwidth: f64,
        throughput: f64,
    ) -> TurnObservation {
        let mut debounced = false;

        let direction = if last == 0 && self.drain_allowed(now) {
            self.seen_drain = true;
            self.last_event = Some(now);
            Direction::Raise
        } else if last > first {
            // A fill restarts the debounce interval without counting as a drain
            self.last_event = Some(now);
            Direction::Lower
        } else {
            debounced = last == 0;
            Direction::Hold
        };

        let mut pivots_recorded = 0;

        // Reversal out of a filling trend
        if self.previous_vector < 0.0 && direction != Direction::Lower {
            self.pivots.push_front(latest_bandwidth);
            pivots_recorded += 1;
        }

        // Actively draining but not yet empty
        if last < first && last > 0 {
            self.pivots.push_front(throughput);
            pivots_recorded += 1;
        }

        TurnObservation {
            direction,
            debounced,
            pivots_recorded,
        }
    }

    fn drain_allowed(&self, now: Instant) -> bool {
        if !self.seen_drain {
            return true;
        }
        match self.last_event {
            None => true,
            Some(last) => now.saturating_duration_since(last) > self.debounce,
        }
    }

    /// Remember the vector emitted for the tick just classified
    pub fn commit_vector(&mut self, vector: f64) {
        self.previous_vector = vector;
    }

    /// Mean of the pivot window, 0 when empty
    pub fn pivot_average(&self) -> f64 {
        self.pivots.mean().unwrap_or(0.0)
    }

    pub fn pivots(&self) -> &BoundedWindow<f64> {
        &self.pivots
    }

    pub fn has_seen_drain(&self) -> bool {
        self.seen_drain
    }

    pub fn previous_vector(&self) -> f64 {
        self.previous_vector
    }
}
