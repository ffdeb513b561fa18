//! Front-weighted bandwidth estimation

use crate::window::BoundedWindow;
use std::time::Duration;

/// Normalized geometric weights, most recent slot first
#[derive(Debug, Clone)]
pub struct WeightTable {
    weights: Vec<f64>,
}

impl WeightTable {
    /// Build `len` weights `ratio^i / Σ ratio^k` so that they sum to 1
    pub fn geometric(ratio: f64, len: usize) -> Self {
        let norm = (1.0 - ratio.powi(len as i32)) / (1.0 - ratio);
        let weights = (0..len).map(|i| ratio.powi(i as i32) / norm).collect();
        Self { weights }
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.weights
    }

    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }
}

/// Turns sent-byte totals into throughput samples and a smoothed average
#[derive(Debug, Clone)]
pub struct BandwidthEstimator {
    weights: WeightTable,
    window: BoundedWindow<f64>,
    min_elapsed: Duration,
}

/// One throughput measurement
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BandwidthSample {
    /// Bytes/sec over the last interval
    pub instantaneous: f64,
    /// Weighted average over the window, bytes/sec
    pub smoothed: f64,
    /// Interval length after the floor was applied
    pub elapsed_secs: f64,
}

impl BandwidthEstimator {
    pub fn new(capacity: usize, ratio: f64, min_elapsed: Duration) -> Self {
        Self {
            weights: WeightTable::geometric(ratio, capacity),
            window: BoundedWindow::new(capacity),
            min_elapsed,
        }
    }

    /// Record `total_sent` bytes observed over `elapsed`
    ///
    /// `elapsed` is clamped to the configured floor so a zero-length interval
    /// never divides by zero.
    pub fn record(&mut self, total_sent: u64, elapsed: Duration) -> BandwidthSample {
        let elapsed_secs = elapsed.max(self.min_elapsed).as_secs_f64();
        let instantaneous = total_sent as f64 / elapsed_secs;

        self.window.push_front(instantaneous);

        BandwidthSample {
            instantaneous,
            smoothed: self.weighted_average(),
            elapsed_secs,
        }
    }

    /// Dot product of the window with the weights truncated to its length
    pub fn weighted_average(&self) -> f64 {
        self.window
            .iter()
            .zip(self.weights.as_slice())
            .map(|(sample, weight)| sample * weight)
            .sum()
    }

    /// Most recent throughput value
    pub fn latest(&self) -> Option<f64> {
        self.window.front().copied()
    }

    pub fn window(&self) -> &BoundedWindow<f64> {
        &self.window
    }

    pub fn weights(&self) -> &WeightTable {
        &self.weights
    }
}
