//! Core data models for the adaptation engine

use serde::{Deserialize, Serialize};

/// Buffer trend classified for one tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Buffer drained to empty: throughput exceeds demand
    Raise,
    /// No actionable trend
    Hold,
    /// Buffer grew during the tick: demand exceeds throughput
    Lower,
}

impl Direction {
    /// Signed unit value (+1, 0, -1)
    pub fn signum(self) -> f64 {
        match self {
            Direction::Raise => 1.0,
            Direction::Hold => 0.0,
            Direction::Lower => -1.0,
        }
    }
}

/// Outcome of one estimation tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickReport {
    /// Control signal in [-1, 1] delivered to the callback
    pub vector: f64,
    /// Mean of the pivot window in bytes/sec (0 when no pivots yet)
    pub pivot_average: f64,
    /// Classified direction, `None` when no buffer samples arrived this tick
    pub direction: Option<Direction>,
    /// Instantaneous throughput in bytes/sec
    pub throughput_bps: f64,
    /// Front-weighted average throughput in bytes/sec
    pub smoothed_bps: f64,
    /// Elapsed time used for the throughput sample, after clamping
    pub elapsed_secs: f64,
    pub total_sent_bytes: u64,
    pub buffer_samples: usize,
    pub pivot_samples: usize,
    /// Pivots captured during this tick
    pub pivots_recorded: usize,
    /// Buffer drained to zero inside the debounce interval
    pub drain_debounced: bool,
    /// True when the previous output was reused for lack of buffer samples
    pub carried_forward: bool,
    /// Wall clock emission time (unix millis)
    pub emitted_at: i64,
}
