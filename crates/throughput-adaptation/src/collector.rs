//! Producer-facing sample collection
//!
//! Sent-byte samples and buffer-depth samples are guarded by separate locks so
//! producers of one kind never contend with producers (or the drain) of the
//! other kind.

use std::sync::{Mutex, MutexGuard, PoisonError};

/// Pending samples accumulated between two ticks
#[derive(Debug, Default)]
pub struct SampleCollector {
    sent: Mutex<Vec<u64>>,
    buffer: Mutex<Vec<u64>>,
}

/// Samples taken out of the collector by one drain
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SampleSnapshot {
    /// Sent-byte reports in arrival order
    pub sent: Vec<u64>,
    /// Buffer-depth readings in arrival order
    pub buffer: Vec<u64>,
}

impl SampleSnapshot {
    /// Sum of all sent-byte reports
    pub fn total_sent(&self) -> u64 {
        self.sent.iter().fold(0u64, |acc, b| acc.saturating_add(*b))
    }

    /// First and last buffer readings of the tick
    pub fn buffer_bounds(&self) -> Option<(u64, u64)> {
        match (self.buffer.first(), self.buffer.last()) {
            (Some(first), Some(last)) => Some((*first, *last)),
            _ => None,
        }
    }
}

impl SampleCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record bytes transmitted since the previous report
    pub fn add_sent_bytes_sample(&self, bytes: u64) {
        lock(&self.sent).push(bytes);
    }

    /// Record the current backlog depth
    pub fn add_buffer_size_sample(&self, depth: u64) {
        lock(&self.buffer).push(depth);
    }

    /// Take every pending sample, leaving both sequences empty
    ///
    /// Each lock is held only for the swap, so samples added afterwards land
    /// in the next drain.
    pub fn drain(&self) -> SampleSnapshot {
        let sent = std::mem::take(&mut *lock(&self.sent));
        let buffer = std::mem::take(&mut *lock(&self.buffer));
        SampleSnapshot { sent, buffer }
    }

    /// Number of samples waiting for the next drain (sent, buffer)
    pub fn pending(&self) -> (usize, usize) {
        (lock(&self.sent).len(), lock(&self.buffer).len())
    }
}

/// Samples are plain integers, so a poisoned lock still holds consistent data.
fn lock(samples: &Mutex<Vec<u64>>) -> MutexGuard<'_, Vec<u64>> {
    samples.lock().unwrap_or_else(PoisonError::into_inner)
}
