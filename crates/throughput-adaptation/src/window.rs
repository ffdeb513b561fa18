//! Bounded most-recent-first sample windows

use std::collections::VecDeque;

/// Fixed-capacity ring buffer that keeps the newest value at index 0.
///
/// Pushing onto a full window evicts the oldest value from the back.
#[derive(Debug, Clone)]
pub struct BoundedWindow<T> {
    samples: VecDeque<T>,
    capacity: usize,
}

impl<T> BoundedWindow<T> {
    /// Create an empty window holding at most `capacity` values
    pub fn new(capacity: usize) -> Self {
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Insert a value at the front, evicting the oldest on overflow
    pub fn push_front(&mut self, value: T) {
        self.samples.push_front(value);
        self.samples.truncate(self.capacity);
    }

    /// Most recent value
    pub fn front(&self) -> Option<&T> {
        self.samples.front()
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.samples.get(index)
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Iterate from most recent to oldest
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.samples.iter()
    }
}

impl BoundedWindow<f64> {
    /// Arithmetic mean of the window, or `None` when empty
    pub fn mean(&self) -> Option<f64> {
        if self.samples.is_empty() {
            return None;
        }
        let sum: f64 = self.samples.iter().sum();
        Some(sum / self.samples.len() as f64)
    }
}
