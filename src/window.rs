//! Bounded record of recent probe outcomes.

use std::collections::VecDeque;

use crate::config::DEFAULT_WINDOW_CAPACITY;

/// FIFO window of probe outcomes, `true` meaning the probe failed.
#[derive(Debug, Clone)]
pub struct LossWindow {
    samples: VecDeque<bool>,
    capacity: usize,
}

impl Default for LossWindow {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW_CAPACITY)
    }
}

impl LossWindow {
    /// Create an empty window. A capacity of zero is raised to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append an outcome, evicting the oldest one when full.
    pub fn push(&mut self, failed: bool) {
        if self.samples.len() >= self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(failed);
    }

    /// Fraction of failed probes in the window, `None` while empty.
    pub fn rate(&self) -> Option<f64> {
        if self.samples.is_empty() {
            return None;
        }
        let failures = self.samples.iter().filter(|&&failed| failed).count();
        Some(failures as f64 / self.samples.len() as f64)
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
}
