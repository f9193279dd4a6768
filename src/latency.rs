//! Running latency statistics for one host.
//!
//! The smoothed value blends the lifetime mean with the newest sample
//! (`0.75 * mean + 0.25 * latest`). It is not an exponential moving average.
//! Failed probes count as a fixed penalty delay so that sustained loss shows
//! up in both the mean and the smoothed value.

use crate::config::DEFAULT_FAILURE_PENALTY_MS;
use crate::prober::ProbeOutcome;

const MEAN_WEIGHT: f64 = 0.75;
const LATEST_WEIGHT: f64 = 0.25;

/// Values derived from one recorded probe.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatencySample {
    pub mean_ms: f64,
    pub instantaneous_ms: f64,
    pub smoothed_ms: f64,
}

/// Cumulative RTT sum and sample count. Never reset.
#[derive(Debug, Clone)]
pub struct LatencyStats {
    total_ms: f64,
    samples: u64,
    failure_penalty_ms: f64,
}

impl Default for LatencyStats {
    fn default() -> Self {
        Self::new(DEFAULT_FAILURE_PENALTY_MS)
    }
}

impl LatencyStats {
    pub fn new(failure_penalty_ms: f64) -> Self {
        LatencyStats {
            total_ms: 0.0,
            samples: 0,
            failure_penalty_ms,
        }
    }

    /// Fold one probe outcome into the statistics.
    pub fn record(&mut self, outcome: &ProbeOutcome) -> LatencySample {
        let instantaneous_ms = outcome.rtt_ms().unwrap_or(self.failure_penalty_ms);
        self.total_ms += instantaneous_ms;
        self.samples += 1;

        let mean_ms = self.total_ms / self.samples as f64;
        LatencySample {
            mean_ms,
            instantaneous_ms,
            smoothed_ms: MEAN_WEIGHT * mean_ms + LATEST_WEIGHT * instantaneous_ms,
        }
    }

    /// Lifetime mean in milliseconds, `None` before the first sample.
    pub fn mean_ms(&self) -> Option<f64> {
        (self.samples > 0).then(|| self.total_ms / self.samples as f64)
    }

    pub fn total_ms(&self) -> f64 {
        self.total_ms
    }

    pub fn samples(&self) -> u64 {
        self.samples
    }
}
