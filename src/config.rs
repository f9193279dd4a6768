//! Per-host monitoring parameters.

use std::time::Duration;

/// Default pause between two probes of the same host.
pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(100);

/// Default deadline for one echo round trip.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Default number of outcomes kept for the loss rate.
pub const DEFAULT_WINDOW_CAPACITY: usize = 30;

/// Delay substituted for a failed probe.
pub const DEFAULT_FAILURE_PENALTY_MS: f64 = 100.0;

/// Parse a failure penalty in milliseconds.
///
/// The penalty feeds the smoothed RTT, so it must be finite and non-negative.
pub fn parse_failure_penalty(s: &str) -> Result<f64, String> {
    let penalty: f64 = s
        .trim()
        .parse()
        .map_err(|e| format!("invalid penalty '{s}': {e}"))?;
    if !penalty.is_finite() || penalty < 0.0 {
        return Err(format!("penalty must be a finite value >= 0, got {s}"));
    }
    Ok(penalty)
}

/// Settings shared by every host monitor.
#[derive(Debug, Clone, PartialEq)]
pub struct MonitorConfig {
    /// Pause after each probe cycle.
    pub interval: Duration,
    /// Deadline for a single probe.
    pub timeout: Duration,
    /// Loss window capacity.
    pub window_capacity: usize,
    /// Delay (ms) recorded in place of a failed probe.
    pub failure_penalty_ms: f64,
    /// Upper bound of the random delay before a monitor's first probe.
    pub start_jitter: Duration,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_INTERVAL,
            timeout: DEFAULT_TIMEOUT,
            window_capacity: DEFAULT_WINDOW_CAPACITY,
            failure_penalty_ms: DEFAULT_FAILURE_PENALTY_MS,
            start_jitter: Duration::ZERO,
        }
    }
}

impl MonitorConfig {
    /// Set the inter-probe interval.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Set the probe deadline.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the loss window capacity.
    pub fn with_window_capacity(mut self, capacity: usize) -> Self {
        self.window_capacity = capacity;
        self
    }

    /// Set the failure penalty.
    pub fn with_failure_penalty_ms(mut self, penalty_ms: f64) -> Self {
        self.failure_penalty_ms = penalty_ms;
        self
    }

    /// Set the start jitter.
    pub fn with_start_jitter(mut self, jitter: Duration) -> Self {
        self.start_jitter = jitter;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_monitor_config_defaults() {
        let config = MonitorConfig::default();
        assert_eq!(config.interval, Duration::from_millis(100));
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.window_capacity, 30);
        assert_eq!(config.failure_penalty_ms, 100.0);
        assert_eq!(config.start_jitter, Duration::ZERO);
    }

    #[test]
    fn test_monitor_config_builder() {
        let config = MonitorConfig::default()
            .with_interval(Duration::from_secs(1))
            .with_timeout(Duration::from_secs(2))
            .with_window_capacity(10)
            .with_failure_penalty_ms(250.0)
            .with_start_jitter(Duration::from_millis(500));

        assert_eq!(config.interval, Duration::from_secs(1));
        assert_eq!(config.timeout, Duration::from_secs(2));
        assert_eq!(config.window_capacity, 10);
        assert_eq!(config.failure_penalty_ms, 250.0);
        assert_eq!(config.start_jitter, Duration::from_millis(500));
    }

    #[test]
    fn test_parse_failure_penalty() {
        assert_eq!(parse_failure_penalty("100"), Ok(100.0));
        assert_eq!(parse_failure_penalty("0"), Ok(0.0));
        assert_eq!(parse_failure_penalty("12.5"), Ok(12.5));

        for bad in ["-1", "-0.5", "NaN", "inf", "-inf", "abc", ""] {
            assert!(parse_failure_penalty(bad).is_err(), "accepted {bad:?}");
        }
    }
}
