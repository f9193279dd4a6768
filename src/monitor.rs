//! Probe loop for a single destination.

use std::fmt;
use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use tokio::sync::watch;
use tokio::time::sleep;

use crate::config::MonitorConfig;
use crate::error::MonitorError;
use crate::latency::{LatencySample, LatencyStats};
use crate::prober::{ProbeOutcome, Prober};
use crate::sink::{Gauge, GaugeLabels, GaugeSink};
use crate::window::LossWindow;

/// A monitored host: the name it was given as and the address it resolved to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Destination {
    pub source: String,
    pub address: IpAddr,
}

impl Destination {
    pub fn new(source: impl Into<String>, address: IpAddr) -> Self {
        Self {
            source: source.into(),
            address,
        }
    }

    pub fn labels(&self) -> GaugeLabels {
        GaugeLabels::new(self.source.clone(), self.address.to_string())
    }
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]", self.source, self.address)
    }
}

/// Counters reported when a monitor stops.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MonitorStats {
    pub cycles: u64,
    pub failures: u64,
}

/// Probes one destination forever, publishing loss and latency gauges.
///
/// The loss window and latency statistics belong to this monitor alone, so
/// monitors for different hosts never contend with each other.
pub struct HostMonitor {
    destination: Destination,
    labels: GaugeLabels,
    prober: Arc<dyn Prober>,
    sink: Arc<dyn GaugeSink>,
    config: MonitorConfig,
    window: LossWindow,
    latency: LatencyStats,
    sequence: u16,
    stats: MonitorStats,
}

impl fmt::Debug for HostMonitor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostMonitor")
            .field("destination", &self.destination)
            .field("config", &self.config)
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}

impl HostMonitor {
    pub fn new(
        destination: Destination,
        prober: Arc<dyn Prober>,
        sink: Arc<dyn GaugeSink>,
        config: MonitorConfig,
    ) -> Self {
        Self {
            labels: destination.labels(),
            window: LossWindow::new(config.window_capacity),
            latency: LatencyStats::new(config.failure_penalty_ms),
            destination,
            prober,
            sink,
            config,
            sequence: 0,
            stats: MonitorStats::default(),
        }
    }

    /// Run the probe loop until `shutdown` flips to `true` or its sender is dropped.
    pub async fn run(
        mut self,
        mut shutdown: watch::Receiver<bool>,
    ) -> Result<MonitorStats, MonitorError> {
        self.prober.preflight().await.inspect_err(|e| {
            tracing::error!(
                host = %self.destination.source,
                address = %self.destination.address,
                error = %e,
                "Cannot start monitor"
            );
        })?;

        tracing::info!(
            host = %self.destination.source,
            address = %self.destination.address,
            "Monitor started"
        );

        let delay = self.start_delay();
        if !delay.is_zero() {
            tokio::select! {
                _ = shutdown.changed() => return Ok(self.stop()),
                _ = sleep(delay) => {}
            }
        }

        loop {
            if *shutdown.borrow() {
                break;
            }

            let seq = self.sequence;
            self.sequence = self.sequence.wrapping_add(1);

            let outcome = tokio::select! {
                _ = shutdown.changed() => break,
                outcome = self.prober.probe(self.destination.address, seq) => outcome,
            };
            self.update(seq, &outcome);

            tokio::select! {
                _ = shutdown.changed() => break,
                _ = sleep(self.config.interval) => {}
            }
        }

        Ok(self.stop())
    }

    fn start_delay(&self) -> Duration {
        let max_ms = u64::try_from(self.config.start_jitter.as_millis()).unwrap_or(u64::MAX);
        if max_ms == 0 {
            return Duration::ZERO;
        }
        Duration::from_millis(rand::thread_rng().gen_range(0..=max_ms))
    }

    /// Fold one outcome into the window and statistics and publish the gauges.
    fn update(&mut self, seq: u16, outcome: &ProbeOutcome) {
        self.stats.cycles += 1;
        if let ProbeOutcome::Failure { reason } = outcome {
            self.stats.failures += 1;
            tracing::debug!(
                host = %self.destination.source,
                address = %self.destination.address,
                seq,
                error = %reason,
                "Probe failed"
            );
        }

        self.window.push(outcome.is_failure());
        let sample = self.latency.record(outcome);
        // The window was just pushed, so it cannot be empty.
        let loss_rate = self.window.rate().unwrap_or_default();

        self.publish(loss_rate, &sample);
    }

    fn publish(&self, loss_rate: f64, sample: &LatencySample) {
        let values = [
            (Gauge::PacketLossRate, loss_rate),
            (Gauge::QueueingDelay, sample.instantaneous_ms),
            (Gauge::SmoothRtt, sample.smoothed_ms),
        ];

        for (gauge, value) in values {
            if let Err(e) = self.sink.set(gauge, &self.labels, value) {
                tracing::warn!(
                    host = %self.destination.source,
                    gauge = gauge.name(),
                    error = %e,
                    "Failed to publish gauge"
                );
            }
        }
    }

    fn stop(self) -> MonitorStats {
        tracing::info!(
            host = %self.destination.source,
            address = %self.destination.address,
            cycles = self.stats.cycles,
            failures = self.stats.failures,
            "Monitor stopped"
        );
        self.stats
    }
}
