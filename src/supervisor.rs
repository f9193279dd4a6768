//! Runs one [`HostMonitor`] per destination.

use std::sync::Arc;

use futures::stream::FuturesUnordered;
use futures::StreamExt;
use tokio::sync::watch;

use crate::config::MonitorConfig;
use crate::error::MonitorError;
use crate::monitor::{Destination, HostMonitor, MonitorStats};
use crate::prober::Prober;
use crate::sink::GaugeSink;

/// How one monitor ended.
#[derive(Debug)]
pub struct MonitorReport {
    pub destination: Destination,
    pub result: Result<MonitorStats, MonitorError>,
}

/// True when monitors were started and none of them ended cleanly.
///
/// This is the case when no host could acquire a probing channel at all.
pub fn all_failed(reports: &[MonitorReport]) -> bool {
    !reports.is_empty() && reports.iter().all(|r| r.result.is_err())
}

/// Stops every monitor started by a [`Supervisor`].
#[derive(Debug, Clone)]
pub struct ShutdownHandle(Arc<watch::Sender<bool>>);

impl ShutdownHandle {
    pub fn trigger(&self) {
        self.0.send_replace(true);
    }

    pub fn is_triggered(&self) -> bool {
        *self.0.borrow()
    }
}

/// Starts monitors concurrently and waits for all of them.
pub struct Supervisor {
    prober: Arc<dyn Prober>,
    sink: Arc<dyn GaugeSink>,
    config: MonitorConfig,
    shutdown: Arc<watch::Sender<bool>>,
}

impl std::fmt::Debug for Supervisor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Supervisor")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Supervisor {
    pub fn new(prober: Arc<dyn Prober>, sink: Arc<dyn GaugeSink>, config: MonitorConfig) -> Self {
        let (shutdown, _) = watch::channel(false);
        Self {
            prober,
            sink,
            config,
            shutdown: Arc::new(shutdown),
        }
    }

    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle(Arc::clone(&self.shutdown))
    }

    /// Monitor every destination until shutdown.
    ///
    /// A monitor that fails to start only affects its own destination. The
    /// returned reports are in completion order.
    pub async fn run(&self, destinations: Vec<Destination>) -> Vec<MonitorReport> {
        if destinations.is_empty() {
            tracing::warn!("No destinations to monitor");
            return Vec::new();
        }

        tracing::info!(hosts = destinations.len(), "Starting monitors");

        let mut running: FuturesUnordered<_> = destinations
            .into_iter()
            .map(|destination| {
                let monitor = HostMonitor::new(
                    destination.clone(),
                    Arc::clone(&self.prober),
                    Arc::clone(&self.sink),
                    self.config.clone(),
                );
                let handle = tokio::spawn(monitor.run(self.shutdown.subscribe()));
                async move {
                    let result = match handle.await {
                        Ok(result) => result,
                        Err(e) => Err(MonitorError::Aborted(e.to_string())),
                    };
                    MonitorReport {
                        destination,
                        result,
                    }
                }
            })
            .collect();

        let mut reports = Vec::new();
        while let Some(report) = running.next().await {
            if let Err(e) = &report.result {
                tracing::error!(
                    host = %report.destination,
                    error = %e,
                    "Monitor exited with error"
                );
            }
            reports.push(report);
        }
        reports
    }
}
