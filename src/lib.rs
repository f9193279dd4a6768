//! Path-quality monitoring over ICMP echo.
//!
//! Each destination gets its own [`HostMonitor`] task that probes it at a
//! fixed cadence and publishes three gauges per `(SourceIP, DestinationIP)`:
//!
//! - `quality_of_service_packet_loss_rate`: failures among the last 30 probes
//! - `quality_of_service_queueing_delay_millisecond`: latest RTT, or the failure penalty
//! - `quality_of_service_smooth_RTT_millisecond`: `0.75 * mean + 0.25 * latest`
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use qos_monitor::{resolve_all, IcmpProber, MonitorConfig, PrometheusSink, Supervisor};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = MonitorConfig::default();
//! let sink = Arc::new(PrometheusSink::new()?);
//! let destinations = resolve_all(&["1.1.1.1", "example.com"]).await?;
//!
//! let supervisor = Supervisor::new(Arc::new(IcmpProber::new(config.timeout)), sink, config);
//! supervisor.run(destinations).await;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod exporter;
pub mod latency;
pub mod monitor;
pub mod prober;
pub mod resolve;
pub mod sink;
pub mod supervisor;
pub mod window;

pub use config::MonitorConfig;
pub use error::{ExporterError, MonitorError, ProbeError, ResolveError, SinkError};
pub use exporter::MetricsExporter;
pub use latency::{LatencySample, LatencyStats};
pub use monitor::{Destination, HostMonitor, MonitorStats};
pub use prober::{IcmpProber, ProbeOutcome, Prober};
pub use resolve::{resolve_all, resolve_host};
pub use sink::{Gauge, GaugeLabels, GaugeSink, PrometheusSink};
pub use supervisor::{all_failed, MonitorReport, ShutdownHandle, Supervisor};
pub use window::LossWindow;
