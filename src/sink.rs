//! Gauge sink abstraction and its Prometheus implementation.
//!
//! Monitors only ever write to a sink. Implementations must tolerate
//! concurrent writes from many host tasks.

use prometheus::{Encoder, GaugeVec, Opts, Registry, TextEncoder};

use crate::error::SinkError;

/// Label names attached to every published gauge.
pub const LABEL_NAMES: [&str; 2] = ["SourceIP", "DestinationIP"];

/// The gauges published per monitored host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Gauge {
    PacketLossRate,
    QueueingDelay,
    SmoothRtt,
}

impl Gauge {
    pub const ALL: [Gauge; 3] = [Gauge::PacketLossRate, Gauge::QueueingDelay, Gauge::SmoothRtt];

    pub fn name(self) -> &'static str {
        match self {
            Gauge::PacketLossRate => "quality_of_service_packet_loss_rate",
            Gauge::QueueingDelay => "quality_of_service_queueing_delay_millisecond",
            Gauge::SmoothRtt => "quality_of_service_smooth_RTT_millisecond",
        }
    }

    pub fn help(self) -> &'static str {
        match self {
            Gauge::PacketLossRate => "The rate of Packet Loss",
            Gauge::QueueingDelay => "The duration of queueing delay (in millisecond)",
            Gauge::SmoothRtt => "Smooth RTT of queueing delay (in millisecond)",
        }
    }
}

/// The (source, destination) label pair of one monitored host.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GaugeLabels {
    pub source: String,
    pub destination: String,
}

impl GaugeLabels {
    pub fn new(source: impl Into<String>, destination: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            destination: destination.into(),
        }
    }
}

/// Receives labelled gauge values.
pub trait GaugeSink: Send + Sync + 'static {
    fn set(&self, gauge: Gauge, labels: &GaugeLabels, value: f64) -> Result<(), SinkError>;
}

/// Gauge sink backed by a private Prometheus registry.
#[derive(Clone)]
pub struct PrometheusSink {
    registry: Registry,
    packet_loss_rate: GaugeVec,
    queueing_delay: GaugeVec,
    smooth_rtt: GaugeVec,
}

impl std::fmt::Debug for PrometheusSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrometheusSink").finish_non_exhaustive()
    }
}

impl PrometheusSink {
    /// Create the three gauge families and register them.
    pub fn new() -> Result<Self, SinkError> {
        let registry = Registry::new();
        let register = |gauge: Gauge| -> Result<GaugeVec, SinkError> {
            let vec = GaugeVec::new(Opts::new(gauge.name(), gauge.help()), &LABEL_NAMES)?;
            registry.register(Box::new(vec.clone()))?;
            Ok(vec)
        };

        Ok(Self {
            packet_loss_rate: register(Gauge::PacketLossRate)?,
            queueing_delay: register(Gauge::QueueingDelay)?,
            smooth_rtt: register(Gauge::SmoothRtt)?,
            registry,
        })
    }

    fn family(&self, gauge: Gauge) -> &GaugeVec {
        match gauge {
            Gauge::PacketLossRate => &self.packet_loss_rate,
            Gauge::QueueingDelay => &self.queueing_delay,
            Gauge::SmoothRtt => &self.smooth_rtt,
        }
    }

    /// Current value of a gauge. Reading an unseen label pair creates it at zero.
    pub fn get(&self, gauge: Gauge, labels: &GaugeLabels) -> Result<f64, SinkError> {
        Ok(self
            .family(gauge)
            .get_metric_with_label_values(&[labels.source.as_str(), labels.destination.as_str()])?
            .get())
    }

    /// Encode every gauge in the Prometheus text exposition format.
    pub fn render(&self) -> Result<String, SinkError> {
        let families = self.registry.gather();
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&families, &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| SinkError::Encoding(e.to_string()))
    }
}

impl GaugeSink for PrometheusSink {
    fn set(&self, gauge: Gauge, labels: &GaugeLabels, value: f64) -> Result<(), SinkError> {
        self.family(gauge)
            .get_metric_with_label_values(&[labels.source.as_str(), labels.destination.as_str()])?
            .set(value);
        Ok(())
    }
}
