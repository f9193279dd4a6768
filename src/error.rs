//! Error types for probing, monitoring and metric export.

use std::time::Duration;

use thiserror::Error;

/// Reasons a single echo probe did not produce a round-trip time.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProbeError {
    /// The ICMP channel could not be opened or the request could not be sent.
    #[error("icmp channel error: {0}")]
    Channel(String),

    /// No matching reply arrived before the deadline.
    #[error("no reply within {0:?}")]
    Timeout(Duration),

    /// A reply arrived but was malformed or not an echo reply.
    #[error("unexpected reply: {0}")]
    Parse(String),
}

/// Errors that end a host monitor.
#[derive(Debug, Error)]
pub enum MonitorError {
    /// The monitor could not acquire its probing resources.
    #[error("monitor startup failed: {0}")]
    Startup(#[from] ProbeError),

    /// The monitor task panicked or was aborted.
    #[error("monitor task aborted: {0}")]
    Aborted(String),
}

/// Errors raised by a gauge sink.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("prometheus error: {0}")]
    Prometheus(#[from] prometheus::Error),

    #[error("encoding error: {0}")]
    Encoding(String),
}

/// Errors raised by the `/metrics` endpoint.
#[derive(Debug, Error)]
pub enum ExporterError {
    #[error("failed to bind metrics endpoint: {0}")]
    Bind(#[source] hyper::Error),

    #[error("metrics endpoint failed: {0}")]
    Serve(#[source] hyper::Error),
}

/// Errors produced while turning host names into destinations.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("failed to resolve {host}: {source}")]
    Lookup {
        host: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{0} resolved to no addresses")]
    NoAddress(String),

    #[error("none of the given hosts could be resolved")]
    NoDestinations,
}
