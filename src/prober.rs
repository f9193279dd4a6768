//! ICMP echo probing.
//!
//! A [`Prober`] sends one echo request and waits for its reply or a deadline.
//! It never retries; the caller owns the probe cadence.

use std::net::IpAddr;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::timeout;
use tokio_icmp_echo::Pinger;

use crate::config::DEFAULT_TIMEOUT;
use crate::error::ProbeError;

/// Result of one probe attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum ProbeOutcome {
    Success { rtt: Duration },
    Failure { reason: ProbeError },
}

impl ProbeOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failure { .. })
    }

    /// Round-trip time in milliseconds, if the probe succeeded.
    pub fn rtt_ms(&self) -> Option<f64> {
        match self {
            Self::Success { rtt } => Some(rtt.as_secs_f64() * 1000.0),
            Self::Failure { .. } => None,
        }
    }
}

impl From<Result<Duration, ProbeError>> for ProbeOutcome {
    fn from(result: Result<Duration, ProbeError>) -> Self {
        match result {
            Ok(rtt) => Self::Success { rtt },
            Err(reason) => Self::Failure { reason },
        }
    }
}

/// Sends a single echo request to an address.
#[async_trait]
pub trait Prober: Send + Sync + 'static {
    /// Probe `addr` once with the given sequence number.
    async fn probe(&self, addr: IpAddr, seq: u16) -> ProbeOutcome;

    /// Check that probing resources can be acquired at all.
    async fn preflight(&self) -> Result<(), ProbeError> {
        Ok(())
    }
}

/// Raw-socket ICMP prober.
///
/// Opens a fresh pinger for every probe and drops it on return, so no socket
/// outlives a call.
#[derive(Debug, Clone)]
pub struct IcmpProber {
    timeout: Duration,
}

impl Default for IcmpProber {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEOUT)
    }
}

impl IcmpProber {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn echo(&self, addr: IpAddr, ident: u16, seq: u16) -> Result<Duration, ProbeError> {
        let pinger = Pinger::new()
            .await
            .map_err(|e| ProbeError::Channel(e.to_string()))?;

        pinger
            .ping(addr, ident, seq, self.timeout)
            .await
            .map_err(|e| ProbeError::Channel(e.to_string()))?
            .ok_or(ProbeError::Timeout(self.timeout))
    }
}

#[async_trait]
impl Prober for IcmpProber {
    async fn probe(&self, addr: IpAddr, seq: u16) -> ProbeOutcome {
        let ident: u16 = rand::random();

        // The deadline covers socket setup as well as the round trip.
        let result = match timeout(self.timeout, self.echo(addr, ident, seq)).await {
            Ok(result) => result,
            Err(_) => Err(ProbeError::Timeout(self.timeout)),
        };

        match &result {
            Ok(rtt) => tracing::debug!(
                address = %addr,
                seq,
                rtt_ms = rtt.as_secs_f64() * 1000.0,
                "Echo reply received"
            ),
            Err(e) => tracing::debug!(address = %addr, seq, error = %e, "Echo probe failed"),
        }

        result.into()
    }

    async fn preflight(&self) -> Result<(), ProbeError> {
        Pinger::new()
            .await
            .map(drop)
            .map_err(|e| ProbeError::Channel(e.to_string()))
    }
}
