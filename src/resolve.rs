//! Host name resolution into [`Destination`]s.

use std::net::IpAddr;

use crate::error::ResolveError;
use crate::monitor::Destination;

/// Resolve a host name or IP literal to its first address.
pub async fn resolve_host(host: &str) -> Result<IpAddr, ResolveError> {
    if let Ok(ip) = host.parse::<IpAddr>() {
        return Ok(ip);
    }

    let mut addrs = tokio::net::lookup_host(format!("{host}:0"))
        .await
        .map_err(|source| ResolveError::Lookup {
            host: host.to_string(),
            source,
        })?;

    addrs
        .next()
        .map(|addr| addr.ip())
        .ok_or_else(|| ResolveError::NoAddress(host.to_string()))
}

/// Resolve every host independently.
///
/// Hosts that fail to resolve are logged and skipped. Errors only when no
/// host resolved at all.
pub async fn resolve_all<S: AsRef<str>>(hosts: &[S]) -> Result<Vec<Destination>, ResolveError> {
    let mut destinations = Vec::with_capacity(hosts.len());

    for host in hosts {
        let host = host.as_ref();
        match resolve_host(host).await {
            Ok(address) => {
                tracing::info!(host, %address, "Resolved destination");
                destinations.push(Destination::new(host, address));
            }
            Err(e) => tracing::warn!(host, error = %e, "Skipping unresolvable host"),
        }
    }

    if destinations.is_empty() {
        return Err(ResolveError::NoDestinations);
    }
    Ok(destinations)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{Ipv4Addr, Ipv6Addr};

    #[tokio::test]
    async fn test_resolve_host_ipv4() {
        let ip = resolve_host("127.0.0.1").await.unwrap();
        assert_eq!(ip, IpAddr::V4(Ipv4Addr::LOCALHOST));
    }

    #[tokio::test]
    async fn test_resolve_host_ipv6() {
        let ip = resolve_host("::1").await.unwrap();
        assert_eq!(ip, IpAddr::V6(Ipv6Addr::LOCALHOST));
    }

    #[tokio::test]
    async fn test_resolve_all_skips_bad_hosts() {
        let destinations = resolve_all(&["127.0.0.1", "host.invalid", "::1"])
            .await
            .unwrap();

        assert_eq!(destinations.len(), 2);
        assert_eq!(destinations[0].source, "127.0.0.1");
        assert_eq!(destinations[1].address, IpAddr::V6(Ipv6Addr::LOCALHOST));
    }

    #[tokio::test]
    async fn test_resolve_all_without_any_host_fails() {
        let result = resolve_all(&["host.invalid"]).await;
        assert!(matches!(result, Err(ResolveError::NoDestinations)));

        let empty: [&str; 0] = [];
        assert!(matches!(resolve_all(&empty).await, Err(ResolveError::NoDestinations)));
    }
}
