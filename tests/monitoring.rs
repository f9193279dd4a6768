//! End-to-end tests for supervisor, sink and scrape endpoint.

use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use qos_monitor::{
    Destination, Gauge, MetricsExporter, MonitorConfig, ProbeError, ProbeOutcome, Prober,
    PrometheusSink, Supervisor,
};
use tokio::sync::watch;
use tokio::time::sleep;

// =============================================================================
// Test Helpers
// =============================================================================

/// Answers each address after a fixed per-address delay.
struct DelayProber {
    delays: HashMap<IpAddr, Duration>,
}

#[async_trait]
impl Prober for DelayProber {
    async fn probe(&self, addr: IpAddr, _seq: u16) -> ProbeOutcome {
        let rtt = self.delays[&addr];
        sleep(rtt).await;
        ProbeOutcome::Success { rtt }
    }
}

/// Fails every other probe, starting with a 10ms success.
#[derive(Default)]
struct FlakyProber {
    calls: AtomicU64,
}

#[async_trait]
impl Prober for FlakyProber {
    async fn probe(&self, _addr: IpAddr, _seq: u16) -> ProbeOutcome {
        if self.calls.fetch_add(1, Ordering::SeqCst) % 2 == 0 {
            ProbeOutcome::Success {
                rtt: Duration::from_millis(10),
            }
        } else {
            ProbeOutcome::Failure {
                reason: ProbeError::Parse("destination unreachable".to_string()),
            }
        }
    }
}

fn dest(last: u8) -> Destination {
    Destination::new(
        format!("host-{last}"),
        IpAddr::V4(Ipv4Addr::new(10, 0, 0, last)),
    )
}

// =============================================================================
// Tests
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_slow_host_does_not_stall_fast_hosts() {
    let slow = dest(1);
    let fast = [dest(2), dest(3), dest(4)];

    let mut delays = HashMap::new();
    delays.insert(slow.address, Duration::from_secs(5));
    for d in &fast {
        delays.insert(d.address, Duration::from_millis(10));
    }

    let supervisor = Arc::new(Supervisor::new(
        Arc::new(DelayProber { delays }),
        Arc::new(PrometheusSink::new().unwrap()),
        MonitorConfig::default(),
    ));
    let shutdown = supervisor.shutdown_handle();

    let mut destinations = vec![slow.clone()];
    destinations.extend(fast.iter().cloned());
    let task = tokio::spawn({
        let supervisor = Arc::clone(&supervisor);
        async move { supervisor.run(destinations).await }
    });

    sleep(Duration::from_secs(12)).await;
    shutdown.trigger();

    let reports = task.await.unwrap();
    assert_eq!(reports.len(), 4);

    let cycles: HashMap<IpAddr, u64> = reports
        .iter()
        .map(|r| (r.destination.address, r.result.as_ref().unwrap().cycles))
        .collect();

    // 5s probe + 100ms pause: completed at 5.0s and 10.1s.
    assert_eq!(cycles[&slow.address], 2);
    for d in &fast {
        assert!(
            cycles[&d.address] > 10 * cycles[&slow.address],
            "{} only ran {} cycles",
            d,
            cycles[&d.address]
        );
    }
}

#[tokio::test(start_paused = true)]
async fn test_gauges_reflect_alternating_loss() {
    let sink = PrometheusSink::new().unwrap();
    let supervisor = Supervisor::new(
        Arc::new(FlakyProber::default()),
        Arc::new(sink.clone()),
        MonitorConfig::default(),
    );
    let shutdown = supervisor.shutdown_handle();
    let target = dest(7);

    let run = supervisor.run(vec![target.clone()]);
    let stop = async {
        // Probes at 0, 100, 200, 300ms: success, failure, success, failure.
        sleep(Duration::from_millis(350)).await;
        shutdown.trigger();
    };
    let (reports, ()) = tokio::join!(run, stop);

    let stats = reports[0].result.as_ref().unwrap();
    assert_eq!(stats.cycles, 4);
    assert_eq!(stats.failures, 2);

    let labels = target.labels();
    assert_eq!(sink.get(Gauge::PacketLossRate, &labels).unwrap(), 0.5);
    assert_eq!(sink.get(Gauge::QueueingDelay, &labels).unwrap(), 100.0);
    // mean = (10 + 100 + 10 + 100) / 4 = 55
    assert_eq!(
        sink.get(Gauge::SmoothRtt, &labels).unwrap(),
        0.75 * 55.0 + 0.25 * 100.0
    );
}

#[tokio::test]
async fn test_scrape_endpoint_serves_published_gauges() {
    let sink = PrometheusSink::new().unwrap();
    let supervisor = Supervisor::new(
        Arc::new(FlakyProber::default()),
        Arc::new(sink.clone()),
        MonitorConfig::default().with_interval(Duration::from_millis(10)),
    );
    let shutdown = supervisor.shutdown_handle();

    let exporter = MetricsExporter::bind("127.0.0.1:0".parse().unwrap(), sink).unwrap();
    let addr = exporter.local_addr();
    let (stop_tx, stop_rx) = watch::channel(false);
    let server = tokio::spawn(exporter.serve(stop_rx));

    let target = dest(9);
    let run = supervisor.run(vec![target.clone()]);
    let scrape = async {
        sleep(Duration::from_millis(100)).await;

        let client = hyper::Client::new();
        let uri: hyper::Uri = format!("http://{addr}/metrics").parse().unwrap();
        let resp = client.get(uri).await.unwrap();
        assert_eq!(resp.status(), hyper::StatusCode::OK);
        let body = hyper::body::to_bytes(resp.into_body()).await.unwrap();

        shutdown.trigger();
        String::from_utf8(body.to_vec()).unwrap()
    };
    let (_, text) = tokio::join!(run, scrape);

    for gauge in Gauge::ALL {
        assert!(text.contains(gauge.name()), "missing {}", gauge.name());
    }
    assert!(text.contains("DestinationIP=\"10.0.0.9\""));
    assert!(text.contains("SourceIP=\"host-9\""));

    stop_tx.send_replace(true);
    server.await.unwrap().unwrap();
}
