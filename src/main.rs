use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use qos_monitor::config::{
    parse_failure_penalty, DEFAULT_FAILURE_PENALTY_MS, DEFAULT_WINDOW_CAPACITY,
};
use qos_monitor::exporter::DEFAULT_LISTEN;
use qos_monitor::{
    all_failed, resolve_all, IcmpProber, MetricsExporter, MonitorConfig, PrometheusSink,
    Supervisor,
};
use tokio::signal;
use tokio::sync::watch;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Measure packet loss and RTT to remote hosts over ICMP echo.
#[derive(Parser, Debug)]
#[command(name = "qos-monitor", version, about, long_about = None)]
struct Cli {
    /// Hosts to monitor (names or IP addresses)
    #[arg(required = true)]
    hosts: Vec<String>,

    /// Address of the /metrics endpoint
    #[arg(long, default_value = DEFAULT_LISTEN, env = "QOS_LISTEN")]
    listen: SocketAddr,

    /// Pause between probes of the same host
    #[arg(long, default_value = "100ms", value_parser = humantime::parse_duration)]
    interval: Duration,

    /// Deadline for one echo round trip
    #[arg(long, default_value = "5s", value_parser = humantime::parse_duration)]
    timeout: Duration,

    /// Upper bound of the random delay before each host's first probe
    #[arg(long, default_value = "500ms", value_parser = humantime::parse_duration)]
    start_jitter: Duration,

    /// Number of recent probes used for the loss rate
    #[arg(long, default_value_t = DEFAULT_WINDOW_CAPACITY)]
    window: usize,

    /// Delay (ms) recorded for a failed probe
    #[arg(
        long,
        default_value_t = DEFAULT_FAILURE_PENALTY_MS,
        value_parser = parse_failure_penalty
    )]
    failure_penalty_ms: f64,
}

impl Cli {
    fn monitor_config(&self) -> MonitorConfig {
        MonitorConfig::default()
            .with_interval(self.interval)
            .with_timeout(self.timeout)
            .with_window_capacity(self.window)
            .with_failure_penalty_ms(self.failure_penalty_ms)
            .with_start_jitter(self.start_jitter)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,qos_monitor=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = cli.monitor_config();

    let destinations = resolve_all(cli.hosts.as_slice())
        .await
        .context("no destination to monitor")?;

    let sink = PrometheusSink::new().context("failed to create gauges")?;
    let exporter = MetricsExporter::bind(cli.listen, sink.clone())
        .context("failed to start metrics endpoint")?;

    let prober = Arc::new(IcmpProber::new(config.timeout));
    let supervisor = Supervisor::new(prober, Arc::new(sink), config);
    let shutdown = supervisor.shutdown_handle();

    let (exporter_stop, exporter_rx) = watch::channel(false);
    let exporter_task = tokio::spawn(exporter.serve(exporter_rx));

    tokio::spawn(async move {
        if signal::ctrl_c().await.is_ok() {
            tracing::info!("Exiting...");
            shutdown.trigger();
        }
    });

    let reports = supervisor.run(destinations).await;
    let failed = reports.iter().filter(|r| r.result.is_err()).count();
    tracing::info!(monitors = reports.len(), failed, "All monitors stopped");

    exporter_stop.send_replace(true);
    exporter_task
        .await
        .context("metrics endpoint task failed")?
        .context("metrics endpoint failed")?;

    if all_failed(&reports) {
        anyhow::bail!("no monitor could start");
    }
    Ok(())
}
