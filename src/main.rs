//! Command-line interface for iccp-sim
//!
//! # Usage Examples
//!
//! ```bash
//! # Publish to Kafka until Ctrl+C
//! KAFKA_BROKERS=kafka:29092 SITE_NAME=manapouri-power iccp-sim
//!
//! # Load a YAML config and create topics first
//! iccp-sim --config simulator.yaml --create-topics
//!
//! # Dry run against the in-memory broker
//! iccp-sim --dry-run --count 50 --seed 7
//! ```

use anyhow::Context;
use clap::Parser;
use iccp_core::SimulatorConfig;
use iccp_sim::{Cli, LogFormat, Simulation};
use kafka_publisher::{BrokerClient, KafkaBroker, MemoryBroker};
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = run().await {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}

async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_format);

    let config = cli.load_config()?;

    let shutdown = CancellationToken::new();
    let signal = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Received shutdown signal");
            signal.cancel();
        }
    });

    if cli.dry_run {
        info!("Dry run: publishing to the in-memory broker");
        return simulate(config, MemoryBroker::default(), shutdown).await;
    }

    let broker = KafkaBroker::new(&config.broker, config.publish_timeout)
        .context("Failed to create Kafka producer")?;
    if cli.create_topics {
        let topics = config.topics.topics();
        broker
            .create_topics_if_not_exist(&topics, cli.topic_partitions)
            .await
            .context("Failed to create topics")?;
    }

    simulate(config, broker, shutdown).await
}

async fn simulate<B: BrokerClient>(
    config: SimulatorConfig,
    broker: B,
    shutdown: CancellationToken,
) -> anyhow::Result<()> {
    let mut simulation = Simulation::new(config, broker)?;
    let summary = simulation
        .run(shutdown)
        .await
        .context("Simulation aborted")?;

    println!(
        "Sent {} messages ({} failed) in {:.1}s, {:.2} msg/sec, {} uncleared alarms",
        summary.total_sent,
        summary.total_failed,
        summary.uptime.as_secs_f64(),
        summary.average_throughput,
        summary.uncleared_alarms
    );
    Ok(())
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}
