//! Command-line arguments and configuration overrides.

use anyhow::Context;
use clap::{Parser, ValueEnum};
use iccp_core::{parse_duration, SimulatorConfig};
use std::path::PathBuf;
use std::time::Duration;

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human-readable lines
    Text,
    /// One JSON object per event
    Json,
}

#[derive(Parser, Clone, Debug)]
#[command(name = "iccp-sim")]
#[command(about = "Simulated ICCP telecontrol source publishing synthetic telemetry to Kafka")]
#[command(long_about = None)]
pub struct Cli {
    /// Path to a YAML configuration file
    #[arg(long, short = 'c', value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Kafka brokers (comma-separated, e.g., "localhost:9092")
    #[arg(long, env = "KAFKA_BROKERS")]
    pub brokers: Option<String>,

    /// Simulated site (e.g., "huntly-power")
    #[arg(long, env = "SITE_NAME")]
    pub site: Option<String>,

    /// Producer compression codec (gzip, snappy, lz4, zstd or none)
    #[arg(long, env = "KAFKA_COMPRESSION_TYPE")]
    pub compression: Option<String>,

    /// Random seed for deterministic generation (same seed = same messages)
    #[arg(long, env = "SIMULATOR_SEED")]
    pub seed: Option<u64>,

    /// Stop after this many messages
    #[arg(long)]
    pub count: Option<u64>,

    /// Mean interval between messages (e.g., "1500ms", "2s")
    #[arg(long, value_parser = parse_interval)]
    pub interval: Option<Duration>,

    /// Publish to an in-memory broker instead of Kafka
    #[arg(long)]
    pub dry_run: bool,

    /// Create the configured topics before publishing
    #[arg(long)]
    pub create_topics: bool,

    /// Partitions for topics created with --create-topics
    #[arg(long, default_value = "3")]
    pub topic_partitions: i32,

    /// Log output format
    #[arg(long, value_enum, default_value = "text")]
    pub log_format: LogFormat,
}

fn parse_interval(s: &str) -> Result<Duration, String> {
    parse_duration(s).map_err(|e| e.to_string())
}

impl Cli {
    /// Load the configuration file (or defaults) and apply CLI/env overrides.
    pub fn load_config(&self) -> anyhow::Result<SimulatorConfig> {
        let mut config = match &self.config {
            Some(path) => SimulatorConfig::from_file(path)
                .with_context(|| format!("Failed to load config from {path:?}"))?,
            None => SimulatorConfig::default(),
        };
        self.apply_overrides(&mut config);
        config.validate().context("Invalid configuration")?;
        Ok(config)
    }

    fn apply_overrides(&self, config: &mut SimulatorConfig) {
        if let Some(brokers) = &self.brokers {
            config.broker.brokers = brokers.clone();
        }
        if let Some(site) = &self.site {
            config.site = site.clone();
        }
        if let Some(compression) = &self.compression {
            config.broker.compression = compression.clone();
        }
        if self.seed.is_some() {
            config.seed = self.seed;
        }
        if self.count.is_some() {
            config.max_messages = self.count;
        }
        if self.interval.is_some() {
            config.interval = self.interval;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_flags_override_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "site: wellington-central\nseed: 1\nbroker:\n  compression: lz4").unwrap();
        let path = file.path().to_string_lossy().to_string();

        let cli = Cli::parse_from([
            "iccp-sim",
            "--config",
            &path,
            "--site",
            "huntly-power",
            "--count",
            "25",
            "--interval",
            "250ms",
            "--brokers",
            "kafka:29092",
        ]);
        let config = cli.load_config().unwrap();

        assert_eq!(config.site, "huntly-power");
        assert_eq!(config.seed, Some(1));
        assert_eq!(config.max_messages, Some(25));
        assert_eq!(config.interval, Some(Duration::from_millis(250)));
        assert_eq!(config.broker.brokers, "kafka:29092");
        assert_eq!(config.broker.compression, "lz4");
    }

    #[test]
    fn test_invalid_override_rejected() {
        let cli = Cli::parse_from(["iccp-sim", "--compression", "brotli"]);
        assert!(cli.load_config().is_err());
    }

    #[test]
    fn test_log_format_parsing() {
        let cli = Cli::parse_from(["iccp-sim", "--log-format", "json", "--dry-run"]);
        assert_eq!(cli.log_format, LogFormat::Json);
        assert!(cli.dry_run);
        assert!(Cli::try_parse_from(["iccp-sim", "--log-format", "xml"]).is_err());
    }
}
