//! Simulator configuration.
//!
//! Configuration is read from a YAML file. Every field has a default, so an
//! empty document is a valid configuration:
//!
//! ```yaml
//! site: wellington-central
//! seed: 42
//! message_weights:
//!   measurement: 85
//!   protection_event: 15
//! severity_weights:
//!   info: 40
//!   warning: 35
//!   high: 20
//!   critical: 5
//! interval: 2s
//! jitter: 300ms
//! throughput_window: 10s
//! milestones: [10, 50, 100, 500, 1000]
//! topics:
//!   measurement: iccp-measurements
//!   protection_event: iccp-protection-events
//!   measurement_kinds:
//!     status_point: iccp-status-points
//!     analog_value: iccp-analog-values
//! clearing:
//!   policy: after_messages
//!   messages: 20
//! broker:
//!   brokers: kafka-0:9092,kafka-1:9092
//!   compression: gzip
//! ```

use crate::duration::{format_duration, serde_duration, serde_duration_opt};
use crate::message::{MeasurementKind, MessageType, Payload, Severity, SimulatedMessage};
use crate::site::{SiteProfile, DEFAULT_SITE};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

// ============================================================================
// Error Types
// ============================================================================

/// Error type for configuration loading and validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Error reading configuration file
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    /// Error parsing YAML
    #[error("Failed to parse YAML: {0}")]
    YamlError(#[from] serde_yaml::Error),

    /// A weighted distribution cannot be sampled
    #[error("Invalid {name} distribution: {reason}")]
    InvalidDistribution { name: &'static str, reason: String },

    /// A routing entry is not a usable Kafka topic name
    #[error("Invalid topic '{topic}' for {message_type}: {reason}")]
    InvalidTopic {
        message_type: MessageType,
        topic: String,
        reason: String,
    },

    /// A duration field is out of range
    #[error("Invalid {field}: {reason}")]
    InvalidDuration { field: &'static str, reason: String },

    /// Milestone thresholds are not strictly ascending and positive
    #[error("Invalid milestones: {0}")]
    InvalidMilestones(String),

    /// Clearing policy parameters are out of range
    #[error("Invalid clearing policy: {0}")]
    InvalidClearingPolicy(String),

    /// Broker settings are unusable
    #[error("Invalid broker config: {0}")]
    InvalidBroker(String),
}

// ============================================================================
// Distributions
// ============================================================================

/// Relative weights for choosing a message type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MessageWeights {
    pub measurement: f64,
    pub protection_event: f64,
}

impl Default for MessageWeights {
    fn default() -> Self {
        Self {
            measurement: 85.0,
            protection_event: 15.0,
        }
    }
}

impl MessageWeights {
    /// Weights paired with the message type they select.
    pub fn entries(&self) -> [(MessageType, f64); 2] {
        [
            (MessageType::Measurement, self.measurement),
            (MessageType::ProtectionEvent, self.protection_event),
        ]
    }
}

/// Relative weights for choosing a protection event severity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SeverityWeights {
    pub info: f64,
    pub warning: f64,
    pub high: f64,
    pub critical: f64,
}

impl Default for SeverityWeights {
    fn default() -> Self {
        Self {
            info: 40.0,
            warning: 35.0,
            high: 20.0,
            critical: 5.0,
        }
    }
}

impl SeverityWeights {
    /// Weights paired with the severity they select.
    pub fn entries(&self) -> [(Severity, f64); 4] {
        [
            (Severity::Info, self.info),
            (Severity::Warning, self.warning),
            (Severity::High, self.high),
            (Severity::Critical, self.critical),
        ]
    }

    /// A distribution that always yields `severity`.
    pub fn only(severity: Severity) -> Self {
        let pick = |s: Severity| if s == severity { 1.0 } else { 0.0 };
        Self {
            info: pick(Severity::Info),
            warning: pick(Severity::Warning),
            high: pick(Severity::High),
            critical: pick(Severity::Critical),
        }
    }
}

/// Check that a set of weights can be sampled: every weight finite and
/// non-negative, at least one positive.
pub fn check_weights(name: &'static str, weights: &[f64]) -> Result<(), ConfigError> {
    if let Some(bad) = weights.iter().find(|w| !w.is_finite() || **w < 0.0) {
        return Err(ConfigError::InvalidDistribution {
            name,
            reason: format!("weight {bad} is not a finite non-negative number"),
        });
    }
    if !weights.iter().any(|w| *w > 0.0) {
        return Err(ConfigError::InvalidDistribution {
            name,
            reason: "weights sum to zero".to_string(),
        });
    }
    Ok(())
}

// ============================================================================
// Routing, clearing and broker settings
// ============================================================================

/// Per-kind topics for measurement readings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MeasurementKindRoutes {
    pub status_point: String,
    pub analog_value: String,
}

impl Default for MeasurementKindRoutes {
    fn default() -> Self {
        Self {
            status_point: "iccp-status-points".to_string(),
            analog_value: "iccp-analog-values".to_string(),
        }
    }
}

impl MeasurementKindRoutes {
    pub fn topic_for(&self, kind: MeasurementKind) -> &str {
        match kind {
            MeasurementKind::StatusPoint => &self.status_point,
            MeasurementKind::AnalogValue => &self.analog_value,
        }
    }
}

/// Mapping from message to Kafka topic.
///
/// Measurements go to their per-kind topic when `measurement_kinds` is set
/// (the default) and to `measurement` when it is null.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TopicRoutes {
    pub measurement: String,
    pub protection_event: String,
    pub measurement_kinds: Option<MeasurementKindRoutes>,
}

impl Default for TopicRoutes {
    fn default() -> Self {
        Self {
            measurement: "iccp-measurements".to_string(),
            protection_event: "iccp-protection-events".to_string(),
            measurement_kinds: Some(MeasurementKindRoutes::default()),
        }
    }
}

impl TopicRoutes {
    /// Topic for a message type, ignoring per-kind measurement routes.
    pub fn topic_for(&self, message_type: MessageType) -> &str {
        match message_type {
            MessageType::Measurement => &self.measurement,
            MessageType::ProtectionEvent => &self.protection_event,
        }
    }

    /// Topic a message is published to.
    pub fn route(&self, message: &SimulatedMessage) -> &str {
        match (&message.payload, &self.measurement_kinds) {
            (Payload::Measurement(reading), Some(kinds)) => kinds.topic_for(reading.kind),
            _ => self.topic_for(message.message_type),
        }
    }

    /// Every topic `route` can return, without duplicates.
    pub fn topics(&self) -> Vec<&str> {
        let mut topics = match &self.measurement_kinds {
            Some(kinds) => vec![
                kinds.status_point.as_str(),
                kinds.analog_value.as_str(),
                self.protection_event.as_str(),
            ],
            None => vec![self.measurement.as_str(), self.protection_event.as_str()],
        };
        let mut seen = std::collections::HashSet::new();
        topics.retain(|topic| seen.insert(*topic));
        topics
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for message_type in MessageType::ALL {
            check_topic(message_type, self.topic_for(message_type))?;
        }
        if let Some(kinds) = &self.measurement_kinds {
            check_topic(MessageType::Measurement, &kinds.status_point)?;
            check_topic(MessageType::Measurement, &kinds.analog_value)?;
        }
        Ok(())
    }
}

fn check_topic(message_type: MessageType, topic: &str) -> Result<(), ConfigError> {
    let invalid = |reason: &str| ConfigError::InvalidTopic {
        message_type,
        topic: topic.to_string(),
        reason: reason.to_string(),
    };
    if topic.is_empty() {
        return Err(invalid("topic name is empty"));
    }
    if topic.len() > 249 {
        return Err(invalid("topic name longer than 249 characters"));
    }
    if topic == "." || topic == ".." {
        return Err(invalid("topic name cannot be '.' or '..'"));
    }
    if !topic
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
    {
        return Err(invalid("only ASCII alphanumerics, '.', '_' and '-' are allowed"));
    }
    Ok(())
}

/// Decides when the simulation loop emits a clearing event for an
/// outstanding protection alarm.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case", deny_unknown_fields)]
pub enum ClearingPolicy {
    /// Alarms are never cleared
    Never,
    /// The oldest alarm is cleared once this many messages were generated after it
    AfterMessages { messages: u64 },
    /// Each iteration clears the oldest alarm with this probability
    Random { probability: f64 },
}

impl Default for ClearingPolicy {
    fn default() -> Self {
        ClearingPolicy::Random { probability: 0.2 }
    }
}

impl ClearingPolicy {
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self {
            ClearingPolicy::Never => Ok(()),
            ClearingPolicy::AfterMessages { messages } if *messages == 0 => Err(
                ConfigError::InvalidClearingPolicy("messages must be greater than zero".into()),
            ),
            ClearingPolicy::AfterMessages { .. } => Ok(()),
            ClearingPolicy::Random { probability } if !(0.0..=1.0).contains(probability) => {
                Err(ConfigError::InvalidClearingPolicy(format!(
                    "probability {probability} is outside [0, 1]"
                )))
            }
            ClearingPolicy::Random { .. } => Ok(()),
        }
    }
}

/// Kafka producer settings handed to the broker client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BrokerConfig {
    /// Comma-separated bootstrap servers
    pub brokers: String,
    /// Compression codec; "none" or empty disables compression
    pub compression: String,
    pub acks: String,
    pub linger_ms: u32,
    pub batch_size: u32,
    pub retries: u32,
    pub retry_backoff_ms: u32,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            brokers: "localhost:9092".to_string(),
            compression: "gzip".to_string(),
            acks: "all".to_string(),
            linger_ms: 10,
            batch_size: 16384,
            retries: 5,
            retry_backoff_ms: 1000,
        }
    }
}

impl BrokerConfig {
    /// Compression codec to configure, `None` when compression is disabled.
    pub fn compression_codec(&self) -> Option<&str> {
        let codec = self.compression.trim();
        if codec.is_empty() || codec.eq_ignore_ascii_case("none") {
            None
        } else {
            Some(codec)
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.brokers.split(',').all(|b| b.trim().is_empty()) {
            return Err(ConfigError::InvalidBroker(
                "at least one bootstrap server is required".into(),
            ));
        }
        if let Some(codec) = self.compression_codec() {
            if !matches!(codec, "gzip" | "snappy" | "lz4" | "zstd") {
                return Err(ConfigError::InvalidBroker(format!(
                    "unsupported compression codec '{codec}'"
                )));
            }
        }
        Ok(())
    }
}

// ============================================================================
// Top-level configuration
// ============================================================================

/// Longest accepted interval, jitter, floor or backoff.
pub const MAX_DELAY: Duration = Duration::from_secs(24 * 60 * 60);

fn default_milestones() -> Vec<u64> {
    vec![10, 50, 100, 500, 1000, 5000, 10000]
}

/// Complete simulator configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimulatorConfig {
    /// Site name from the built-in catalog
    pub site: String,

    /// RNG seed; a random seed is drawn when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,

    /// Sequence number of the first generated message
    pub start_sequence: u64,

    pub message_weights: MessageWeights,

    pub severity_weights: SeverityWeights,

    /// Mean inter-message interval; defaults to the site's message frequency
    #[serde(with = "serde_duration_opt", skip_serializing_if = "Option::is_none")]
    pub interval: Option<Duration>,

    /// Uniform jitter applied around the interval (± jitter)
    #[serde(with = "serde_duration")]
    pub jitter: Duration,

    /// Lower bound on any inter-message sleep
    #[serde(with = "serde_duration")]
    pub min_interval: Duration,

    /// Sleep after a failed publish instead of the regular interval
    #[serde(with = "serde_duration")]
    pub failure_backoff: Duration,

    /// Length of the tumbling throughput window
    #[serde(with = "serde_duration")]
    pub throughput_window: Duration,

    /// Message-count thresholds logged once each
    pub milestones: Vec<u64>,

    pub topics: TopicRoutes,

    /// Upper bound on a single publish round trip
    #[serde(with = "serde_duration")]
    pub publish_timeout: Duration,

    pub clearing: ClearingPolicy,

    /// Stop after this many publish attempts
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_messages: Option<u64>,

    pub broker: BrokerConfig,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            site: DEFAULT_SITE.to_string(),
            seed: None,
            start_sequence: 0,
            message_weights: MessageWeights::default(),
            severity_weights: SeverityWeights::default(),
            interval: None,
            jitter: Duration::from_millis(300),
            min_interval: Duration::from_millis(500),
            failure_backoff: Duration::from_secs(5),
            throughput_window: Duration::from_secs(10),
            milestones: default_milestones(),
            topics: TopicRoutes::default(),
            publish_timeout: Duration::from_secs(10),
            clearing: ClearingPolicy::default(),
            max_messages: None,
            broker: BrokerConfig::default(),
        }
    }
}

impl SimulatorConfig {
    /// Load configuration from a YAML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        // An empty document deserializes as unit, not as an empty mapping
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Resolved site profile (falls back to the default site).
    pub fn site_profile(&self) -> &'static SiteProfile {
        SiteProfile::resolve(&self.site)
    }

    /// Effective mean interval between messages.
    pub fn effective_interval(&self) -> Duration {
        self.interval
            .unwrap_or_else(|| self.site_profile().message_interval())
    }

    /// Validate the whole configuration. The simulation refuses to start on error.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let message_weights = self.message_weights.entries().map(|(_, w)| w);
        check_weights("message type", &message_weights)?;
        let severity_weights = self.severity_weights.entries().map(|(_, w)| w);
        check_weights("severity", &severity_weights)?;

        if self.throughput_window.is_zero() {
            return Err(ConfigError::InvalidDuration {
                field: "throughput_window",
                reason: "must be greater than zero".into(),
            });
        }
        if self.publish_timeout.is_zero() {
            return Err(ConfigError::InvalidDuration {
                field: "publish_timeout",
                reason: "must be greater than zero".into(),
            });
        }
        let delays = [
            ("interval", self.effective_interval()),
            ("jitter", self.jitter),
            ("min_interval", self.min_interval),
            ("failure_backoff", self.failure_backoff),
        ];
        if let Some((field, value)) = delays.into_iter().find(|(_, d)| *d > MAX_DELAY) {
            return Err(ConfigError::InvalidDuration {
                field,
                reason: format!(
                    "{} exceeds the maximum of {}",
                    format_duration(&value),
                    format_duration(&MAX_DELAY)
                ),
            });
        }

        if self.milestones.iter().any(|m| *m == 0) {
            return Err(ConfigError::InvalidMilestones(
                "thresholds must be positive".into(),
            ));
        }
        if self.milestones.windows(2).any(|pair| pair[0] >= pair[1]) {
            return Err(ConfigError::InvalidMilestones(
                "thresholds must be strictly ascending".into(),
            ));
        }

        self.topics.validate()?;
        self.clearing.validate()?;
        self.broker.validate()?;
        Ok(())
    }
}
