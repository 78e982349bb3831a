//! Core types for the ICCP simulator.
//!
//! This crate provides the foundational types shared by every part of the
//! simulator:
//!
//! - [`SimulatedMessage`] - A synthetic telecontrol record (measurement or
//!   protection event) together with its envelope metadata
//! - [`AlarmIdentity`] - The customer/site/sequence triple identifying one
//!   logical protection alarm
//! - [`SiteProfile`] - Built-in catalog of simulated grid sites
//! - [`SimulatorConfig`] - Configuration loaded from YAML
//!
//! # Architecture
//!
//! ```text
//! iccp-core (this crate)
//!    │
//!    ├─── message-generator  (builds SimulatedMessage values)
//!    ├─── kafka-publisher    (routes and serializes SimulatedMessage values)
//!    └─── iccp-sim           (statistics, simulation loop, CLI)
//! ```
//!
//! # Example
//!
//! ```rust
//! use iccp_core::{MessageType, SimulatorConfig};
//!
//! let config = SimulatorConfig::from_yaml(r#"
//! site: huntly-power
//! seed: 7
//! message_weights:
//!   measurement: 0
//!   protection_event: 1
//! "#).unwrap();
//!
//! config.validate().unwrap();
//! assert_eq!(config.topics.topic_for(MessageType::ProtectionEvent), "iccp-protection-events");
//! ```

pub mod config;
pub mod duration;
pub mod message;
pub mod site;

// Re-exports for convenience
pub use config::{
    BrokerConfig, ClearingPolicy, ConfigError, MeasurementKindRoutes, MessageWeights,
    SeverityWeights, SimulatorConfig, TopicRoutes, MAX_DELAY,
};
pub use duration::parse_duration;
pub use message::{
    AlarmIdentity, EnvelopeMetadata, Location, MeasurementKind, MeasurementReading, MessageType,
    Payload, ProtectionDetail, ProtectionEventType, Quality, Severity, SimulatedMessage,
    PROTOCOL_VERSION,
};
pub use site::{SiteProfile, DEFAULT_SITE, SITES};
