//! ICCP Simulator Library
//!
//! Simulates a utility telecontrol (ICCP-like) data source that periodically
//! publishes synthetic measurements and protection events to Kafka, for
//! exercising downstream log and trace pipelines with realistic but fake
//! telemetry.
//!
//! # Features
//!
//! - Seeded message generation: identical seed and config give an identical stream
//! - Publishing keyed by customer, routed by message type
//! - Tumbling-window throughput, milestones and an uncleared-alarm registry
//! - Interruptible loop with a drain-and-flush shutdown
//!
//! # Crates
//!
//! - `iccp_core` - message model, site catalog and configuration
//! - `message_generator` - synthetic message generation
//! - `kafka_publisher` - broker client seam, Kafka client and publisher adapter
//!
//! # CLI Usage
//!
//! ```bash
//! # Publish to a local Kafka until Ctrl+C
//! iccp-sim --brokers localhost:9092 --site huntly-power
//!
//! # Reproducible dry run of 100 messages, JSON logs
//! iccp-sim --dry-run --seed 42 --count 100 --log-format json
//! ```

pub mod cli;
pub mod simulation;
pub mod stats;

pub use cli::{Cli, LogFormat};
pub use simulation::{Iteration, LoopState, ShutdownSummary, Simulation, SimulationError};
pub use stats::{RunStatistics, StatsTracker, ThroughputReport};
