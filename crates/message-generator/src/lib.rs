//! Synthetic message generator for the ICCP simulator.
//!
//! This crate provides the `MessageGenerator` which manufactures plausible
//! telecontrol records for a simulated grid site. The generator uses a seeded
//! RNG so that a run can be reproduced exactly from its seed and configuration.
//!
//! # Architecture
//!
//! ```text
//! SimulatorConfig + seed
//!        │
//!        ▼
//! ┌──────────────────────┐
//! │   MessageGenerator   │
//! │                      │
//! │  - site profile      │
//! │  - type weights      │
//! │  - severity weights  │
//! │  - rng (StdRng)      │
//! └──────────┬───────────┘
//!            │  generate(previous_sequence)
//!            ▼
//!   SimulatedMessage { type, customer, site, sequence, payload, .. }
//! ```
//!
//! # Example
//!
//! ```rust
//! use iccp_core::SimulatorConfig;
//! use message_generator::MessageGenerator;
//!
//! let config = SimulatorConfig::default();
//! let mut generator = MessageGenerator::new(&config, 42).unwrap();
//!
//! let first = generator.generate(None).unwrap();
//! let second = generator.generate(Some(first.sequence_number)).unwrap();
//! assert_eq!(first.sequence_number, 0);
//! assert_eq!(second.sequence_number, 1);
//! ```

pub mod generator;
pub mod generators;

// Re-exports for convenience
pub use generator::{GeneratorError, MessageGenerator};
