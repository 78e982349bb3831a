//! Kafka publisher adapter for the ICCP simulator.
//!
//! This crate turns a [`SimulatedMessage`](iccp_core::SimulatedMessage) into a
//! keyed Kafka record and reports where it landed and how long the broker took
//! to acknowledge it.
//!
//! # Architecture
//!
//! ```text
//! SimulatedMessage
//!        │
//!        ▼
//! ┌──────────────────────┐
//! │      Publisher       │  topic  = routes[message_type / kind]
//! │                      │  key    = customer_id
//! │                      │  bytes  = JSON envelope
//! └──────────┬───────────┘
//!            │  BrokerClient::send(topic, key, bytes, timeout)
//!            ▼
//!   ┌────────────────┬────────────────┐
//!   │  KafkaBroker   │  MemoryBroker  │
//!   │  (rdkafka)     │  (dry run)     │
//!   └────────────────┴────────────────┘
//! ```
//!
//! # Example
//!
//! ```rust,no_run
//! use iccp_core::{BrokerConfig, SimulatorConfig};
//! use kafka_publisher::{KafkaBroker, Publisher};
//! use message_generator::MessageGenerator;
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = SimulatorConfig::default();
//! let broker = KafkaBroker::new(&config.broker, config.publish_timeout)?;
//! let publisher = Publisher::new(broker, config.topics.clone(), config.publish_timeout);
//!
//! let mut generator = MessageGenerator::new(&config, 42)?;
//! let message = generator.generate(None)?;
//! let result = publisher.publish(&message).await?;
//! println!("{} [{}] @ {}", result.topic, result.partition, result.offset);
//!
//! publisher.flush(Duration::from_secs(10)).await?;
//! # Ok(())
//! # }
//! ```

pub mod broker;
pub mod encoder;
pub mod error;
pub mod memory;
pub mod publisher;

pub use broker::{BrokerClient, Delivery, KafkaBroker};
pub use encoder::{encode_message, message_key};
pub use error::{BrokerError, PublishError};
pub use memory::{MemoryBroker, StoredRecord};
pub use publisher::{PublishResult, Publisher};
