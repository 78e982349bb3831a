//! Error types for the publisher adapter.

use std::time::Duration;
use thiserror::Error;

/// Errors reported by a broker client.
#[derive(Error, Debug)]
pub enum BrokerError {
    #[error("Kafka error: {0}")]
    Kafka(#[from] rdkafka::error::KafkaError),

    #[error("Delivery timed out")]
    Timeout,

    #[error("Broker rejected message: {0}")]
    Rejected(String),

    #[error("Topic creation error: {0}")]
    TopicCreation(String),
}

/// Errors that can occur while publishing a single message.
///
/// All variants are recoverable from the simulation loop's point of view:
/// the message is dropped, counted as failed, and the loop continues.
#[derive(Error, Debug)]
pub enum PublishError {
    #[error("Failed to encode message #{sequence_number}: {source}")]
    Encode {
        sequence_number: u64,
        #[source]
        source: serde_json::Error,
    },

    #[error("Publish to '{topic}' timed out after {timeout:?}")]
    Timeout { topic: String, timeout: Duration },

    #[error("Publish to '{topic}' failed: {source}")]
    Broker {
        topic: String,
        #[source]
        source: BrokerError,
    },

    #[error("Flush failed: {0}")]
    Flush(#[source] BrokerError),
}

impl PublishError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, PublishError::Timeout { .. })
    }
}
