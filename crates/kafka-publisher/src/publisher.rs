//! Publisher adapter: routes, keys, encodes and sends one message at a time.

use crate::broker::BrokerClient;
use crate::encoder::{encode_message, message_key};
use crate::error::{BrokerError, PublishError};
use iccp_core::{SimulatedMessage, TopicRoutes};
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

/// Outcome of an acknowledged publish.
#[derive(Debug, Clone, PartialEq)]
pub struct PublishResult {
    pub topic: String,
    pub partition: i32,
    pub offset: i64,
    /// Time from submission to acknowledgment
    pub latency: Duration,
    pub success: bool,
}

impl PublishResult {
    pub fn latency_ms(&self) -> f64 {
        self.latency.as_secs_f64() * 1000.0
    }
}

/// Publishes simulated messages through a [`BrokerClient`].
///
/// The publisher never retries: a failed or timed-out send is reported to the
/// caller, who decides whether to back off.
pub struct Publisher<B: BrokerClient> {
    broker: B,
    routes: TopicRoutes,
    timeout: Duration,
}

impl<B: BrokerClient> Publisher<B> {
    /// Create a publisher with a routing table and a per-publish timeout.
    pub fn new(broker: B, routes: TopicRoutes, timeout: Duration) -> Self {
        Self {
            broker,
            routes,
            timeout,
        }
    }

    /// Publish a single message and wait for its acknowledgment.
    pub async fn publish(&self, message: &SimulatedMessage) -> Result<PublishResult, PublishError> {
        let topic = self.routes.route(message);
        let key = message_key(message);
        let payload = encode_message(message).map_err(|source| PublishError::Encode {
            sequence_number: message.sequence_number,
            source,
        })?;

        debug!(
            topic,
            key,
            sequence = message.sequence_number,
            bytes = payload.len(),
            "Publishing message"
        );

        let started = Instant::now();
        let sent = tokio::time::timeout(
            self.timeout,
            self.broker.send(topic, key, &payload, self.timeout),
        )
        .await;
        let latency = started.elapsed();

        match sent {
            Ok(Ok(delivery)) => Ok(PublishResult {
                topic: topic.to_string(),
                partition: delivery.partition,
                offset: delivery.offset,
                latency,
                success: true,
            }),
            Ok(Err(BrokerError::Timeout)) | Err(_) => Err(PublishError::Timeout {
                topic: topic.to_string(),
                timeout: self.timeout,
            }),
            Ok(Err(source)) => Err(PublishError::Broker {
                topic: topic.to_string(),
                source,
            }),
        }
    }

    /// Wait for every outstanding message to be delivered.
    pub async fn flush(&self, timeout: Duration) -> Result<(), PublishError> {
        self.broker.flush(timeout).await.map_err(PublishError::Flush)
    }
}
