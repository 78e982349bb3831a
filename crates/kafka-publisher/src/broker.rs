//! Broker client seam and its Kafka implementation.

use crate::error::BrokerError;
use async_trait::async_trait;
use iccp_core::BrokerConfig;
use rdkafka::admin::{AdminClient, AdminOptions, NewTopic, TopicReplication};
use rdkafka::client::DefaultClientContext;
use rdkafka::error::KafkaError;
use rdkafka::producer::{FutureProducer, FutureRecord, Producer};
use rdkafka::types::RDKafkaErrorCode;
use rdkafka::ClientConfig;
use std::time::Duration;
use tracing::{debug, info};

/// Where the broker stored an acknowledged message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Delivery {
    pub partition: i32,
    pub offset: i64,
}

/// Minimal producer capability the publisher adapter needs.
///
/// Connection management, retries and batching all belong to the
/// implementation; callers only see acknowledged deliveries or errors.
#[async_trait]
pub trait BrokerClient: Send + Sync {
    /// Send one record and wait for its acknowledgment.
    async fn send(
        &self,
        topic: &str,
        key: &str,
        payload: &[u8],
        timeout: Duration,
    ) -> Result<Delivery, BrokerError>;

    /// Wait for all outstanding records to be delivered.
    async fn flush(&self, timeout: Duration) -> Result<(), BrokerError>;
}

/// Kafka broker client backed by an rdkafka `FutureProducer`.
pub struct KafkaBroker {
    producer: FutureProducer,
    brokers: String,
}

impl KafkaBroker {
    /// Create a producer from the broker settings.
    ///
    /// `delivery_timeout` bounds librdkafka's own retries for a message.
    pub fn new(config: &BrokerConfig, delivery_timeout: Duration) -> Result<Self, BrokerError> {
        let mut client_config = ClientConfig::new();
        client_config
            .set("bootstrap.servers", &config.brokers)
            .set("acks", &config.acks)
            .set("linger.ms", config.linger_ms.to_string())
            .set("batch.size", config.batch_size.to_string())
            .set("retries", config.retries.to_string())
            .set("retry.backoff.ms", config.retry_backoff_ms.to_string())
            .set(
                "message.timeout.ms",
                delivery_timeout.as_millis().max(1).to_string(),
            );
        if let Some(codec) = config.compression_codec() {
            client_config.set("compression.type", codec);
        }
        info!(
            brokers = %config.brokers,
            compression = config.compression_codec().unwrap_or("none"),
            acks = %config.acks,
            "Creating Kafka producer"
        );

        let producer: FutureProducer = client_config.create()?;

        Ok(Self {
            producer,
            brokers: config.brokers.clone(),
        })
    }

    /// Create Kafka topics that do not exist yet.
    pub async fn create_topics_if_not_exist(
        &self,
        topics: &[&str],
        partitions: i32,
    ) -> Result<(), BrokerError> {
        let admin_client: AdminClient<DefaultClientContext> = ClientConfig::new()
            .set("bootstrap.servers", &self.brokers)
            .create()?;

        let new_topics: Vec<NewTopic> = topics
            .iter()
            .map(|topic| NewTopic::new(topic, partitions, TopicReplication::Fixed(1)))
            .collect();
        let opts = AdminOptions::new().operation_timeout(Some(Duration::from_secs(10)));

        let results = admin_client
            .create_topics(&new_topics, &opts)
            .await
            .map_err(|e| BrokerError::TopicCreation(format!("Failed to create topics: {e}")))?;

        for result in results {
            match result {
                Ok(topic_name) => {
                    info!("Topic '{topic_name}' created successfully");
                }
                Err((topic_name, code)) if code == RDKafkaErrorCode::TopicAlreadyExists => {
                    info!("Topic '{topic_name}' already exists");
                }
                Err((topic_name, code)) => {
                    return Err(BrokerError::TopicCreation(format!(
                        "Failed to create topic {topic_name}: {code}"
                    )));
                }
            }
        }

        Ok(())
    }
}

fn classify(err: KafkaError) -> BrokerError {
    match err.rdkafka_error_code() {
        Some(RDKafkaErrorCode::MessageTimedOut) => BrokerError::Timeout,
        _ => BrokerError::Kafka(err),
    }
}

#[async_trait]
impl BrokerClient for KafkaBroker {
    async fn send(
        &self,
        topic: &str,
        key: &str,
        payload: &[u8],
        timeout: Duration,
    ) -> Result<Delivery, BrokerError> {
        let record = FutureRecord::to(topic).key(key).payload(payload);

        let (partition, offset) = self
            .producer
            .send(record, timeout)
            .await
            .map_err(|(err, _)| classify(err))?;

        Ok(Delivery { partition, offset })
    }

    async fn flush(&self, timeout: Duration) -> Result<(), BrokerError> {
        let producer = self.producer.clone();
        debug!("Flushing Kafka producer");
        // librdkafka's flush blocks the calling thread
        tokio::task::spawn_blocking(move || producer.flush(timeout))
            .await
            .map_err(|e| BrokerError::Rejected(format!("flush task failed: {e}")))?
            .map_err(classify)
    }
}
