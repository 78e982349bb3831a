//! In-memory broker for dry runs and tests.
//!
//! Kafka-like semantics: a key always maps to the same partition and offsets
//! grow by one per topic partition. Only offsets and counters are kept unless
//! the broker is built with [`MemoryBroker::retaining`], so an unbounded dry
//! run stays small. Failures and acknowledgment delays can be injected.

use crate::broker::{BrokerClient, Delivery};
use crate::error::BrokerError;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

/// A record acknowledged by the in-memory broker.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredRecord {
    pub topic: String,
    pub key: String,
    pub payload: Vec<u8>,
    pub partition: i32,
    pub offset: i64,
}

#[derive(Default)]
struct Log {
    records: Vec<StoredRecord>,
    next_offsets: HashMap<(String, i32), i64>,
}

/// In-memory `BrokerClient`.
///
/// Cloning is cheap and clones share the same log, so a test can keep a
/// handle while the publisher owns another.
#[derive(Clone)]
pub struct MemoryBroker {
    partitions: i32,
    fail_every: Option<u64>,
    ack_delay: Duration,
    retain: bool,
    calls: Arc<AtomicU64>,
    acknowledged: Arc<AtomicU64>,
    flushes: Arc<AtomicU64>,
    log: Arc<Mutex<Log>>,
}

impl Default for MemoryBroker {
    fn default() -> Self {
        Self::new(3)
    }
}

impl MemoryBroker {
    /// Create a broker where every topic has `partitions` partitions.
    pub fn new(partitions: i32) -> Self {
        Self {
            partitions: partitions.max(1),
            fail_every: None,
            ack_delay: Duration::ZERO,
            retain: false,
            calls: Arc::new(AtomicU64::new(0)),
            acknowledged: Arc::new(AtomicU64::new(0)),
            flushes: Arc::new(AtomicU64::new(0)),
            log: Arc::new(Mutex::new(Log::default())),
        }
    }

    /// Reject every `n`-th send call (the 3rd, 6th, ... for `n = 3`).
    pub fn with_fail_every(mut self, n: u64) -> Self {
        self.fail_every = (n > 0).then_some(n);
        self
    }

    /// Delay every acknowledgment by `delay`.
    pub fn with_ack_delay(mut self, delay: Duration) -> Self {
        self.ack_delay = delay;
        self
    }

    /// Keep every acknowledged record so [`records`](Self::records) can return it.
    pub fn retaining(mut self) -> Self {
        self.retain = true;
        self
    }

    /// Number of send calls, successful or not.
    pub fn calls(&self) -> u64 {
        self.calls.load(Ordering::SeqCst)
    }

    /// Number of acknowledged sends.
    pub fn acknowledged(&self) -> u64 {
        self.acknowledged.load(Ordering::SeqCst)
    }

    /// Number of flush calls.
    pub fn flushes(&self) -> u64 {
        self.flushes.load(Ordering::SeqCst)
    }

    /// Acknowledged records in acknowledgment order. Always empty unless the
    /// broker is retaining.
    pub async fn records(&self) -> Vec<StoredRecord> {
        self.log.lock().await.records.clone()
    }

    /// Partition a key is routed to.
    pub fn partition_for(&self, key: &str) -> i32 {
        // FNV-1a, stable across runs
        let hash = key.bytes().fold(0x811c_9dc5_u32, |hash, byte| {
            (hash ^ u32::from(byte)).wrapping_mul(0x0100_0193)
        });
        (hash % self.partitions as u32) as i32
    }
}

#[async_trait]
impl BrokerClient for MemoryBroker {
    async fn send(
        &self,
        topic: &str,
        key: &str,
        payload: &[u8],
        _timeout: Duration,
    ) -> Result<Delivery, BrokerError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;

        if !self.ack_delay.is_zero() {
            tokio::time::sleep(self.ack_delay).await;
        }

        if let Some(n) = self.fail_every {
            if call % n == 0 {
                return Err(BrokerError::Rejected(format!(
                    "injected failure on call {call}"
                )));
            }
        }

        let partition = self.partition_for(key);
        let mut log = self.log.lock().await;
        let next = log
            .next_offsets
            .entry((topic.to_string(), partition))
            .or_insert(0);
        let offset = *next;
        *next += 1;

        if self.retain {
            log.records.push(StoredRecord {
                topic: topic.to_string(),
                key: key.to_string(),
                payload: payload.to_vec(),
                partition,
                offset,
            });
        }
        self.acknowledged.fetch_add(1, Ordering::SeqCst);

        Ok(Delivery { partition, offset })
    }

    async fn flush(&self, _timeout: Duration) -> Result<(), BrokerError> {
        self.flushes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
