//! Shared fixtures for simulation tests.

use iccp_core::{
    ClearingPolicy, MessageWeights, Severity, SeverityWeights, SimulatorConfig,
};
use kafka_publisher::StoredRecord;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};

/// Fixed-cadence configuration: one message per second, no jitter.
pub fn steady_config() -> SimulatorConfig {
    SimulatorConfig {
        seed: Some(42),
        interval: Some(Duration::from_secs(1)),
        jitter: Duration::ZERO,
        min_interval: Duration::from_millis(500),
        ..SimulatorConfig::default()
    }
}

/// Every message is an uncleared CRITICAL protection event.
pub fn critical_config() -> SimulatorConfig {
    SimulatorConfig {
        message_weights: MessageWeights {
            measurement: 0.0,
            protection_event: 1.0,
        },
        severity_weights: SeverityWeights::only(Severity::Critical),
        clearing: ClearingPolicy::Never,
        ..steady_config()
    }
}

/// Sequence numbers of acknowledged records, in acknowledgment order.
pub fn sequence_numbers(records: &[StoredRecord]) -> Vec<u64> {
    records
        .iter()
        .map(|record| {
            let value: serde_json::Value = serde_json::from_slice(&record.payload).unwrap();
            value["sequence_number"].as_u64().unwrap()
        })
        .collect()
}

/// Counts WARN events emitted while installed.
#[derive(Clone, Default)]
pub struct WarnCounter(Arc<AtomicUsize>);

impl WarnCounter {
    pub fn count(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }

    /// Install as the thread's default subscriber until the guard drops.
    pub fn install(&self) -> tracing::subscriber::DefaultGuard {
        let subscriber = tracing_subscriber::registry().with(self.clone());
        tracing::subscriber::set_default(subscriber)
    }
}

impl<S: Subscriber> Layer<S> for WarnCounter {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        if *event.metadata().level() == Level::WARN {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }
}
