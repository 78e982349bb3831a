//! State machine and error propagation.

use crate::helpers::steady_config;
use iccp_core::SimulatorConfig;
use iccp_sim::{LoopState, Simulation, SimulationError};
use kafka_publisher::MemoryBroker;
use message_generator::GeneratorError;
use tokio_util::sync::CancellationToken;

#[tokio::test(start_paused = true)]
async fn test_generator_error_is_fatal() {
    let config = SimulatorConfig {
        start_sequence: u64::MAX,
        ..steady_config()
    };
    let broker = MemoryBroker::default();
    let mut sim = Simulation::new(config, broker.clone()).unwrap();

    let result = sim.run(CancellationToken::new()).await;

    assert!(matches!(
        result,
        Err(SimulationError::Generator(GeneratorError::SequenceExhausted(u64::MAX)))
    ));
    assert_eq!(sim.state(), LoopState::Stopped);
    assert!(sim.summary().is_none());
    assert_eq!(broker.calls(), 1);
    assert_eq!(broker.flushes(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_stopped_simulation_rejects_further_work() {
    let config = SimulatorConfig {
        max_messages: Some(2),
        ..steady_config()
    };
    let mut sim = Simulation::new(config, MemoryBroker::default()).unwrap();
    let summary = sim.run(CancellationToken::new()).await.unwrap();
    assert_eq!(summary.total_attempted, 2);

    assert!(matches!(
        sim.step().await,
        Err(SimulationError::NotRunning(LoopState::Stopped))
    ));
    assert!(matches!(
        sim.run(CancellationToken::new()).await,
        Err(SimulationError::NotRunning(LoopState::Stopped))
    ));
    assert_eq!(sim.snapshot().total_attempted, 2);
}

#[tokio::test(start_paused = true)]
async fn test_zero_message_limit_stops_immediately() {
    let config = SimulatorConfig {
        max_messages: Some(0),
        ..steady_config()
    };
    let broker = MemoryBroker::default();
    let mut sim = Simulation::new(config, broker.clone()).unwrap();

    let summary = sim.run(CancellationToken::new()).await.unwrap();

    assert_eq!(summary.total_attempted, 0);
    assert_eq!(broker.calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_reporter_sees_consistent_snapshots() {
    let config = SimulatorConfig {
        max_messages: Some(6),
        ..steady_config()
    };
    let broker = MemoryBroker::default().with_fail_every(2);
    let mut sim = Simulation::new(config, broker).unwrap();
    let mut snapshots = sim.subscribe();

    let reporter = async move {
        let mut observed = 0;
        while snapshots.changed().await.is_ok() {
            let snapshot = snapshots.borrow_and_update().clone();
            assert_eq!(
                snapshot.total_attempted,
                snapshot.total_sent + snapshot.total_failed
            );
            observed += 1;
            if snapshot.total_attempted == 6 {
                break;
            }
        }
        observed
    };

    let (summary, observed) = tokio::join!(sim.run(CancellationToken::new()), reporter);
    let summary = summary.unwrap();

    assert_eq!(summary.total_sent, 3);
    assert_eq!(summary.total_failed, 3);
    assert!(observed >= 1);
}

#[tokio::test(start_paused = true)]
async fn test_invalid_config_never_starts() {
    let mut config = steady_config();
    config.milestones = vec![50, 10];

    assert!(matches!(
        Simulation::new(config, MemoryBroker::default()),
        Err(SimulationError::Config(_))
    ));
}
