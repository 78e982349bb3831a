//! End-to-end scenarios through `Simulation::run` and `Simulation::step`.

use crate::helpers::{critical_config, sequence_numbers, steady_config, WarnCounter};
use iccp_core::SimulatorConfig;
use iccp_sim::{LoopState, Simulation};
use kafka_publisher::MemoryBroker;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

#[tokio::test(start_paused = true)]
async fn test_critical_alarms_warn_once_each() {
    let warnings = WarnCounter::default();
    let _guard = warnings.install();

    let config = SimulatorConfig {
        max_messages: Some(5),
        ..critical_config()
    };
    let broker = MemoryBroker::default().retaining();
    let mut sim = Simulation::new(config, broker.clone()).unwrap();

    let summary = sim.run(CancellationToken::new()).await.unwrap();

    assert_eq!(summary.total_sent, 5);
    assert_eq!(summary.total_failed, 0);
    assert_eq!(summary.uncleared_alarms, 5);
    assert_eq!(warnings.count(), 5);
    assert_eq!(broker.records().await.len(), 5);

    let snapshot = sim.snapshot();
    assert_eq!(snapshot.uncleared_high_severity(), 5);
    assert!(!snapshot.milestones_hit.contains(&10));
}

#[tokio::test(start_paused = true)]
async fn test_failures_are_counted_and_loop_keeps_running() {
    let broker = MemoryBroker::default().with_fail_every(3);
    let mut sim = Simulation::new(steady_config(), broker.clone()).unwrap();
    sim.start().unwrap();

    let mut failed_at = Vec::new();
    for _ in 0..9 {
        let iteration = sim.step().await.unwrap();
        if iteration.is_failure() {
            failed_at.push(iteration.sequence_number());
        }
    }

    let snapshot = sim.snapshot();
    assert_eq!(snapshot.total_sent, 6);
    assert_eq!(snapshot.total_failed, 3);
    assert_eq!(snapshot.total_attempted, 9);
    assert_eq!(failed_at, vec![2, 5, 8]);
    assert_eq!(sim.state(), LoopState::Running);
}

#[tokio::test(start_paused = true)]
async fn test_stop_during_sleep_drains_without_new_iteration() {
    let broker = MemoryBroker::default();
    let mut sim = Simulation::new(steady_config(), broker.clone()).unwrap();
    let shutdown = CancellationToken::new();

    let stopper = shutdown.clone();
    let (summary, _) = tokio::join!(sim.run(shutdown), async move {
        // First message goes out at t=0, the next one is due at t=1s
        tokio::time::sleep(Duration::from_millis(400)).await;
        stopper.cancel();
    });
    let summary = summary.unwrap();

    assert_eq!(sim.state(), LoopState::Stopped);
    assert_eq!(broker.calls(), 1);
    assert_eq!(broker.flushes(), 1);
    assert_eq!(summary.total_sent, 1);
    assert_eq!(summary.uptime, Duration::from_millis(400));
    assert_eq!(sim.summary(), Some(&summary));
}

#[tokio::test(start_paused = true)]
async fn test_cancelled_before_start_publishes_nothing() {
    let broker = MemoryBroker::default();
    let mut sim = Simulation::new(steady_config(), broker.clone()).unwrap();
    let shutdown = CancellationToken::new();
    shutdown.cancel();

    let summary = sim.run(shutdown).await.unwrap();

    assert_eq!(summary.total_attempted, 0);
    assert_eq!(broker.calls(), 0);
    assert_eq!(sim.state(), LoopState::Stopped);
}

#[tokio::test(start_paused = true)]
async fn test_sequence_numbers_are_contiguous() {
    let config = SimulatorConfig {
        start_sequence: 500,
        max_messages: Some(40),
        ..steady_config()
    };
    let broker = MemoryBroker::default().retaining();
    let mut sim = Simulation::new(config, broker.clone()).unwrap();

    sim.run(CancellationToken::new()).await.unwrap();

    let sequences = sequence_numbers(&broker.records().await);
    assert_eq!(sequences, (500..540).collect::<Vec<u64>>());
}

#[tokio::test(start_paused = true)]
async fn test_summary_matches_acknowledgments() {
    let config = SimulatorConfig {
        max_messages: Some(12),
        ..steady_config()
    };
    let broker = MemoryBroker::default().with_fail_every(4);
    let mut sim = Simulation::new(config, broker.clone()).unwrap();

    let summary = sim.run(CancellationToken::new()).await.unwrap();

    assert_eq!(summary.total_sent, broker.acknowledged());
    assert!(broker.records().await.is_empty());
    assert_eq!(summary.total_sent, 9);
    assert_eq!(summary.total_failed, 3);
    assert_eq!(summary.total_attempted, 12);
}

#[tokio::test(start_paused = true)]
async fn test_failure_backoff_replaces_interval() {
    let config = SimulatorConfig {
        max_messages: Some(3),
        failure_backoff: Duration::from_secs(5),
        ..steady_config()
    };
    // Second call fails: t=0 ok, t=1 fails, t=6 ok
    let broker = MemoryBroker::default().with_fail_every(2);
    let mut sim = Simulation::new(config, broker.clone()).unwrap();

    let summary = sim.run(CancellationToken::new()).await.unwrap();

    assert_eq!(summary.total_sent, 2);
    assert_eq!(summary.total_failed, 1);
    assert_eq!(summary.uptime, Duration::from_secs(6));
}

#[tokio::test(start_paused = true)]
async fn test_throughput_windows_do_not_carry_over() {
    let config = SimulatorConfig {
        throughput_window: Duration::from_secs(5),
        max_messages: Some(12),
        ..steady_config()
    };
    let mut sim = Simulation::new(config, MemoryBroker::default()).unwrap();

    sim.run(CancellationToken::new()).await.unwrap();

    // Messages at t=0..=11; windows close at t=5 (6 messages) and t=10 (5)
    let snapshot = sim.snapshot();
    assert_eq!(snapshot.window_count, 1);
    assert_eq!(snapshot.total_sent, 12);
    assert!(snapshot.milestones_hit.contains(&10));
    assert!(!snapshot.milestones_hit.contains(&50));
}

#[tokio::test(start_paused = true)]
async fn test_milestones_observed_in_ascending_order() {
    let config = SimulatorConfig {
        milestones: vec![2, 4, 6],
        max_messages: Some(7),
        ..steady_config()
    };
    let mut sim = Simulation::new(config, MemoryBroker::default()).unwrap();
    sim.start().unwrap();
    let mut snapshots = sim.subscribe();

    let mut seen: Vec<u64> = Vec::new();
    for _ in 0..7 {
        sim.step().await.unwrap();
        for milestone in &snapshots.borrow_and_update().milestones_hit {
            if !seen.contains(milestone) {
                seen.push(*milestone);
            }
        }
    }

    assert_eq!(seen, vec![2, 4, 6]);
}

#[tokio::test(start_paused = true)]
async fn test_same_seed_same_stream() {
    async fn keys_for_seed(seed: u64) -> Vec<(String, String)> {
        let config = SimulatorConfig {
            seed: Some(seed),
            max_messages: Some(30),
            ..steady_config()
        };
        let broker = MemoryBroker::default().retaining();
        let mut sim = Simulation::new(config, broker.clone()).unwrap();
        sim.run(CancellationToken::new()).await.unwrap();
        broker
            .records()
            .await
            .into_iter()
            .map(|record| (record.topic, record.key))
            .collect()
    }

    assert_eq!(keys_for_seed(3).await, keys_for_seed(3).await);
}
