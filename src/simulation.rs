//! Simulation loop.
//!
//! One iteration generates a single message, publishes it, records the outcome
//! and then sleeps until the next tick:
//!
//! ```text
//!          start()             stop / cancel / max_messages
//!   Init ───────────▶ Running ─────────────────────────────▶ Draining ──▶ Stopped
//!                      │   ▲                                   (flush)
//!                      └───┘  step(): [clear | generate] → publish → record
//!                                  → alarms → window → milestones → sleep
//! ```
//!
//! A generator error is fatal and moves the loop straight to `Stopped`
//! without a summary. Publish errors are counted and the loop carries on.

use crate::stats::{RunStatistics, StatsTracker};
use iccp_core::{
    AlarmIdentity, ClearingPolicy, ConfigError, Severity, SimulatedMessage, SimulatorConfig,
};
use kafka_publisher::{BrokerClient, PublishError, PublishResult, Publisher};
use message_generator::{GeneratorError, MessageGenerator};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::fmt;
use std::time::Duration;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Salt for the loop RNG seed (jitter and clearing draws), derived from the run seed.
const LOOP_RNG_SALT: u64 = 0x5eed_1cc9;

/// Lifecycle of a simulation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Init,
    Running,
    Draining,
    Stopped,
}

impl fmt::Display for LoopState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LoopState::Init => "init",
            LoopState::Running => "running",
            LoopState::Draining => "draining",
            LoopState::Stopped => "stopped",
        };
        f.write_str(name)
    }
}

/// Error type for the simulation loop.
#[derive(Debug, thiserror::Error)]
pub enum SimulationError {
    /// The configuration failed validation
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    /// The generator could not produce a message; the run is over
    #[error("Message generation failed: {0}")]
    Generator(#[from] GeneratorError),

    /// `step` or `stop` was called outside the running state
    #[error("Simulation is not running (state: {0})")]
    NotRunning(LoopState),

    /// `start` was called twice
    #[error("Simulation already started (state: {0})")]
    AlreadyStarted(LoopState),
}

/// Final statistics of a run that stopped cleanly.
#[derive(Debug, Clone, PartialEq)]
pub struct ShutdownSummary {
    pub total_sent: u64,
    pub total_failed: u64,
    pub total_attempted: u64,
    /// Messages per second over the whole uptime
    pub average_throughput: f64,
    pub uptime: Duration,
    /// Protection alarms still outstanding at shutdown
    pub uncleared_alarms: usize,
}

impl ShutdownSummary {
    fn from_stats(stats: &RunStatistics) -> Self {
        Self {
            total_sent: stats.total_sent,
            total_failed: stats.total_failed,
            total_attempted: stats.total_attempted,
            average_throughput: stats.average_throughput(),
            uptime: stats.uptime,
            uncleared_alarms: stats.uncleared_alarms.len(),
        }
    }
}

/// Result of one loop iteration.
#[derive(Debug)]
pub enum Iteration {
    Sent {
        sequence_number: u64,
        clearing: bool,
        result: PublishResult,
    },
    Failed {
        sequence_number: u64,
        clearing: bool,
        error: PublishError,
    },
}

impl Iteration {
    pub fn sequence_number(&self) -> u64 {
        match self {
            Iteration::Sent {
                sequence_number, ..
            }
            | Iteration::Failed {
                sequence_number, ..
            } => *sequence_number,
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Iteration::Failed { .. })
    }
}

/// The generate → publish → record → sleep loop for one simulated site.
pub struct Simulation<B: BrokerClient> {
    config: SimulatorConfig,
    generator: MessageGenerator,
    publisher: Publisher<B>,
    stats: StatsTracker,
    state: LoopState,
    /// Sequence number of the last generated message
    last_sequence: Option<u64>,
    interval: Duration,
    /// Jitter and clearing decisions
    rng: StdRng,
    snapshots: watch::Sender<RunStatistics>,
    summary: Option<ShutdownSummary>,
}

impl<B: BrokerClient> Simulation<B> {
    /// Build a simulation over `broker`. The configuration is validated first.
    pub fn new(config: SimulatorConfig, broker: B) -> Result<Self, SimulationError> {
        config.validate()?;

        let seed = config.seed.unwrap_or_else(rand::random);
        let generator = MessageGenerator::new(&config, seed)?;
        let publisher = Publisher::new(broker, config.topics.clone(), config.publish_timeout);
        let stats = StatsTracker::new(config.throughput_window, &config.milestones);
        let (snapshots, _) = watch::channel(stats.snapshot());

        Ok(Self {
            interval: config.effective_interval(),
            rng: StdRng::seed_from_u64(seed ^ LOOP_RNG_SALT),
            config,
            generator,
            publisher,
            stats,
            state: LoopState::Init,
            last_sequence: None,
            snapshots,
            summary: None,
        })
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn seed(&self) -> u64 {
        self.generator.seed()
    }

    /// Current statistics.
    pub fn snapshot(&self) -> RunStatistics {
        self.stats.snapshot()
    }

    /// Receiver that sees a fresh snapshot after every iteration.
    pub fn subscribe(&self) -> watch::Receiver<RunStatistics> {
        self.snapshots.subscribe()
    }

    /// Summary of a cleanly stopped run.
    pub fn summary(&self) -> Option<&ShutdownSummary> {
        self.summary.as_ref()
    }

    /// Reset statistics, start the uptime clock and enter `Running`.
    pub fn start(&mut self) -> Result<(), SimulationError> {
        if self.state != LoopState::Init {
            return Err(SimulationError::AlreadyStarted(self.state));
        }

        self.stats.reset();
        self.last_sequence = None;
        self.state = LoopState::Running;

        let site = self.generator.site();
        info!(
            site = site.name,
            site_id = site.site_id,
            display_name = site.display_name,
            brokers = %self.config.broker.brokers,
            interval_ms = self.interval.as_millis() as u64,
            jitter_ms = self.config.jitter.as_millis() as u64,
            seed = self.generator.seed(),
            "Starting ICCP simulation"
        );
        self.publish_snapshot();
        Ok(())
    }

    /// Run one iteration without sleeping.
    pub async fn step(&mut self) -> Result<Iteration, SimulationError> {
        if self.state != LoopState::Running {
            return Err(SimulationError::NotRunning(self.state));
        }

        let generated = match self.clearing_candidate() {
            Some((identity, severity)) => {
                self.generator
                    .generate_clearing(self.last_sequence, &identity, severity)
            }
            None => self.generator.generate(self.last_sequence),
        };
        let message = match generated {
            Ok(message) => message,
            Err(e) => {
                error!(error = %e, "Message generation failed, stopping simulation");
                self.state = LoopState::Stopped;
                self.stats.freeze();
                return Err(e.into());
            }
        };
        self.last_sequence = Some(message.sequence_number);

        debug!(
            sequence = message.sequence_number,
            message_type = %message.message_type,
            customer = %message.customer_id,
            association = %message.iccp_association,
            severity = message.severity.map(|s| s.as_str()),
            cleared = message.cleared,
            "Generated message"
        );

        let iteration = match self.publisher.publish(&message).await {
            Ok(result) => {
                self.stats.record_success(&result);
                info!(
                    topic = %result.topic,
                    partition = result.partition,
                    offset = result.offset,
                    latency_ms = result.latency_ms(),
                    sequence = message.sequence_number,
                    message_type = %message.message_type,
                    "Message published"
                );
                self.track_alarm(&message);
                Iteration::Sent {
                    sequence_number: message.sequence_number,
                    clearing: message.is_clearing(),
                    result,
                }
            }
            Err(err) => {
                self.stats.record_failure();
                error!(
                    customer = %message.customer_id,
                    site = %message.site_id,
                    sequence = message.sequence_number,
                    error = %err,
                    "Failed to publish message"
                );
                Iteration::Failed {
                    sequence_number: message.sequence_number,
                    clearing: message.is_clearing(),
                    error: err,
                }
            }
        };

        if let Some(report) = self.stats.check_window() {
            info!(
                messages = report.messages,
                window_secs = report.elapsed.as_secs_f64(),
                rate = report.rate,
                "Throughput"
            );
        }
        let total_sent = self.stats.total_sent();
        while let Some(milestone) = self.stats.check_milestone(total_sent) {
            info!(milestone, total_sent, "Milestone reached");
        }

        self.publish_snapshot();
        Ok(iteration)
    }

    /// Drive the loop until `shutdown` is cancelled or `max_messages` attempts
    /// were made, then drain and return the summary.
    pub async fn run(
        &mut self,
        shutdown: CancellationToken,
    ) -> Result<ShutdownSummary, SimulationError> {
        if self.state == LoopState::Init {
            self.start()?;
        }

        while !shutdown.is_cancelled() && !self.limit_reached() {
            let iteration = self.step().await?;
            if self.limit_reached() {
                break;
            }

            let delay = self.next_delay(iteration.is_failure());
            if iteration.is_failure() {
                warn!(backoff_ms = delay.as_millis() as u64, "Backing off after failed publish");
            }

            tokio::select! {
                _ = shutdown.cancelled() => {
                    info!("Stop requested, not starting another iteration");
                    break;
                }
                _ = tokio::time::sleep(delay) => {}
            }
        }

        self.stop().await
    }

    /// Drain the publisher and stop. The in-flight publish has already
    /// completed because iterations are awaited to the end.
    pub async fn stop(&mut self) -> Result<ShutdownSummary, SimulationError> {
        if self.state != LoopState::Running {
            return Err(SimulationError::NotRunning(self.state));
        }

        self.state = LoopState::Draining;
        if self.limit_reached() {
            info!(
                max_messages = self.config.max_messages,
                "Message limit reached"
            );
        }
        info!("Draining: flushing pending messages");
        if let Err(e) = self.publisher.flush(self.config.publish_timeout).await {
            warn!(error = %e, "Flush did not complete cleanly");
        }

        self.state = LoopState::Stopped;
        self.stats.freeze();
        let stats = self.stats.snapshot();
        let summary = ShutdownSummary::from_stats(&stats);
        info!(
            total_sent = summary.total_sent,
            total_failed = summary.total_failed,
            average_throughput = summary.average_throughput,
            uptime_secs = summary.uptime.as_secs_f64(),
            uncleared_alarms = summary.uncleared_alarms,
            "Simulation stopped"
        );
        self.snapshots.send_replace(stats);
        self.summary = Some(summary.clone());
        Ok(summary)
    }

    /// Sleep before the next iteration: `interval ± jitter` floored at
    /// `min_interval`, or `failure_backoff` after a failed publish.
    pub fn next_delay(&mut self, last_failed: bool) -> Duration {
        if last_failed {
            return self.config.failure_backoff;
        }

        let jitter = self.config.jitter;
        let delay = if jitter.is_zero() {
            self.interval
        } else {
            // uniform in [interval - jitter, interval + jitter], saturating at both ends
            let offset = self.rng.gen_range(Duration::ZERO..=jitter.saturating_mul(2));
            self.interval.saturating_add(offset).saturating_sub(jitter)
        };
        delay.max(self.config.min_interval)
    }

    fn limit_reached(&self) -> bool {
        self.config
            .max_messages
            .is_some_and(|max| self.stats.total_attempted() >= max)
    }

    /// Oldest outstanding alarm, when the clearing policy says to clear it now.
    fn clearing_candidate(&mut self) -> Option<(AlarmIdentity, Severity)> {
        let (identity, severity) = self
            .stats
            .oldest_uncleared()
            .map(|(identity, severity)| (identity.clone(), severity))?;

        let due = match &self.config.clearing {
            ClearingPolicy::Never => false,
            ClearingPolicy::AfterMessages { messages } => self
                .last_sequence
                .is_some_and(|last| last.saturating_sub(identity.sequence_number) >= *messages),
            ClearingPolicy::Random { probability } => self.rng.gen_bool(*probability),
        };
        due.then_some((identity, severity))
    }

    /// Alarm bookkeeping for an acknowledged message.
    fn track_alarm(&mut self, message: &SimulatedMessage) {
        let (Some(identity), Some(severity)) = (message.alarm_identity(), message.severity) else {
            return;
        };

        if message.is_clearing() {
            if let Some(severity) = self.stats.note_cleared(&identity) {
                info!(alarm = %identity, severity = %severity, "Protection alarm cleared");
            }
        } else if self.stats.note_alarm(identity.clone(), severity) {
            warn!(
                alarm = %identity,
                severity = %severity,
                customer = %message.customer_id,
                "Uncleared {severity} protection alarm"
            );
        }
    }

    fn publish_snapshot(&self) {
        self.snapshots.send_replace(self.stats.snapshot());
    }
}
