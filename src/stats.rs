//! Run statistics: counters, tumbling-window throughput, milestones and the
//! uncleared-alarm registry.
//!
//! The tracker is owned by the simulation loop. Everyone else reads immutable
//! [`RunStatistics`] snapshots.

use iccp_core::{AlarmIdentity, Severity};
use kafka_publisher::PublishResult;
use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;
use tokio::time::Instant;

/// Immutable copy of the run statistics at one point in time.
#[derive(Debug, Clone, PartialEq)]
pub struct RunStatistics {
    pub total_sent: u64,
    pub total_failed: u64,
    /// Always `total_sent + total_failed`
    pub total_attempted: u64,
    pub window_start_time: Instant,
    pub window_count: u64,
    pub uptime_start: Instant,
    /// Uptime when the snapshot was taken
    pub uptime: Duration,
    pub milestones_hit: BTreeSet<u64>,
    /// Outstanding protection alarms, oldest first
    pub uncleared_alarms: BTreeMap<AlarmIdentity, Severity>,
    pub last_latency: Option<Duration>,
    pub max_latency: Option<Duration>,
}

impl RunStatistics {
    fn new(now: Instant) -> Self {
        Self {
            total_sent: 0,
            total_failed: 0,
            total_attempted: 0,
            window_start_time: now,
            window_count: 0,
            uptime_start: now,
            uptime: Duration::ZERO,
            milestones_hit: BTreeSet::new(),
            uncleared_alarms: BTreeMap::new(),
            last_latency: None,
            max_latency: None,
        }
    }

    /// Messages per second over the whole uptime.
    pub fn average_throughput(&self) -> f64 {
        let secs = self.uptime.as_secs_f64();
        if secs > 0.0 {
            self.total_sent as f64 / secs
        } else {
            0.0
        }
    }

    /// Uncleared alarms at HIGH or CRITICAL severity.
    pub fn uncleared_high_severity(&self) -> usize {
        self.uncleared_alarms
            .values()
            .filter(|severity| severity.is_alarming())
            .count()
    }
}

/// Throughput of one completed window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThroughputReport {
    /// Messages acknowledged during the window
    pub messages: u64,
    /// Actual window length (at least the configured window)
    pub elapsed: Duration,
    /// `messages / elapsed` in messages per second
    pub rate: f64,
}

/// Tracks counters and thresholds for one run.
pub struct StatsTracker {
    window: Duration,
    /// Ascending
    milestones: Vec<u64>,
    stats: RunStatistics,
    /// Set once the run is over; uptime stops here
    stopped_at: Option<Instant>,
}

impl StatsTracker {
    pub fn new(window: Duration, milestones: &[u64]) -> Self {
        let mut milestones = milestones.to_vec();
        milestones.sort_unstable();
        milestones.dedup();
        Self {
            window,
            milestones,
            stats: RunStatistics::new(Instant::now()),
            stopped_at: None,
        }
    }

    /// Zero every counter and restart uptime and the current window now.
    pub fn reset(&mut self) {
        self.stats = RunStatistics::new(Instant::now());
        self.stopped_at = None;
    }

    /// Stop the uptime clock. Later snapshots report the uptime at this instant.
    pub fn freeze(&mut self) {
        self.stopped_at.get_or_insert_with(Instant::now);
    }

    pub fn record_success(&mut self, result: &PublishResult) {
        self.stats.total_sent += 1;
        self.stats.total_attempted += 1;
        self.stats.window_count += 1;
        self.stats.last_latency = Some(result.latency);
        self.stats.max_latency = Some(
            self.stats
                .max_latency
                .map_or(result.latency, |max| max.max(result.latency)),
        );
    }

    pub fn record_failure(&mut self) {
        self.stats.total_failed += 1;
        self.stats.total_attempted += 1;
    }

    pub fn total_sent(&self) -> u64 {
        self.stats.total_sent
    }

    pub fn total_attempted(&self) -> u64 {
        self.stats.total_attempted
    }

    /// Close the current window if it has run for at least the configured
    /// length. The next window starts empty.
    pub fn check_window(&mut self) -> Option<ThroughputReport> {
        let now = Instant::now();
        let elapsed = now.duration_since(self.stats.window_start_time);
        if elapsed < self.window {
            return None;
        }

        let messages = self.stats.window_count;
        let rate = messages as f64 / elapsed.as_secs_f64();
        self.stats.window_count = 0;
        self.stats.window_start_time = now;

        Some(ThroughputReport {
            messages,
            elapsed,
            rate,
        })
    }

    /// Smallest milestone not yet fired that `total_sent` has reached.
    ///
    /// Each threshold fires once. When a jump crosses several thresholds,
    /// repeated calls return them one at a time in ascending order.
    pub fn check_milestone(&mut self, total_sent: u64) -> Option<u64> {
        let milestone = self
            .milestones
            .iter()
            .copied()
            .take_while(|m| *m <= total_sent)
            .find(|m| !self.stats.milestones_hit.contains(m))?;
        self.stats.milestones_hit.insert(milestone);
        Some(milestone)
    }

    /// Register a raised protection alarm.
    ///
    /// Returns true when a HIGH or CRITICAL alarm newly becomes uncleared, which
    /// is when a warning is due.
    pub fn note_alarm(&mut self, identity: AlarmIdentity, severity: Severity) -> bool {
        let newly_raised = self
            .stats
            .uncleared_alarms
            .insert(identity, severity)
            .is_none();
        newly_raised && severity.is_alarming()
    }

    /// Remove a cleared alarm. Clearing an unknown or already cleared alarm
    /// returns `None` and changes nothing.
    pub fn note_cleared(&mut self, identity: &AlarmIdentity) -> Option<Severity> {
        self.stats.uncleared_alarms.remove(identity)
    }

    /// Oldest outstanding alarm.
    pub fn oldest_uncleared(&self) -> Option<(&AlarmIdentity, Severity)> {
        self.stats
            .uncleared_alarms
            .iter()
            .next()
            .map(|(identity, severity)| (identity, *severity))
    }

    pub fn snapshot(&self) -> RunStatistics {
        let mut snapshot = self.stats.clone();
        let end = self.stopped_at.unwrap_or_else(Instant::now);
        snapshot.uptime = end.duration_since(snapshot.uptime_start);
        snapshot
    }
}
