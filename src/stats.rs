// src/stats.rs
//! Statistics tracking for certinfo

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// Thread-safe statistics collector
#[derive(Clone)]
pub struct StatsCollector {
    dispatched: Arc<AtomicU64>,
    succeeded: Arc<AtomicU64>,
    failed: Arc<AtomicU64>,
    discovered: Arc<AtomicU64>,
    rounds: Arc<AtomicU64>,
    start_time: Instant,
}

/// Snapshot of statistics at a point in time
#[derive(Debug, Clone)]
pub struct StatsSnapshot {
    pub dispatched: u64,
    pub succeeded: u64,
    pub failed: u64,
    pub discovered: u64,
    pub rounds: u64,
    pub handshakes_per_minute: f64,
    pub elapsed_secs: u64,
}

impl StatsCollector {
    pub fn new() -> Self {
        Self {
            dispatched: Arc::new(AtomicU64::new(0)),
            succeeded: Arc::new(AtomicU64::new(0)),
            failed: Arc::new(AtomicU64::new(0)),
            discovered: Arc::new(AtomicU64::new(0)),
            rounds: Arc::new(AtomicU64::new(0)),
            start_time: Instant::now(),
        }
    }

    /// A worker pulled a job off the queue
    pub fn increment_dispatched(&self) {
        self.dispatched.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_succeeded(&self) {
        self.succeeded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_failed(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    /// New hosts admitted to the next frontier through SAN harvesting
    pub fn add_discovered(&self, count: u64) {
        self.discovered.fetch_add(count, Ordering::Relaxed);
    }

    pub fn increment_rounds(&self) {
        self.rounds.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        let elapsed = self.start_time.elapsed();
        let succeeded = self.succeeded.load(Ordering::Relaxed);
        let failed = self.failed.load(Ordering::Relaxed);

        let rate = if elapsed.as_secs() > 0 {
            ((succeeded + failed) as f64 / elapsed.as_secs() as f64) * 60.0
        } else {
            0.0
        };

        StatsSnapshot {
            dispatched: self.dispatched.load(Ordering::Relaxed),
            succeeded,
            failed,
            discovered: self.discovered.load(Ordering::Relaxed),
            rounds: self.rounds.load(Ordering::Relaxed),
            handshakes_per_minute: rate,
            elapsed_secs: elapsed.as_secs(),
        }
    }

    /// Format statistics as a human-readable string
    pub fn format_stats(&self) -> String {
        let snapshot = self.snapshot();
        format!(
            "round {} | {} dispatched | {} ok | {} failed | {} discovered | {:.1} hs/min | elapsed: {}",
            snapshot.rounds,
            snapshot.dispatched,
            snapshot.succeeded,
            snapshot.failed,
            snapshot.discovered,
            snapshot.handshakes_per_minute,
            Self::format_elapsed(snapshot.elapsed_secs)
        )
    }

    pub fn format_elapsed(secs: u64) -> String {
        let hours = secs / 3600;
        let minutes = (secs % 3600) / 60;
        let seconds = secs % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}s", seconds)
        }
    }
}

impl Default for StatsCollector {
    fn default() -> Self {
        Self::new()
    }
}
