// src/coordinator.rs
//! Round-based frontier expansion
//!
//! Each round runs a fresh [`WorkerPool`] over the current frontier. Records
//! stream to the result sink as they arrive; in recursive mode their SAN
//! entries are pushed through the [`DedupStore`] and the hosts that were
//! admitted form the next frontier. The run ends when a frontier is empty.

use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, trace, warn};

use crate::config::RunConfig;
use crate::dedupe::DedupStore;
use crate::fetcher::CertFetcher;
use crate::pool::{WorkerContext, WorkerPool};
use crate::progress::ProgressIndicator;
use crate::scope::ScopeFilter;
use crate::stats::StatsCollector;
use crate::target::canonicalize;
use crate::types::CertificateRecord;

/// What a finished run did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Rounds started (a round with an empty frontier is never started)
    pub rounds: usize,
    /// Jobs handed to worker pools across all rounds
    pub dispatched: usize,
    /// Records produced by successful fetches
    pub records: usize,
    /// Hosts admitted to a later frontier through SAN harvesting
    pub discovered: usize,
    /// The run stopped early on shutdown
    pub interrupted: bool,
}

struct RoundOutcome {
    fed: usize,
    records: usize,
    next: Vec<String>,
}

/// Drives the run from seeding to the empty frontier
pub struct RoundCoordinator {
    config: RunConfig,
    fetcher: Arc<dyn CertFetcher>,
    dedupe: DedupStore,
    stats: StatsCollector,
    progress: ProgressIndicator,
    scope: Option<ScopeFilter>,
    shutdown: watch::Receiver<bool>,
}

impl RoundCoordinator {
    pub fn new(config: RunConfig, fetcher: Arc<dyn CertFetcher>) -> Self {
        let (_, shutdown) = watch::channel(false);

        Self {
            config,
            fetcher,
            dedupe: DedupStore::new(),
            stats: StatsCollector::new(),
            progress: ProgressIndicator::disabled(),
            scope: None,
            shutdown,
        }
    }

    pub fn with_stats(mut self, stats: StatsCollector) -> Self {
        self.stats = stats;
        self
    }

    pub fn with_progress(mut self, progress: ProgressIndicator) -> Self {
        self.progress = progress;
        self
    }

    /// Stop between jobs and at the next round boundary once `true` is sent
    pub fn with_shutdown(mut self, shutdown: watch::Receiver<bool>) -> Self {
        self.shutdown = shutdown;
        self
    }

    /// Ignore SAN-discovered hosts outside the given root domains
    pub fn with_scope(mut self, scope: ScopeFilter) -> Self {
        self.scope = Some(scope);
        self
    }

    pub fn with_dedup_store(mut self, dedupe: DedupStore) -> Self {
        self.dedupe = dedupe;
        self
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Run every round and close `results` when done
    pub async fn run(
        self,
        seeds: Vec<String>,
        results: mpsc::Sender<CertificateRecord>,
    ) -> RunSummary {
        let mut summary = RunSummary::default();
        let mut frontier = self.seed(seeds).await;

        info!(
            "Starting run: {} seed hosts, concurrency {}, timeout {:?}, recursive {}",
            frontier.len(),
            self.config.concurrency,
            self.config.timeout,
            self.config.recursive
        );

        while !frontier.is_empty() {
            if *self.shutdown.borrow() {
                warn!(
                    "Shutdown requested, abandoning {} queued hosts",
                    frontier.len()
                );
                summary.interrupted = true;
                break;
            }

            let round = summary.rounds;
            summary.rounds += 1;
            self.stats.increment_rounds();
            self.progress.round_started(round, frontier.len());
            info!("Round {}: probing {} hosts", round, frontier.len());

            let outcome = self.run_round(frontier, &results).await;

            summary.dispatched += outcome.fed;
            summary.records += outcome.records;
            summary.discovered += outcome.next.len();

            info!(
                "Round {} complete: {} records, {} new hosts",
                round,
                outcome.records,
                outcome.next.len()
            );

            if !self.config.recursive {
                break;
            }
            frontier = outcome.next;
        }

        if *self.shutdown.borrow() {
            summary.interrupted = true;
        }

        info!(
            "Run finished after {} rounds: {} records from {} jobs",
            summary.rounds, summary.records, summary.dispatched
        );

        // dropping the sender closes the result stream
        drop(results);
        summary
    }

    /// Build round 0
    ///
    /// In recursive mode seeds are registered in the store so they are never
    /// rediscovered, and duplicate seeds are probed once. Single-pass mode
    /// dispatches the input as given.
    async fn seed(&self, seeds: Vec<String>) -> Vec<String> {
        if !self.config.recursive {
            return seeds;
        }

        let mut frontier = Vec::with_capacity(seeds.len());
        for seed in seeds {
            let host = canonicalize(&seed);
            if self.dedupe.insert(host.clone()).await {
                frontier.push(host);
            } else {
                debug!("Skipping duplicate seed {}", seed);
            }
        }
        frontier
    }

    async fn run_round(
        &self,
        jobs: Vec<String>,
        sink: &mpsc::Sender<CertificateRecord>,
    ) -> RoundOutcome {
        let (round_tx, mut round_rx) = mpsc::channel(self.config.concurrency.max(1));
        let ctx = WorkerContext::new(
            self.config.verbose,
            self.stats.clone(),
            self.shutdown.clone(),
        );

        let mut pool = WorkerPool::spawn(
            self.config.concurrency,
            Arc::clone(&self.fetcher),
            round_tx,
            ctx,
        );
        pool.submit(jobs);

        let mut next = Vec::new();
        let mut records = 0;
        let mut sink_open = true;

        // ends once every worker has returned and dropped its sender
        while let Some(record) = round_rx.recv().await {
            records += 1;

            if self.config.recursive {
                self.harvest(&record, &mut next).await;
            }

            if sink_open && sink.send(record).await.is_err() {
                warn!("Result sink closed, further records will be discarded");
                sink_open = false;
            }
        }

        let fed = pool.join().await;

        RoundOutcome { fed, records, next }
    }

    /// Admit the record's SAN hosts that were never seen before into `next`
    async fn harvest(&self, record: &CertificateRecord, next: &mut Vec<String>) {
        let mut admitted = 0;

        for name in record.discovered_hosts() {
            if let Some(ref scope) = self.scope {
                if !scope.contains(name) {
                    trace!("{} is out of scope, not following", name);
                    continue;
                }
            }

            let host = canonicalize(name);
            if self.dedupe.insert(host.clone()).await {
                next.push(host);
                admitted += 1;
            }
        }

        if admitted > 0 {
            self.stats.add_discovered(admitted as u64);
            debug!("{} new hosts discovered via {}", admitted, record.host);
        }
    }
}
