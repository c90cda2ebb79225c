// src/pool.rs
//! Fixed-size worker pool draining a bounded job queue
//!
//! A pool serves exactly one round: jobs are submitted once, the queue is
//! closed, and [`WorkerPool::join`] is the barrier that ends the round.

use futures_util::future::join_all;
use std::sync::Arc;
use tokio::sync::{Mutex, mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

use crate::fetcher::CertFetcher;
use crate::stats::StatsCollector;
use crate::types::CertificateRecord;

/// Shared state handed to every worker of a pool
#[derive(Clone)]
pub struct WorkerContext {
    /// Report failed fetches at `warn` instead of `debug`
    pub verbose: bool,
    pub stats: StatsCollector,
    pub shutdown: watch::Receiver<bool>,
}

impl WorkerContext {
    pub fn new(verbose: bool, stats: StatsCollector, shutdown: watch::Receiver<bool>) -> Self {
        Self {
            verbose,
            stats,
            shutdown,
        }
    }
}

/// Resolves once shutdown has been requested; never resolves if the sender is gone
pub(crate) async fn shutdown_requested(shutdown: &mut watch::Receiver<bool>) {
    let signalled = shutdown.wait_for(|stop| *stop).await.is_ok();
    if !signalled {
        std::future::pending::<()>().await;
    }
}

struct Worker {
    id: usize,
    jobs: Arc<Mutex<mpsc::Receiver<String>>>,
    fetcher: Arc<dyn CertFetcher>,
    results: mpsc::Sender<CertificateRecord>,
    ctx: WorkerContext,
}

impl Worker {
    async fn run(mut self) {
        loop {
            if *self.ctx.shutdown.borrow() {
                debug!("Worker {} stopping on shutdown", self.id);
                break;
            }

            let job = {
                let mut jobs = self.jobs.lock().await;
                tokio::select! {
                    job = jobs.recv() => job,
                    _ = shutdown_requested(&mut self.ctx.shutdown) => None,
                }
            };

            let Some(target) = job else {
                break;
            };

            self.ctx.stats.increment_dispatched();

            match self.fetcher.fetch(&target).await {
                Ok(record) => {
                    self.ctx.stats.increment_succeeded();
                    if self.results.send(record).await.is_err() {
                        warn!("Result stream closed, worker {} stopping", self.id);
                        break;
                    }
                }
                Err(e) => {
                    self.ctx.stats.increment_failed();
                    if self.ctx.verbose {
                        warn!("{}", e);
                    } else {
                        debug!("{}", e);
                    }
                }
            }
        }
    }
}

/// Exactly `size` concurrent workers pulling from one bounded queue
pub struct WorkerPool {
    job_tx: Option<mpsc::Sender<String>>,
    feeder: Option<JoinHandle<usize>>,
    workers: Vec<JoinHandle<()>>,
    shutdown: watch::Receiver<bool>,
}

impl WorkerPool {
    /// Start `size` workers forwarding successful records to `results`
    ///
    /// `results` is moved into the workers, so the receiving side sees the
    /// stream close once every worker has returned.
    pub fn spawn(
        size: usize,
        fetcher: Arc<dyn CertFetcher>,
        results: mpsc::Sender<CertificateRecord>,
        ctx: WorkerContext,
    ) -> Self {
        let size = size.max(1);
        let (job_tx, job_rx) = mpsc::channel(size);
        let jobs = Arc::new(Mutex::new(job_rx));

        let workers = (0..size)
            .map(|id| {
                let worker = Worker {
                    id,
                    jobs: Arc::clone(&jobs),
                    fetcher: Arc::clone(&fetcher),
                    results: results.clone(),
                    ctx: ctx.clone(),
                };
                tokio::spawn(worker.run())
            })
            .collect();

        Self {
            job_tx: Some(job_tx),
            feeder: None,
            workers,
            shutdown: ctx.shutdown,
        }
    }

    pub fn size(&self) -> usize {
        self.workers.len()
    }

    /// Queue every job of the round, then close the queue
    ///
    /// Feeding happens on its own task so the caller can drain results while
    /// the bounded queue applies back-pressure. Calling this twice is a no-op.
    pub fn submit(&mut self, jobs: Vec<String>) {
        let Some(job_tx) = self.job_tx.take() else {
            warn!("Job queue already closed, ignoring {} jobs", jobs.len());
            return;
        };
        let mut shutdown = self.shutdown.clone();

        self.feeder = Some(tokio::spawn(async move {
            let mut fed = 0;
            for job in jobs {
                tokio::select! {
                    sent = job_tx.send(job) => {
                        if sent.is_err() {
                            break;
                        }
                        fed += 1;
                    }
                    _ = shutdown_requested(&mut shutdown) => break,
                }
            }
            fed
        }));
    }

    /// Wait for the queue to drain and every worker to return
    ///
    /// Returns the number of jobs that made it into the queue.
    pub async fn join(mut self) -> usize {
        drop(self.job_tx.take());

        let fed = match self.feeder.take() {
            Some(handle) => handle.await.unwrap_or_else(|e| {
                error!("Job feeder failed: {}", e);
                0
            }),
            None => 0,
        };

        for result in join_all(self.workers).await {
            if let Err(e) = result {
                error!("Worker task failed: {}", e);
            }
        }

        fed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FetchError;
    use crate::types::fixtures::record;
    use async_trait::async_trait;
    use std::io;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Succeeds for every target except those starting with "bad", tracking peak concurrency
    struct CountingFetcher {
        in_flight: AtomicUsize,
        peak: AtomicUsize,
        calls: AtomicUsize,
    }

    impl CountingFetcher {
        fn new() -> Self {
            Self {
                in_flight: AtomicUsize::new(0),
                peak: AtomicUsize::new(0),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl CertFetcher for CountingFetcher {
        async fn fetch(&self, target: &str) -> Result<CertificateRecord, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(20)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            if target.starts_with("bad") {
                Err(FetchError::connect(
                    target,
                    io::Error::new(io::ErrorKind::ConnectionRefused, "refused"),
                ))
            } else {
                Ok(record(target, &[target]))
            }
        }
    }

    fn context() -> (watch::Sender<bool>, WorkerContext) {
        let (tx, rx) = watch::channel(false);
        (tx, WorkerContext::new(false, StatsCollector::new(), rx))
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_pool_processes_every_job_once() {
        let fetcher = Arc::new(CountingFetcher::new());
        let (_shutdown_tx, ctx) = context();
        let stats = ctx.stats.clone();
        let (tx, mut rx) = mpsc::channel(4);

        let mut pool = WorkerPool::spawn(4, fetcher.clone(), tx, ctx);
        assert_eq!(pool.size(), 4);

        let jobs: Vec<String> = (0..20).map(|i| format!("host{}.example:443", i)).collect();
        pool.submit(jobs);

        let mut received = Vec::new();
        while let Some(record) = rx.recv().await {
            received.push(record.host);
        }
        let fed = pool.join().await;

        received.sort();
        received.dedup();
        assert_eq!(fed, 20);
        assert_eq!(received.len(), 20);
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 20);
        assert!(fetcher.peak.load(Ordering::SeqCst) <= 4);
        assert_eq!(stats.snapshot().dispatched, 20);
    }

    #[tokio::test]
    async fn test_failures_are_dropped_not_fatal() {
        let fetcher = Arc::new(CountingFetcher::new());
        let (_shutdown_tx, ctx) = context();
        let stats = ctx.stats.clone();
        let (tx, mut rx) = mpsc::channel(8);

        let mut pool = WorkerPool::spawn(2, fetcher, tx, ctx);
        pool.submit(vec![
            "good1.example:443".to_string(),
            "bad1.example:443".to_string(),
            "good2.example:443".to_string(),
            "bad2.example:443".to_string(),
        ]);

        let mut hosts = Vec::new();
        while let Some(record) = rx.recv().await {
            hosts.push(record.host);
        }
        pool.join().await;

        hosts.sort();
        assert_eq!(hosts, vec!["good1.example:443", "good2.example:443"]);
        let snapshot = stats.snapshot();
        assert_eq!(snapshot.succeeded, 2);
        assert_eq!(snapshot.failed, 2);
    }

    #[tokio::test]
    async fn test_join_without_submit_terminates() {
        let fetcher = Arc::new(CountingFetcher::new());
        let (_shutdown_tx, ctx) = context();
        let (tx, mut rx) = mpsc::channel(1);

        let pool = WorkerPool::spawn(3, fetcher, tx, ctx);
        assert_eq!(pool.join().await, 0);
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_shutdown_stops_workers() {
        let fetcher = Arc::new(CountingFetcher::new());
        let (shutdown_tx, ctx) = context();
        let (tx, mut rx) = mpsc::channel(1);

        let mut pool = WorkerPool::spawn(1, fetcher.clone(), tx, ctx);
        pool.submit((0..1000).map(|i| format!("h{}.example:443", i)).collect());

        // take a couple of records, then request shutdown
        assert!(rx.recv().await.is_some());
        shutdown_tx.send(true).unwrap();
        while rx.recv().await.is_some() {}

        let fed = tokio::time::timeout(Duration::from_secs(5), pool.join())
            .await
            .expect("pool did not stop after shutdown");
        assert!(fed < 1000);
        assert!(fetcher.calls.load(Ordering::SeqCst) < 1000);
    }
}
