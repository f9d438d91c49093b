//! Supervisor runner: main loop that ticks the supervisor until shutdown.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::watch;
use tokio::time;
use tracing::{debug, error, info};

use airlock_core::config::supervisor::SupervisorConfig;
use airlock_service::Supervisor;

/// Counters accumulated over the runner's lifetime.
#[derive(Debug, Default)]
pub struct RunnerStats {
    ticks: AtomicU64,
    notified: AtomicU64,
    evicted: AtomicU64,
    failures: AtomicU64,
}

impl RunnerStats {
    /// Completed ticks, including failed ones.
    pub fn ticks(&self) -> u64 {
        self.ticks.load(Ordering::Relaxed)
    }

    /// Notifications sent.
    pub fn notified(&self) -> u64 {
        self.notified.load(Ordering::Relaxed)
    }

    /// Callers evicted.
    pub fn evicted(&self) -> u64 {
        self.evicted.load(Ordering::Relaxed)
    }

    /// Ticks that returned an error.
    pub fn failures(&self) -> u64 {
        self.failures.load(Ordering::Relaxed)
    }
}

/// Ticks a [`Supervisor`] periodically.
#[derive(Debug)]
pub struct SupervisorRunner {
    supervisor: Arc<Supervisor>,
    interval: Duration,
    stats: Arc<RunnerStats>,
}

impl SupervisorRunner {
    /// Create a runner ticking every `config.tick_interval_ms`.
    pub fn new(supervisor: Arc<Supervisor>, config: &SupervisorConfig) -> Self {
        Self {
            supervisor,
            interval: Duration::from_millis(config.tick_interval_ms.max(1)),
            stats: Arc::new(RunnerStats::default()),
        }
    }

    /// Shared handle to the runner's counters.
    pub fn stats(&self) -> Arc<RunnerStats> {
        Arc::clone(&self.stats)
    }

    /// Start the runner. Runs until the cancel signal is received.
    pub async fn run(&self, mut cancel: watch::Receiver<bool>) {
        info!(
            interval_ms = self.interval.as_millis() as u64,
            claim_window_seconds = self.supervisor.claim_window().as_secs(),
            "Supervisor runner started"
        );

        loop {
            tokio::select! {
                changed = cancel.changed() => {
                    if changed.is_err() || *cancel.borrow() {
                        info!("Supervisor runner received shutdown signal");
                        break;
                    }
                }
                _ = self.tick_once() => {
                    tokio::select! {
                        changed = cancel.changed() => {
                            if changed.is_err() || *cancel.borrow() {
                                info!("Supervisor runner shutting down");
                                break;
                            }
                        }
                        _ = time::sleep(self.interval) => {}
                    }
                }
            }
        }

        info!(
            ticks = self.stats.ticks(),
            notified = self.stats.notified(),
            evicted = self.stats.evicted(),
            failures = self.stats.failures(),
            "Supervisor runner shut down complete"
        );
    }

    /// Run one tick, logging instead of propagating failures.
    async fn tick_once(&self) {
        let result = self.supervisor.tick().await;
        self.stats.ticks.fetch_add(1, Ordering::Relaxed);

        match result {
            Ok(report) => {
                if report.notified.is_some() {
                    self.stats.notified.fetch_add(1, Ordering::Relaxed);
                }
                self.stats
                    .evicted
                    .fetch_add(report.evicted.len() as u64, Ordering::Relaxed);

                if report.is_idle() {
                    debug!(skipped = ?report.skipped, "Supervisor tick idle");
                } else {
                    info!(
                        notified = ?report.notified,
                        evicted = ?report.evicted,
                        "Supervisor tick"
                    );
                }
            }
            Err(e) => {
                self.stats.failures.fetch_add(1, Ordering::Relaxed);
                error!(error = %e, "Supervisor tick failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use airlock_core::traits::Queue;
    use airlock_realtime::LogNotifier;
    use airlock_store::FifoQueue;
    use airlock_store::memory::MemoryFifoStorage;

    use super::*;

    fn config(tick_interval_ms: u64) -> SupervisorConfig {
        SupervisorConfig {
            claim_window_seconds: 0,
            tick_interval_ms,
            presence_sweep: false,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticks_until_cancelled() {
        let queue = Arc::new(FifoQueue::new(Arc::new(MemoryFifoStorage::new())));
        for id in ["A", "B", "C"] {
            queue.add(id, 0).await.unwrap();
        }
        let supervisor = Arc::new(Supervisor::new(
            queue.clone(),
            Arc::new(LogNotifier),
            "room",
            Duration::ZERO,
        ));
        let runner = Arc::new(SupervisorRunner::new(supervisor, &config(1000)));
        let stats = runner.stats();

        let (cancel_tx, cancel_rx) = watch::channel(false);
        let handle = tokio::spawn({
            let runner = runner.clone();
            async move { runner.run(cancel_rx).await }
        });

        time::sleep(Duration::from_millis(3500)).await;
        cancel_tx.send(true).unwrap();
        handle.await.unwrap();

        assert!(stats.ticks() >= 3);
        assert!(stats.evicted() >= 2);
        assert_eq!(stats.failures(), 0);
        assert_eq!(queue.len().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_stops_when_sender_dropped() {
        let queue = Arc::new(FifoQueue::new(Arc::new(MemoryFifoStorage::new())));
        let supervisor = Arc::new(Supervisor::new(
            queue,
            Arc::new(LogNotifier),
            "room",
            Duration::from_secs(30),
        ));
        let runner = SupervisorRunner::new(supervisor, &config(10));

        let (cancel_tx, cancel_rx) = watch::channel(false);
        drop(cancel_tx);
        runner.run(cancel_rx).await;
        assert!(runner.stats().ticks() <= 1);
    }
}
