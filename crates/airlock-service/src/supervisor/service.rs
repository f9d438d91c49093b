//! Tick-driven queue maintenance: presence sweep, notification, eviction.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, broadcast};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use airlock_core::events::{AirlockEvent, DomainEvent, EvictionReason};
use airlock_core::keys;
use airlock_core::result::AppResult;
use airlock_core::traits::{EnumerableQueue, Notifier, PresenceProvider, Queue, ReservationStore};

use super::gate::AvailabilityGate;
use super::report::{SkipReason, TickReport};

/// The candidate most recently told it may claim.
#[derive(Debug, Default)]
struct Notified {
    candidate: Option<String>,
    at: Option<Instant>,
}

impl Notified {
    fn clear(&mut self) {
        self.candidate = None;
        self.at = None;
    }
}

/// Moves the queue forward between requests.
///
/// Has no timer of its own: an external driver calls [`tick`](Self::tick)
/// periodically. Each tick notifies the front of the queue once, and evicts
/// it if it is still at the front one full claim window later.
#[derive(Debug)]
pub struct Supervisor {
    queue: Arc<dyn EnumerableQueue>,
    notifier: Arc<dyn Notifier>,
    reservations: Option<Arc<dyn ReservationStore>>,
    presence: Option<Arc<dyn PresenceProvider>>,
    gate: Option<Arc<dyn AvailabilityGate>>,
    events: Option<broadcast::Sender<DomainEvent>>,
    topic_prefix: String,
    claim_window: Duration,
    notified: Mutex<Notified>,
}

impl Supervisor {
    /// Creates a supervisor over `queue` that notifies through `notifier`.
    pub fn new(
        queue: Arc<dyn EnumerableQueue>,
        notifier: Arc<dyn Notifier>,
        topic_prefix: impl Into<String>,
        claim_window: Duration,
    ) -> Self {
        Self {
            queue,
            notifier,
            reservations: None,
            presence: None,
            gate: None,
            events: None,
            topic_prefix: topic_prefix.into(),
            claim_window,
            notified: Mutex::new(Notified::default()),
        }
    }

    /// Attach a claim nonce to every notification.
    pub fn with_reservations(mut self, reservations: Arc<dyn ReservationStore>) -> Self {
        self.reservations = Some(reservations);
        self
    }

    /// Evict queued callers that stopped listening on their topic.
    pub fn with_presence(mut self, presence: Arc<dyn PresenceProvider>) -> Self {
        self.presence = Some(presence);
        self
    }

    /// Only notify when `gate` reports a free slot.
    pub fn with_gate(mut self, gate: Arc<dyn AvailabilityGate>) -> Self {
        self.gate = Some(gate);
        self
    }

    /// Publish notification and eviction events on `sender`.
    pub fn with_events(mut self, sender: broadcast::Sender<DomainEvent>) -> Self {
        self.events = Some(sender);
        self
    }

    /// How long a notified candidate has to claim.
    pub fn claim_window(&self) -> Duration {
        self.claim_window
    }

    /// The candidate most recently notified, if still remembered.
    pub async fn last_notified(&self) -> Option<String> {
        self.notified.lock().await.candidate.clone()
    }

    /// Forget the last notified candidate. The next tick treats the front
    /// of the queue as new and notifies it again.
    pub async fn reset(&self) {
        self.notified.lock().await.clear();
        info!("Supervisor state reset");
    }

    /// Run one maintenance pass.
    pub async fn tick(&self) -> AppResult<TickReport> {
        let mut notified = self.notified.lock().await;
        let mut report = TickReport::default();

        if self.presence.is_some() {
            self.sweep(&mut notified, &mut report).await?;
        }

        let Some(mut candidate) = self.queue.peek().await? else {
            notified.clear();
            report.skipped = Some(SkipReason::EmptyQueue);
            return Ok(report);
        };

        if let Some(gate) = &self.gate {
            if !gate.is_available().await? {
                debug!(candidate = %candidate, "No free slot, skipping tick");
                report.candidate = Some(candidate);
                report.skipped = Some(SkipReason::NoCapacity);
                return Ok(report);
            }
        }

        let is_new = notified.candidate.as_deref() != Some(candidate.as_str());
        let cooldown_expired = notified
            .at
            .is_none_or(|at| at.elapsed() >= self.claim_window);

        if !is_new && !cooldown_expired {
            report.candidate = Some(candidate);
            report.skipped = Some(SkipReason::AwaitingClaim);
            return Ok(report);
        }

        if !is_new {
            info!(identifier = %candidate, "Candidate did not claim in time, evicting");
            self.evict(&candidate, EvictionReason::ClaimWindowElapsed)
                .await?;
            notified.clear();
            report.evicted.push(candidate);

            match self.queue.peek().await? {
                Some(next) => candidate = next,
                None => {
                    report.skipped = Some(SkipReason::EmptyQueue);
                    return Ok(report);
                }
            }
        }

        self.notify(&candidate).await?;
        notified.candidate = Some(candidate.clone());
        notified.at = Some(Instant::now());
        report.candidate = Some(candidate.clone());
        report.notified = Some(candidate);
        Ok(report)
    }

    fn topic(&self, identifier: &str) -> String {
        keys::topic(&self.topic_prefix, identifier)
    }

    async fn sweep(&self, notified: &mut Notified, report: &mut TickReport) -> AppResult<()> {
        let Some(presence) = &self.presence else {
            return Ok(());
        };

        for identifier in self.queue.all().await? {
            let topic = self.topic(&identifier);
            let connected = match presence.is_connected(&identifier, &topic).await {
                Ok(connected) => connected,
                Err(e) => {
                    warn!(
                        identifier = %identifier,
                        error = %e,
                        "Presence check failed, assuming connected"
                    );
                    true
                }
            };
            if connected {
                continue;
            }

            info!(identifier = %identifier, "Caller disconnected, evicting");
            self.evict(&identifier, EvictionReason::Disconnected).await?;
            if notified.candidate.as_deref() == Some(identifier.as_str()) {
                notified.clear();
            }
            report.evicted.push(identifier);
        }
        Ok(())
    }

    async fn evict(&self, identifier: &str, reason: EvictionReason) -> AppResult<()> {
        self.queue.remove(identifier).await?;
        if let Some(reservations) = &self.reservations {
            reservations.clear(identifier).await?;
        }
        self.publish(AirlockEvent::Evicted {
            identifier: identifier.to_string(),
            reason,
        });
        Ok(())
    }

    async fn notify(&self, identifier: &str) -> AppResult<()> {
        let nonce = match &self.reservations {
            Some(reservations) => Some(reservations.reserve(identifier, self.claim_window).await?),
            None => None,
        };

        let topic = self.topic(identifier);
        match self.notifier.notify(identifier, &topic, nonce.as_deref()).await {
            Ok(()) => debug!(identifier, topic = %topic, "Candidate notified"),
            Err(e) => warn!(identifier, error = %e, "Notification failed"),
        }
        self.publish(AirlockEvent::CandidateNotified {
            identifier: identifier.to_string(),
        });
        Ok(())
    }

    fn publish(&self, payload: AirlockEvent) {
        if let Some(sender) = &self.events {
            let _ = sender.send(DomainEvent::new(payload));
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};

    use async_trait::async_trait;

    use airlock_core::error::AppError;
    use airlock_realtime::PresenceTracker;
    use airlock_store::FifoQueue;
    use airlock_store::memory::{MemoryFifoStorage, MemoryReservationStore};

    use super::*;
    use crate::supervisor::gate::FnGate;

    /// Records every notification it is asked to deliver.
    #[derive(Debug, Default)]
    struct RecordingNotifier {
        sent: std::sync::Mutex<Vec<(String, Option<String>)>>,
        fail: bool,
    }

    impl RecordingNotifier {
        fn failing() -> Self {
            Self {
                fail: true,
                ..Self::default()
            }
        }

        fn sent(&self) -> Vec<(String, Option<String>)> {
            self.sent.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn notify(
            &self,
            identifier: &str,
            _topic: &str,
            claim_nonce: Option<&str>,
        ) -> AppResult<()> {
            self.sent
                .lock()
                .unwrap()
                .push((identifier.to_string(), claim_nonce.map(str::to_string)));
            if self.fail {
                return Err(AppError::internal("transport down"));
            }
            Ok(())
        }
    }

    #[derive(Debug)]
    struct BrokenPresence;

    #[async_trait]
    impl PresenceProvider for BrokenPresence {
        async fn is_connected(&self, _identifier: &str, _topic: &str) -> AppResult<bool> {
            Err(AppError::store("presence backend unreachable"))
        }
    }

    struct Fixture {
        queue: Arc<FifoQueue>,
        notifier: Arc<RecordingNotifier>,
        reservations: Arc<MemoryReservationStore>,
        supervisor: Supervisor,
    }

    async fn fixture(ids: &[&str], claim_window: Duration) -> Fixture {
        fixture_with(ids, claim_window, RecordingNotifier::default()).await
    }

    async fn fixture_with(
        ids: &[&str],
        claim_window: Duration,
        notifier: RecordingNotifier,
    ) -> Fixture {
        let queue = Arc::new(FifoQueue::new(Arc::new(MemoryFifoStorage::new())));
        for id in ids {
            queue.add(id, 0).await.unwrap();
        }
        let notifier = Arc::new(notifier);
        let reservations = Arc::new(MemoryReservationStore::new());
        let supervisor = Supervisor::new(queue.clone(), notifier.clone(), "room", claim_window)
            .with_reservations(reservations.clone());
        Fixture {
            queue,
            notifier,
            reservations,
            supervisor,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_notifies_front_once_per_window() {
        let f = fixture(&["A", "B"], Duration::from_secs(30)).await;

        let report = f.supervisor.tick().await.unwrap();
        assert_eq!(report.notified.as_deref(), Some("A"));
        let sent = f.notifier.sent();
        let nonce = sent[0].1.clone().unwrap();
        assert!(f.reservations.is_reserved_for("A", &nonce).await.unwrap());

        let report = f.supervisor.tick().await.unwrap();
        assert_eq!(report.skipped, Some(SkipReason::AwaitingClaim));
        assert!(report.is_idle());
        assert_eq!(f.notifier.sent().len(), 1);
    }

    #[tokio::test]
    async fn test_zero_window_evicts_on_next_tick() {
        let f = fixture(&["A", "B"], Duration::ZERO).await;

        let first = f.supervisor.tick().await.unwrap();
        assert_eq!(first.notified.as_deref(), Some("A"));
        assert!(first.evicted.is_empty());

        let second = f.supervisor.tick().await.unwrap();
        assert_eq!(second.evicted, vec!["A".to_string()]);
        assert_eq!(second.notified.as_deref(), Some("B"));
        assert_eq!(f.queue.position("A").await.unwrap(), None);
        assert_eq!(f.reservations.nonce("A").await.unwrap(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_eviction_waits_full_window() {
        let f = fixture(&["A", "B"], Duration::from_secs(30)).await;
        f.supervisor.tick().await.unwrap();

        tokio::time::advance(Duration::from_secs(29)).await;
        let report = f.supervisor.tick().await.unwrap();
        assert!(report.evicted.is_empty());

        tokio::time::advance(Duration::from_secs(1)).await;
        let report = f.supervisor.tick().await.unwrap();
        assert_eq!(report.evicted, vec!["A".to_string()]);
        assert_eq!(report.notified.as_deref(), Some("B"));
        assert_eq!(f.supervisor.last_notified().await.as_deref(), Some("B"));
    }

    #[tokio::test]
    async fn test_claimed_candidate_is_not_evicted() {
        let f = fixture(&["A", "B"], Duration::ZERO).await;
        f.supervisor.tick().await.unwrap();

        f.queue.remove("A").await.unwrap();
        let report = f.supervisor.tick().await.unwrap();
        assert!(report.evicted.is_empty());
        assert_eq!(report.notified.as_deref(), Some("B"));
    }

    #[tokio::test]
    async fn test_last_eviction_empties_queue() {
        let f = fixture(&["A"], Duration::ZERO).await;
        f.supervisor.tick().await.unwrap();

        let report = f.supervisor.tick().await.unwrap();
        assert_eq!(report.evicted, vec!["A".to_string()]);
        assert_eq!(report.notified, None);
        assert_eq!(report.skipped, Some(SkipReason::EmptyQueue));
        assert_eq!(f.supervisor.last_notified().await, None);
    }

    #[tokio::test]
    async fn test_empty_queue_is_idle() {
        let f = fixture(&[], Duration::from_secs(30)).await;
        let report = f.supervisor.tick().await.unwrap();
        assert_eq!(report.skipped, Some(SkipReason::EmptyQueue));
        assert!(report.is_idle());
    }

    #[tokio::test]
    async fn test_closed_gate_skips_tick() {
        let open = Arc::new(AtomicBool::new(false));
        let flag = open.clone();
        let f = fixture(&["A"], Duration::ZERO).await;
        let supervisor = f
            .supervisor
            .with_gate(Arc::new(FnGate::new(move || flag.load(Ordering::SeqCst))));

        for _ in 0..3 {
            let report = supervisor.tick().await.unwrap();
            assert_eq!(report.skipped, Some(SkipReason::NoCapacity));
            assert_eq!(report.candidate.as_deref(), Some("A"));
        }
        assert!(f.notifier.sent().is_empty());

        open.store(true, Ordering::SeqCst);
        let report = supervisor.tick().await.unwrap();
        assert_eq!(report.notified.as_deref(), Some("A"));
    }

    #[tokio::test]
    async fn test_presence_sweep_evicts_disconnected() {
        let f = fixture(&["A", "B"], Duration::from_secs(30)).await;
        let presence = Arc::new(PresenceTracker::new());
        presence.connect("A", "room/A");
        presence.connect("B", "room/B");

        let (tx, mut events) = broadcast::channel(16);
        let supervisor = f.supervisor.with_presence(presence.clone()).with_events(tx);
        assert_eq!(supervisor.tick().await.unwrap().notified.as_deref(), Some("A"));

        presence.disconnect("A", "room/A");
        let report = supervisor.tick().await.unwrap();
        assert_eq!(report.evicted, vec!["A".to_string()]);
        assert_eq!(report.notified.as_deref(), Some("B"));

        let payloads: Vec<AirlockEvent> = std::iter::from_fn(|| events.try_recv().ok())
            .map(|e| e.payload)
            .collect();
        assert!(payloads.contains(&AirlockEvent::Evicted {
            identifier: "A".to_string(),
            reason: EvictionReason::Disconnected,
        }));
        assert!(payloads.contains(&AirlockEvent::CandidateNotified {
            identifier: "B".to_string(),
        }));
    }

    #[tokio::test]
    async fn test_presence_errors_fail_open() {
        let f = fixture(&["A", "B"], Duration::from_secs(30)).await;
        let supervisor = f.supervisor.with_presence(Arc::new(BrokenPresence));

        let report = supervisor.tick().await.unwrap();
        assert!(report.evicted.is_empty());
        assert_eq!(f.queue.len().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_notifier_failure_is_swallowed() {
        let f = fixture_with(&["A"], Duration::from_secs(30), RecordingNotifier::failing()).await;
        let report = f.supervisor.tick().await.unwrap();
        assert_eq!(report.notified.as_deref(), Some("A"));
        assert_eq!(f.notifier.sent().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reset_renotifies_candidate() {
        let f = fixture(&["A"], Duration::from_secs(30)).await;
        f.supervisor.tick().await.unwrap();
        f.supervisor.reset().await;

        let report = f.supervisor.tick().await.unwrap();
        assert!(report.evicted.is_empty());
        assert_eq!(report.notified.as_deref(), Some("A"));
        assert_eq!(f.notifier.sent().len(), 2);
    }
}
