//! Waiting-room airlock: a seal guarded by a FIFO or lottery queue.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use airlock_core::error::AppError;
use airlock_core::keys;
use airlock_core::result::AppResult;
use airlock_core::traits::{Airlock, Notifier, Queue, ReservationStore, Seal};
use airlock_core::types::{AirlockCapabilities, ClaimResult, EntryResult, Token};

/// Fair admission through a queue.
///
/// Callers join the queue before the seal is probed, so a slow admission
/// check never lets a later arrival overtake. Only the caller at position 1
/// (the FIFO head or the lottery candidate) may take a permit.
///
/// With a [`ReservationStore`] a notified caller can [`claim`](Airlock::claim)
/// its slot with the nonce it received. With a [`Notifier`] every release
/// pushes the next candidate right away instead of waiting for the
/// supervisor's next tick.
#[derive(Debug, Clone)]
pub struct QueueAirlock {
    seal: Arc<dyn Seal>,
    queue: Arc<dyn Queue>,
    reservations: Option<Arc<dyn ReservationStore>>,
    notifier: Option<Arc<dyn Notifier>>,
    topic_prefix: String,
    claim_window: Duration,
}

impl QueueAirlock {
    /// Creates an airlock with no claim support and no fast-path notifications.
    pub fn new(
        seal: Arc<dyn Seal>,
        queue: Arc<dyn Queue>,
        topic_prefix: impl Into<String>,
    ) -> Self {
        Self {
            seal,
            queue,
            reservations: None,
            notifier: None,
            topic_prefix: topic_prefix.into(),
            claim_window: Duration::from_secs(30),
        }
    }

    /// Enable `claim`. Fast-path nonces live for `claim_window`.
    pub fn with_reservations(
        mut self,
        reservations: Arc<dyn ReservationStore>,
        claim_window: Duration,
    ) -> Self {
        self.reservations = Some(reservations);
        self.claim_window = claim_window;
        self
    }

    /// Notify the next candidate on every release.
    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// The wrapped seal.
    pub fn seal(&self) -> &Arc<dyn Seal> {
        &self.seal
    }

    /// The wrapped queue.
    pub fn queue(&self) -> &Arc<dyn Queue> {
        &self.queue
    }

    /// Drop an admitted caller from the queue along with its reservation.
    async fn dequeue_admitted(&self, identifier: &str) -> AppResult<()> {
        self.queue.remove(identifier).await?;
        if let Some(reservations) = &self.reservations {
            reservations.clear(identifier).await?;
        }
        Ok(())
    }

    /// Hand back a permit acquired by a call that is about to fail, so the
    /// slot does not stay taken for the rest of its lease.
    async fn release_abandoned(&self, token: &Token) {
        if let Err(e) = self.seal.release(token).await {
            warn!(token_id = %token.id(), error = %e, "Could not release abandoned permit");
        }
    }

    /// Tell the current front of the queue that a slot opened up.
    ///
    /// A live nonce is reused so a notification already in flight stays
    /// valid.
    async fn promote_next(&self) -> AppResult<()> {
        let Some(notifier) = &self.notifier else {
            return Ok(());
        };
        let Some(candidate) = self.queue.peek().await? else {
            return Ok(());
        };

        let nonce = match &self.reservations {
            Some(reservations) => match reservations.nonce(&candidate).await? {
                Some(live) => Some(live),
                None => Some(reservations.reserve(&candidate, self.claim_window).await?),
            },
            None => None,
        };

        let topic = self.topic(&candidate);
        if let Err(e) = notifier.notify(&candidate, &topic, nonce.as_deref()).await {
            warn!(identifier = %candidate, error = %e, "Fast-path notification failed");
        } else {
            debug!(identifier = %candidate, topic = %topic, "Next candidate notified on release");
        }
        Ok(())
    }
}

#[async_trait]
impl Airlock for QueueAirlock {
    fn capabilities(&self) -> AirlockCapabilities {
        AirlockCapabilities {
            queue: true,
            claim: self.reservations.is_some(),
            refresh: self.seal.capabilities().refreshable,
        }
    }

    fn topic(&self, identifier: &str) -> String {
        keys::topic(&self.topic_prefix, identifier)
    }

    async fn enter(&self, identifier: &str, priority: i32) -> AppResult<EntryResult> {
        let position = self.queue.add(identifier, priority).await?;
        let topic = self.topic(identifier);

        if position > 1 {
            return Ok(EntryResult::Queued {
                position: position as i64,
                topic,
            });
        }

        match self.seal.try_acquire().await? {
            Some(token) => {
                if let Err(e) = self.dequeue_admitted(identifier).await {
                    self.release_abandoned(&token).await;
                    return Err(e);
                }
                info!(identifier, token_id = %token.id(), "Caller admitted");
                Ok(EntryResult::Admitted { token, topic })
            }
            None => Ok(EntryResult::Queued { position: 1, topic }),
        }
    }

    async fn leave(&self, identifier: &str) -> AppResult<()> {
        self.queue.remove(identifier).await
    }

    async fn release(&self, token: &Token) -> AppResult<()> {
        self.seal.release(token).await?;
        if let Err(e) = self.promote_next().await {
            warn!(error = %e, "Could not promote next candidate, leaving it to the supervisor");
        }
        Ok(())
    }

    async fn refresh(&self, token: &Token, ttl: Option<Duration>) -> AppResult<Token> {
        if !self.seal.capabilities().refreshable {
            return Err(AppError::unsupported(format!(
                "Seal '{}' does not support refresh",
                self.seal.resource()
            )));
        }
        self.seal.refresh(token, ttl).await
    }

    async fn claim(&self, identifier: &str, nonce: &str) -> AppResult<ClaimResult> {
        let Some(reservations) = &self.reservations else {
            return Err(AppError::unsupported("Claim requires a reservation store"));
        };
        let topic = self.topic(identifier);

        if !reservations.is_reserved_for(identifier, nonce).await? {
            debug!(identifier, "Claim nonce did not match");
            return Ok(ClaimResult::Missed { topic });
        }

        let Some(token) = self.seal.try_acquire().await? else {
            debug!(identifier, "Claim valid but seal is full");
            return Ok(ClaimResult::Unavailable { topic });
        };

        let consumed = match reservations.consume(identifier, nonce).await {
            Ok(consumed) => consumed,
            Err(e) => {
                self.release_abandoned(&token).await;
                return Err(e);
            }
        };
        if !consumed {
            // A concurrent claim won the nonce between the check and the consume.
            self.seal.release(&token).await?;
            return Ok(ClaimResult::Missed { topic });
        }

        if let Err(e) = self.queue.remove(identifier).await {
            self.release_abandoned(&token).await;
            return Err(e);
        }
        info!(identifier, token_id = %token.id(), "Caller claimed slot");
        Ok(ClaimResult::Admitted { token, topic })
    }

    async fn position(&self, identifier: &str) -> AppResult<Option<u64>> {
        self.queue.position(identifier).await
    }
}
