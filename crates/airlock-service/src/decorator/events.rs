//! Airlock decorator that publishes domain events.

use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::broadcast;
use tracing::trace;

use airlock_core::events::{AirlockEvent, DomainEvent};
use airlock_core::result::AppResult;
use airlock_core::traits::Airlock;
use airlock_core::types::{AirlockCapabilities, ClaimResult, EntryResult, Token};

use super::ensure_capability;

/// Wraps an airlock and publishes an [`AirlockEvent`] for every successful
/// call on a broadcast channel.
///
/// Publishing never fails the call: with no subscribers the event is
/// dropped.
#[derive(Debug, Clone)]
pub struct EventAirlock<A> {
    inner: A,
    sender: broadcast::Sender<DomainEvent>,
}

impl<A: Airlock> EventAirlock<A> {
    /// Wrap `inner` with a fresh channel of `capacity` events.
    pub fn new(inner: A, capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { inner, sender }
    }

    /// Wrap `inner`, publishing on an existing channel.
    pub fn with_sender(inner: A, sender: broadcast::Sender<DomainEvent>) -> Self {
        Self { inner, sender }
    }

    /// Subscribe to published events.
    pub fn subscribe(&self) -> broadcast::Receiver<DomainEvent> {
        self.sender.subscribe()
    }

    /// The wrapped airlock.
    pub fn inner(&self) -> &A {
        &self.inner
    }

    fn publish(&self, payload: AirlockEvent) {
        let receivers = self.sender.send(DomainEvent::new(payload)).unwrap_or(0);
        trace!(receivers, "Airlock event published");
    }
}

#[async_trait]
impl<A: Airlock> Airlock for EventAirlock<A> {
    fn capabilities(&self) -> AirlockCapabilities {
        self.inner.capabilities()
    }

    fn topic(&self, identifier: &str) -> String {
        self.inner.topic(identifier)
    }

    async fn enter(&self, identifier: &str, priority: i32) -> AppResult<EntryResult> {
        let result = self.inner.enter(identifier, priority).await?;
        let identifier = identifier.to_string();
        self.publish(match &result {
            EntryResult::Admitted { token, .. } => AirlockEvent::Admitted {
                identifier,
                token_id: token.id(),
            },
            EntryResult::Queued { position, .. } => AirlockEvent::Queued {
                identifier,
                position: *position,
            },
        });
        Ok(result)
    }

    async fn leave(&self, identifier: &str) -> AppResult<()> {
        self.inner.leave(identifier).await?;
        self.publish(AirlockEvent::Left {
            identifier: identifier.to_string(),
        });
        Ok(())
    }

    async fn release(&self, token: &Token) -> AppResult<()> {
        self.inner.release(token).await?;
        self.publish(AirlockEvent::Released {
            token_id: token.id(),
        });
        Ok(())
    }

    async fn refresh(&self, token: &Token, ttl: Option<Duration>) -> AppResult<Token> {
        ensure_capability(self.inner.capabilities().refresh, "refresh")?;
        let refreshed = self.inner.refresh(token, ttl).await?;
        self.publish(AirlockEvent::Refreshed {
            token_id: refreshed.id(),
        });
        Ok(refreshed)
    }

    async fn claim(&self, identifier: &str, nonce: &str) -> AppResult<ClaimResult> {
        ensure_capability(self.inner.capabilities().claim, "claim")?;
        let result = self.inner.claim(identifier, nonce).await?;
        let identifier = identifier.to_string();
        self.publish(match &result {
            ClaimResult::Admitted { token, .. } => AirlockEvent::Claimed {
                identifier,
                token_id: token.id(),
            },
            ClaimResult::Missed { .. } => AirlockEvent::ClaimMissed { identifier },
            ClaimResult::Unavailable { .. } => AirlockEvent::ClaimUnavailable { identifier },
        });
        Ok(result)
    }

    async fn position(&self, identifier: &str) -> AppResult<Option<u64>> {
        self.inner.position(identifier).await
    }
}
