//! Seal-only airlock: admitted now or turned away, never queued.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use airlock_core::error::AppError;
use airlock_core::keys;
use airlock_core::result::AppResult;
use airlock_core::traits::{Airlock, Seal};
use airlock_core::types::{
    AirlockCapabilities, ClaimResult, EntryResult, NO_QUEUE_POSITION, Token,
};

/// Single-flight admission over a seal.
///
/// A second `enter` while the permit is held is rejected immediately with
/// [`NO_QUEUE_POSITION`], which makes this the fit for "ignore the double
/// click" guards.
#[derive(Debug, Clone)]
pub struct OpportunisticAirlock {
    seal: Arc<dyn Seal>,
    topic_prefix: String,
}

impl OpportunisticAirlock {
    /// Creates an airlock over `seal`.
    pub fn new(seal: Arc<dyn Seal>, topic_prefix: impl Into<String>) -> Self {
        Self {
            seal,
            topic_prefix: topic_prefix.into(),
        }
    }

    /// The wrapped seal.
    pub fn seal(&self) -> &Arc<dyn Seal> {
        &self.seal
    }
}

#[async_trait]
impl Airlock for OpportunisticAirlock {
    fn capabilities(&self) -> AirlockCapabilities {
        AirlockCapabilities {
            queue: false,
            claim: false,
            refresh: self.seal.capabilities().refreshable,
        }
    }

    fn topic(&self, identifier: &str) -> String {
        keys::topic(&self.topic_prefix, identifier)
    }

    async fn enter(&self, identifier: &str, _priority: i32) -> AppResult<EntryResult> {
        let topic = self.topic(identifier);
        match self.seal.try_acquire().await? {
            Some(token) => Ok(EntryResult::Admitted { token, topic }),
            None => {
                debug!(identifier, resource = %self.seal.resource(), "Seal busy, entry rejected");
                Ok(EntryResult::Queued {
                    position: NO_QUEUE_POSITION,
                    topic,
                })
            }
        }
    }

    async fn leave(&self, _identifier: &str) -> AppResult<()> {
        Ok(())
    }

    async fn release(&self, token: &Token) -> AppResult<()> {
        self.seal.release(token).await
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

    async fn claim(&self, _identifier: &str, _nonce: &str) -> AppResult<ClaimResult> {
        Err(AppError::unsupported("An airlock without a queue has nothing to claim"))
    }

    async fn position(&self, _identifier: &str) -> AppResult<Option<u64>> {
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use airlock_core::error::ErrorKind;
    use airlock_store::memory::{MemoryRateLimiter, MemorySeal};

    fn airlock(limit: u32) -> OpportunisticAirlock {
        let seal = Arc::new(MemorySeal::new("checkout", limit, Duration::from_secs(60)));
        OpportunisticAirlock::new(seal, "checkout")
    }

    #[tokio::test]
    async fn test_double_submit_is_rejected() {
        let airlock = airlock(1);
        let first = airlock.enter("A", 0).await.unwrap();
        assert!(first.is_admitted());
        assert_eq!(first.topic(), "checkout/A");

        let second = airlock.enter("A", 0).await.unwrap();
        assert_eq!(second.position(), Some(NO_QUEUE_POSITION));

        airlock.release(first.token().unwrap()).await.unwrap();
        assert!(airlock.enter("A", 0).await.unwrap().is_admitted());
    }

    #[tokio::test]
    async fn test_claim_is_unsupported() {
        let airlock = airlock(1);
        assert!(!airlock.capabilities().claim);
        let err = airlock.claim("A", "nonce").await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Unsupported);
        assert_eq!(airlock.position("A").await.unwrap(), None);
        airlock.leave("A").await.unwrap();
    }

    #[tokio::test]
    async fn test_refresh_follows_seal_capability() {
        let leased = airlock(1);
        let token = leased.enter("A", 0).await.unwrap().token().cloned().unwrap();
        assert!(leased.capabilities().refresh);
        leased.refresh(&token, None).await.unwrap();

        let windowed = OpportunisticAirlock::new(
            Arc::new(MemoryRateLimiter::new("api", 5, Duration::from_secs(1))),
            "api",
        );
        let token = windowed.enter("A", 0).await.unwrap().token().cloned().unwrap();
        assert!(!windowed.capabilities().refresh);
        let err = windowed.refresh(&token, None).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Unsupported);
    }
}
