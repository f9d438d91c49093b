//! Lottery queue: random admission order with a sticky candidate.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use airlock_core::result::AppResult;
use airlock_core::traits::{EnumerableQueue, LotteryStorage, Queue};

/// Random draw over a [`LotteryStorage`].
///
/// Once elected, a candidate keeps position 1 for `claim_window`. Other
/// members report the pool size as their position, since the pool has no
/// stable rank.
#[derive(Debug, Clone)]
pub struct LotteryQueue {
    storage: Arc<dyn LotteryStorage>,
    claim_window: Duration,
}

impl LotteryQueue {
    /// Creates a lottery queue whose candidates hold for `claim_window`.
    pub fn new(storage: Arc<dyn LotteryStorage>, claim_window: Duration) -> Self {
        Self {
            storage,
            claim_window,
        }
    }

    /// How long an elected candidate stays at the front.
    pub fn claim_window(&self) -> Duration {
        self.claim_window
    }

    /// Pool size.
    pub async fn len(&self) -> AppResult<u64> {
        self.storage.len().await
    }

    /// Whether the pool is empty.
    pub async fn is_empty(&self) -> AppResult<bool> {
        Ok(self.len().await? == 0)
    }

    /// Drop the pool and the candidate.
    pub async fn purge(&self) -> AppResult<()> {
        self.storage.purge().await
    }
}

#[async_trait]
impl Queue for LotteryQueue {
    async fn add(&self, identifier: &str, _priority: i32) -> AppResult<u64> {
        self.storage.add(identifier).await
    }

    async fn remove(&self, identifier: &str) -> AppResult<()> {
        self.storage.remove(identifier).await
    }

    async fn peek(&self) -> AppResult<Option<String>> {
        self.storage.peek(self.claim_window).await
    }

    async fn position(&self, identifier: &str) -> AppResult<Option<u64>> {
        self.storage.position(identifier).await
    }
}

#[async_trait]
impl EnumerableQueue for LotteryQueue {
    async fn all(&self) -> AppResult<Vec<String>> {
        self.storage.all().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryLotteryStorage;

    #[tokio::test]
    async fn test_peeked_candidate_moves_to_front() {
        let queue = LotteryQueue::new(
            Arc::new(MemoryLotteryStorage::new()),
            Duration::from_secs(30),
        );
        for id in ["A", "B", "C", "D"] {
            queue.add(id, 0).await.unwrap();
        }

        let candidate = queue.peek().await.unwrap().unwrap();
        assert_eq!(queue.add(&candidate, 0).await.unwrap(), 1);
        assert_eq!(queue.position(&candidate).await.unwrap(), Some(1));
        assert_eq!(queue.all().await.unwrap().len(), 4);

        queue.purge().await.unwrap();
        assert!(queue.is_empty().await.unwrap());
    }
}
