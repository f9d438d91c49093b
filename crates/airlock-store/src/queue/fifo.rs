//! Strictly ordered queue.

use std::sync::Arc;

use async_trait::async_trait;

use airlock_core::result::AppResult;
use airlock_core::traits::{EnumerableQueue, FifoStorage, Queue};

/// First come, first served over a [`FifoStorage`].
#[derive(Debug, Clone)]
pub struct FifoQueue {
    storage: Arc<dyn FifoStorage>,
}

impl FifoQueue {
    /// Creates a FIFO queue over `storage`.
    pub fn new(storage: Arc<dyn FifoStorage>) -> Self {
        Self { storage }
    }

    /// Number of waiting callers.
    pub async fn len(&self) -> AppResult<u64> {
        self.storage.len().await
    }

    /// Whether nobody is waiting.
    pub async fn is_empty(&self) -> AppResult<bool> {
        Ok(self.len().await? == 0)
    }

    /// Drop every waiting caller.
    pub async fn purge(&self) -> AppResult<()> {
        self.storage.purge().await
    }
}

#[async_trait]
impl Queue for FifoQueue {
    async fn add(&self, identifier: &str, _priority: i32) -> AppResult<u64> {
        self.storage.add(identifier).await
    }

    async fn remove(&self, identifier: &str) -> AppResult<()> {
        self.storage.remove(identifier).await
    }

    async fn peek(&self) -> AppResult<Option<String>> {
        self.storage.peek().await
    }

    async fn position(&self, identifier: &str) -> AppResult<Option<u64>> {
        self.storage.position(identifier).await
    }
}

#[async_trait]
impl EnumerableQueue for FifoQueue {
    async fn all(&self) -> AppResult<Vec<String>> {
        self.storage.all().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryFifoStorage;

    fn queue() -> FifoQueue {
        FifoQueue::new(Arc::new(MemoryFifoStorage::new()))
    }

    #[tokio::test]
    async fn test_priority_is_ignored() {
        let queue = queue();
        queue.add("low", 0).await.unwrap();
        assert_eq!(queue.add("high", 100).await.unwrap(), 2);
        assert_eq!(queue.peek().await.unwrap().as_deref(), Some("low"));
    }

    #[tokio::test]
    async fn test_purge() {
        let queue = queue();
        queue.add("A", 0).await.unwrap();
        queue.add("B", 0).await.unwrap();
        assert_eq!(queue.all().await.unwrap(), vec!["A", "B"]);

        queue.purge().await.unwrap();
        assert!(queue.is_empty().await.unwrap());
        assert_eq!(queue.peek().await.unwrap(), None);
        assert_eq!(queue.position("A").await.unwrap(), None);
    }
}
