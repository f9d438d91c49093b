//! Queue policies and the runtime dispatcher between them.

pub mod fifo;
pub mod lottery;

use async_trait::async_trait;

use airlock_core::result::AppResult;
use airlock_core::traits::{EnumerableQueue, Queue};

pub use fifo::FifoQueue;
pub use lottery::LotteryQueue;

/// Dispatcher for queue policies, selected from configuration.
#[derive(Debug, Clone)]
pub enum QueueDispatch {
    /// Strict arrival order.
    Fifo(FifoQueue),
    /// Random draw with a sticky candidate.
    Lottery(LotteryQueue),
}

impl QueueDispatch {
    /// Policy name as used in configuration.
    pub fn policy(&self) -> &'static str {
        match self {
            Self::Fifo(_) => "fifo",
            Self::Lottery(_) => "lottery",
        }
    }

    /// Number of waiting callers.
    pub async fn len(&self) -> AppResult<u64> {
        match self {
            Self::Fifo(inner) => inner.len().await,
            Self::Lottery(inner) => inner.len().await,
        }
    }

    /// Whether nobody is waiting.
    pub async fn is_empty(&self) -> AppResult<bool> {
        Ok(self.len().await? == 0)
    }

    /// Drop every waiting caller.
    pub async fn purge(&self) -> AppResult<()> {
        match self {
            Self::Fifo(inner) => inner.purge().await,
            Self::Lottery(inner) => inner.purge().await,
        }
    }
}

#[async_trait]
impl Queue for QueueDispatch {
    async fn add(&self, identifier: &str, priority: i32) -> AppResult<u64> {
        match self {
            Self::Fifo(inner) => inner.add(identifier, priority).await,
            Self::Lottery(inner) => inner.add(identifier, priority).await,
        }
    }

    async fn remove(&self, identifier: &str) -> AppResult<()> {
        match self {
            Self::Fifo(inner) => inner.remove(identifier).await,
            Self::Lottery(inner) => inner.remove(identifier).await,
        }
    }

    async fn peek(&self) -> AppResult<Option<String>> {
        match self {
            Self::Fifo(inner) => inner.peek().await,
            Self::Lottery(inner) => inner.peek().await,
        }
    }

    async fn position(&self, identifier: &str) -> AppResult<Option<u64>> {
        match self {
            Self::Fifo(inner) => inner.position(identifier).await,
            Self::Lottery(inner) => inner.position(identifier).await,
        }
    }
}

#[async_trait]
impl EnumerableQueue for QueueDispatch {
    async fn all(&self) -> AppResult<Vec<String>> {
        match self {
            Self::Fifo(inner) => inner.all().await,
            Self::Lottery(inner) => inner.all().await,
        }
    }
}
