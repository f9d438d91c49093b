//! Queue traits and the storage ports behind them.

use std::time::Duration;

use async_trait::async_trait;

use crate::result::AppResult;

/// Waiting-caller order and membership.
#[async_trait]
pub trait Queue: Send + Sync + std::fmt::Debug + 'static {
    /// Add a caller (idempotent) and return its 1-indexed position.
    ///
    /// `priority` is accepted for interface compatibility; neither ordering
    /// policy uses it.
    async fn add(&self, identifier: &str, priority: i32) -> AppResult<u64>;

    /// Remove a caller. Removing an absent caller is a no-op.
    async fn remove(&self, identifier: &str) -> AppResult<()>;

    /// The caller that should attempt admission next.
    async fn peek(&self) -> AppResult<Option<String>>;

    /// 1-indexed position of a caller, or `None` if it is not queued.
    async fn position(&self, identifier: &str) -> AppResult<Option<u64>>;
}

/// A queue whose members can be listed (used for presence sweeps).
#[async_trait]
pub trait EnumerableQueue: Queue {
    /// Every queued identifier.
    async fn all(&self) -> AppResult<Vec<String>>;
}

/// Atomic storage operations for a strictly ordered queue.
///
/// Every compound check-then-act step runs as one indivisible unit in the
/// shared store.
#[async_trait]
pub trait FifoStorage: Send + Sync + std::fmt::Debug + 'static {
    /// Append if absent, locate if present, heal a membership marker that
    /// has no sequence entry by re-appending. Returns the 1-indexed position.
    async fn add(&self, identifier: &str) -> AppResult<u64>;

    /// Drop from both the sequence and the membership marker.
    async fn remove(&self, identifier: &str) -> AppResult<()>;

    /// Head of the sequence.
    async fn peek(&self) -> AppResult<Option<String>>;

    /// Membership check, then indexed lookup.
    async fn position(&self, identifier: &str) -> AppResult<Option<u64>>;

    /// Sequence contents in order.
    async fn all(&self) -> AppResult<Vec<String>>;

    /// Sequence length.
    async fn len(&self) -> AppResult<u64>;

    /// Delete the whole queue.
    async fn purge(&self) -> AppResult<()>;
}

/// Atomic storage operations for a lottery queue.
#[async_trait]
pub trait LotteryStorage: Send + Sync + std::fmt::Debug + 'static {
    /// Add to the pool. Returns 1 for the current candidate, else pool size.
    async fn add(&self, identifier: &str) -> AppResult<u64>;

    /// Drop from the pool, clearing the candidate slot if it held `identifier`.
    async fn remove(&self, identifier: &str) -> AppResult<()>;

    /// The live candidate, electing a random member for `candidate_ttl`
    /// when there is none.
    async fn peek(&self, candidate_ttl: Duration) -> AppResult<Option<String>>;

    /// 1 for the candidate, pool size for other members, `None` otherwise.
    async fn position(&self, identifier: &str) -> AppResult<Option<u64>>;

    /// Pool members in no particular order.
    async fn all(&self) -> AppResult<Vec<String>>;

    /// Pool size.
    async fn len(&self) -> AppResult<u64>;

    /// Delete the pool and candidate slot.
    async fn purge(&self) -> AppResult<()>;
}
