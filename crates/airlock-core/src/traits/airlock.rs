//! The admission façade called per request.

use std::time::Duration;

use async_trait::async_trait;

use crate::result::AppResult;
use crate::types::{AirlockCapabilities, ClaimResult, EntryResult, Token};

/// Composes a seal (and optionally a queue) into one admission decision.
#[async_trait]
pub trait Airlock: Send + Sync + std::fmt::Debug + 'static {
    /// Optional operations this airlock supports.
    fn capabilities(&self) -> AirlockCapabilities;

    /// Topic `identifier` is notified on.
    fn topic(&self, identifier: &str) -> String;

    /// Try to get in, queueing if the room is full.
    async fn enter(&self, identifier: &str, priority: i32) -> AppResult<EntryResult>;

    /// Give up waiting. Always safe, idempotent.
    async fn leave(&self, identifier: &str) -> AppResult<()>;

    /// Return a permit.
    async fn release(&self, token: &Token) -> AppResult<()>;

    /// Extend a permit's lease.
    async fn refresh(&self, token: &Token, ttl: Option<Duration>) -> AppResult<Token>;

    /// Redeem a reservation nonce received in a notification.
    async fn claim(&self, identifier: &str, nonce: &str) -> AppResult<ClaimResult>;

    /// Current queue position of `identifier`.
    async fn position(&self, identifier: &str) -> AppResult<Option<u64>>;
}
