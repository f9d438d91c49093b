//! Single-use claim nonces.

use std::time::Duration;

use async_trait::async_trait;

use crate::result::AppResult;

/// Issues and validates claim nonces tied to an identifier.
///
/// At most one live nonce exists per identifier. `consume` is an atomic
/// compare-and-delete and succeeds at most once per reservation.
#[async_trait]
pub trait ReservationStore: Send + Sync + std::fmt::Debug + 'static {
    /// Issue a fresh nonce, replacing any previous one.
    async fn reserve(&self, identifier: &str, ttl: Duration) -> AppResult<String>;

    /// Constant-time check that `nonce` is the live nonce for `identifier`.
    async fn is_reserved_for(&self, identifier: &str, nonce: &str) -> AppResult<bool>;

    /// Verify and delete in one step.
    async fn consume(&self, identifier: &str, nonce: &str) -> AppResult<bool>;

    /// The live nonce, if any.
    async fn nonce(&self, identifier: &str) -> AppResult<Option<String>>;

    /// Drop any reservation for `identifier`.
    async fn clear(&self, identifier: &str) -> AppResult<()>;
}
