//! Seal trait: acquire/release/refresh of a capacity permit.

use std::time::Duration;

use async_trait::async_trait;

use crate::result::AppResult;
use crate::types::{SealCapabilities, SealKind, Token};

/// A capacity-limited permit pool.
///
/// `try_acquire` never blocks: it is a single probe that either returns a
/// permit or `None`. Waiting is layered outside the seal by airlocks.
/// Optional operations are gated by [`Seal::capabilities`]; calling one that
/// is not advertised fails with `ErrorKind::Unsupported`.
#[async_trait]
pub trait Seal: Send + Sync + std::fmt::Debug + 'static {
    /// The variant of this seal.
    fn kind(&self) -> SealKind;

    /// Optional operations this seal supports.
    fn capabilities(&self) -> SealCapabilities;

    /// Key of the protected capacity pool.
    fn resource(&self) -> &str;

    /// Attempt to take one permit. Returns `None` immediately when full.
    async fn try_acquire(&self) -> AppResult<Option<Token>>;

    /// Return a permit.
    ///
    /// Releasing a permit that already lapsed is a no-op. A token issued by
    /// a different seal fails with `ErrorKind::InvalidTokenType` and never
    /// touches another holder's permit.
    async fn release(&self, token: &Token) -> AppResult<()>;

    /// Extend the lease, by `ttl` or the seal's default.
    ///
    /// Fails with `ErrorKind::LeaseExpired` when the permit is no longer held.
    async fn refresh(&self, token: &Token, ttl: Option<Duration>) -> AppResult<Token>;

    /// Time left on the lease, or `None` if the permit is not held.
    async fn remaining_lifetime(&self, token: &Token) -> AppResult<Option<Duration>>;

    /// Number of permits that could be acquired right now.
    async fn available(&self) -> AppResult<u32>;

    /// Whether the permit is currently held.
    async fn is_acquired(&self, token: &Token) -> AppResult<bool> {
        Ok(self.remaining_lifetime(token).await?.is_some())
    }

    /// Whether the permit's lease has lapsed (or it was released).
    async fn is_expired(&self, token: &Token) -> AppResult<bool> {
        Ok(!self.is_acquired(token).await?)
    }
}
