//! Seal variants and the runtime dispatcher between backends.

pub mod composite;

use std::time::Duration;

use async_trait::async_trait;

use airlock_core::result::AppResult;
use airlock_core::traits::Seal;
use airlock_core::types::{SealCapabilities, SealKind, Token};

use crate::memory::{MemoryRateLimiter, MemorySeal};
#[cfg(feature = "redis-backend")]
use crate::redis::{RedisRateLimiter, RedisSeal};

pub use composite::CompositeSeal;

/// Dispatcher for seal backends.
///
/// Switches between in-memory and Redis-based permits based on configuration.
#[derive(Debug, Clone)]
pub enum SealDispatch {
    /// In-memory lock/semaphore (single node).
    Memory(MemorySeal),
    /// In-memory fixed-window rate limiter.
    MemoryRateLimiter(MemoryRateLimiter),
    /// Redis lock/semaphore (multi-node).
    #[cfg(feature = "redis-backend")]
    Redis(RedisSeal),
    /// Redis fixed-window rate limiter.
    #[cfg(feature = "redis-backend")]
    RedisRateLimiter(RedisRateLimiter),
    /// All-or-nothing combination of other seals.
    Composite(CompositeSeal),
}

macro_rules! dispatch {
    ($self:ident, $inner:ident => $call:expr) => {
        match $self {
            Self::Memory($inner) => $call,
            Self::MemoryRateLimiter($inner) => $call,
            #[cfg(feature = "redis-backend")]
            Self::Redis($inner) => $call,
            #[cfg(feature = "redis-backend")]
            Self::RedisRateLimiter($inner) => $call,
            Self::Composite($inner) => $call,
        }
    };
}

#[async_trait]
impl Seal for SealDispatch {
    fn kind(&self) -> SealKind {
        dispatch!(self, inner => inner.kind())
    }

    fn capabilities(&self) -> SealCapabilities {
        dispatch!(self, inner => inner.capabilities())
    }

    fn resource(&self) -> &str {
        dispatch!(self, inner => inner.resource())
    }

    async fn try_acquire(&self) -> AppResult<Option<Token>> {
        dispatch!(self, inner => inner.try_acquire().await)
    }

    async fn release(&self, token: &Token) -> AppResult<()> {
        dispatch!(self, inner => inner.release(token).await)
    }

    async fn refresh(&self, token: &Token, ttl: Option<Duration>) -> AppResult<Token> {
        dispatch!(self, inner => inner.refresh(token, ttl).await)
    }

    async fn remaining_lifetime(&self, token: &Token) -> AppResult<Option<Duration>> {
        dispatch!(self, inner => inner.remaining_lifetime(token).await)
    }

    async fn available(&self) -> AppResult<u32> {
        dispatch!(self, inner => inner.available().await)
    }
}
