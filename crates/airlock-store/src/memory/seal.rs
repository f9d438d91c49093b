//! In-memory lock/semaphore seal using a Tokio mutex for single-node deployments.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use airlock_core::error::AppError;
use airlock_core::result::AppResult;
use airlock_core::traits::Seal;
use airlock_core::types::{SealCapabilities, SealKind, Token};

use crate::nonce;

/// Permit id → lease expiry.
type PermitTable = HashMap<String, Instant>;

/// In-memory leased permit pool. `limit == 1` behaves as a mutex.
#[derive(Debug, Clone)]
pub struct MemorySeal {
    /// Key of the protected pool.
    resource: String,
    /// Maximum concurrently held permits.
    limit: u32,
    /// Default lease length.
    ttl: Duration,
    /// Live permits.
    permits: Arc<Mutex<PermitTable>>,
}

impl MemorySeal {
    /// Creates a new in-memory seal.
    pub fn new(resource: impl Into<String>, limit: u32, ttl: Duration) -> Self {
        Self {
            resource: resource.into(),
            limit: limit.max(1),
            ttl,
            permits: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    fn purge_expired(table: &mut PermitTable, now: Instant) {
        table.retain(|_, expires_at| *expires_at > now);
    }
}

#[async_trait]
impl Seal for MemorySeal {
    fn kind(&self) -> SealKind {
        SealKind::for_limit(self.limit)
    }

    fn capabilities(&self) -> SealCapabilities {
        SealCapabilities::LEASED
    }

    fn resource(&self) -> &str {
        &self.resource
    }

    async fn try_acquire(&self) -> AppResult<Option<Token>> {
        let mut table = self.permits.lock().await;
        let now = Instant::now();
        Self::purge_expired(&mut table, now);

        if table.len() as u32 >= self.limit {
            debug!(resource = %self.resource, held = table.len(), "Seal full");
            return Ok(None);
        }

        let permit = nonce::permit_id();
        table.insert(permit.clone(), now + self.ttl);
        info!(
            resource = %self.resource,
            held = table.len(),
            limit = self.limit,
            "Permit acquired"
        );

        Ok(Some(Token::new(self.kind(), &self.resource, permit)))
    }

    async fn release(&self, token: &Token) -> AppResult<()> {
        token.ensure_issued_by(self.kind(), &self.resource)?;
        let mut table = self.permits.lock().await;

        if table.remove(&token.permit).is_some() {
            info!(resource = %self.resource, held = table.len(), "Permit released");
        } else {
            warn!(
                resource = %self.resource,
                token_id = %token.id(),
                "Attempted to release permit that is not held"
            );
        }

        Ok(())
    }

    async fn refresh(&self, token: &Token, ttl: Option<Duration>) -> AppResult<Token> {
        token.ensure_issued_by(self.kind(), &self.resource)?;
        let mut table = self.permits.lock().await;
        let now = Instant::now();
        Self::purge_expired(&mut table, now);

        match table.get_mut(&token.permit) {
            Some(expires_at) => {
                *expires_at = now + ttl.unwrap_or(self.ttl);
                debug!(resource = %self.resource, token_id = %token.id(), "Permit refreshed");
                Ok(token.clone())
            }
            None => Err(AppError::lease_expired(format!(
                "Permit on '{}' is no longer held",
                self.resource
            ))),
        }
    }

    async fn remaining_lifetime(&self, token: &Token) -> AppResult<Option<Duration>> {
        token.ensure_issued_by(self.kind(), &self.resource)?;
        let table = self.permits.lock().await;
        let now = Instant::now();

        Ok(table
            .get(&token.permit)
            .filter(|expires_at| **expires_at > now)
            .map(|expires_at| expires_at.duration_since(now)))
    }

    async fn available(&self) -> AppResult<u32> {
        let mut table = self.permits.lock().await;
        Self::purge_expired(&mut table, Instant::now());
        Ok(self.limit.saturating_sub(table.len() as u32))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use airlock_core::error::ErrorKind;

    fn seal(limit: u32) -> MemorySeal {
        MemorySeal::new("room", limit, Duration::from_secs(10))
    }

    #[tokio::test]
    async fn test_capacity_limit() {
        let seal = seal(2);
        let results = futures::future::join_all((0..3).map(|_| seal.try_acquire())).await;
        let granted = results
            .into_iter()
            .filter(|r| matches!(r, Ok(Some(_))))
            .count();
        assert_eq!(granted, 2);
        assert_eq!(seal.available().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_lock_kind() {
        let lock = seal(1);
        assert_eq!(lock.kind(), SealKind::Lock);
        let token = lock.try_acquire().await.unwrap().unwrap();
        assert_eq!(token.kind, SealKind::Lock);
        assert!(lock.try_acquire().await.unwrap().is_none());
        lock.release(&token).await.unwrap();
        assert!(lock.try_acquire().await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_release_is_idempotent() {
        let seal = seal(1);
        let token = seal.try_acquire().await.unwrap().unwrap();
        seal.release(&token).await.unwrap();
        seal.release(&token).await.unwrap();
        assert_eq!(seal.available().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_release_foreign_token_rejected() {
        let a = seal(1);
        let b = MemorySeal::new("other", 1, Duration::from_secs(10));
        let held = a.try_acquire().await.unwrap().unwrap();
        let foreign = b.try_acquire().await.unwrap().unwrap();

        let err = a.release(&foreign).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidTokenType);
        assert!(a.is_acquired(&held).await.unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn test_lease_expires() {
        let seal = seal(1);
        let token = seal.try_acquire().await.unwrap().unwrap();
        tokio::time::advance(Duration::from_secs(11)).await;

        assert!(seal.is_expired(&token).await.unwrap());
        assert!(seal.try_acquire().await.unwrap().is_some());
        let err = seal.refresh(&token, None).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::LeaseExpired);
    }

    #[tokio::test(start_paused = true)]
    async fn test_refresh_extends_lease() {
        let seal = seal(1);
        let token = seal.try_acquire().await.unwrap().unwrap();
        tokio::time::advance(Duration::from_secs(8)).await;

        let refreshed = seal
            .refresh(&token, Some(Duration::from_secs(20)))
            .await
            .unwrap();
        tokio::time::advance(Duration::from_secs(8)).await;

        assert!(seal.is_acquired(&refreshed).await.unwrap());
        let left = seal.remaining_lifetime(&refreshed).await.unwrap().unwrap();
        assert_eq!(left, Duration::from_secs(12));
    }
}
