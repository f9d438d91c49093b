//! All-or-nothing acquisition across several seals.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};

use airlock_core::error::AppError;
use airlock_core::result::AppResult;
use airlock_core::traits::Seal;
use airlock_core::types::{SealCapabilities, SealKind, Token};

/// A seal that holds a permit only when every part grants one.
///
/// Parts are acquired in order. If a later part is full or fails, the parts
/// already taken are released again before returning.
#[derive(Debug, Clone)]
pub struct CompositeSeal {
    resource: String,
    parts: Vec<Arc<dyn Seal>>,
}

impl CompositeSeal {
    /// Creates a composite over `parts`, which must not be empty.
    pub fn new(resource: impl Into<String>, parts: Vec<Arc<dyn Seal>>) -> AppResult<Self> {
        if parts.is_empty() {
            return Err(AppError::validation(
                "A composite seal needs at least one part",
            ));
        }
        Ok(Self {
            resource: resource.into(),
            parts,
        })
    }

    /// The wrapped seals, in acquisition order.
    pub fn parts(&self) -> &[Arc<dyn Seal>] {
        &self.parts
    }

    /// Pair each part token with the seal that issued it.
    fn split<'a>(&'a self, token: &'a Token) -> AppResult<Vec<(&'a Arc<dyn Seal>, &'a Token)>> {
        token.ensure_issued_by(SealKind::Composite, &self.resource)?;
        if token.parts.len() != self.parts.len() {
            return Err(AppError::invalid_token(format!(
                "Composite token has {} parts, seal '{}' has {}",
                token.parts.len(),
                self.resource,
                self.parts.len()
            )));
        }
        Ok(self.parts.iter().zip(token.parts.iter()).collect())
    }

    async fn roll_back(&self, acquired: &[(&Arc<dyn Seal>, Token)]) {
        for (seal, token) in acquired.iter().rev() {
            if !seal.capabilities().releasable {
                debug!(resource = %seal.resource(), "Part is not releasable, leaving it to lapse");
                continue;
            }
            if let Err(e) = seal.release(token).await {
                warn!(
                    resource = %seal.resource(),
                    error = %e,
                    "Failed to roll back composite part"
                );
            }
        }
    }
}

#[async_trait]
impl Seal for CompositeSeal {
    fn kind(&self) -> SealKind {
        SealKind::Composite
    }

    fn capabilities(&self) -> SealCapabilities {
        let all = SealCapabilities {
            releasable: true,
            refreshable: true,
            requires_ttl: false,
        };
        self.parts
            .iter()
            .fold(all, |caps, part| caps.intersect(part.capabilities()))
    }

    fn resource(&self) -> &str {
        &self.resource
    }

    async fn try_acquire(&self) -> AppResult<Option<Token>> {
        let mut acquired: Vec<(&Arc<dyn Seal>, Token)> = Vec::with_capacity(self.parts.len());

        for seal in &self.parts {
            match seal.try_acquire().await {
                Ok(Some(token)) => acquired.push((seal, token)),
                Ok(None) => {
                    debug!(
                        resource = %self.resource,
                        part = %seal.resource(),
                        "Composite part full, rolling back"
                    );
                    self.roll_back(&acquired).await;
                    return Ok(None);
                }
                Err(e) => {
                    self.roll_back(&acquired).await;
                    return Err(e);
                }
            }
        }

        let parts = acquired.into_iter().map(|(_, token)| token).collect();
        Ok(Some(Token::composite(&self.resource, parts)))
    }

    async fn release(&self, token: &Token) -> AppResult<()> {
        if !self.capabilities().releasable {
            return Err(AppError::unsupported(format!(
                "Composite seal '{}' has a part that cannot be released",
                self.resource
            )));
        }
        for (seal, part) in self.split(token)? {
            seal.release(part).await?;
        }
        Ok(())
    }

    async fn refresh(&self, token: &Token, ttl: Option<Duration>) -> AppResult<Token> {
        if !self.capabilities().refreshable {
            return Err(AppError::unsupported(format!(
                "Composite seal '{}' has a part that cannot be refreshed",
                self.resource
            )));
        }
        let mut refreshed = Vec::with_capacity(self.parts.len());
        for (seal, part) in self.split(token)? {
            refreshed.push(seal.refresh(part, ttl).await?);
        }
        Ok(Token::composite(&self.resource, refreshed))
    }

    async fn remaining_lifetime(&self, token: &Token) -> AppResult<Option<Duration>> {
        let mut shortest: Option<Duration> = None;
        for (seal, part) in self.split(token)? {
            match seal.remaining_lifetime(part).await? {
                Some(left) => shortest = Some(shortest.map_or(left, |s| s.min(left))),
                None => return Ok(None),
            }
        }
        Ok(shortest)
    }

    async fn available(&self) -> AppResult<u32> {
        let mut fewest = u32::MAX;
        for seal in &self.parts {
            fewest = fewest.min(seal.available().await?);
        }
        Ok(fewest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{MemoryRateLimiter, MemorySeal};
    use airlock_core::error::ErrorKind;

    const TTL: Duration = Duration::from_secs(60);

    fn pair(a_limit: u32, b_limit: u32) -> (Arc<MemorySeal>, Arc<MemorySeal>, CompositeSeal) {
        let a = Arc::new(MemorySeal::new("a", a_limit, TTL));
        let b = Arc::new(MemorySeal::new("b", b_limit, TTL));
        let composite = CompositeSeal::new(
            "a+b",
            vec![a.clone() as Arc<dyn Seal>, b.clone() as Arc<dyn Seal>],
        )
        .unwrap();
        (a, b, composite)
    }

    #[tokio::test]
    async fn test_acquires_every_part() {
        let (a, b, composite) = pair(2, 2);
        let token = composite.try_acquire().await.unwrap().unwrap();
        assert_eq!(token.kind, SealKind::Composite);
        assert_eq!(token.parts.len(), 2);
        assert_eq!(a.available().await.unwrap(), 1);
        assert_eq!(b.available().await.unwrap(), 1);
        assert_eq!(composite.available().await.unwrap(), 1);

        composite.release(&token).await.unwrap();
        assert_eq!(a.available().await.unwrap(), 2);
        assert_eq!(b.available().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_rolls_back_on_partial_failure() {
        let (a, b, composite) = pair(2, 1);
        let held = b.try_acquire().await.unwrap().unwrap();

        assert!(composite.try_acquire().await.unwrap().is_none());
        assert_eq!(a.available().await.unwrap(), 2);

        b.release(&held).await.unwrap();
        assert!(composite.try_acquire().await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_capabilities_intersect() {
        let leased: Arc<dyn Seal> = Arc::new(MemorySeal::new("a", 1, TTL));
        let windowed: Arc<dyn Seal> = Arc::new(MemoryRateLimiter::new("r", 5, TTL));
        let composite = CompositeSeal::new("mixed", vec![leased, windowed]).unwrap();

        let caps = composite.capabilities();
        assert!(!caps.releasable);
        assert!(!caps.refreshable);
        assert!(caps.requires_ttl);

        let token = composite.try_acquire().await.unwrap().unwrap();
        let err = composite.release(&token).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Unsupported);
    }

    #[tokio::test]
    async fn test_rejects_foreign_token() {
        let (_, _, composite) = pair(1, 1);
        let foreign = Token::new(SealKind::Lock, "a", "p");
        let err = composite.release(&foreign).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidTokenType);
    }

    #[test]
    fn test_empty_is_rejected() {
        let err = CompositeSeal::new("none", Vec::new()).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
    }
}
