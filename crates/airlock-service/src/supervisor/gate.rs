//! Availability gates consulted before a candidate is notified.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use airlock_core::result::AppResult;
use airlock_core::traits::Seal;

/// Answers "is there actually a free slot right now".
///
/// When a gate says no, the supervisor skips the tick without notifying
/// or evicting anyone.
#[async_trait]
pub trait AvailabilityGate: Send + Sync + fmt::Debug + 'static {
    /// Whether a notified candidate could take a permit now.
    async fn is_available(&self) -> AppResult<bool>;
}

/// Gate backed by a plain closure.
pub struct FnGate<F> {
    check: F,
}

impl<F> FnGate<F>
where
    F: Fn() -> bool + Send + Sync + 'static,
{
    /// Wrap `check`.
    pub fn new(check: F) -> Self {
        Self { check }
    }
}

impl<F> fmt::Debug for FnGate<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnGate").finish_non_exhaustive()
    }
}

#[async_trait]
impl<F> AvailabilityGate for FnGate<F>
where
    F: Fn() -> bool + Send + Sync + 'static,
{
    async fn is_available(&self) -> AppResult<bool> {
        Ok((self.check)())
    }
}

/// Open while the seal reports at least one free permit.
#[derive(Debug, Clone)]
pub struct SealCapacityGate {
    seal: Arc<dyn Seal>,
}

impl SealCapacityGate {
    /// Gate on `seal`'s free capacity.
    pub fn new(seal: Arc<dyn Seal>) -> Self {
        Self { seal }
    }
}

#[async_trait]
impl AvailabilityGate for SealCapacityGate {
    async fn is_available(&self) -> AppResult<bool> {
        Ok(self.seal.available().await? > 0)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;

    use airlock_store::memory::MemorySeal;

    use super::*;

    #[tokio::test]
    async fn test_fn_gate() {
        let open = Arc::new(AtomicBool::new(false));
        let flag = open.clone();
        let gate = FnGate::new(move || flag.load(Ordering::SeqCst));

        assert!(!gate.is_available().await.unwrap());
        open.store(true, Ordering::SeqCst);
        assert!(gate.is_available().await.unwrap());
    }

    #[tokio::test]
    async fn test_seal_capacity_gate() {
        let seal = Arc::new(MemorySeal::new("room", 1, Duration::from_secs(60)));
        let gate = SealCapacityGate::new(seal.clone());
        assert!(gate.is_available().await.unwrap());

        let token = seal.try_acquire().await.unwrap().unwrap();
        assert!(!gate.is_available().await.unwrap());

        seal.release(&token).await.unwrap();
        assert!(gate.is_available().await.unwrap());
    }
}
