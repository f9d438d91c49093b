//! In-memory lottery queue storage.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rand::seq::IteratorRandom;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

use airlock_core::result::AppResult;
use airlock_core::traits::LotteryStorage;

#[derive(Debug, Default)]
struct LotteryState {
    pool: HashSet<String>,
    /// Elected candidate and the end of its claim window.
    candidate: Option<(String, Instant)>,
}

impl LotteryState {
    /// The candidate if its window is open and it is still in the pool.
    fn live_candidate(&self, now: Instant) -> Option<&str> {
        self.candidate
            .as_ref()
            .filter(|(id, expires_at)| *expires_at > now && self.pool.contains(id))
            .map(|(id, _)| id.as_str())
    }
}

/// In-memory lottery storage guarded by a single mutex.
#[derive(Debug, Clone, Default)]
pub struct MemoryLotteryStorage {
    state: Arc<Mutex<LotteryState>>,
}

impl MemoryLotteryStorage {
    /// Creates an empty lottery storage.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LotteryStorage for MemoryLotteryStorage {
    async fn add(&self, identifier: &str) -> AppResult<u64> {
        let mut state = self.state.lock().await;
        state.pool.insert(identifier.to_string());
        if state.live_candidate(Instant::now()) == Some(identifier) {
            return Ok(1);
        }
        Ok(state.pool.len() as u64)
    }

    async fn remove(&self, identifier: &str) -> AppResult<()> {
        let mut state = self.state.lock().await;
        state.pool.remove(identifier);
        if state
            .candidate
            .as_ref()
            .is_some_and(|(id, _)| id == identifier)
        {
            state.candidate = None;
        }
        Ok(())
    }

    async fn peek(&self, candidate_ttl: Duration) -> AppResult<Option<String>> {
        let mut state = self.state.lock().await;
        let now = Instant::now();

        if let Some(current) = state.live_candidate(now) {
            return Ok(Some(current.to_string()));
        }

        let elected = state.pool.iter().choose(&mut rand::thread_rng()).cloned();
        match elected {
            Some(id) => {
                debug!(candidate = %id, "Elected lottery candidate");
                state.candidate = Some((id.clone(), now + candidate_ttl));
                Ok(Some(id))
            }
            None => {
                state.candidate = None;
                Ok(None)
            }
        }
    }

    async fn position(&self, identifier: &str) -> AppResult<Option<u64>> {
        let state = self.state.lock().await;
        if !state.pool.contains(identifier) {
            return Ok(None);
        }
        if state.live_candidate(Instant::now()) == Some(identifier) {
            return Ok(Some(1));
        }
        Ok(Some(state.pool.len() as u64))
    }

    async fn all(&self) -> AppResult<Vec<String>> {
        Ok(self.state.lock().await.pool.iter().cloned().collect())
    }

    async fn len(&self) -> AppResult<u64> {
        Ok(self.state.lock().await.pool.len() as u64)
    }

    async fn purge(&self) -> AppResult<()> {
        let mut state = self.state.lock().await;
        state.pool.clear();
        state.candidate = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WINDOW: Duration = Duration::from_secs(30);

    async fn filled() -> MemoryLotteryStorage {
        let storage = MemoryLotteryStorage::new();
        for id in ["A", "B", "C"] {
            storage.add(id).await.unwrap();
        }
        storage
    }

    #[tokio::test]
    async fn test_candidate_is_sticky() {
        let storage = filled().await;
        let candidate = storage.peek(WINDOW).await.unwrap().unwrap();
        for _ in 0..10 {
            assert_eq!(storage.peek(WINDOW).await.unwrap().unwrap(), candidate);
        }
        assert_eq!(storage.position(&candidate).await.unwrap(), Some(1));
        assert_eq!(storage.add(&candidate).await.unwrap(), 1);

        let other = ["A", "B", "C"]
            .into_iter()
            .find(|id| *id != candidate)
            .unwrap();
        assert_eq!(storage.position(other).await.unwrap(), Some(3));
    }

    #[tokio::test]
    async fn test_remove_candidate_rerolls() {
        let storage = filled().await;
        let first = storage.peek(WINDOW).await.unwrap().unwrap();
        storage.remove(&first).await.unwrap();

        let second = storage.peek(WINDOW).await.unwrap().unwrap();
        assert_ne!(first, second);
        assert_eq!(storage.position(&first).await.unwrap(), None);
        assert_eq!(storage.len().await.unwrap(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_candidate_window_lapses() {
        let storage = MemoryLotteryStorage::new();
        storage.add("A").await.unwrap();
        storage.peek(WINDOW).await.unwrap();
        assert_eq!(storage.position("A").await.unwrap(), Some(1));

        tokio::time::advance(WINDOW).await;
        storage.add("B").await.unwrap();
        assert_eq!(storage.position("A").await.unwrap(), Some(2));

        let next = storage.peek(WINDOW).await.unwrap().unwrap();
        assert_eq!(storage.position(&next).await.unwrap(), Some(1));
    }

    #[tokio::test]
    async fn test_empty_pool() {
        let storage = MemoryLotteryStorage::new();
        assert_eq!(storage.peek(WINDOW).await.unwrap(), None);
        assert_eq!(storage.position("nobody").await.unwrap(), None);
    }
}
