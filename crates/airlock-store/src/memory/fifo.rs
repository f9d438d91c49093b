//! In-memory FIFO queue storage.

use std::collections::{HashSet, VecDeque};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::warn;

use airlock_core::result::AppResult;
use airlock_core::traits::FifoStorage;

/// Ordered sequence plus membership marker, mirroring the Redis layout.
#[derive(Debug, Default)]
struct FifoState {
    list: VecDeque<String>,
    set: HashSet<String>,
}

/// In-memory FIFO storage guarded by a single mutex.
#[derive(Debug, Clone, Default)]
pub struct MemoryFifoStorage {
    state: Arc<Mutex<FifoState>>,
}

impl MemoryFifoStorage {
    /// Creates an empty FIFO storage.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl FifoStorage for MemoryFifoStorage {
    async fn add(&self, identifier: &str) -> AppResult<u64> {
        let mut state = self.state.lock().await;

        if state.set.insert(identifier.to_string()) {
            state.list.push_back(identifier.to_string());
            return Ok(state.list.len() as u64);
        }

        if let Some(index) = state.list.iter().position(|id| id == identifier) {
            return Ok(index as u64 + 1);
        }

        warn!(identifier, "Queue member had no sequence entry, re-appending");
        state.list.push_back(identifier.to_string());
        Ok(state.list.len() as u64)
    }

    async fn remove(&self, identifier: &str) -> AppResult<()> {
        let mut state = self.state.lock().await;
        state.list.retain(|id| id != identifier);
        state.set.remove(identifier);
        Ok(())
    }

    async fn peek(&self) -> AppResult<Option<String>> {
        Ok(self.state.lock().await.list.front().cloned())
    }

    async fn position(&self, identifier: &str) -> AppResult<Option<u64>> {
        let state = self.state.lock().await;
        if !state.set.contains(identifier) {
            return Ok(None);
        }
        Ok(state
            .list
            .iter()
            .position(|id| id == identifier)
            .map(|index| index as u64 + 1))
    }

    async fn all(&self) -> AppResult<Vec<String>> {
        Ok(self.state.lock().await.list.iter().cloned().collect())
    }

    async fn len(&self) -> AppResult<u64> {
        Ok(self.state.lock().await.list.len() as u64)
    }

    async fn purge(&self) -> AppResult<()> {
        let mut state = self.state.lock().await;
        state.list.clear();
        state.set.clear();
        Ok(())
    }
}
