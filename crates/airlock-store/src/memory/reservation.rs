//! In-memory reservation store.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

use airlock_core::result::AppResult;
use airlock_core::traits::ReservationStore;

use crate::nonce;

/// Identifier → (nonce, expiry).
type ReservationTable = HashMap<String, (String, Instant)>;

/// In-memory claim reservations for single-node deployments.
#[derive(Debug, Clone, Default)]
pub struct MemoryReservationStore {
    entries: Arc<Mutex<ReservationTable>>,
}

impl MemoryReservationStore {
    /// Creates an empty reservation store.
    pub fn new() -> Self {
        Self::default()
    }

    fn live<'a>(table: &'a ReservationTable, identifier: &str, now: Instant) -> Option<&'a str> {
        table
            .get(identifier)
            .filter(|(_, expires_at)| *expires_at > now)
            .map(|(nonce, _)| nonce.as_str())
    }
}

#[async_trait]
impl ReservationStore for MemoryReservationStore {
    async fn reserve(&self, identifier: &str, ttl: Duration) -> AppResult<String> {
        let nonce = nonce::generate();
        let mut table = self.entries.lock().await;
        let now = Instant::now();
        table.retain(|_, (_, expires_at)| *expires_at > now);
        table.insert(identifier.to_string(), (nonce.clone(), now + ttl));
        debug!(identifier, ttl_ms = ttl.as_millis() as u64, "Reservation issued");
        Ok(nonce)
    }

    async fn is_reserved_for(&self, identifier: &str, nonce: &str) -> AppResult<bool> {
        let table = self.entries.lock().await;
        Ok(Self::live(&table, identifier, Instant::now())
            .is_some_and(|stored| nonce::matches(stored, nonce)))
    }

    async fn consume(&self, identifier: &str, nonce: &str) -> AppResult<bool> {
        let mut table = self.entries.lock().await;
        let matched = Self::live(&table, identifier, Instant::now())
            .is_some_and(|stored| nonce::matches(stored, nonce));
        if matched {
            table.remove(identifier);
        }
        Ok(matched)
    }

    async fn nonce(&self, identifier: &str) -> AppResult<Option<String>> {
        let table = self.entries.lock().await;
        Ok(Self::live(&table, identifier, Instant::now()).map(str::to_string))
    }

    async fn clear(&self, identifier: &str) -> AppResult<()> {
        self.entries.lock().await.remove(identifier);
        Ok(())
    }
}
