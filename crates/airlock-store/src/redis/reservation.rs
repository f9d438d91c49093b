//! Redis reservation store.

use std::time::Duration;

use async_trait::async_trait;
use redis::AsyncCommands;
use tracing::debug;

use airlock_core::keys;
use airlock_core::result::AppResult;
use airlock_core::traits::ReservationStore;

use super::client::{RedisClient, ttl_ms};
use crate::nonce;

/// Lua script for atomic compare-and-delete of a claim nonce.
///
/// KEYS[1] = reservation key
/// ARGV[1] = presented nonce
///
/// Returns 1 = consumed, 0 = missing or mismatched
const CONSUME_SCRIPT: &str = r#"
    if redis.call('GET', KEYS[1]) == ARGV[1] then
        redis.call('DEL', KEYS[1])
        return 1
    end
    return 0
"#;

/// Redis-backed claim reservations shared across nodes.
#[derive(Debug, Clone)]
pub struct RedisReservationStore {
    client: RedisClient,
    prefix: String,
}

impl RedisReservationStore {
    /// Creates a reservation store whose keys start with `prefix`.
    pub fn new(client: RedisClient, prefix: impl Into<String>) -> Self {
        Self {
            client,
            prefix: prefix.into(),
        }
    }

    fn key(&self, identifier: &str) -> String {
        keys::reservation(&self.prefix, identifier)
    }
}

#[async_trait]
impl ReservationStore for RedisReservationStore {
    async fn reserve(&self, identifier: &str, ttl: Duration) -> AppResult<String> {
        let nonce = nonce::generate();
        let mut conn = self.client.conn();
        let _: () = conn
            .pset_ex(self.key(identifier), &nonce, ttl_ms(ttl))
            .await?;
        debug!(identifier, ttl_ms = ttl_ms(ttl), "Reservation issued");
        Ok(nonce)
    }

    async fn is_reserved_for(&self, identifier: &str, presented: &str) -> AppResult<bool> {
        Ok(self
            .nonce(identifier)
            .await?
            .is_some_and(|stored| nonce::matches(&stored, presented)))
    }

    async fn consume(&self, identifier: &str, presented: &str) -> AppResult<bool> {
        let mut conn = self.client.conn();
        let consumed: i64 = redis::Script::new(CONSUME_SCRIPT)
            .key(self.key(identifier))
            .arg(presented)
            .invoke_async(&mut conn)
            .await?;
        Ok(consumed == 1)
    }

    async fn nonce(&self, identifier: &str) -> AppResult<Option<String>> {
        let mut conn = self.client.conn();
        let stored: Option<String> = conn.get(self.key(identifier)).await?;
        Ok(stored)
    }

    async fn clear(&self, identifier: &str) -> AppResult<()> {
        let mut conn = self.client.conn();
        let _: () = conn.del(self.key(identifier)).await?;
        Ok(())
    }
}
