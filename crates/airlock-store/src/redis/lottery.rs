//! Redis lottery queue storage.
//!
//! Layout: a pool set `<prefix>:pool` and the elected candidate under
//! `<prefix>:pool:candidate`, which carries the claim window as its TTL.

use std::time::Duration;

use async_trait::async_trait;
use redis::AsyncCommands;

use airlock_core::keys;
use airlock_core::result::AppResult;
use airlock_core::traits::LotteryStorage;

use super::client::{RedisClient, ttl_ms};

/// KEYS[1] = pool, KEYS[2] = candidate, ARGV[1] = identifier
/// Returns 1 for the live candidate, otherwise the pool size.
const ADD_SCRIPT: &str = r#"
    redis.call('SADD', KEYS[1], ARGV[1])
    if redis.call('GET', KEYS[2]) == ARGV[1] then
        return 1
    end
    return redis.call('SCARD', KEYS[1])
"#;

/// KEYS[1] = pool, KEYS[2] = candidate, ARGV[1] = identifier
const REMOVE_SCRIPT: &str = r#"
    redis.call('SREM', KEYS[1], ARGV[1])
    if redis.call('GET', KEYS[2]) == ARGV[1] then
        redis.call('DEL', KEYS[2])
    end
    return 1
"#;

/// Returns the live candidate, electing a new one when none is held.
///
/// KEYS[1] = pool, KEYS[2] = candidate, ARGV[1] = claim window (ms)
const PEEK_SCRIPT: &str = r#"
    local current = redis.call('GET', KEYS[2])
    if current and redis.call('SISMEMBER', KEYS[1], current) == 1 then
        return current
    end

    local elected = redis.call('SRANDMEMBER', KEYS[1])
    if not elected then
        redis.call('DEL', KEYS[2])
        return false
    end

    redis.call('SET', KEYS[2], elected, 'PX', ARGV[1])
    return elected
"#;

/// KEYS[1] = pool, KEYS[2] = candidate, ARGV[1] = identifier
const POSITION_SCRIPT: &str = r#"
    if redis.call('SISMEMBER', KEYS[1], ARGV[1]) == 0 then
        return false
    end
    if redis.call('GET', KEYS[2]) == ARGV[1] then
        return 1
    end
    return redis.call('SCARD', KEYS[1])
"#;

/// Redis-backed lottery storage.
#[derive(Debug, Clone)]
pub struct RedisLotteryStorage {
    client: RedisClient,
    pool_key: String,
    candidate_key: String,
}

impl RedisLotteryStorage {
    /// Creates a lottery storage rooted at `prefix`.
    pub fn new(client: RedisClient, prefix: &str) -> Self {
        Self {
            client,
            pool_key: keys::lottery_pool(prefix),
            candidate_key: keys::lottery_candidate(prefix),
        }
    }
}

#[async_trait]
impl LotteryStorage for RedisLotteryStorage {
    async fn add(&self, identifier: &str) -> AppResult<u64> {
        let mut conn = self.client.conn();
        let position: u64 = redis::Script::new(ADD_SCRIPT)
            .key(&self.pool_key)
            .key(&self.candidate_key)
            .arg(identifier)
            .invoke_async(&mut conn)
            .await?;
        Ok(position)
    }

    async fn remove(&self, identifier: &str) -> AppResult<()> {
        let mut conn = self.client.conn();
        let _: i64 = redis::Script::new(REMOVE_SCRIPT)
            .key(&self.pool_key)
            .key(&self.candidate_key)
            .arg(identifier)
            .invoke_async(&mut conn)
            .await?;
        Ok(())
    }

    async fn peek(&self, candidate_ttl: Duration) -> AppResult<Option<String>> {
        let mut conn = self.client.conn();
        let candidate: Option<String> = redis::Script::new(PEEK_SCRIPT)
            .key(&self.pool_key)
            .key(&self.candidate_key)
            .arg(ttl_ms(candidate_ttl))
            .invoke_async(&mut conn)
            .await?;
        Ok(candidate)
    }

    async fn position(&self, identifier: &str) -> AppResult<Option<u64>> {
        let mut conn = self.client.conn();
        let position: Option<u64> = redis::Script::new(POSITION_SCRIPT)
            .key(&self.pool_key)
            .key(&self.candidate_key)
            .arg(identifier)
            .invoke_async(&mut conn)
            .await?;
        Ok(position)
    }

    async fn all(&self) -> AppResult<Vec<String>> {
        let mut conn = self.client.conn();
        let members: Vec<String> = conn.smembers(&self.pool_key).await?;
        Ok(members)
    }

    async fn len(&self) -> AppResult<u64> {
        let mut conn = self.client.conn();
        let len: u64 = conn.scard(&self.pool_key).await?;
        Ok(len)
    }

    async fn purge(&self) -> AppResult<()> {
        let mut conn = self.client.conn();
        let _: () = conn.del(&[&self.pool_key, &self.candidate_key]).await?;
        Ok(())
    }
}
