//! Redis FIFO queue storage.
//!
//! Layout: an ordered list `<prefix>:list` and a membership set
//! `<prefix>:set`. Membership checks and list mutations run together in
//! one script so two concurrent callers can never both believe they are
//! first.

use async_trait::async_trait;
use redis::AsyncCommands;

use airlock_core::keys;
use airlock_core::result::AppResult;
use airlock_core::traits::FifoStorage;

use super::client::RedisClient;

/// Append if new, locate if present, heal a marker with no list entry.
///
/// KEYS[1] = list, KEYS[2] = set, ARGV[1] = identifier
/// Returns the 1-indexed position.
const ADD_SCRIPT: &str = r#"
    local list, set, id = KEYS[1], KEYS[2], ARGV[1]

    if redis.call('SADD', set, id) == 1 then
        return redis.call('RPUSH', list, id)
    end

    local index = redis.call('LPOS', list, id)
    if index then
        return index + 1
    end

    return redis.call('RPUSH', list, id)
"#;

/// KEYS[1] = list, KEYS[2] = set, ARGV[1] = identifier
const REMOVE_SCRIPT: &str = r#"
    redis.call('LREM', KEYS[1], 0, ARGV[1])
    redis.call('SREM', KEYS[2], ARGV[1])
    return 1
"#;

/// KEYS[1] = list, KEYS[2] = set, ARGV[1] = identifier
/// Returns the 1-indexed position or nil.
const POSITION_SCRIPT: &str = r#"
    if redis.call('SISMEMBER', KEYS[2], ARGV[1]) == 0 then
        return false
    end

    local index = redis.call('LPOS', KEYS[1], ARGV[1])
    if index then
        return index + 1
    end
    return false
"#;

/// Redis-backed FIFO storage.
#[derive(Debug, Clone)]
pub struct RedisFifoStorage {
    client: RedisClient,
    list_key: String,
    set_key: String,
}

impl RedisFifoStorage {
    /// Creates a FIFO storage rooted at `prefix`.
    pub fn new(client: RedisClient, prefix: &str) -> Self {
        Self {
            client,
            list_key: keys::fifo_list(prefix),
            set_key: keys::fifo_set(prefix),
        }
    }
}

#[async_trait]
impl FifoStorage for RedisFifoStorage {
    async fn add(&self, identifier: &str) -> AppResult<u64> {
        let mut conn = self.client.conn();
        let position: u64 = redis::Script::new(ADD_SCRIPT)
            .key(&self.list_key)
            .key(&self.set_key)
            .arg(identifier)
            .invoke_async(&mut conn)
            .await?;
        Ok(position)
    }

    async fn remove(&self, identifier: &str) -> AppResult<()> {
        let mut conn = self.client.conn();
        let _: i64 = redis::Script::new(REMOVE_SCRIPT)
            .key(&self.list_key)
            .key(&self.set_key)
            .arg(identifier)
            .invoke_async(&mut conn)
            .await?;
        Ok(())
    }

    async fn peek(&self) -> AppResult<Option<String>> {
        let mut conn = self.client.conn();
        let head: Option<String> = conn.lindex(&self.list_key, 0).await?;
        Ok(head)
    }

    async fn position(&self, identifier: &str) -> AppResult<Option<u64>> {
        let mut conn = self.client.conn();
        let position: Option<u64> = redis::Script::new(POSITION_SCRIPT)
            .key(&self.list_key)
            .key(&self.set_key)
            .arg(identifier)
            .invoke_async(&mut conn)
            .await?;
        Ok(position)
    }

    async fn all(&self) -> AppResult<Vec<String>> {
        let mut conn = self.client.conn();
        let members: Vec<String> = conn.lrange(&self.list_key, 0, -1).await?;
        Ok(members)
    }

    async fn len(&self) -> AppResult<u64> {
        let mut conn = self.client.conn();
        let len: u64 = conn.llen(&self.list_key).await?;
        Ok(len)
    }

    async fn purge(&self) -> AppResult<()> {
        let mut conn = self.client.conn();
        let _: () = conn.del(&[&self.list_key, &self.set_key]).await?;
        Ok(())
    }
}
