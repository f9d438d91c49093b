//! Redis lock/semaphore seal using Lua scripts for atomicity.
//!
//! Live permits are members of a sorted set scored by their expiry in unix
//! milliseconds. Every script purges expired members first, so a crashed
//! holder frees its slot once its lease lapses.

use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, error, info, warn};

use airlock_core::error::{AppError, ErrorKind};
use airlock_core::keys;
use airlock_core::result::AppResult;
use airlock_core::traits::Seal;
use airlock_core::types::{SealCapabilities, SealKind, Token};

use super::client::{RedisClient, now_ms, ttl_ms};
use crate::nonce;

/// Lua script for atomic permit acquisition.
///
/// KEYS[1] = permit sorted set
/// ARGV[1] = now (ms)
/// ARGV[2] = expiry of the new permit (ms)
/// ARGV[3] = limit
/// ARGV[4] = permit id
///
/// Returns 1 = granted, 0 = full
const ACQUIRE_SCRIPT: &str = r#"
    local permits = KEYS[1]
    redis.call('ZREMRANGEBYSCORE', permits, '-inf', ARGV[1])

    if redis.call('ZCARD', permits) >= tonumber(ARGV[3]) then
        return 0
    end

    redis.call('ZADD', permits, ARGV[2], ARGV[4])
    local longest = redis.call('ZRANGE', permits, -1, -1, 'WITHSCORES')
    redis.call('PEXPIREAT', permits, longest[2])
    return 1
"#;

/// Lua script for atomic lease extension.
///
/// KEYS[1] = permit sorted set
/// ARGV[1] = now (ms)
/// ARGV[2] = permit id
/// ARGV[3] = new expiry (ms)
///
/// Returns 1 = extended, 0 = permit no longer held
const REFRESH_SCRIPT: &str = r#"
    local permits = KEYS[1]
    redis.call('ZREMRANGEBYSCORE', permits, '-inf', ARGV[1])

    if not redis.call('ZSCORE', permits, ARGV[2]) then
        return 0
    end

    redis.call('ZADD', permits, 'XX', ARGV[3], ARGV[2])
    local longest = redis.call('ZRANGE', permits, -1, -1, 'WITHSCORES')
    redis.call('PEXPIREAT', permits, longest[2])
    return 1
"#;

/// Lua script for atomic permit release.
const RELEASE_SCRIPT: &str = r#"
    return redis.call('ZREM', KEYS[1], ARGV[1])
"#;

/// Redis-backed leased permit pool for multi-node deployments.
#[derive(Debug, Clone)]
pub struct RedisSeal {
    /// Redis client.
    client: RedisClient,
    /// Key of the protected pool.
    resource: String,
    /// Full key of the permit sorted set.
    key: String,
    /// Maximum concurrently held permits.
    limit: u32,
    /// Default lease length.
    ttl: Duration,
}

impl RedisSeal {
    /// Creates a new Redis seal.
    pub fn new(
        client: RedisClient,
        resource: impl Into<String>,
        limit: u32,
        ttl: Duration,
    ) -> Self {
        let resource = resource.into();
        let key = keys::seal_permits(client.prefix(), &resource);
        Self {
            client,
            resource,
            key,
            limit: limit.max(1),
            ttl,
        }
    }
}

#[async_trait]
impl Seal for RedisSeal {
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
        let mut conn = self.client.conn();
        let permit = nonce::permit_id();
        let now = now_ms();

        let result: i64 = redis::Script::new(ACQUIRE_SCRIPT)
            .key(&self.key)
            .arg(now)
            .arg(now + ttl_ms(self.ttl) as i64)
            .arg(self.limit)
            .arg(&permit)
            .invoke_async(&mut conn)
            .await?;

        match result {
            1 => {
                info!(resource = %self.resource, "Permit acquired via Redis");
                Ok(Some(Token::new(self.kind(), &self.resource, permit)))
            }
            0 => {
                debug!(resource = %self.resource, "Seal full");
                Ok(None)
            }
            other => {
                error!(result = other, "Unexpected Lua script result");
                Err(AppError::internal(format!(
                    "Unexpected permit acquisition result: {other}"
                )))
            }
        }
    }

    async fn release(&self, token: &Token) -> AppResult<()> {
        token.ensure_issued_by(self.kind(), &self.resource)?;
        let mut conn = self.client.conn();

        let removed: i64 = redis::Script::new(RELEASE_SCRIPT)
            .key(&self.key)
            .arg(&token.permit)
            .invoke_async(&mut conn)
            .await
            .map_err(|e| {
                AppError::with_source(
                    ErrorKind::SealReleasingFailure,
                    format!("Failed to release permit on '{}'", self.resource),
                    e,
                )
            })?;

        if removed > 0 {
            info!(resource = %self.resource, "Permit released via Redis");
        } else {
            warn!(
                resource = %self.resource,
                token_id = %token.id(),
                "Permit release: permit was not held"
            );
        }
        Ok(())
    }

    async fn refresh(&self, token: &Token, ttl: Option<Duration>) -> AppResult<Token> {
        token.ensure_issued_by(self.kind(), &self.resource)?;
        let mut conn = self.client.conn();
        let now = now_ms();
        let ttl = ttl.unwrap_or(self.ttl);

        let extended: i64 = redis::Script::new(REFRESH_SCRIPT)
            .key(&self.key)
            .arg(now)
            .arg(&token.permit)
            .arg(now + ttl_ms(ttl) as i64)
            .invoke_async(&mut conn)
            .await?;

        if extended == 1 {
            debug!(resource = %self.resource, token_id = %token.id(), "Permit refreshed");
            Ok(token.clone())
        } else {
            Err(AppError::lease_expired(format!(
                "Permit on '{}' is no longer held",
                self.resource
            )))
        }
    }

    async fn remaining_lifetime(&self, token: &Token) -> AppResult<Option<Duration>> {
        token.ensure_issued_by(self.kind(), &self.resource)?;
        let mut conn = self.client.conn();

        let score: Option<f64> = redis::cmd("ZSCORE")
            .arg(&self.key)
            .arg(&token.permit)
            .query_async(&mut conn)
            .await?;

        let now = now_ms();
        Ok(score
            .map(|expires_at| expires_at as i64 - now)
            .filter(|left| *left > 0)
            .map(|left| Duration::from_millis(left as u64)))
    }

    async fn available(&self) -> AppResult<u32> {
        let mut conn = self.client.conn();
        let live: u32 = redis::cmd("ZCOUNT")
            .arg(&self.key)
            .arg(format!("({}", now_ms()))
            .arg("+inf")
            .query_async(&mut conn)
            .await?;
        Ok(self.limit.saturating_sub(live))
    }
}
