//! Redis fixed-window rate-limiter seal.
//!
//! Windows are aligned to multiples of the window length since the unix
//! epoch, so every node agrees on the current window without coordination.

use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use airlock_core::error::AppError;
use airlock_core::keys;
use airlock_core::result::AppResult;
use airlock_core::traits::Seal;
use airlock_core::types::{SealCapabilities, SealKind, Token};

use super::client::{RedisClient, now_ms, ttl_ms};
use crate::nonce;

/// Lua script for counting one acquisition in the current window.
///
/// KEYS[1] = window counter
/// ARGV[1] = limit
/// ARGV[2] = window length (ms)
///
/// Returns 1 = granted, 0 = limit reached
const ACQUIRE_SCRIPT: &str = r#"
    local count = redis.call('INCR', KEYS[1])
    if count == 1 then
        redis.call('PEXPIRE', KEYS[1], ARGV[2])
    end
    if count > tonumber(ARGV[1]) then
        return 0
    end
    return 1
"#;

/// Redis-backed rate limiter.
#[derive(Debug, Clone)]
pub struct RedisRateLimiter {
    /// Redis client.
    client: RedisClient,
    /// Key of the protected pool.
    resource: String,
    /// Acquisitions allowed per window.
    limit: u32,
    /// Window length.
    window: Duration,
}

impl RedisRateLimiter {
    /// Creates a new Redis rate limiter.
    pub fn new(
        client: RedisClient,
        resource: impl Into<String>,
        limit: u32,
        window: Duration,
    ) -> Self {
        Self {
            client,
            resource: resource.into(),
            limit,
            window,
        }
    }

    fn window_ms(&self) -> i64 {
        ttl_ms(self.window) as i64
    }

    fn window_key(&self, index: i64) -> String {
        format!("{}:{index}", keys::rate_window(self.client.prefix(), &self.resource))
    }
}

#[async_trait]
impl Seal for RedisRateLimiter {
    fn kind(&self) -> SealKind {
        SealKind::RateLimiter
    }

    fn capabilities(&self) -> SealCapabilities {
        SealCapabilities::WINDOWED
    }

    fn resource(&self) -> &str {
        &self.resource
    }

    async fn try_acquire(&self) -> AppResult<Option<Token>> {
        let mut conn = self.client.conn();
        let index = now_ms() / self.window_ms();

        let granted: i64 = redis::Script::new(ACQUIRE_SCRIPT)
            .key(self.window_key(index))
            .arg(self.limit)
            .arg(self.window_ms())
            .invoke_async(&mut conn)
            .await?;

        if granted == 1 {
            let permit = format!("{index}:{}", nonce::permit_id());
            Ok(Some(Token::new(SealKind::RateLimiter, &self.resource, permit)))
        } else {
            debug!(resource = %self.resource, "Rate limit reached for window");
            Ok(None)
        }
    }

    async fn release(&self, _token: &Token) -> AppResult<()> {
        Err(AppError::unsupported(
            "Rate-limiter permits cannot be released",
        ))
    }

    async fn refresh(&self, _token: &Token, _ttl: Option<Duration>) -> AppResult<Token> {
        Err(AppError::unsupported(
            "Rate-limiter permits cannot be refreshed",
        ))
    }

    async fn remaining_lifetime(&self, token: &Token) -> AppResult<Option<Duration>> {
        token.ensure_issued_by(SealKind::RateLimiter, &self.resource)?;
        let index: Option<i64> = token
            .permit
            .split_once(':')
            .and_then(|(index, _)| index.parse().ok());

        let now = now_ms();
        let window = self.window_ms();
        Ok(index
            .filter(|index| *index == now / window)
            .map(|index| (index + 1) * window - now)
            .map(|left| Duration::from_millis(left as u64)))
    }

    async fn available(&self) -> AppResult<u32> {
        let mut conn = self.client.conn();
        let index = now_ms() / self.window_ms();
        let used: Option<u32> = redis::cmd("GET")
            .arg(self.window_key(index))
            .query_async(&mut conn)
            .await?;
        Ok(self.limit.saturating_sub(used.unwrap_or(0)))
    }
}
