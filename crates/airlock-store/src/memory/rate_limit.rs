//! In-memory fixed-window rate-limiter seal.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

use airlock_core::error::AppError;
use airlock_core::result::AppResult;
use airlock_core::traits::Seal;
use airlock_core::types::{SealCapabilities, SealKind, Token};

use crate::nonce;

#[derive(Debug)]
struct Window {
    /// Sequence number of the current window.
    index: u64,
    /// When the current window opened.
    opened_at: Instant,
    /// Permits handed out in the current window.
    issued: u32,
}

/// Admits at most `limit` acquisitions per window. Permits cannot be
/// returned or extended; they lapse when the window closes.
#[derive(Debug, Clone)]
pub struct MemoryRateLimiter {
    /// Key of the protected pool.
    resource: String,
    /// Acquisitions allowed per window.
    limit: u32,
    /// Window length.
    window: Duration,
    /// Current window state.
    state: Arc<Mutex<Window>>,
}

impl MemoryRateLimiter {
    /// Creates a new in-memory rate limiter.
    pub fn new(resource: impl Into<String>, limit: u32, window: Duration) -> Self {
        Self {
            resource: resource.into(),
            limit,
            window,
            state: Arc::new(Mutex::new(Window {
                index: 0,
                opened_at: Instant::now(),
                issued: 0,
            })),
        }
    }

    fn roll(&self, state: &mut Window, now: Instant) {
        if now.duration_since(state.opened_at) >= self.window {
            state.index += 1;
            state.opened_at = now;
            state.issued = 0;
        }
    }

    fn window_of(token: &Token) -> Option<u64> {
        token.permit.split_once(':')?.0.parse().ok()
    }
}

#[async_trait]
impl Seal for MemoryRateLimiter {
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
        let mut state = self.state.lock().await;
        self.roll(&mut state, Instant::now());

        if state.issued >= self.limit {
            debug!(resource = %self.resource, "Rate limit reached for window");
            return Ok(None);
        }
        state.issued += 1;

        let permit = format!("{}:{}", state.index, nonce::permit_id());
        Ok(Some(Token::new(SealKind::RateLimiter, &self.resource, permit)))
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
        let mut state = self.state.lock().await;
        let now = Instant::now();
        self.roll(&mut state, now);

        if Self::window_of(token) != Some(state.index) {
            return Ok(None);
        }
        Ok(Some(self.window.saturating_sub(now.duration_since(state.opened_at))))
    }

    async fn available(&self) -> AppResult<u32> {
        let mut state = self.state.lock().await;
        self.roll(&mut state, Instant::now());
        Ok(self.limit.saturating_sub(state.issued))
    }
}
