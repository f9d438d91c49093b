//! Airlock decorator that logs every call with its outcome and latency.

use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;
use tracing::{info, warn};

use airlock_core::result::AppResult;
use airlock_core::traits::Airlock;
use airlock_core::types::{AirlockCapabilities, ClaimResult, EntryResult, Token};

use super::ensure_capability;

/// Wraps an airlock and emits one structured log line per call.
#[derive(Debug, Clone)]
pub struct TracingAirlock<A> {
    inner: A,
    name: String,
}

impl<A: Airlock> TracingAirlock<A> {
    /// Wrap `inner`, tagging log lines with `name`.
    pub fn new(inner: A, name: impl Into<String>) -> Self {
        Self {
            inner,
            name: name.into(),
        }
    }

    /// The wrapped airlock.
    pub fn inner(&self) -> &A {
        &self.inner
    }

    fn record<T>(&self, op: &'static str, started: Instant, result: &AppResult<T>, outcome: &str) {
        let elapsed_ms = started.elapsed().as_millis() as u64;
        match result {
            Ok(_) => info!(airlock = %self.name, op, outcome, elapsed_ms, "Airlock call"),
            Err(e) => warn!(
                airlock = %self.name,
                op,
                error = %e,
                elapsed_ms,
                "Airlock call failed"
            ),
        }
    }
}

#[async_trait]
impl<A: Airlock> Airlock for TracingAirlock<A> {
    fn capabilities(&self) -> AirlockCapabilities {
        self.inner.capabilities()
    }

    fn topic(&self, identifier: &str) -> String {
        self.inner.topic(identifier)
    }

    async fn enter(&self, identifier: &str, priority: i32) -> AppResult<EntryResult> {
        let started = Instant::now();
        let result = self.inner.enter(identifier, priority).await;
        let outcome = match &result {
            Ok(EntryResult::Admitted { .. }) => "admitted".to_string(),
            Ok(EntryResult::Queued { position, .. }) => format!("queued:{position}"),
            Err(_) => "error".to_string(),
        };
        self.record("enter", started, &result, &outcome);
        result
    }

    async fn leave(&self, identifier: &str) -> AppResult<()> {
        let started = Instant::now();
        let result = self.inner.leave(identifier).await;
        self.record("leave", started, &result, "left");
        result
    }

    async fn release(&self, token: &Token) -> AppResult<()> {
        let started = Instant::now();
        let result = self.inner.release(token).await;
        self.record("release", started, &result, "released");
        result
    }

    async fn refresh(&self, token: &Token, ttl: Option<Duration>) -> AppResult<Token> {
        ensure_capability(self.inner.capabilities().refresh, "refresh")?;
        let started = Instant::now();
        let result = self.inner.refresh(token, ttl).await;
        self.record("refresh", started, &result, "refreshed");
        result
    }

    async fn claim(&self, identifier: &str, nonce: &str) -> AppResult<ClaimResult> {
        ensure_capability(self.inner.capabilities().claim, "claim")?;
        let started = Instant::now();
        let result = self.inner.claim(identifier, nonce).await;
        let outcome = result.as_ref().map(ClaimResult::label).unwrap_or("error");
        self.record("claim", started, &result, outcome);
        result
    }

    async fn position(&self, identifier: &str) -> AppResult<Option<u64>> {
        self.inner.position(identifier).await
    }
}

