//! Notifier that only writes a log line.

use async_trait::async_trait;
use tracing::info;

use airlock_core::result::AppResult;
use airlock_core::traits::{Notifier, PresenceProvider};

/// Logs each notification instead of delivering it.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(
        &self,
        identifier: &str,
        topic: &str,
        claim_nonce: Option<&str>,
    ) -> AppResult<()> {
        info!(
            identifier,
            topic,
            has_nonce = claim_nonce.is_some(),
            "Candidate notified"
        );
        Ok(())
    }
}

/// Nothing subscribes to a log, so every caller counts as connected.
#[async_trait]
impl PresenceProvider for LogNotifier {
    async fn is_connected(&self, _identifier: &str, _topic: &str) -> AppResult<bool> {
        Ok(true)
    }
}
