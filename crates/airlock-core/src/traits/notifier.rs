//! Ports to the external notification and presence transports.

use async_trait::async_trait;

use crate::result::AppResult;

/// Delivers "your turn" events.
///
/// Delivery is best effort. Callers in this workspace log and swallow the
/// returned error; correctness rests on the claim window and polling.
#[async_trait]
pub trait Notifier: Send + Sync + std::fmt::Debug + 'static {
    /// Push a notification to `topic`, optionally carrying a claim nonce.
    async fn notify(&self, identifier: &str, topic: &str, claim_nonce: Option<&str>)
    -> AppResult<()>;
}

/// Answers whether an identifier is still listening on its topic.
///
/// Callers treat an error as "connected" so a transport outage does not
/// evict the whole queue.
#[async_trait]
pub trait PresenceProvider: Send + Sync + std::fmt::Debug + 'static {
    /// Whether `identifier` has a live subscription on `topic`.
    async fn is_connected(&self, identifier: &str, topic: &str) -> AppResult<bool>;
}
