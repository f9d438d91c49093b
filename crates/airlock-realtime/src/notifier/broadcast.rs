//! In-memory notifier for single-node deployments.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tokio::sync::broadcast;
use tracing::debug;

use airlock_core::result::AppResult;
use airlock_core::traits::{Notifier, PresenceProvider};

use super::message::Notification;

/// Topic → broadcast sender.
type Channels = HashMap<String, broadcast::Sender<Notification>>;

/// In-memory pub/sub notifier.
///
/// Each topic gets its own broadcast channel on first subscription.
/// Notifications to a topic nobody listens on are dropped.
#[derive(Debug, Clone)]
pub struct BroadcastNotifier {
    channels: Arc<RwLock<Channels>>,
    /// Buffer size for channels
    buffer_size: usize,
}

impl BroadcastNotifier {
    /// Create a new in-memory notifier
    pub fn new(buffer_size: usize) -> Self {
        Self {
            channels: Arc::new(RwLock::new(HashMap::new())),
            buffer_size: buffer_size.max(1),
        }
    }

    /// Subscribe to a topic, returns a receiver
    pub async fn subscribe(&self, topic: &str) -> broadcast::Receiver<Notification> {
        let mut channels = self.channels.write().await;
        let tx = channels
            .entry(topic.to_string())
            .or_insert_with(|| broadcast::channel(self.buffer_size).0);
        tx.subscribe()
    }

    /// Live receivers on a topic.
    pub async fn subscriber_count(&self, topic: &str) -> usize {
        self.channels
            .read()
            .await
            .get(topic)
            .map(|tx| tx.receiver_count())
            .unwrap_or(0)
    }

    /// Drop channels whose receivers are all gone.
    pub async fn prune(&self) -> usize {
        let mut channels = self.channels.write().await;
        let before = channels.len();
        channels.retain(|_, tx| tx.receiver_count() > 0);
        before - channels.len()
    }
}

#[async_trait]
impl Notifier for BroadcastNotifier {
    async fn notify(
        &self,
        identifier: &str,
        topic: &str,
        claim_nonce: Option<&str>,
    ) -> AppResult<()> {
        let channels = self.channels.read().await;
        match channels.get(topic) {
            Some(tx) => {
                let delivered = tx
                    .send(Notification::new(identifier, topic, claim_nonce))
                    .unwrap_or(0);
                debug!(identifier, topic, delivered, "Notification broadcast");
            }
            None => debug!(identifier, topic, "No subscribers on topic"),
        }
        Ok(())
    }
}

/// A caller is present while at least one receiver is open on its topic.
#[async_trait]
impl PresenceProvider for BroadcastNotifier {
    async fn is_connected(&self, _identifier: &str, topic: &str) -> AppResult<bool> {
        Ok(self.subscriber_count(topic).await > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_subscriber_receives_nonce() {
        let notifier = BroadcastNotifier::new(8);
        let mut rx = notifier.subscribe("room/B").await;

        notifier.notify("B", "room/B", Some("n-1")).await.unwrap();
        let received = rx.recv().await.unwrap();
        assert_eq!(received.identifier, "B");
        assert_eq!(received.claim_nonce.as_deref(), Some("n-1"));
    }

    #[tokio::test]
    async fn test_unheard_topic_is_not_an_error() {
        let notifier = BroadcastNotifier::new(8);
        notifier.notify("A", "room/A", None).await.unwrap();
        assert_eq!(notifier.subscriber_count("room/A").await, 0);
    }

    #[tokio::test]
    async fn test_prune_drops_abandoned_topics() {
        let notifier = BroadcastNotifier::new(8);
        let rx = notifier.subscribe("room/A").await;
        let _kept = notifier.subscribe("room/B").await;
        assert_eq!(notifier.subscriber_count("room/A").await, 1);

        drop(rx);
        assert_eq!(notifier.prune().await, 1);
        assert_eq!(notifier.subscriber_count("room/B").await, 1);
    }

    #[tokio::test]
    async fn test_presence_follows_receivers() {
        let notifier = BroadcastNotifier::new(8);
        assert!(!notifier.is_connected("A", "room/A").await.unwrap());

        let rx = notifier.subscribe("room/A").await;
        assert!(notifier.is_connected("A", "room/A").await.unwrap());
        assert!(!notifier.is_connected("B", "room/B").await.unwrap());

        drop(rx);
        assert!(!notifier.is_connected("A", "room/A").await.unwrap());
    }
}
