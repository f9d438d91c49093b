//! Presence tracker: which identifiers are listening on which topics.

use std::collections::HashSet;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tracing::debug;

use airlock_core::result::AppResult;
use airlock_core::traits::PresenceProvider;

/// One live subscription.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Connection {
    /// Topic the identifier listens on.
    pub topic: String,
    /// When the subscription was opened.
    pub connected_at: DateTime<Utc>,
}

/// Tracks live topic subscriptions for all identifiers.
///
/// The transport layer calls [`connect`](Self::connect) and
/// [`disconnect`](Self::disconnect) as subscriptions open and close; the
/// supervisor reads it through [`PresenceProvider`].
#[derive(Debug, Default)]
pub struct PresenceTracker {
    /// Identifier → open subscriptions
    connections: DashMap<String, Vec<Connection>>,
}

impl PresenceTracker {
    /// Create a new presence tracker
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a subscription of `identifier` on `topic`.
    pub fn connect(&self, identifier: &str, topic: &str) {
        let mut entry = self.connections.entry(identifier.to_string()).or_default();
        if !entry.iter().any(|c| c.topic == topic) {
            entry.push(Connection {
                topic: topic.to_string(),
                connected_at: Utc::now(),
            });
        }
        debug!(identifier, topic, "Presence connected");
    }

    /// Drop a subscription.
    pub fn disconnect(&self, identifier: &str, topic: &str) {
        if let Some(mut entry) = self.connections.get_mut(identifier) {
            entry.retain(|c| c.topic != topic);
            if entry.is_empty() {
                drop(entry);
                self.connections.remove(identifier);
            }
        }
        debug!(identifier, topic, "Presence disconnected");
    }

    /// Drop every subscription of `identifier`.
    pub fn disconnect_all(&self, identifier: &str) -> HashSet<String> {
        self.connections
            .remove(identifier)
            .map(|(_, conns)| conns.into_iter().map(|c| c.topic).collect())
            .unwrap_or_default()
    }

    /// Check if an identifier is listening on `topic`
    pub fn is_online(&self, identifier: &str, topic: &str) -> bool {
        self.connections
            .get(identifier)
            .is_some_and(|conns| conns.iter().any(|c| c.topic == topic))
    }

    /// Open subscriptions of an identifier.
    pub fn connections(&self, identifier: &str) -> Vec<Connection> {
        self.connections
            .get(identifier)
            .map(|r| r.value().clone())
            .unwrap_or_default()
    }

    /// Number of identifiers with at least one subscription
    pub fn online_count(&self) -> usize {
        self.connections.len()
    }
}

#[async_trait]
impl PresenceProvider for PresenceTracker {
    async fn is_connected(&self, identifier: &str, topic: &str) -> AppResult<bool> {
        Ok(self.is_online(identifier, topic))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_connect_disconnect() {
        let tracker = PresenceTracker::new();
        tracker.connect("A", "room/A");
        tracker.connect("A", "room/A");
        assert!(tracker.is_connected("A", "room/A").await.unwrap());
        assert!(!tracker.is_connected("A", "other/A").await.unwrap());
        assert_eq!(tracker.connections("A").len(), 1);

        tracker.disconnect("A", "room/A");
        assert!(!tracker.is_connected("A", "room/A").await.unwrap());
        assert_eq!(tracker.online_count(), 0);
    }

    #[test]
    fn test_disconnect_all() {
        let tracker = PresenceTracker::new();
        tracker.connect("A", "room/A");
        tracker.connect("A", "lobby/A");
        tracker.connect("B", "room/B");

        let topics = tracker.disconnect_all("A");
        assert_eq!(topics.len(), 2);
        assert!(!tracker.is_online("A", "lobby/A"));
        assert_eq!(tracker.online_count(), 1);
    }
}
