//! Redis pub/sub notifier for multi-node deployments.

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use tracing::{debug, info};

use airlock_core::error::{AppError, ErrorKind};
use airlock_core::result::AppResult;
use airlock_core::traits::{Notifier, PresenceProvider};

use super::message::Notification;

/// Publishes notifications as JSON on a Redis channel named after the topic.
#[derive(Clone)]
pub struct RedisPubSubNotifier {
    conn: ConnectionManager,
}

impl std::fmt::Debug for RedisPubSubNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisPubSubNotifier").finish_non_exhaustive()
    }
}

impl RedisPubSubNotifier {
    /// Connect to the Redis server at `url`.
    pub async fn connect(url: &str) -> AppResult<Self> {
        let client = redis::Client::open(url).map_err(|e| {
            AppError::with_source(ErrorKind::Store, "Redis pub/sub connection failed", e)
        })?;
        let conn = ConnectionManager::new(client).await.map_err(|e| {
            AppError::with_source(ErrorKind::Store, "Redis pub/sub connection failed", e)
        })?;
        info!("Redis pub/sub notifier connected");
        Ok(Self { conn })
    }
}

#[async_trait]
impl Notifier for RedisPubSubNotifier {
    async fn notify(
        &self,
        identifier: &str,
        topic: &str,
        claim_nonce: Option<&str>,
    ) -> AppResult<()> {
        let payload = serde_json::to_string(&Notification::new(identifier, topic, claim_nonce))?;
        let mut conn = self.conn.clone();

        let receivers: i64 = redis::cmd("PUBLISH")
            .arg(topic)
            .arg(payload)
            .query_async(&mut conn)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Store, "Redis PUBLISH failed", e))?;

        debug!(identifier, topic, receivers, "Notification published");
        Ok(())
    }
}

/// A caller is present while some client is subscribed to its topic
/// channel (`PUBSUB NUMSUB`).
#[async_trait]
impl PresenceProvider for RedisPubSubNotifier {
    async fn is_connected(&self, _identifier: &str, topic: &str) -> AppResult<bool> {
        let mut conn = self.conn.clone();
        let (_, subscribers): (String, i64) = redis::cmd("PUBSUB")
            .arg("NUMSUB")
            .arg(topic)
            .query_async(&mut conn)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Store, "Redis PUBSUB NUMSUB failed", e)
            })?;
        Ok(subscribers > 0)
    }
}
