//! Notifier transports and the runtime dispatcher between them.

pub mod broadcast;
pub mod log;
pub mod message;
#[cfg(feature = "redis-pubsub")]
pub mod redis_pubsub;

use async_trait::async_trait;
use tracing::info;

use airlock_core::config::store::StoreConfig;
use airlock_core::config::supervisor::NotifierConfig;
use airlock_core::error::AppError;
use airlock_core::result::AppResult;
use airlock_core::traits::{Notifier, PresenceProvider};

pub use broadcast::BroadcastNotifier;
pub use log::LogNotifier;
pub use message::Notification;
#[cfg(feature = "redis-pubsub")]
pub use redis_pubsub::RedisPubSubNotifier;

/// Dispatcher for notification transports.
///
/// Switches between in-process, Redis and log-only delivery based on
/// configuration.
#[derive(Debug, Clone)]
pub enum NotifierDispatch {
    /// In-process broadcast channels (single node).
    Broadcast(BroadcastNotifier),
    /// Redis PUBLISH (multi-node).
    #[cfg(feature = "redis-pubsub")]
    Redis(RedisPubSubNotifier),
    /// Log line only.
    Log(LogNotifier),
}

impl NotifierDispatch {
    /// Create the notifier selected by `config`. The Redis transport
    /// connects to the store's server.
    #[cfg_attr(not(feature = "redis-pubsub"), allow(unused_variables))]
    pub async fn new(config: &NotifierConfig, store: &StoreConfig) -> AppResult<Self> {
        let notifier = match config.kind.as_str() {
            "broadcast" => {
                info!(buffer = config.channel_buffer_size, "Initializing broadcast notifier");
                Self::Broadcast(BroadcastNotifier::new(config.channel_buffer_size))
            }
            #[cfg(feature = "redis-pubsub")]
            "redis" => {
                info!("Initializing Redis pub/sub notifier");
                Self::Redis(RedisPubSubNotifier::connect(&store.redis.url).await?)
            }
            "log" => {
                info!("Initializing log-only notifier");
                Self::Log(LogNotifier)
            }
            other => {
                return Err(AppError::configuration(format!(
                    "Unknown notifier kind: '{other}'. Supported: broadcast, redis, log"
                )));
            }
        };
        Ok(notifier)
    }

    /// The broadcast notifier, when that transport is active.
    pub fn as_broadcast(&self) -> Option<&BroadcastNotifier> {
        match self {
            Self::Broadcast(inner) => Some(inner),
            _ => None,
        }
    }
}

#[async_trait]
impl Notifier for NotifierDispatch {
    async fn notify(
        &self,
        identifier: &str,
        topic: &str,
        claim_nonce: Option<&str>,
    ) -> AppResult<()> {
        match self {
            Self::Broadcast(inner) => inner.notify(identifier, topic, claim_nonce).await,
            #[cfg(feature = "redis-pubsub")]
            Self::Redis(inner) => inner.notify(identifier, topic, claim_nonce).await,
            Self::Log(inner) => inner.notify(identifier, topic, claim_nonce).await,
        }
    }
}

/// Presence as seen by the active transport: a caller is connected while
/// something listens on its topic.
#[async_trait]
impl PresenceProvider for NotifierDispatch {
    async fn is_connected(&self, identifier: &str, topic: &str) -> AppResult<bool> {
        match self {
            Self::Broadcast(inner) => inner.is_connected(identifier, topic).await,
            #[cfg(feature = "redis-pubsub")]
            Self::Redis(inner) => inner.is_connected(identifier, topic).await,
            Self::Log(inner) => inner.is_connected(identifier, topic).await,
        }
    }
}
