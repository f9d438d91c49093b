//! Store manager that builds seals, queues and reservations for the
//! configured backend.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tracing::info;

use airlock_core::config::queue::{QueueConfig, ReservationConfig};
use airlock_core::config::seal::SealConfig;
use airlock_core::config::store::StoreConfig;
use airlock_core::error::AppError;
use airlock_core::result::AppResult;
use airlock_core::traits::{FifoStorage, LotteryStorage, ReservationStore};

use crate::memory::{
    MemoryFifoStorage, MemoryLotteryStorage, MemoryRateLimiter, MemoryReservationStore,
    MemorySeal,
};
use crate::queue::{FifoQueue, LotteryQueue, QueueDispatch};
use crate::seal::SealDispatch;

/// In-process state, keyed like the Redis layout so that two handles on
/// the same key share state.
#[derive(Debug, Default)]
struct MemoryBackend {
    seals: DashMap<String, MemorySeal>,
    rate_limiters: DashMap<String, MemoryRateLimiter>,
    fifo: DashMap<String, MemoryFifoStorage>,
    lottery: DashMap<String, MemoryLotteryStorage>,
    reservations: DashMap<String, MemoryReservationStore>,
}

#[derive(Debug)]
enum Backend {
    Memory(MemoryBackend),
    #[cfg(feature = "redis-backend")]
    Redis(crate::redis::RedisClient),
}

/// Builds store-backed components for the configured backend.
///
/// The backend is selected at construction time based on configuration.
#[derive(Debug, Clone)]
pub struct StoreManager {
    backend: Arc<Backend>,
}

impl StoreManager {
    /// Create a store manager from configuration.
    pub async fn new(config: &StoreConfig) -> AppResult<Self> {
        let backend = match config.backend.as_str() {
            #[cfg(feature = "redis-backend")]
            "redis" => {
                info!("Initializing Redis store backend");
                let client = crate::redis::RedisClient::connect(&config.redis).await?;
                Backend::Redis(client)
            }
            "memory" => {
                info!("Initializing in-memory store backend");
                Backend::Memory(MemoryBackend::default())
            }
            other => {
                return Err(AppError::configuration(format!(
                    "Unknown store backend: '{other}'. Supported: memory, redis"
                )));
            }
        };
        Ok(Self {
            backend: Arc::new(backend),
        })
    }

    /// Create an in-memory store manager (for testing and single-node use).
    pub fn memory() -> Self {
        Self {
            backend: Arc::new(Backend::Memory(MemoryBackend::default())),
        }
    }

    /// Name of the active backend.
    pub fn backend(&self) -> &'static str {
        match self.backend.as_ref() {
            Backend::Memory(_) => "memory",
            #[cfg(feature = "redis-backend")]
            Backend::Redis(_) => "redis",
        }
    }

    /// Check that the backend is reachable.
    pub async fn health_check(&self) -> AppResult<bool> {
        match self.backend.as_ref() {
            Backend::Memory(_) => Ok(true),
            #[cfg(feature = "redis-backend")]
            Backend::Redis(client) => client.health_check().await,
        }
    }

    /// Build the seal described by `config`.
    pub fn seal(&self, config: &SealConfig) -> AppResult<SealDispatch> {
        let ttl = Duration::from_secs(config.ttl_seconds);
        let resource = config.resource.clone();

        let seal = match (config.kind.as_str(), self.backend.as_ref()) {
            ("semaphore", Backend::Memory(memory)) => SealDispatch::Memory(
                memory
                    .seals
                    .entry(resource.clone())
                    .or_insert_with(|| MemorySeal::new(resource, config.limit, ttl))
                    .clone(),
            ),
            ("rate_limiter", Backend::Memory(memory)) => SealDispatch::MemoryRateLimiter(
                memory
                    .rate_limiters
                    .entry(resource.clone())
                    .or_insert_with(|| MemoryRateLimiter::new(resource, config.limit, ttl))
                    .clone(),
            ),
            #[cfg(feature = "redis-backend")]
            ("semaphore", Backend::Redis(client)) => SealDispatch::Redis(
                crate::redis::RedisSeal::new(client.clone(), resource, config.limit, ttl),
            ),
            #[cfg(feature = "redis-backend")]
            ("rate_limiter", Backend::Redis(client)) => SealDispatch::RedisRateLimiter(
                crate::redis::RedisRateLimiter::new(client.clone(), resource, config.limit, ttl),
            ),
            (other, _) => {
                return Err(AppError::configuration(format!(
                    "Unknown seal kind: '{other}'. Supported: semaphore, rate_limiter"
                )));
            }
        };

        info!(
            kind = %config.kind,
            resource = %config.resource,
            limit = config.limit,
            ttl_seconds = config.ttl_seconds,
            backend = self.backend(),
            "Seal configured"
        );
        Ok(seal)
    }

    /// FIFO storage rooted at `prefix`.
    pub fn fifo_storage(&self, prefix: &str) -> Arc<dyn FifoStorage> {
        match self.backend.as_ref() {
            Backend::Memory(memory) => Arc::new(
                memory
                    .fifo
                    .entry(prefix.to_string())
                    .or_default()
                    .clone(),
            ),
            #[cfg(feature = "redis-backend")]
            Backend::Redis(client) => Arc::new(crate::redis::RedisFifoStorage::new(
                client.clone(),
                prefix,
            )),
        }
    }

    /// Lottery storage rooted at `prefix`.
    pub fn lottery_storage(&self, prefix: &str) -> Arc<dyn LotteryStorage> {
        match self.backend.as_ref() {
            Backend::Memory(memory) => Arc::new(
                memory
                    .lottery
                    .entry(prefix.to_string())
                    .or_default()
                    .clone(),
            ),
            #[cfg(feature = "redis-backend")]
            Backend::Redis(client) => Arc::new(crate::redis::RedisLotteryStorage::new(
                client.clone(),
                prefix,
            )),
        }
    }

    /// Build the queue described by `config`. Lottery candidates hold for
    /// `claim_window`.
    pub fn queue(&self, config: &QueueConfig, claim_window: Duration) -> AppResult<QueueDispatch> {
        let queue = match config.policy.as_str() {
            "fifo" => QueueDispatch::Fifo(FifoQueue::new(self.fifo_storage(&config.key))),
            "lottery" => QueueDispatch::Lottery(LotteryQueue::new(
                self.lottery_storage(&config.key),
                claim_window,
            )),
            other => {
                return Err(AppError::configuration(format!(
                    "Unknown queue policy: '{other}'. Supported: fifo, lottery"
                )));
            }
        };
        info!(policy = %config.policy, key = %config.key, "Queue configured");
        Ok(queue)
    }

    /// Build the reservation store, or `None` when claims are disabled.
    pub fn reservations(&self, config: &ReservationConfig) -> Option<Arc<dyn ReservationStore>> {
        if !config.enabled {
            info!("Reservations disabled, claim is unavailable");
            return None;
        }
        let store: Arc<dyn ReservationStore> = match self.backend.as_ref() {
            Backend::Memory(memory) => Arc::new(
                memory
                    .reservations
                    .entry(config.key_prefix.clone())
                    .or_default()
                    .clone(),
            ),
            #[cfg(feature = "redis-backend")]
            Backend::Redis(client) => Arc::new(crate::redis::RedisReservationStore::new(
                client.clone(),
                config.key_prefix.clone(),
            )),
        };
        Some(store)
    }
}
