//! # airlock-store
//!
//! Shared-store backends for Airlock. Two backends implement every port:
//!
//! - **memory**: single-node state behind `tokio::sync::Mutex`, expiring
//!   against the tokio clock
//! - **redis**: multi-node state where every compound check-then-act step
//!   is a Lua script
//!
//! On top of the storage ports sit the [`FifoQueue`](queue::FifoQueue) and
//! [`LotteryQueue`](queue::LotteryQueue) façades and the
//! [`CompositeSeal`](seal::CompositeSeal). The [`StoreManager`] picks the
//! backend at runtime from configuration.

pub mod memory;
pub mod nonce;
pub mod provider;
pub mod queue;
#[cfg(feature = "redis-backend")]
pub mod redis;
pub mod seal;

pub use provider::StoreManager;
pub use queue::{FifoQueue, LotteryQueue, QueueDispatch};
pub use seal::{CompositeSeal, SealDispatch};
