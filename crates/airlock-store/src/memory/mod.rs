//! In-memory backend for single-node deployments.
//!
//! State lives behind `tokio::sync::Mutex`, so every compound operation is
//! atomic within the process. Expiry uses the tokio clock.

pub mod fifo;
pub mod lottery;
pub mod rate_limit;
pub mod reservation;
pub mod seal;

pub use fifo::MemoryFifoStorage;
pub use lottery::MemoryLotteryStorage;
pub use rate_limit::MemoryRateLimiter;
pub use reservation::MemoryReservationStore;
pub use seal::MemorySeal;
