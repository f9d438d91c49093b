//! Redis backend for multi-node deployments.
//!
//! Every compound check-then-act step is a Lua script, so concurrent
//! callers on different nodes observe the same ordering.

pub mod client;
pub mod fifo;
pub mod lottery;
pub mod rate_limit;
pub mod reservation;
pub mod seal;

pub use client::RedisClient;
pub use fifo::RedisFifoStorage;
pub use lottery::RedisLotteryStorage;
pub use rate_limit::RedisRateLimiter;
pub use reservation::RedisReservationStore;
pub use seal::RedisSeal;
