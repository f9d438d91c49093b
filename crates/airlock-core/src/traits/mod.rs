//! Core traits defined in `airlock-core` and implemented by other crates.

pub mod airlock;
pub mod notifier;
pub mod queue;
pub mod reservation;
pub mod seal;

pub use airlock::Airlock;
pub use notifier::{Notifier, PresenceProvider};
pub use queue::{EnumerableQueue, FifoStorage, LotteryStorage, Queue};
pub use reservation::ReservationStore;
pub use seal::Seal;
