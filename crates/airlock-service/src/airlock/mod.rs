//! Admission protocols.

pub mod opportunistic;
pub mod queue;

pub use opportunistic::OpportunisticAirlock;
pub use queue::QueueAirlock;
