//! Supervisor: the authoritative backstop that notifies and evicts.

pub mod gate;
pub mod report;
pub mod service;

pub use gate::{AvailabilityGate, FnGate, SealCapacityGate};
pub use report::{SkipReason, TickReport};
pub use service::Supervisor;
