//! # airlock-service
//!
//! Admission protocols for Airlock. Composes the ports from
//! `airlock-core` into:
//!
//! - [`OpportunisticAirlock`]: single-flight admission over a seal
//! - [`QueueAirlock`]: a FIFO or lottery waiting room with claims
//! - [`TracingAirlock`] and [`EventAirlock`]: logging and event decorators
//! - [`Supervisor`]: the tick-driven loop that notifies and evicts
//!
//! Components take their collaborators as `Arc<dyn Trait>` at construction.

pub mod airlock;
pub mod decorator;
pub mod supervisor;

pub use airlock::{OpportunisticAirlock, QueueAirlock};
pub use decorator::{EventAirlock, TracingAirlock};
pub use supervisor::{
    AvailabilityGate, FnGate, SealCapacityGate, SkipReason, Supervisor, TickReport,
};
