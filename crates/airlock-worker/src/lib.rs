//! # airlock-worker
//!
//! Background driver for the Airlock supervisor. The supervisor has no
//! timer of its own; [`SupervisorRunner`] ticks it at the configured
//! interval until a shutdown signal arrives.

pub mod runner;

pub use runner::{RunnerStats, SupervisorRunner};
