//! # airlock-server
//!
//! Wires the Airlock crates into one application from configuration.
//! Used by the `airlockd` binary and by the integration tests.

pub mod app;

pub use app::{AirlockApp, AppAirlock};
