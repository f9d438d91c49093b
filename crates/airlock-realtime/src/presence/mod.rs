//! Presence tracking.

pub mod tracker;

pub use tracker::{Connection, PresenceTracker};
