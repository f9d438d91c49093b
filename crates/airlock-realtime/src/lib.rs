//! # airlock-realtime
//!
//! Transports behind the notifier and presence ports:
//!
//! - In-process broadcast channels per topic for single-node deployments
//! - Redis PUBLISH for multi-node deployments
//! - A log-only notifier for dry runs
//! - Presence tracking of live topic subscriptions

pub mod notifier;
pub mod presence;

pub use notifier::{BroadcastNotifier, LogNotifier, Notification, NotifierDispatch};
pub use presence::PresenceTracker;
