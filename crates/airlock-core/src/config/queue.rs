//! Queue and reservation configuration.

use serde::{Deserialize, Serialize};

/// Waiting queue configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueConfig {
    /// Ordering policy: `"fifo"` or `"lottery"`.
    #[serde(default = "default_policy")]
    pub policy: String,
    /// Store key prefix for the queue structures.
    #[serde(default = "default_key")]
    pub key: String,
    /// Prefix of notification topics (`{topic_prefix}/{identifier}`).
    #[serde(default = "default_topic_prefix")]
    pub topic_prefix: String,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            policy: default_policy(),
            key: default_key(),
            topic_prefix: default_topic_prefix(),
        }
    }
}

/// Claim reservation configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReservationConfig {
    /// Whether claim nonces are issued. Without them `claim` cannot be used.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Store key prefix for reservation entries.
    #[serde(default = "default_reservation_prefix")]
    pub key_prefix: String,
}

impl Default for ReservationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            key_prefix: default_reservation_prefix(),
        }
    }
}

fn default_policy() -> String {
    "fifo".to_string()
}

fn default_key() -> String {
    "airlock:queue".to_string()
}

fn default_topic_prefix() -> String {
    "airlock".to_string()
}

fn default_true() -> bool {
    true
}

fn default_reservation_prefix() -> String {
    "airlock:reservation".to_string()
}
