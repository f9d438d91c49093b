//! Supervisor and notifier configuration.

use serde::{Deserialize, Serialize};

/// Supervisor tick loop configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupervisorConfig {
    /// Seconds a notified candidate has to claim before eviction.
    #[serde(default = "default_claim_window")]
    pub claim_window_seconds: u64,
    /// Interval between ticks in milliseconds.
    #[serde(default = "default_tick_interval")]
    pub tick_interval_ms: u64,
    /// Whether to sweep the queue for disconnected identifiers each tick.
    #[serde(default)]
    pub presence_sweep: bool,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            claim_window_seconds: default_claim_window(),
            tick_interval_ms: default_tick_interval(),
            presence_sweep: false,
        }
    }
}

/// Notification transport configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifierConfig {
    /// Notifier kind: `"broadcast"`, `"redis"` or `"log"`.
    #[serde(default = "default_notifier_kind")]
    pub kind: String,
    /// Buffer size of the in-process broadcast channel.
    #[serde(default = "default_channel_buffer")]
    pub channel_buffer_size: usize,
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            kind: default_notifier_kind(),
            channel_buffer_size: default_channel_buffer(),
        }
    }
}

fn default_claim_window() -> u64 {
    30
}

fn default_tick_interval() -> u64 {
    1000
}

fn default_notifier_kind() -> String {
    "broadcast".to_string()
}

fn default_channel_buffer() -> usize {
    256
}
