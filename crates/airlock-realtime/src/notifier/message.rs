//! Wire format of a "your turn" notification.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Pushed to a waiting caller when it reaches the front of the queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    /// The caller being notified.
    pub identifier: String,
    /// Topic the caller listens on.
    pub topic: String,
    /// Nonce to present to `claim`, when reservations are enabled.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub claim_nonce: Option<String>,
    /// When the notification was produced.
    pub timestamp: DateTime<Utc>,
}

impl Notification {
    /// Create a notification stamped with the current time.
    pub fn new(identifier: &str, topic: &str, claim_nonce: Option<&str>) -> Self {
        Self {
            identifier: identifier.to_string(),
            topic: topic.to_string(),
            claim_nonce: claim_nonce.map(str::to_string),
            timestamp: Utc::now(),
        }
    }
}
