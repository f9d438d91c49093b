//! Domain events emitted by airlocks and the supervisor.
//!
//! Events are observational: they are published on a broadcast channel by
//! the event decorator and never influence admission decisions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Wrapper for all airlock events with metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainEvent {
    /// When the event occurred.
    pub timestamp: DateTime<Utc>,
    /// The event payload.
    pub payload: AirlockEvent,
}

impl DomainEvent {
    /// Create a new event stamped with the current time.
    pub fn new(payload: AirlockEvent) -> Self {
        Self {
            timestamp: Utc::now(),
            payload,
        }
    }
}

/// Events describing one caller's path through an airlock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AirlockEvent {
    /// A caller entered and obtained a permit.
    Admitted {
        /// The caller.
        identifier: String,
        /// Stable id of the permit.
        token_id: String,
    },
    /// A caller entered and is waiting.
    Queued {
        /// The caller.
        identifier: String,
        /// Reported position.
        position: i64,
    },
    /// A caller gave up waiting.
    Left {
        /// The caller.
        identifier: String,
    },
    /// A permit was returned.
    Released {
        /// Stable id of the permit.
        token_id: String,
    },
    /// A permit lease was extended.
    Refreshed {
        /// Stable id of the permit.
        token_id: String,
    },
    /// A notified caller claimed its slot.
    Claimed {
        /// The caller.
        identifier: String,
        /// Stable id of the permit.
        token_id: String,
    },
    /// A claim carried a stale or foreign nonce.
    ClaimMissed {
        /// The caller.
        identifier: String,
    },
    /// A claim was valid but the seal was full.
    ClaimUnavailable {
        /// The caller.
        identifier: String,
    },
    /// The supervisor told a candidate it may claim.
    CandidateNotified {
        /// The candidate.
        identifier: String,
    },
    /// The supervisor removed a caller from the queue.
    Evicted {
        /// The evicted caller.
        identifier: String,
        /// Why it was evicted.
        reason: EvictionReason,
    },
}

/// Why the supervisor evicted a caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvictionReason {
    /// Notified but did not claim within the claim window.
    ClaimWindowElapsed,
    /// No longer listening on its topic.
    Disconnected,
}
