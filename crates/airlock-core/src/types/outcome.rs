//! Immutable outcomes of `enter` and `claim`.

use serde::{Deserialize, Serialize};

use super::token::Token;

/// Queue position reported by airlocks that have no queue.
pub const NO_QUEUE_POSITION: i64 = -1;

/// Outcome of `enter`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum EntryResult {
    /// The caller holds a permit.
    Admitted {
        /// The acquired permit.
        token: Token,
        /// Topic the caller listens on.
        topic: String,
    },
    /// The caller is waiting (or, without a queue, was turned away).
    Queued {
        /// 1-indexed position, or [`NO_QUEUE_POSITION`].
        position: i64,
        /// Topic the caller listens on.
        topic: String,
    },
}

impl EntryResult {
    /// Whether the caller was admitted.
    pub fn is_admitted(&self) -> bool {
        matches!(self, Self::Admitted { .. })
    }

    /// The permit, if admitted.
    pub fn token(&self) -> Option<&Token> {
        match self {
            Self::Admitted { token, .. } => Some(token),
            Self::Queued { .. } => None,
        }
    }

    /// The queue position, if queued.
    pub fn position(&self) -> Option<i64> {
        match self {
            Self::Admitted { .. } => None,
            Self::Queued { position, .. } => Some(*position),
        }
    }

    /// The caller's topic.
    pub fn topic(&self) -> &str {
        match self {
            Self::Admitted { topic, .. } | Self::Queued { topic, .. } => topic,
        }
    }
}

/// Outcome of `claim`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ClaimResult {
    /// Nonce accepted and permit acquired.
    Admitted {
        /// The acquired permit.
        token: Token,
        /// Topic the caller listens on.
        topic: String,
    },
    /// Nonce is stale, consumed, or was never issued to this caller.
    Missed {
        /// Topic the caller listens on.
        topic: String,
    },
    /// Nonce is valid but the seal is still full; keep waiting.
    Unavailable {
        /// Topic the caller listens on.
        topic: String,
    },
}

impl ClaimResult {
    /// Whether the claim admitted the caller.
    pub fn is_admitted(&self) -> bool {
        matches!(self, Self::Admitted { .. })
    }

    /// The permit, if admitted.
    pub fn token(&self) -> Option<&Token> {
        match self {
            Self::Admitted { token, .. } => Some(token),
            _ => None,
        }
    }

    /// The caller's topic.
    pub fn topic(&self) -> &str {
        match self {
            Self::Admitted { topic, .. } | Self::Missed { topic } | Self::Unavailable { topic } => {
                topic
            }
        }
    }

    /// Short label for logs and events.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Admitted { .. } => "admitted",
            Self::Missed { .. } => "missed",
            Self::Unavailable { .. } => "unavailable",
        }
    }
}
