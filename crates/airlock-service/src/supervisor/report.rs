//! Outcome of one supervisor tick.

use std::fmt;

/// Why a tick ended without notifying anyone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Nobody is waiting.
    EmptyQueue,
    /// The availability gate reported no free slot.
    NoCapacity,
    /// The candidate was already notified and its claim window is open.
    AwaitingClaim,
}

impl SkipReason {
    /// Return the snake_case name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::EmptyQueue => "empty_queue",
            Self::NoCapacity => "no_capacity",
            Self::AwaitingClaim => "awaiting_claim",
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What one tick did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Front of the queue when the tick finished, if any.
    pub candidate: Option<String>,
    /// Identifier notified during this tick.
    pub notified: Option<String>,
    /// Identifiers removed from the queue during this tick.
    pub evicted: Vec<String>,
    /// Set when the tick ended early.
    pub skipped: Option<SkipReason>,
}

impl TickReport {
    /// Whether the tick changed anything.
    pub fn is_idle(&self) -> bool {
        self.notified.is_none() && self.evicted.is_empty()
    }
}
