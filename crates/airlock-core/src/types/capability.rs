//! Seal kinds and capability flags.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The closed set of seal variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SealKind {
    /// Mutual exclusion (`limit == 1`).
    Lock,
    /// Counting semaphore (`limit > 1`).
    Semaphore,
    /// Fixed-window rate limiter; permits lapse with the window.
    RateLimiter,
    /// All-or-nothing combination of other seals.
    Composite,
}

impl SealKind {
    /// Kind of a leased permit pool with the given limit.
    pub fn for_limit(limit: u32) -> Self {
        if limit <= 1 { Self::Lock } else { Self::Semaphore }
    }

    /// Return the snake_case name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Lock => "lock",
            Self::Semaphore => "semaphore",
            Self::RateLimiter => "rate_limiter",
            Self::Composite => "composite",
        }
    }
}

impl fmt::Display for SealKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a seal supports beyond `try_acquire`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SealCapabilities {
    /// `release` returns the permit early.
    pub releasable: bool,
    /// `refresh` extends the lease.
    pub refreshable: bool,
    /// Permits carry a mandatory TTL.
    pub requires_ttl: bool,
}

impl SealCapabilities {
    /// Leased lock/semaphore permits.
    pub const LEASED: Self = Self {
        releasable: true,
        refreshable: true,
        requires_ttl: true,
    };

    /// Rate-limited permits that only lapse with their window.
    pub const WINDOWED: Self = Self {
        releasable: false,
        refreshable: false,
        requires_ttl: true,
    };

    /// Capabilities shared by both sides.
    pub fn intersect(self, other: Self) -> Self {
        Self {
            releasable: self.releasable && other.releasable,
            refreshable: self.refreshable && other.refreshable,
            requires_ttl: self.requires_ttl || other.requires_ttl,
        }
    }
}

/// What an airlock supports beyond `enter`/`leave`/`release`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AirlockCapabilities {
    /// Callers are queued rather than rejected.
    pub queue: bool,
    /// `claim` with a reservation nonce is available.
    pub claim: bool,
    /// `refresh` of a held token is available.
    pub refresh: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_for_limit() {
        assert_eq!(SealKind::for_limit(1), SealKind::Lock);
        assert_eq!(SealKind::for_limit(5), SealKind::Semaphore);
    }

    #[test]
    fn test_intersect() {
        let caps = SealCapabilities::LEASED.intersect(SealCapabilities::WINDOWED);
        assert!(!caps.releasable);
        assert!(!caps.refreshable);
        assert!(caps.requires_ttl);
        assert_eq!(
            SealCapabilities::LEASED.intersect(SealCapabilities::LEASED),
            SealCapabilities::LEASED
        );
    }
}
