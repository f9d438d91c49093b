//! Shared-store key builders.
//!
//! Centralising key construction keeps the layout identical across the
//! memory and Redis backends and across deployments that share a store.

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

/// Characters left unescaped in identifiers (form-style encoding).
const IDENTIFIER_SET: &AsciiSet = &NON_ALPHANUMERIC.remove(b'-').remove(b'_').remove(b'.');

// ── Queue keys ─────────────────────────────────────────────

/// Ordered list of a FIFO queue.
pub fn fifo_list(prefix: &str) -> String {
    format!("{prefix}:list")
}

/// Membership set of a FIFO queue.
pub fn fifo_set(prefix: &str) -> String {
    format!("{prefix}:set")
}

/// Membership pool of a lottery queue.
pub fn lottery_pool(prefix: &str) -> String {
    format!("{prefix}:pool")
}

/// Sticky candidate slot of a lottery queue.
pub fn lottery_candidate(prefix: &str) -> String {
    format!("{prefix}:pool:candidate")
}

// ── Reservation keys ───────────────────────────────────────

/// Reservation entry for one identifier.
pub fn reservation(prefix: &str, identifier: &str) -> String {
    format!("{prefix}:{}", encode_identifier(identifier))
}

// ── Seal keys ──────────────────────────────────────────────

/// Sorted set of live permits for a leased seal.
pub fn seal_permits(key_prefix: &str, resource: &str) -> String {
    format!("{key_prefix}seal:{resource}")
}

/// Window counter for a rate-limiter seal.
pub fn rate_window(key_prefix: &str, resource: &str) -> String {
    format!("{key_prefix}rate:{resource}")
}

// ── Topics ─────────────────────────────────────────────────

/// Notification topic of an identifier.
pub fn topic(topic_prefix: &str, identifier: &str) -> String {
    format!("{topic_prefix}/{identifier}")
}

/// Form-encode an identifier (spaces become `+`).
pub fn encode_identifier(identifier: &str) -> String {
    utf8_percent_encode(identifier, IDENTIFIER_SET)
        .to_string()
        .replace("%20", "+")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_queue_layout() {
        assert_eq!(fifo_list("q"), "q:list");
        assert_eq!(fifo_set("q"), "q:set");
        assert_eq!(lottery_pool("q"), "q:pool");
        assert_eq!(lottery_candidate("q"), "q:pool:candidate");
    }

    #[test]
    fn test_reservation_key_encodes_identifier() {
        assert_eq!(reservation("r", "alice"), "r:alice");
        assert_eq!(reservation("r", "a b/c:d"), "r:a+b%2Fc%3Ad");
        assert_eq!(reservation("r", "user.name-1_x"), "r:user.name-1_x");
    }

    #[test]
    fn test_topic() {
        assert_eq!(topic("room", "alice"), "room/alice");
    }
}
