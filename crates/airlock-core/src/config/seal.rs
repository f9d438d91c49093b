//! Seal (capacity permit) configuration.

use serde::{Deserialize, Serialize};

/// Seal configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SealConfig {
    /// Seal kind: `"semaphore"` (lock when `limit == 1`) or `"rate_limiter"`.
    #[serde(default = "default_kind")]
    pub kind: String,
    /// Key of the protected capacity pool.
    #[serde(default = "default_resource")]
    pub resource: String,
    /// Maximum number of simultaneously held permits.
    #[serde(default = "default_limit")]
    pub limit: u32,
    /// Lease length in seconds. Mandatory; a crashed holder frees its slot
    /// once this lapses.
    #[serde(default = "default_ttl")]
    pub ttl_seconds: u64,
}

impl Default for SealConfig {
    fn default() -> Self {
        Self {
            kind: default_kind(),
            resource: default_resource(),
            limit: default_limit(),
            ttl_seconds: default_ttl(),
        }
    }
}

fn default_kind() -> String {
    "semaphore".to_string()
}

fn default_resource() -> String {
    "waiting-room".to_string()
}

fn default_limit() -> u32 {
    1
}

fn default_ttl() -> u64 {
    300
}
