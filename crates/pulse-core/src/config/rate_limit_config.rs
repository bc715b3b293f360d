use serde::{Deserialize, Serialize};

use super::defaults;

/// Per-identity request admission.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    pub anonymous_per_window: u32,
    pub authenticated_per_window: u32,
    pub window_secs: u64,
    /// Upper bound on tracked identities before eviction.
    pub max_identities: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            anonymous_per_window: defaults::DEFAULT_ANONYMOUS_REQUESTS_PER_MINUTE,
            authenticated_per_window: defaults::DEFAULT_AUTHENTICATED_REQUESTS_PER_MINUTE,
            window_secs: defaults::DEFAULT_RATE_LIMIT_WINDOW_SECS,
            max_identities: defaults::DEFAULT_RATE_LIMIT_MAX_IDENTITIES,
        }
    }
}
