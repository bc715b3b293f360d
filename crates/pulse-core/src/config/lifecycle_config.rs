use serde::{Deserialize, Serialize};

use super::defaults;

/// Report lifecycle configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LifecycleConfig {
    pub vote_window_hours: i64,
    pub report_ttl_hours: i64,
    pub delete_cooldown_minutes: i64,
    /// Confidence at or above which a report becomes verified.
    pub verify_threshold: f64,
    /// Downvote ratio at or above which a report becomes disputed.
    pub dispute_ratio: f64,
    pub min_votes_for_transition: u32,
    /// Age after which the recency term of confidence reaches zero.
    pub recency_horizon_hours: f64,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            vote_window_hours: defaults::DEFAULT_VOTE_WINDOW_HOURS,
            report_ttl_hours: defaults::DEFAULT_REPORT_TTL_HOURS,
            delete_cooldown_minutes: defaults::DEFAULT_DELETE_COOLDOWN_MINUTES,
            verify_threshold: defaults::DEFAULT_VERIFY_THRESHOLD,
            dispute_ratio: defaults::DEFAULT_DISPUTE_RATIO,
            min_votes_for_transition: defaults::DEFAULT_MIN_VOTES_FOR_TRANSITION,
            recency_horizon_hours: defaults::DEFAULT_RECENCY_HORIZON_HOURS,
        }
    }
}
