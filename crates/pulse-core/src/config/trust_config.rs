use serde::{Deserialize, Serialize};

use super::defaults;

/// Trust scoring configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrustConfig {
    pub new_anonymous_trust: f64,
    pub new_authenticated_trust: f64,
    pub history_bonus_per_submission: f64,
    pub history_bonus_cap: f64,
    pub authenticated_bonus: f64,
    pub anomaly_penalty: f64,
    /// Weight each vote adds to the observed ratio.
    pub vote_weight_per_vote: f64,
    pub vote_weight_cap: f64,
    pub vote_prior: f64,
    /// Share of the existing trust kept when blending in vote evidence.
    pub existing_trust_share: f64,
    /// Privacy blur radius in meters.
    pub blur_radius_m: f64,
    /// Submissions closer together than this bump the anomaly score.
    pub rapid_submission_secs: i64,
    pub abuse_submission_limit: u32,
    pub abuse_anomaly_limit: f64,
    pub abuse_trust_multiplier: f64,
}

impl Default for TrustConfig {
    fn default() -> Self {
        Self {
            new_anonymous_trust: defaults::DEFAULT_NEW_ANONYMOUS_TRUST,
            new_authenticated_trust: defaults::DEFAULT_NEW_AUTHENTICATED_TRUST,
            history_bonus_per_submission: defaults::DEFAULT_HISTORY_BONUS_PER_SUBMISSION,
            history_bonus_cap: defaults::DEFAULT_HISTORY_BONUS_CAP,
            authenticated_bonus: defaults::DEFAULT_AUTHENTICATED_BONUS,
            anomaly_penalty: defaults::DEFAULT_ANOMALY_PENALTY,
            vote_weight_per_vote: defaults::DEFAULT_VOTE_WEIGHT_PER_VOTE,
            vote_weight_cap: defaults::DEFAULT_VOTE_WEIGHT_CAP,
            vote_prior: defaults::DEFAULT_VOTE_PRIOR,
            existing_trust_share: defaults::DEFAULT_EXISTING_TRUST_SHARE,
            blur_radius_m: defaults::DEFAULT_BLUR_RADIUS_M,
            rapid_submission_secs: defaults::DEFAULT_RAPID_SUBMISSION_SECS,
            abuse_submission_limit: defaults::DEFAULT_ABUSE_SUBMISSION_LIMIT,
            abuse_anomaly_limit: defaults::DEFAULT_ABUSE_ANOMALY_LIMIT,
            abuse_trust_multiplier: defaults::DEFAULT_ABUSE_TRUST_MULTIPLIER,
        }
    }
}
