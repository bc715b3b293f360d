//! Submission-time trust derived from an identity's history.

use pulse_core::config::TrustConfig;
use pulse_core::models::Reputation;
use pulse_core::TrustScore;

/// Trust for a new submission.
///
/// New identities start at a fixed value (anonymous vs authenticated);
/// established ones earn a capped history bonus and lose up to
/// `anomaly_penalty` in proportion to their anomaly score.
pub fn compute(reputation: Option<&Reputation>, authenticated: bool, cfg: &TrustConfig) -> TrustScore {
    let rep = match reputation {
        Some(rep) if !rep.is_new() => rep,
        _ => {
            return TrustScore::new(if authenticated {
                cfg.new_authenticated_trust
            } else {
                cfg.new_anonymous_trust
            })
        }
    };

    let history = (f64::from(rep.submission_count) * cfg.history_bonus_per_submission)
        .min(cfg.history_bonus_cap);
    let auth = if authenticated { cfg.authenticated_bonus } else { 0.0 };
    let penalty = rep.anomaly_score.clamp(0.0, 1.0) * cfg.anomaly_penalty;

    TrustScore::new(TrustScore::FLOOR + history + auth - penalty)
}
