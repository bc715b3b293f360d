//! Reputation bookkeeping for submissions, votes, and abuse heuristics.

use chrono::{DateTime, Utc};

use pulse_core::config::TrustConfig;
use pulse_core::models::Reputation;
use pulse_core::TrustScore;

const RAPID_SUBMISSION_BUMP: f64 = 0.1;
const GOOD_BEHAVIOR_RELIEF: f64 = 0.05;
const CONFIRM_REWARD: f64 = 0.02;
const FLAG_PENALTY: f64 = 0.05;
const VOTE_REVERT_STEP: f64 = 0.01;

/// Outcome of recording a submission against an identity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SubmissionCheck {
    /// Submitted sooner than the configured gap after the previous one.
    pub rapid: bool,
    pub anomaly_after: f64,
}

/// Count the submission and nudge the anomaly score: rapid resubmission
/// raises it, ordinary spacing lets it relax.
pub fn record_submission(rep: &mut Reputation, now: DateTime<Utc>, cfg: &TrustConfig) -> SubmissionCheck {
    let rapid = rep
        .last_submission
        .is_some_and(|last| (now - last).num_seconds() < cfg.rapid_submission_secs);
    let delta = if rapid {
        RAPID_SUBMISSION_BUMP
    } else {
        -GOOD_BEHAVIOR_RELIEF
    };
    rep.set_anomaly(rep.anomaly_score + delta);
    rep.submission_count = rep.submission_count.saturating_add(1);
    rep.last_submission = Some(now);
    rep.updated_at = now;
    SubmissionCheck {
        rapid,
        anomaly_after: rep.anomaly_score,
    }
}

/// Abuse heuristics evaluated before a submission is accepted.
/// `recent_submissions` counts the identity's reports in the trailing hour.
pub fn abuse_reasons(recent_submissions: usize, rep: Option<&Reputation>, cfg: &TrustConfig) -> Vec<String> {
    let mut reasons = Vec::new();
    if recent_submissions > cfg.abuse_submission_limit as usize {
        reasons.push(format!(
            "high_frequency: {recent_submissions} submissions in the last hour"
        ));
    }
    if let Some(rep) = rep {
        if rep.anomaly_score > cfg.abuse_anomaly_limit {
            reasons.push(format!("anomalous_behavior: score {:.2}", rep.anomaly_score));
        }
    }
    reasons
}

/// Trust after an abuse flag: scaled down, never below the floor.
pub fn apply_abuse_penalty(trust: TrustScore, cfg: &TrustConfig) -> TrustScore {
    TrustScore::new(trust.value() * cfg.abuse_trust_multiplier)
}

/// Track a voter's judgment. Only authenticated users carry a trust score.
pub fn apply_vote_outcome(rep: &mut Reputation, is_accurate: bool, now: DateTime<Utc>) {
    if is_accurate {
        rep.reports_confirmed = rep.reports_confirmed.saturating_add(1);
    } else {
        rep.reports_flagged = rep.reports_flagged.saturating_add(1);
    }
    if let Some(trust) = rep.trust_score {
        let delta = if is_accurate { CONFIRM_REWARD } else { -FLAG_PENALTY };
        rep.trust_score = Some(TrustScore::new(trust.value() + delta));
    }
    rep.updated_at = now;
}

/// Undo a voter's judgment. The step is smaller than the one applied on cast.
pub fn revert_vote_outcome(rep: &mut Reputation, was_accurate: bool, now: DateTime<Utc>) {
    if was_accurate {
        rep.reports_confirmed = rep.reports_confirmed.saturating_sub(1);
    } else {
        rep.reports_flagged = rep.reports_flagged.saturating_sub(1);
    }
    if let Some(trust) = rep.trust_score {
        let delta = if was_accurate { -VOTE_REVERT_STEP } else { VOTE_REVERT_STEP };
        rep.trust_score = Some(TrustScore::new(trust.value() + delta));
    }
    rep.updated_at = now;
}

/// Spam detection feeds its score straight into the anomaly score.
pub fn apply_spam_score(rep: &mut Reputation, spam_score: f64, now: DateTime<Utc>) {
    rep.set_anomaly(spam_score);
    rep.updated_at = now;
}
