//! Status transitions driven by votes, vote removal, and time.

use chrono::{DateTime, Utc};

use pulse_core::config::LifecycleConfig;
use pulse_core::models::{ReportStatus, SafetyReport};

/// Status a pending report should move to after a vote, if any.
/// Requires the minimum vote count; verification wins over dispute.
pub fn after_vote(report: &SafetyReport, cfg: &LifecycleConfig) -> Option<ReportStatus> {
    if report.status != ReportStatus::Pending || report.votes.total() < cfg.min_votes_for_transition
    {
        return None;
    }
    if report.confidence_score.value() >= cfg.verify_threshold {
        Some(ReportStatus::Verified)
    } else if report.votes.false_ratio() >= cfg.dispute_ratio {
        Some(ReportStatus::Disputed)
    } else {
        None
    }
}

/// Verified/disputed reports fall back to pending once removals take them
/// below the minimum vote count.
pub fn after_removal(report: &SafetyReport, cfg: &LifecycleConfig) -> Option<ReportStatus> {
    match report.status {
        ReportStatus::Verified | ReportStatus::Disputed
            if report.votes.total() < cfg.min_votes_for_transition =>
        {
            Some(ReportStatus::Pending)
        }
        _ => None,
    }
}

/// Move `report` to `next`, maintaining the status timestamps.
pub fn apply(report: &mut SafetyReport, next: ReportStatus, now: DateTime<Utc>) -> bool {
    if report.status == next || !report.status.can_transition_to(next) {
        return false;
    }
    match next {
        ReportStatus::Verified => report.verified_at = Some(now),
        ReportStatus::Disputed => report.disputed_at = Some(now),
        ReportStatus::Pending => {
            report.verified_at = None;
            report.disputed_at = None;
        }
        ReportStatus::Expired | ReportStatus::Deleted => report.is_valid = false,
    }
    report.status = next;
    report.last_activity_at = now;
    true
}

/// Past `expires_at`, or still pending when the vote window closed.
pub fn expiration_due(report: &SafetyReport, now: DateTime<Utc>) -> bool {
    if report.status.is_terminal() {
        return false;
    }
    now > report.expires_at
        || (report.status == ReportStatus::Pending && now > report.vote_window_expires_at)
}
