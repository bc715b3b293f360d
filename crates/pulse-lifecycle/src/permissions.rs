//! Preconditions for voting and owner deletion.

use chrono::{DateTime, Utc};

use pulse_core::config::LifecycleConfig;
use pulse_core::errors::{PulseError, PulseResult};
use pulse_core::models::{Identity, ReportStatus, Reputation, SafetyReport};

/// Checked after the duplicate-vote constraint: window/terminal, then self-vote.
pub fn check_can_vote(report: &SafetyReport, voter: &Identity, now: DateTime<Utc>) -> PulseResult<()> {
    if report.status.is_terminal() {
        return Err(PulseError::ReportTerminal {
            report_id: report.id.clone(),
            status: report.status,
        });
    }
    if now > report.vote_window_expires_at {
        return Err(PulseError::VoteWindowClosed {
            report_id: report.id.clone(),
        });
    }
    if report.owned_by(voter) {
        return Err(PulseError::SelfVote {
            report_id: report.id.clone(),
        });
    }
    Ok(())
}

/// Owner deletion: ownership, then the verified-report guard, then cooldown.
pub fn check_can_delete(
    report: &SafetyReport,
    owner: &Identity,
    owner_reputation: &Reputation,
    now: DateTime<Utc>,
    cfg: &LifecycleConfig,
) -> PulseResult<()> {
    if !report.owned_by(owner) {
        return Err(PulseError::NotOwner {
            report_id: report.id.clone(),
        });
    }
    if report.status == ReportStatus::Deleted {
        return Err(PulseError::ReportTerminal {
            report_id: report.id.clone(),
            status: report.status,
        });
    }
    if report.status == ReportStatus::Verified
        && report.confidence_score.value() >= cfg.verify_threshold
    {
        return Err(PulseError::ProtectedReport {
            report_id: report.id.clone(),
            confidence: report.confidence_score.value(),
        });
    }
    if let Some(until) = owner_reputation.delete_cooldown_until {
        if now < until {
            let secs = (until - now).num_seconds();
            return Err(PulseError::DeleteCooldown {
                remaining_minutes: (secs + 59) / 60,
            });
        }
    }
    Ok(())
}
