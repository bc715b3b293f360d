//! Read-side summaries of votes and identities.

use serde::{Deserialize, Serialize};

use pulse_core::models::{Reputation, SafetyReport};
use pulse_core::TrustScore;

const FLAGGED_ANOMALY: f64 = 0.7;
const WATCHED_ANOMALY: f64 = 0.3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrustLevel {
    Low,
    Medium,
    High,
}

impl TrustLevel {
    pub fn from_score(score: f64) -> Self {
        if score >= TrustScore::HIGH {
            Self::High
        } else if score >= TrustScore::MEDIUM {
            Self::Medium
        } else {
            Self::Low
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceStatus {
    Normal,
    Watched,
    Flagged,
}

impl DeviceStatus {
    pub fn from_anomaly(anomaly: f64) -> Self {
        if anomaly >= FLAGGED_ANOMALY {
            Self::Flagged
        } else if anomaly >= WATCHED_ANOMALY {
            Self::Watched
        } else {
            Self::Normal
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoteSummary {
    pub report_id: String,
    pub true_votes: u32,
    pub false_votes: u32,
    pub total_votes: u32,
    /// Share of accurate votes; `None` before the first vote.
    pub accuracy_ratio: Option<f64>,
    pub trust_score: f64,
    pub confidence_score: f64,
}

impl VoteSummary {
    pub fn of(report: &SafetyReport) -> Self {
        let total = report.votes.total();
        Self {
            report_id: report.id.clone(),
            true_votes: report.votes.true_count,
            false_votes: report.votes.false_count,
            total_votes: total,
            accuracy_ratio: (total > 0).then(|| f64::from(report.votes.true_count) / f64::from(total)),
            trust_score: report.trust_score.value(),
            confidence_score: report.confidence_score.value(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdentitySummary {
    pub fingerprint: String,
    pub authenticated: bool,
    pub submission_count: u32,
    pub anomaly_score: f64,
    pub device_status: DeviceStatus,
    pub trust_score: Option<f64>,
    pub trust_level: Option<TrustLevel>,
    pub reports_confirmed: u32,
    pub reports_flagged: u32,
    /// Share of this identity's votes that confirmed a report.
    pub accuracy_rate: Option<f64>,
}

impl IdentitySummary {
    pub fn of(rep: &Reputation) -> Self {
        let votes = rep.reports_confirmed + rep.reports_flagged;
        let trust = rep.trust_score.map(|t| t.value());
        Self {
            fingerprint: rep.key.fingerprint(),
            authenticated: rep.key.is_user(),
            submission_count: rep.submission_count,
            anomaly_score: rep.anomaly_score,
            device_status: DeviceStatus::from_anomaly(rep.anomaly_score),
            trust_score: trust,
            trust_level: trust.map(TrustLevel::from_score),
            reports_confirmed: rep.reports_confirmed,
            reports_flagged: rep.reports_flagged,
            accuracy_rate: (votes > 0).then(|| f64::from(rep.reports_confirmed) / f64::from(votes)),
        }
    }
}
