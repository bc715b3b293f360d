use chrono::{DateTime, Utc};

use pulse_core::config::LifecycleConfig;
use pulse_core::models::SafetyReport;
use pulse_core::Confidence;

const VOTE_SHARE: f64 = 0.4;
const TRUST_SHARE: f64 = 0.3;
const RECENCY_SHARE: f64 = 0.2;
const SEVERITY_SHARE: f64 = 0.1;

/// Report confidence.
///
/// ```text
/// confidence = 0.4 × vote_term
///            + 0.3 × trust
///            + 0.2 × max(0, 1 − age_h / horizon)
///            + 0.1 × severity / 5
/// ```
///
/// Clamped to [0.0, 1.0].
pub fn compute(
    report: &SafetyReport,
    vote_term: f64,
    now: DateTime<Utc>,
    cfg: &LifecycleConfig,
) -> Confidence {
    compute_breakdown(report, vote_term, now, cfg).confidence
}

#[derive(Debug, Clone, Copy)]
pub struct ConfidenceBreakdown {
    pub vote: f64,
    pub trust: f64,
    pub recency: f64,
    pub severity: f64,
    pub confidence: Confidence,
}

pub fn compute_breakdown(
    report: &SafetyReport,
    vote_term: f64,
    now: DateTime<Utc>,
    cfg: &LifecycleConfig,
) -> ConfidenceBreakdown {
    let recency = if cfg.recency_horizon_hours > 0.0 {
        (1.0 - report.age_hours(now) / cfg.recency_horizon_hours).max(0.0)
    } else {
        0.0
    };
    let vote = vote_term.clamp(0.0, 1.0);
    let trust = report.trust_score.value();
    let severity = report.severity.fraction();

    let confidence = Confidence::new(
        VOTE_SHARE * vote + TRUST_SHARE * trust + RECENCY_SHARE * recency + SEVERITY_SHARE * severity,
    );
    ConfidenceBreakdown {
        vote,
        trust,
        recency,
        severity,
        confidence,
    }
}
