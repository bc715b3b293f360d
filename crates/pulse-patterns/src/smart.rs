//! Heuristic per-report risk score and the per-tile safety summary built
//! from it. Independent of the lifecycle confidence score.

use chrono::{DateTime, Duration, Timelike, Utc};

use pulse_core::config::{PatternConfig, TrustConfig};
use pulse_core::models::{ConfidenceLevel, SafetyReport, VoteTally};

use pulse_trust::votes::vote_term;

use crate::detectors::is_night;
use crate::types::{SafetyLevel, TileSafety};

const RECENT_WINDOW_HOURS: f64 = 24.0;
const AGE_DECAY_HOURS: f64 = 72.0;
const NIGHT_BOOST: f64 = 0.15;
const SPIKE_BOOST: f64 = 0.2;
const TILE_SPIKE_BOOST: f64 = 0.15;

/// Votes pull the neutral prior toward the accurate ratio, with the same
/// weighting the trust blend uses.
fn vote_component(votes: &VoteTally, trust: &TrustConfig) -> f64 {
    vote_term(votes, trust.vote_prior, trust)
}

fn recency_component(age_hours: f64) -> f64 {
    if age_hours < RECENT_WINDOW_HOURS {
        1.0 - (age_hours / RECENT_WINDOW_HOURS) * 0.3
    } else {
        0.7
    }
}

/// Score one report in [0, 1]. `in_spike` marks a report whose tile is
/// currently spiking.
pub fn smart_score(
    report: &SafetyReport,
    now: DateTime<Utc>,
    in_spike: bool,
    cfg: &PatternConfig,
    trust: &TrustConfig,
) -> f64 {
    let age = report.age_hours(now);
    let night = if is_night(now.hour(), cfg) { NIGHT_BOOST } else { 0.0 };
    let spike = if in_spike { SPIKE_BOOST } else { 0.0 };

    let blended = report.trust_score.value() * 0.3
        + vote_component(&report.votes, trust) * 0.25
        + recency_component(age) * 0.15
        + (0.5 + night) * 0.1
        + (-age / AGE_DECAY_HOURS).exp() * 0.1
        + (0.5 + spike) * 0.1;

    (blended * report.severity.fraction() * 2.0).clamp(0.0, 1.0)
}

fn safety_level(score: f64) -> SafetyLevel {
    match score {
        s if s >= 0.7 => SafetyLevel::High,
        s if s >= 0.5 => SafetyLevel::Medium,
        s if s >= 0.3 => SafetyLevel::Low,
        _ => SafetyLevel::Safe,
    }
}

fn count_level(count: usize) -> ConfidenceLevel {
    match count {
        n if n >= 10 => ConfidenceLevel::High,
        n if n >= 5 => ConfidenceLevel::Medium,
        _ => ConfidenceLevel::Low,
    }
}

/// Safety summary for one tile from its active reports.
pub fn tile_safety(
    tile_id: &str,
    reports: &[SafetyReport],
    now: DateTime<Utc>,
    cfg: &PatternConfig,
    trust: &TrustConfig,
) -> TileSafety {
    if reports.is_empty() {
        return TileSafety {
            tile_id: tile_id.to_string(),
            safety_score: 0.5,
            risk_level: SafetyLevel::Unknown,
            confidence: ConfidenceLevel::Low,
            signal_count: 0,
            is_spike: false,
            spike_message: None,
        };
    }

    let window_start = now - Duration::minutes(cfg.spike_window_minutes);
    let recent = reports.iter().filter(|r| r.created_at > window_start).count();
    let spiking_now = recent >= cfg.spike_min_reports;

    let n = reports.len();
    let total: f64 = reports.iter().map(|r| smart_score(r, now, spiking_now, cfg, trust)).sum();
    let avg = (total / n as f64 + (n as f64 * 0.02).min(0.2)).min(1.0);

    let (is_spike, spike_message) = burst(reports, cfg);
    let boost = if is_spike { TILE_SPIKE_BOOST } else { 0.0 };

    TileSafety {
        tile_id: tile_id.to_string(),
        safety_score: (avg + boost).min(1.0),
        risk_level: safety_level(avg),
        confidence: count_level(n),
        signal_count: n,
        is_spike,
        spike_message,
    }
}

/// Enough reports packed into one spike window.
fn burst(reports: &[SafetyReport], cfg: &PatternConfig) -> (bool, Option<String>) {
    if reports.len() < cfg.spike_min_reports {
        return (false, None);
    }
    let first = reports.iter().map(|r| r.created_at).min();
    let last = reports.iter().map(|r| r.created_at).max();
    let (Some(first), Some(last)) = (first, last) else {
        return (false, None);
    };
    let minutes = (last - first).num_milliseconds() as f64 / 60_000.0;
    if minutes <= cfg.spike_window_minutes as f64 {
        let message = format!(
            "Spike detected: {} reports in {} minutes",
            reports.len(),
            minutes as i64
        );
        (true, Some(message))
    } else {
        (false, None)
    }
}
