//! Detection results. Serialized as-is by the service layer.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use pulse_core::geo::{Coordinate, TileId};
use pulse_core::models::{ConfidenceLevel, ReputationKey, SignalCategory};

/// What an operator should do about a flagged identity or tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RecommendedAction {
    Monitor,
    Flag,
    DownRank,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Spike {
    pub id: String,
    pub tile_id: TileId,
    pub center: Coordinate,
    pub report_count: usize,
    pub spike_intensity: f64,
    pub time_window_minutes: i64,
    pub actual_time_range_minutes: f64,
    pub severity_breakdown: BTreeMap<u8, usize>,
    pub categories: Vec<SignalCategory>,
    pub detected_at: DateTime<Utc>,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Cluster {
    pub id: String,
    pub tile_id: TileId,
    pub center: Coordinate,
    pub report_count: usize,
    pub avg_severity: f64,
    pub avg_trust_score: f64,
    pub intensity: f64,
    pub categories: Vec<SignalCategory>,
    pub detected_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpamIdentity {
    #[serde(skip)]
    pub key: ReputationKey,
    /// Non-reversible label; raw identifiers never leave the crate.
    pub identity: String,
    pub report_count: usize,
    pub time_window_minutes: i64,
    pub spam_score: f64,
    /// 0.8 when every report carries the same severity, else 0.3.
    pub pattern_score: f64,
    pub severities: Vec<u8>,
    pub is_known_identity: bool,
    pub total_submissions: u32,
    pub action_recommended: RecommendedAction,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RapidFire {
    pub tile_id: TileId,
    pub center: Coordinate,
    pub report_count: usize,
    pub time_span_seconds: i64,
    pub reports_per_minute: f64,
    pub action_recommended: RecommendedAction,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LowTrustIdentity {
    #[serde(skip)]
    pub key: ReputationKey,
    pub identity: String,
    pub avg_trust_score: f64,
    pub report_count: usize,
    pub action_recommended: RecommendedAction,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Anomalies {
    pub spam_identities: Vec<SpamIdentity>,
    pub rapid_reports: Vec<RapidFire>,
    pub low_trust_patterns: Vec<LowTrustIdentity>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskZone {
    pub tile_id: TileId,
    pub center: Coordinate,
    pub risk_score: f64,
    pub report_count: usize,
    pub avg_severity: f64,
    pub categories: Vec<SignalCategory>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RiskZones {
    /// High plus medium zones found, before truncation.
    pub total_zones: usize,
    pub high_risk_zones: Vec<RiskZone>,
    pub medium_risk_zones: Vec<RiskZone>,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PersonalizedAlert {
    pub alert_level: ConfidenceLevel,
    pub risk_score: f64,
    pub location_risk: f64,
    pub time_risk: f64,
    pub spike_risk: f64,
    pub nearby_reports: usize,
    pub is_night: bool,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SafetyLevel {
    High,
    Medium,
    Low,
    Safe,
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TileSafety {
    pub tile_id: TileId,
    pub safety_score: f64,
    pub risk_level: SafetyLevel,
    pub confidence: ConfidenceLevel,
    pub signal_count: usize,
    pub is_spike: bool,
    pub spike_message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PatternAnalysis {
    pub analyzed_at: DateTime<Utc>,
    pub spikes: Vec<Spike>,
    pub clusters: Vec<Cluster>,
    pub anomalies: Anomalies,
    pub risk_zones: RiskZones,
}

/// A full analysis plus what it persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisRun {
    pub analysis: PatternAnalysis,
    pub alerts_created: usize,
    pub patterns_created: usize,
    pub reputations_updated: usize,
    /// Items that could not be persisted; logged and skipped.
    pub failed: usize,
}
