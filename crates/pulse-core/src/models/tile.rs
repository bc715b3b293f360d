use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::PulseError;
use crate::geo::{Coordinate, TileId};

/// Coarse confidence bucket shown with a pulse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceLevel {
    Low,
    Medium,
    High,
}

impl ConfidenceLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl fmt::Display for ConfidenceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConfidenceLevel {
    type Err = PulseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            other => Err(PulseError::invalid(format!(
                "unknown confidence level '{other}'"
            ))),
        }
    }
}

/// Aggregated, decayed danger signal for one coarse tile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PulseTile {
    pub tile_id: TileId,
    pub center: Coordinate,
    /// Current intensity after decay.
    pub intensity: f64,
    /// Intensity written by the last aggregation run.
    pub base_intensity: f64,
    pub radius_m: u32,
    pub confidence: ConfidenceLevel,
    pub confidence_score: f64,
    pub dominant_reason: Option<String>,
    pub signal_count: u32,
    pub last_updated: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl PulseTile {
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        self.expires_at > now
    }

    pub fn age_hours(&self, now: DateTime<Utc>) -> f64 {
        ((now - self.last_updated).num_milliseconds() as f64 / 3_600_000.0).max(0.0)
    }
}
