use serde::{Deserialize, Serialize};
use std::fmt;

/// Reputation-derived weight of a report, clamped to [0.2, 1.0].
///
/// The floor keeps a brand-new anonymous reporter from being silenced
/// entirely; the ceiling is reached only through history and peer votes.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct TrustScore(f64);

impl TrustScore {
    pub const FLOOR: f64 = 0.2;
    pub const CEILING: f64 = 1.0;
    /// Identities at or above this are reported as high trust.
    pub const HIGH: f64 = 0.8;
    /// Identities at or above this are reported as medium trust.
    pub const MEDIUM: f64 = 0.6;

    /// Create a new TrustScore, clamping to [0.2, 1.0]. NaN collapses to the floor.
    pub fn new(value: f64) -> Self {
        if value.is_nan() {
            return Self(Self::FLOOR);
        }
        Self(value.clamp(Self::FLOOR, Self::CEILING))
    }

    pub fn floor() -> Self {
        Self(Self::FLOOR)
    }

    pub fn value(self) -> f64 {
        self.0
    }
}

impl Default for TrustScore {
    fn default() -> Self {
        Self::floor()
    }
}

impl fmt::Display for TrustScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.3}", self.0)
    }
}

impl From<f64> for TrustScore {
    fn from(value: f64) -> Self {
        Self::new(value)
    }
}

impl From<TrustScore> for f64 {
    fn from(t: TrustScore) -> Self {
        t.0
    }
}
