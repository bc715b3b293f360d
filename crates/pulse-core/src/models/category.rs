use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::PulseError;

/// What the reporter experienced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalCategory {
    Harassment,
    Followed,
    SuspiciousActivity,
    UnsafeArea,
    Other,
}

impl SignalCategory {
    /// All variants, ordered by descending aggregation weight.
    pub const ALL: [SignalCategory; 5] = [
        Self::Harassment,
        Self::Followed,
        Self::SuspiciousActivity,
        Self::UnsafeArea,
        Self::Other,
    ];

    /// Multiplier applied to a report's contribution to pulse intensity.
    pub fn weight(self) -> f64 {
        match self {
            Self::Harassment => 1.0,
            Self::Followed => 0.9,
            Self::SuspiciousActivity => 0.8,
            Self::UnsafeArea => 0.7,
            Self::Other => 0.5,
        }
    }

    /// Human-facing reason shown on a pulse.
    pub fn label(self) -> &'static str {
        match self {
            Self::Harassment => "Harassment",
            Self::Followed => "Followed",
            Self::SuspiciousActivity => "Suspicious activity",
            Self::UnsafeArea => "Unsafe area",
            Self::Other => "Felt unsafe here",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Harassment => "harassment",
            Self::Followed => "followed",
            Self::SuspiciousActivity => "suspicious_activity",
            Self::UnsafeArea => "unsafe_area",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for SignalCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SignalCategory {
    type Err = PulseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| PulseError::invalid(format!("unknown signal category '{s}'")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_every_variant() {
        for c in SignalCategory::ALL {
            assert_eq!(c.as_str().parse::<SignalCategory>().unwrap(), c);
        }
        assert!("robbery".parse::<SignalCategory>().is_err());
    }

    #[test]
    fn weights_descend() {
        let weights: Vec<f64> = SignalCategory::ALL.iter().map(|c| c.weight()).collect();
        assert!(weights.windows(2).all(|w| w[0] > w[1]));
    }
}
