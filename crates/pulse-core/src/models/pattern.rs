use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::PulseError;
use crate::geo::{Coordinate, TileId};

/// Persisted pattern kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternKind {
    Cluster,
    RiskZone,
}

/// Persisted alert kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    Spike,
    SpamDevice,
    RapidFire,
    LowTrust,
}

macro_rules! string_enum {
    ($ty:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        impl $ty {
            pub fn as_str(self) -> &'static str {
                match self { $(Self::$variant => $s),+ }
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = PulseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant),)+
                    other => Err(PulseError::invalid(format!(
                        concat!("unknown ", stringify!($ty), " '{}'"), other
                    ))),
                }
            }
        }
    };
}

string_enum!(PatternKind { Cluster => "cluster", RiskZone => "risk_zone" });
string_enum!(AlertKind {
    Spike => "spike",
    SpamDevice => "spam_device",
    RapidFire => "rapid_fire",
    LowTrust => "low_trust",
});

/// Derived geographic pattern, retained for a bounded window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SafetyPattern {
    pub id: String,
    pub kind: PatternKind,
    pub tile_id: TileId,
    pub center: Coordinate,
    pub intensity: f64,
    pub data: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

/// Derived anomaly alert, retained for a bounded window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnomalyAlert {
    pub id: String,
    pub kind: AlertKind,
    pub tile_id: Option<TileId>,
    pub center: Option<Coordinate>,
    pub severity: f64,
    pub message: String,
    pub data: serde_json::Value,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}
