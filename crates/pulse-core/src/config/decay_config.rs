use serde::{Deserialize, Serialize};

use super::defaults;

/// Tile decay and maintenance configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DecayConfig {
    /// Tiles whose decayed intensity is at or below this are deleted.
    pub tile_delete_cutoff: f64,
    pub tile_max_age_hours: f64,
    pub fading_tile_intensity: f64,
    pub fading_tile_ttl_hours: i64,
    /// Time constant for report severity decay during maintenance.
    pub report_decay_hours: f64,
    pub pattern_retention_days: i64,
    pub alert_retention_hours: i64,
    pub empty_tile_retention_days: i64,
}

impl Default for DecayConfig {
    fn default() -> Self {
        Self {
            tile_delete_cutoff: defaults::DEFAULT_TILE_DELETE_CUTOFF,
            tile_max_age_hours: defaults::DEFAULT_TILE_MAX_AGE_HOURS,
            fading_tile_intensity: defaults::DEFAULT_FADING_TILE_INTENSITY,
            fading_tile_ttl_hours: defaults::DEFAULT_FADING_TILE_TTL_HOURS,
            report_decay_hours: defaults::DEFAULT_REPORT_DECAY_HOURS,
            pattern_retention_days: defaults::DEFAULT_PATTERN_RETENTION_DAYS,
            alert_retention_hours: defaults::DEFAULT_ALERT_RETENTION_HOURS,
            empty_tile_retention_days: defaults::DEFAULT_EMPTY_TILE_RETENTION_DAYS,
        }
    }
}
