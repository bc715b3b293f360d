use serde::{Deserialize, Serialize};

use super::defaults;

/// Pulse aggregation configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregationConfig {
    pub window_hours: i64,
    /// Time constant of the exponential report weight.
    pub decay_half_life_hours: f64,
    /// Tiles computing below this intensity are not written.
    pub min_tile_intensity: f64,
    pub density_boost_count: usize,
    pub density_boost: f64,
    pub base_radius_m: f64,
    pub radius_per_intensity_m: f64,
    pub tile_ttl_hours: i64,
    /// Geohash length for pulse tiles.
    pub coarse_precision: usize,
    /// Geohash length for cluster tiles.
    pub fine_precision: usize,
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self {
            window_hours: defaults::DEFAULT_AGGREGATION_WINDOW_HOURS,
            decay_half_life_hours: defaults::DEFAULT_DECAY_HALF_LIFE_HOURS,
            min_tile_intensity: defaults::DEFAULT_MIN_TILE_INTENSITY,
            density_boost_count: defaults::DEFAULT_DENSITY_BOOST_COUNT,
            density_boost: defaults::DEFAULT_DENSITY_BOOST,
            base_radius_m: defaults::DEFAULT_BASE_RADIUS_M,
            radius_per_intensity_m: defaults::DEFAULT_RADIUS_PER_INTENSITY_M,
            tile_ttl_hours: defaults::DEFAULT_TILE_TTL_HOURS,
            coarse_precision: defaults::DEFAULT_COARSE_PRECISION,
            fine_precision: defaults::DEFAULT_FINE_PRECISION,
        }
    }
}
