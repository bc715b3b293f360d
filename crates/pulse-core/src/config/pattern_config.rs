use serde::{Deserialize, Serialize};

use super::defaults;

/// Pattern and anomaly detection configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PatternConfig {
    pub spike_window_minutes: i64,
    pub spike_min_reports: usize,
    /// Geohash length used to bucket spikes.
    pub spike_precision: usize,
    pub cluster_window_hours: i64,
    pub cluster_min_reports: usize,
    pub cluster_limit: usize,
    pub spam_window_minutes: i64,
    pub spam_min_reports: usize,
    pub rapid_fire_window_minutes: i64,
    pub rapid_fire_min_reports: usize,
    pub rapid_fire_rate_per_minute: f64,
    pub low_trust_window_days: i64,
    pub low_trust_min_reports: usize,
    pub low_trust_threshold: f64,
    pub risk_zone_window_hours: i64,
    pub risk_zone_limit: usize,
    pub risk_zone_radius_km: f64,
    pub alert_radius_km: f64,
    pub night_start_hour: u32,
    pub night_end_hour: u32,
    /// Spikes and clusters above this intensity are persisted by the background run.
    pub persist_intensity: f64,
}

impl Default for PatternConfig {
    fn default() -> Self {
        Self {
            spike_window_minutes: defaults::DEFAULT_SPIKE_WINDOW_MINUTES,
            spike_min_reports: defaults::DEFAULT_SPIKE_MIN_REPORTS,
            spike_precision: defaults::DEFAULT_COARSE_PRECISION,
            cluster_window_hours: defaults::DEFAULT_CLUSTER_WINDOW_HOURS,
            cluster_min_reports: defaults::DEFAULT_CLUSTER_MIN_REPORTS,
            cluster_limit: defaults::DEFAULT_CLUSTER_LIMIT,
            spam_window_minutes: defaults::DEFAULT_SPAM_WINDOW_MINUTES,
            spam_min_reports: defaults::DEFAULT_SPAM_MIN_REPORTS,
            rapid_fire_window_minutes: defaults::DEFAULT_RAPID_FIRE_WINDOW_MINUTES,
            rapid_fire_min_reports: defaults::DEFAULT_RAPID_FIRE_MIN_REPORTS,
            rapid_fire_rate_per_minute: defaults::DEFAULT_RAPID_FIRE_RATE_PER_MINUTE,
            low_trust_window_days: defaults::DEFAULT_LOW_TRUST_WINDOW_DAYS,
            low_trust_min_reports: defaults::DEFAULT_LOW_TRUST_MIN_REPORTS,
            low_trust_threshold: defaults::DEFAULT_LOW_TRUST_THRESHOLD,
            risk_zone_window_hours: defaults::DEFAULT_RISK_ZONE_WINDOW_HOURS,
            risk_zone_limit: defaults::DEFAULT_RISK_ZONE_LIMIT,
            risk_zone_radius_km: defaults::DEFAULT_RISK_ZONE_RADIUS_KM,
            alert_radius_km: defaults::DEFAULT_ALERT_RADIUS_KM,
            night_start_hour: defaults::DEFAULT_NIGHT_START_HOUR,
            night_end_hour: defaults::DEFAULT_NIGHT_END_HOUR,
            persist_intensity: defaults::DEFAULT_PERSIST_INTENSITY,
        }
    }
}
