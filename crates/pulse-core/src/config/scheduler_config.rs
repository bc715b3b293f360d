use serde::{Deserialize, Serialize};

use super::defaults;

/// Background job intervals.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    pub aggregation_interval_secs: u64,
    pub decay_interval_secs: u64,
    pub pattern_interval_secs: u64,
    pub maintenance_interval_secs: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            aggregation_interval_secs: defaults::DEFAULT_AGGREGATION_INTERVAL_SECS,
            decay_interval_secs: defaults::DEFAULT_DECAY_INTERVAL_SECS,
            pattern_interval_secs: defaults::DEFAULT_PATTERN_INTERVAL_SECS,
            maintenance_interval_secs: defaults::DEFAULT_MAINTENANCE_INTERVAL_SECS,
        }
    }
}
