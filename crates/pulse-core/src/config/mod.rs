pub mod aggregation_config;
pub mod decay_config;
pub mod defaults;
pub mod lifecycle_config;
pub mod observability_config;
pub mod pattern_config;
pub mod rate_limit_config;
pub mod scheduler_config;
pub mod storage_config;
pub mod trust_config;

pub use aggregation_config::AggregationConfig;
pub use decay_config::DecayConfig;
pub use lifecycle_config::LifecycleConfig;
pub use observability_config::ObservabilityConfig;
pub use pattern_config::PatternConfig;
pub use rate_limit_config::RateLimitConfig;
pub use scheduler_config::SchedulerConfig;
pub use storage_config::StorageConfig;
pub use trust_config::TrustConfig;

use serde::{Deserialize, Serialize};

use crate::errors::{PulseError, PulseResult};

/// Top-level configuration. Every section falls back to its defaults, so a
/// partial TOML document only needs to name the keys it overrides.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PulseConfig {
    pub storage: StorageConfig,
    pub trust: TrustConfig,
    pub lifecycle: LifecycleConfig,
    pub aggregation: AggregationConfig,
    pub decay: DecayConfig,
    pub patterns: PatternConfig,
    pub scheduler: SchedulerConfig,
    pub rate_limit: RateLimitConfig,
    pub observability: ObservabilityConfig,
}

impl PulseConfig {
    /// Parse a TOML document.
    pub fn from_toml(source: &str) -> PulseResult<Self> {
        let config: Self =
            toml::from_str(source).map_err(|e| PulseError::ConfigError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject combinations that would break the scoring bounds.
    pub fn validate(&self) -> PulseResult<()> {
        let trust = &self.trust;
        if !(0.0..=1.0).contains(&trust.existing_trust_share) {
            return Err(PulseError::ConfigError(format!(
                "trust.existing_trust_share {} is outside [0, 1]",
                trust.existing_trust_share
            )));
        }
        if trust.blur_radius_m < 0.0 {
            return Err(PulseError::ConfigError(
                "trust.blur_radius_m must not be negative".into(),
            ));
        }
        if self.aggregation.decay_half_life_hours <= 0.0 {
            return Err(PulseError::ConfigError(
                "aggregation.decay_half_life_hours must be positive".into(),
            ));
        }
        if self.aggregation.coarse_precision == 0 || self.aggregation.fine_precision == 0 {
            return Err(PulseError::ConfigError(
                "tile precision must be at least 1".into(),
            ));
        }
        if self.lifecycle.min_votes_for_transition == 0 {
            return Err(PulseError::ConfigError(
                "lifecycle.min_votes_for_transition must be at least 1".into(),
            ));
        }
        Ok(())
    }
}
