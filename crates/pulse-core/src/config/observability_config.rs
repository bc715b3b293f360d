use serde::{Deserialize, Serialize};

use super::defaults;

/// Observability configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level: "trace", "debug", "info", "warn", "error".
    pub log_level: String,
    /// Emit JSON lines instead of the human-readable format.
    pub json_logs: bool,
    /// Buffer size of the broadcast event channel.
    pub event_channel_capacity: usize,
    /// Consecutive job failures before health degrades.
    pub failure_alert_threshold: u32,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: defaults::DEFAULT_LOG_LEVEL.to_string(),
            json_logs: defaults::DEFAULT_JSON_LOGS,
            event_channel_capacity: defaults::DEFAULT_EVENT_CHANNEL_CAPACITY,
            failure_alert_threshold: defaults::DEFAULT_FAILURE_ALERT_THRESHOLD,
        }
    }
}
