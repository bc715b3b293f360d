//! Tracing setup: structured logging, span definitions, and event helpers.

pub mod events;
pub mod spans;

use std::sync::Once;

use tracing_subscriber::EnvFilter;

use pulse_core::config::ObservabilityConfig;

static INIT: Once = Once::new();

/// Environment variable holding the filter directive.
pub const LOG_ENV: &str = "PULSE_LOG";

/// Initialize the global subscriber with JSON output.
///
/// Respects `PULSE_LOG` (e.g. `PULSE_LOG=pulse_aggregation=debug,info`).
/// Defaults to `info`. Safe to call more than once.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true)
            .json()
            .try_init();
    });
}

/// Initialize with a fixed filter string (tests, embedding).
pub fn init_tracing_with_filter(filter: &str) {
    let filter = filter.to_string();
    INIT.call_once(move || {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::new(filter))
            .with_target(true)
            .json()
            .try_init();
    });
}

/// Initialize from the `[observability]` config section. `PULSE_LOG` still
/// wins over `log_level` when set.
pub fn init_from_config(config: &ObservabilityConfig) {
    let level = config.log_level.clone();
    let json = config.json_logs;
    INIT.call_once(move || {
        let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(level));
        let builder = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true);
        let _ = if json {
            builder.json().try_init()
        } else {
            builder.try_init()
        };
    });
}
