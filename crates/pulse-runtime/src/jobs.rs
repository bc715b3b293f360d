use std::fmt;
use std::time::Duration;

use serde::Serialize;

use pulse_aggregation::AggregationSummary;
use pulse_core::config::SchedulerConfig;
use pulse_decay::{DecaySummary, MaintenanceSummary};
use pulse_patterns::AnalysisRun;

/// Periodic background jobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JobKind {
    Aggregation,
    Decay,
    Patterns,
    Maintenance,
}

impl JobKind {
    pub const ALL: [JobKind; 4] = [
        Self::Aggregation,
        Self::Decay,
        Self::Patterns,
        Self::Maintenance,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Aggregation => "aggregation",
            Self::Decay => "decay",
            Self::Patterns => "patterns",
            Self::Maintenance => "maintenance",
        }
    }

    /// Tick period from config; never zero.
    pub fn period(self, config: &SchedulerConfig) -> Duration {
        let secs = match self {
            Self::Aggregation => config.aggregation_interval_secs,
            Self::Decay => config.decay_interval_secs,
            Self::Patterns => config.pattern_interval_secs,
            Self::Maintenance => config.maintenance_interval_secs,
        };
        Duration::from_secs(secs.max(1))
    }
}

impl fmt::Display for JobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What one job run produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "job", content = "summary", rename_all = "snake_case")]
pub enum JobReport {
    Aggregation(AggregationSummary),
    Decay(DecaySummary),
    Patterns(AnalysisRun),
    Maintenance(MaintenanceSummary),
}
