//! Background job health: per-job run history and an aggregate report.

mod registry;

pub use registry::JobRegistry;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// How the last tick of a job ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", content = "message", rename_all = "snake_case")]
pub enum JobOutcome {
    Succeeded,
    Failed(String),
    Panicked(String),
}

impl JobOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

/// Snapshot of one job's history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobHealth {
    pub name: String,
    pub status: HealthStatus,
    pub last_run: DateTime<Utc>,
    pub last_duration_ms: u64,
    pub last_outcome: JobOutcome,
    pub consecutive_failures: u32,
    pub total_runs: u64,
    pub total_failures: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthReport {
    pub overall_status: HealthStatus,
    /// Sorted by job name.
    pub jobs: Vec<JobHealth>,
    pub generated_at: DateTime<Utc>,
}
