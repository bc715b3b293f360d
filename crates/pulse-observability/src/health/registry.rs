use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;

use super::{HealthReport, HealthStatus, JobHealth, JobOutcome};
use crate::tracing_setup::events;

#[derive(Debug, Clone)]
struct JobRecord {
    last_run: DateTime<Utc>,
    last_duration_ms: u64,
    last_outcome: JobOutcome,
    consecutive_failures: u32,
    total_runs: u64,
    total_failures: u64,
}

/// Thread-safe registry of background job runs. Cloning shares the map.
#[derive(Debug, Clone)]
pub struct JobRegistry {
    jobs: Arc<DashMap<String, JobRecord>>,
    failure_threshold: u32,
}

impl JobRegistry {
    /// `failure_threshold` consecutive failures mark a job unhealthy; fewer
    /// mark it degraded.
    pub fn new(failure_threshold: u32) -> Self {
        Self {
            jobs: Arc::new(DashMap::new()),
            failure_threshold: failure_threshold.max(1),
        }
    }

    /// Record a finished tick and log it.
    pub fn record(&self, job: &str, started_at: DateTime<Utc>, duration_ms: u64, outcome: JobOutcome) {
        let mut entry = self.jobs.entry(job.to_string()).or_insert_with(|| JobRecord {
            last_run: started_at,
            last_duration_ms: 0,
            last_outcome: JobOutcome::Succeeded,
            consecutive_failures: 0,
            total_runs: 0,
            total_failures: 0,
        });
        let record = entry.value_mut();
        record.last_run = started_at;
        record.last_duration_ms = duration_ms;
        record.total_runs += 1;
        if outcome.is_success() {
            record.consecutive_failures = 0;
        } else {
            record.consecutive_failures = record.consecutive_failures.saturating_add(1);
            record.total_failures += 1;
        }

        match &outcome {
            JobOutcome::Succeeded => events::job_completed(job, duration_ms),
            JobOutcome::Failed(error) => events::job_failed(job, error, record.consecutive_failures),
            JobOutcome::Panicked(message) => events::job_panicked(job, message),
        }
        record.last_outcome = outcome;
    }

    pub fn job(&self, job: &str) -> Option<JobHealth> {
        self.jobs.get(job).map(|r| self.to_health(job, r.value()))
    }

    pub fn report(&self, now: DateTime<Utc>) -> HealthReport {
        let mut jobs: Vec<JobHealth> = self
            .jobs
            .iter()
            .map(|r| self.to_health(r.key(), r.value()))
            .collect();
        jobs.sort_by(|a, b| a.name.cmp(&b.name));
        let overall_status = jobs
            .iter()
            .map(|j| j.status)
            .max()
            .unwrap_or(HealthStatus::Healthy);
        HealthReport {
            overall_status,
            jobs,
            generated_at: now,
        }
    }

    fn to_health(&self, name: &str, record: &JobRecord) -> JobHealth {
        let status = match record.consecutive_failures {
            0 => HealthStatus::Healthy,
            n if n >= self.failure_threshold => HealthStatus::Unhealthy,
            _ => HealthStatus::Degraded,
        };
        JobHealth {
            name: name.to_string(),
            status,
            last_run: record.last_run,
            last_duration_ms: record.last_duration_ms,
            last_outcome: record.last_outcome.clone(),
            consecutive_failures: record.consecutive_failures,
            total_runs: record.total_runs,
            total_failures: record.total_failures,
        }
    }
}

impl Default for JobRegistry {
    fn default() -> Self {
        Self::new(pulse_core::config::defaults::DEFAULT_FAILURE_ALERT_THRESHOLD)
    }
}
