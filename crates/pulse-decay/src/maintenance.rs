//! Daily maintenance: expiration sweep, report decay, status refresh, and
//! retention purges. Each step is isolated; a failing step is logged and the
//! rest still run.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use pulse_core::config::{DecayConfig, PulseConfig};
use pulse_core::constants::MAX_SNAPSHOT_ROWS;
use pulse_core::errors::PulseResult;
use pulse_core::models::ReportQuery;
use pulse_core::traits::IPulseStorage;
use pulse_lifecycle::{ExpirationSummary, LifecycleEngine, RefreshSummary};

use crate::curve;
use crate::engine::DecayEngine;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MaintenanceSummary {
    pub expiration: ExpirationSummary,
    pub reports_decayed: usize,
    pub refresh: RefreshSummary,
    pub patterns_purged: usize,
    pub alerts_purged: usize,
    pub empty_tiles_removed: usize,
    pub expired_tiles_removed: usize,
    pub failed_steps: Vec<String>,
}

pub struct MaintenanceJob {
    storage: Arc<dyn IPulseStorage>,
    lifecycle: Arc<LifecycleEngine>,
    decay: Arc<DecayEngine>,
    config: DecayConfig,
}

impl MaintenanceJob {
    pub fn new(
        storage: Arc<dyn IPulseStorage>,
        lifecycle: Arc<LifecycleEngine>,
        decay: Arc<DecayEngine>,
        config: &PulseConfig,
    ) -> Self {
        Self {
            storage,
            lifecycle,
            decay,
            config: config.decay.clone(),
        }
    }

    #[instrument(skip(self))]
    pub fn run(&self, now: DateTime<Utc>) -> MaintenanceSummary {
        let mut summary = MaintenanceSummary::default();

        if let Some(expiration) = step(&mut summary, "expiration", self.lifecycle.expire_due(now)) {
            summary.expiration = expiration;
        }
        if let Some(n) = step(&mut summary, "report_decay", self.decay_reports(now)) {
            summary.reports_decayed = n;
        }
        if let Some(refresh) = step(&mut summary, "status_refresh", self.lifecycle.refresh_statuses(now)) {
            summary.refresh = refresh;
        }

        let pattern_cutoff = now - Duration::days(self.config.pattern_retention_days);
        if let Some(n) = step(&mut summary, "pattern_purge", self.storage.purge_patterns_before(pattern_cutoff)) {
            summary.patterns_purged = n;
        }
        let alert_cutoff = now - Duration::hours(self.config.alert_retention_hours);
        if let Some(n) = step(&mut summary, "alert_purge", self.storage.purge_alerts_before(alert_cutoff)) {
            summary.alerts_purged = n;
        }
        let empty_cutoff = now - Duration::days(self.config.empty_tile_retention_days);
        if let Some(n) = step(&mut summary, "empty_tiles", self.storage.delete_empty_tiles(empty_cutoff)) {
            summary.empty_tiles_removed = n;
        }
        if let Some(ids) = step(&mut summary, "expired_tiles", self.storage.delete_expired_tiles(now)) {
            summary.expired_tiles_removed = ids.len();
            for id in &ids {
                self.decay.emit_expired(id, now);
            }
        }

        info!(
            expired = summary.expiration.expired,
            reports_decayed = summary.reports_decayed,
            transitioned = summary.refresh.transitioned,
            patterns_purged = summary.patterns_purged,
            alerts_purged = summary.alerts_purged,
            tiles_removed = summary.empty_tiles_removed + summary.expired_tiles_removed,
            failed_steps = summary.failed_steps.len(),
            "maintenance complete"
        );
        summary
    }

    /// Recompute `severity_weight` and confidence for every active report.
    fn decay_reports(&self, now: DateTime<Utc>) -> PulseResult<usize> {
        let mut query = ReportQuery {
            active_at: Some(now),
            ..ReportQuery::default()
        };
        query.limit = Some(MAX_SNAPSHOT_ROWS);
        let reports = self.storage.query_reports(&query)?;

        let mut decayed = 0;
        for report in &reports {
            let result = self.storage.update_report(&report.id, &mut |r| {
                r.severity_weight = curve::severity_weight(r.severity, r.age_hours(now), &self.config);
                self.lifecycle.rescore(r, now);
                Ok(())
            });
            match result {
                Ok(_) => decayed += 1,
                Err(e) => warn!(report_id = %report.id, error = %e, "failed to decay report"),
            }
        }
        Ok(decayed)
    }
}

fn step<T>(summary: &mut MaintenanceSummary, name: &str, result: PulseResult<T>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(step = name, error = %e, "maintenance step failed");
            summary.failed_steps.push(name.to_string());
            None
        }
    }
}
