//! PulseService: the facade callers talk to. Validates raw input, admits
//! identity-bearing requests through the rate limiter, and delegates to the
//! component engines. All engines share one storage handle and one
//! broadcast notifier.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Duration, Timelike, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::{debug, info};

use pulse_aggregation::AggregationEngine;
use pulse_core::config::PulseConfig;
use pulse_core::constants::{MAX_SNAPSHOT_ROWS, VERSION};
use pulse_core::errors::{PulseError, PulseResult};
use pulse_core::geo::{BoundingBox, Coordinate};
use pulse_core::models::{
    DomainEvent, Identity, NewReport, PulseTile, ReportQuery, ReportStatus, SafetyReport,
    Severity, SignalCategory,
};
use pulse_core::traits::{IEventSink, IPulseStorage};
use pulse_decay::{DecayEngine, MaintenanceJob};
use pulse_lifecycle::{LifecycleEngine, VoteOutcome};
use pulse_observability::{
    aggregation_span, decay_span, maintenance_span, pattern_span, submission_span, vote_span,
    HealthReport, JobOutcome, JobRegistry,
};
use pulse_patterns::{
    PatternAnalysis, PatternDetector, PersonalizedAlert, RiskZones, Spike, TileSafety,
};
use pulse_storage::StorageEngine;
use pulse_trust::{IdentitySummary, VoteSummary};

use crate::jobs::{JobKind, JobReport};
use crate::notifier::BroadcastNotifier;
use crate::rate_limit::RateLimiter;

type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Raw submission as it arrives from a client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmitReportRequest {
    pub category: String,
    pub severity: u8,
    pub latitude: f64,
    pub longitude: f64,
    pub identity: Identity,
    #[serde(default)]
    pub context: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmitReceipt {
    pub report_id: String,
    pub trust_score: f64,
    pub status: ReportStatus,
    pub vote_window_expires_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Polling fallback for clients without an event subscription.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Updates {
    pub new_reports: Vec<SafetyReport>,
    pub updated_tiles: Vec<PulseTile>,
    pub spikes: Vec<Spike>,
    pub server_time: DateTime<Utc>,
}

pub struct PulseService {
    storage: Arc<dyn IPulseStorage>,
    lifecycle: Arc<LifecycleEngine>,
    aggregation: AggregationEngine,
    decay: Arc<DecayEngine>,
    maintenance: MaintenanceJob,
    patterns: PatternDetector,
    limiter: RateLimiter,
    notifier: BroadcastNotifier,
    jobs: JobRegistry,
    config: PulseConfig,
    clock: Clock,
}

impl PulseService {
    /// File-backed service at `config.storage.db_path`.
    pub fn open(config: PulseConfig) -> PulseResult<Self> {
        config.validate()?;
        let storage =
            StorageEngine::open_with_config(Path::new(&config.storage.db_path), &config.storage)?;
        Ok(Self::new(Arc::new(storage), config))
    }

    pub fn in_memory(config: PulseConfig) -> PulseResult<Self> {
        config.validate()?;
        Ok(Self::new(Arc::new(StorageEngine::open_in_memory()?), config))
    }

    pub fn new(storage: Arc<dyn IPulseStorage>, config: PulseConfig) -> Self {
        let notifier = BroadcastNotifier::new(config.observability.event_channel_capacity);
        let events: Arc<dyn IEventSink> = Arc::new(notifier.clone());

        let lifecycle = Arc::new(LifecycleEngine::new(storage.clone(), &config).with_events(events.clone()));
        let aggregation = AggregationEngine::new(storage.clone(), config.aggregation.clone())
            .with_events(events.clone());
        let decay = Arc::new(DecayEngine::new(storage.clone(), &config).with_events(events.clone()));
        let maintenance = MaintenanceJob::new(storage.clone(), lifecycle.clone(), decay.clone(), &config);
        let patterns = PatternDetector::new(storage.clone(), &config).with_events(events);
        debug!(version = VERSION, db_path = %config.storage.db_path, "pulse service assembled");

        Self {
            limiter: RateLimiter::new(config.rate_limit.clone()),
            jobs: JobRegistry::new(config.observability.failure_alert_threshold),
            storage,
            lifecycle,
            aggregation,
            decay,
            maintenance,
            patterns,
            notifier,
            config,
            clock: Arc::new(Utc::now),
        }
    }

    /// Replace the time source. Tests pin it; production uses `Utc::now`.
    pub fn with_clock(mut self, clock: impl Fn() -> DateTime<Utc> + Send + Sync + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    pub fn config(&self) -> &PulseConfig {
        &self.config
    }

    pub fn now(&self) -> DateTime<Utc> {
        (self.clock)()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DomainEvent> {
        self.notifier.subscribe()
    }

    pub fn jobs(&self) -> &JobRegistry {
        &self.jobs
    }

    pub fn health(&self) -> HealthReport {
        self.jobs.report(self.now())
    }

    // --- Reports & votes ---

    pub fn submit_report(&self, request: SubmitReportRequest) -> PulseResult<SubmitReceipt> {
        let _span = submission_span!(request.category.as_str(), request.severity).entered();
        self.limiter.check(&request.identity)?;
        let category: SignalCategory = request.category.parse()?;
        let severity = Severity::new(request.severity)?;

        let report = self.lifecycle.submit(
            NewReport {
                category,
                severity,
                latitude: request.latitude,
                longitude: request.longitude,
                reporter: request.identity,
                context: request.context,
            },
            self.now(),
        )?;
        Ok(SubmitReceipt {
            report_id: report.id,
            trust_score: report.trust_score.value(),
            status: report.status,
            vote_window_expires_at: report.vote_window_expires_at,
            expires_at: report.expires_at,
        })
    }

    pub fn cast_vote(&self, report_id: &str, voter: &Identity, is_accurate: bool) -> PulseResult<VoteOutcome> {
        let _span = vote_span!(report_id, is_accurate).entered();
        self.limiter.check(voter)?;
        self.lifecycle.cast_vote(report_id, voter, is_accurate, self.now())
    }

    pub fn remove_vote(&self, report_id: &str, voter: &Identity) -> PulseResult<VoteOutcome> {
        self.limiter.check(voter)?;
        self.lifecycle.remove_vote(report_id, voter, self.now())
    }

    pub fn delete_report(
        &self,
        report_id: &str,
        owner: &Identity,
        reason: Option<String>,
    ) -> PulseResult<DateTime<Utc>> {
        self.limiter.check(owner)?;
        self.lifecycle.delete_report(report_id, owner, reason, self.now())
    }

    pub fn get_report(&self, report_id: &str) -> PulseResult<SafetyReport> {
        self.storage
            .get_report(report_id)?
            .ok_or_else(|| PulseError::not_found("report", report_id))
    }

    /// Active reports within `radius_km` created in the last `window_hours`,
    /// newest first.
    pub fn list_reports(
        &self,
        latitude: f64,
        longitude: f64,
        radius_km: f64,
        window_hours: i64,
    ) -> PulseResult<Vec<SafetyReport>> {
        if window_hours <= 0 {
            return Err(PulseError::invalid(format!(
                "window of {window_hours} hours must be positive"
            )));
        }
        let center = Coordinate::new(latitude, longitude)?;
        let now = self.now();
        let mut query = ReportQuery::active_since(now, now - Duration::hours(window_hours))
            .within(BoundingBox::around(center, radius_km)?);
        query.limit = Some(MAX_SNAPSHOT_ROWS);
        let radius_m = radius_km * 1000.0;
        let mut reports: Vec<_> = self
            .storage
            .query_reports(&query)?
            .into_iter()
            .filter(|r| center.distance_m(&r.coordinate()) <= radius_m)
            .collect();
        reports.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(reports)
    }

    pub fn vote_summary(&self, report_id: &str) -> PulseResult<VoteSummary> {
        Ok(VoteSummary::of(&self.get_report(report_id)?))
    }

    pub fn identity_summary(&self, identity: &Identity) -> PulseResult<IdentitySummary> {
        identity.validate()?;
        self.limiter.check(identity)?;
        let key = identity.reputation_key();
        let rep = self
            .storage
            .get_reputation(&key)?
            .ok_or_else(|| PulseError::not_found("identity", key.fingerprint()))?;
        Ok(IdentitySummary::of(&rep))
    }

    // --- Map & patterns ---

    pub fn get_active_pulses(&self, bbox: Option<BoundingBox>) -> PulseResult<Vec<PulseTile>> {
        self.aggregation.active_pulses(bbox.as_ref(), self.now())
    }

    pub fn get_patterns(&self) -> PulseResult<PatternAnalysis> {
        self.patterns.full_analysis(self.now())
    }

    /// `radius_km` defaults to the configured risk-zone radius.
    pub fn get_risk_zones(&self, latitude: f64, longitude: f64, radius_km: Option<f64>) -> PulseResult<RiskZones> {
        let center = Coordinate::new(latitude, longitude)?;
        let radius = radius_km.unwrap_or(self.config.patterns.risk_zone_radius_km);
        self.patterns.risk_zones(center, radius, self.now())
    }

    /// `hour` defaults to the current UTC hour.
    pub fn get_personalized_alert(
        &self,
        latitude: f64,
        longitude: f64,
        hour: Option<u32>,
    ) -> PulseResult<PersonalizedAlert> {
        let location = Coordinate::new(latitude, longitude)?;
        let now = self.now();
        self.patterns
            .personalized_alert(location, hour.unwrap_or_else(|| now.hour()), now)
    }

    pub fn tile_safety(&self, tile_id: &str) -> PulseResult<TileSafety> {
        self.patterns.tile_safety(tile_id, self.now())
    }

    /// Everything that changed near `center` since `since`.
    pub fn updates_since(
        &self,
        latitude: f64,
        longitude: f64,
        radius_km: f64,
        since: DateTime<Utc>,
    ) -> PulseResult<Updates> {
        let center = Coordinate::new(latitude, longitude)?;
        let bbox = BoundingBox::around(center, radius_km)?;
        let now = self.now();

        let mut query = ReportQuery::active_since(now, since).within(bbox);
        query.limit = Some(MAX_SNAPSHOT_ROWS);
        let new_reports = self.storage.query_reports(&query)?;

        let updated_tiles = self
            .storage
            .query_tiles(Some(&bbox), Some(now))?
            .into_iter()
            .filter(|t| t.last_updated > since)
            .collect();

        let spikes = self
            .patterns
            .spikes(now)?
            .into_iter()
            .filter(|s| bbox.contains(&s.center))
            .collect();

        Ok(Updates {
            new_reports,
            updated_tiles,
            spikes,
            server_time: now,
        })
    }

    // --- Jobs ---

    pub fn run_aggregation(&self) -> PulseResult<JobReport> {
        self.execute(JobKind::Aggregation)
    }

    pub fn run_decay(&self) -> PulseResult<JobReport> {
        self.execute(JobKind::Decay)
    }

    pub fn run_pattern_analysis(&self) -> PulseResult<JobReport> {
        self.execute(JobKind::Patterns)
    }

    pub fn run_maintenance(&self) -> PulseResult<JobReport> {
        self.execute(JobKind::Maintenance)
    }

    /// Run one job and record its outcome in the job registry. Maintenance
    /// counts as failed when any of its steps failed.
    pub fn execute(&self, kind: JobKind) -> PulseResult<JobReport> {
        let started_at = self.now();
        let clock = Instant::now();
        let result = self.dispatch(kind, started_at);
        let duration_ms = u64::try_from(clock.elapsed().as_millis()).unwrap_or(u64::MAX);

        let outcome = match &result {
            Ok(JobReport::Maintenance(summary)) if !summary.failed_steps.is_empty() => {
                JobOutcome::Failed(format!("failed steps: {}", summary.failed_steps.join(", ")))
            }
            Ok(_) => JobOutcome::Succeeded,
            Err(e) => JobOutcome::Failed(e.to_string()),
        };
        self.jobs.record(kind.as_str(), started_at, duration_ms, outcome);
        result
    }

    fn dispatch(&self, kind: JobKind, now: DateTime<Utc>) -> PulseResult<JobReport> {
        let trigger = "run";
        match kind {
            JobKind::Aggregation => {
                let _span = aggregation_span!(trigger).entered();
                self.aggregation.run(now).map(JobReport::Aggregation)
            }
            JobKind::Decay => {
                let _span = decay_span!(trigger).entered();
                self.decay.run(now).map(JobReport::Decay)
            }
            JobKind::Patterns => {
                let _span = pattern_span!(trigger).entered();
                self.patterns.run_analysis(now).map(JobReport::Patterns)
            }
            JobKind::Maintenance => {
                let _span = maintenance_span!(trigger).entered();
                let summary = self.maintenance.run(now);
                info!(failed_steps = summary.failed_steps.len(), "maintenance finished");
                Ok(JobReport::Maintenance(summary))
            }
        }
    }
}
