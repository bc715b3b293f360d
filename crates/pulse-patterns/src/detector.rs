use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info, instrument, warn};

use pulse_core::config::{PatternConfig, PulseConfig, TrustConfig};
use pulse_core::constants::MAX_SNAPSHOT_ROWS;
use pulse_core::errors::{PulseError, PulseResult};
use pulse_core::geo::{self, BoundingBox, Coordinate};
use pulse_core::models::{
    AlertKind, AnomalyAlert, DomainEvent, EventKind, PatternKind, ReportQuery, SafetyPattern,
    SafetyReport,
};
use pulse_core::traits::{IEventSink, IPulseStorage, NoopEventSink};
use pulse_trust::reputation;

use crate::detectors;
use crate::smart;
use crate::types::*;

/// Storage-backed pattern detection. Detection reads a bounded snapshot and
/// never mutates it; `run_analysis` is the only path that persists.
pub struct PatternDetector {
    storage: Arc<dyn IPulseStorage>,
    config: PatternConfig,
    trust: TrustConfig,
    coarse_precision: usize,
    fine_precision: usize,
    events: Arc<dyn IEventSink>,
}

impl PatternDetector {
    pub fn new(storage: Arc<dyn IPulseStorage>, config: &PulseConfig) -> Self {
        Self {
            storage,
            config: config.patterns.clone(),
            trust: config.trust.clone(),
            coarse_precision: config.aggregation.coarse_precision,
            fine_precision: config.aggregation.fine_precision,
            events: Arc::new(NoopEventSink),
        }
    }

    pub fn with_events(mut self, events: Arc<dyn IEventSink>) -> Self {
        self.events = events;
        self
    }

    pub fn config(&self) -> &PatternConfig {
        &self.config
    }

    fn active_window(&self, now: DateTime<Utc>, window: Duration) -> PulseResult<Vec<SafetyReport>> {
        let mut query = ReportQuery::active_since(now, now - window);
        query.limit = Some(MAX_SNAPSHOT_ROWS);
        self.storage.query_reports(&query)
    }

    /// Every report in the window, including invalid and terminal ones.
    fn any_window(&self, now: DateTime<Utc>, window: Duration) -> PulseResult<Vec<SafetyReport>> {
        let query = ReportQuery {
            created_after: Some(now - window),
            limit: Some(MAX_SNAPSHOT_ROWS),
            ..ReportQuery::default()
        };
        self.storage.query_reports(&query)
    }

    pub fn spikes(&self, now: DateTime<Utc>) -> PulseResult<Vec<Spike>> {
        let window = Duration::minutes(self.config.spike_window_minutes);
        let reports = self.active_window(now, window)?;
        Ok(detectors::detect_spikes(&reports, now, &self.config))
    }

    pub fn clusters(&self, now: DateTime<Utc>) -> PulseResult<Vec<Cluster>> {
        let window = Duration::hours(self.config.cluster_window_hours);
        let reports = self.active_window(now, window)?;
        Ok(detectors::detect_clusters(
            &reports,
            now,
            self.fine_precision,
            &self.config,
        ))
    }

    /// Spam identities, rapid-fire tiles, and low-trust identities.
    pub fn anomalies(&self, now: DateTime<Utc>) -> PulseResult<Anomalies> {
        let cfg = &self.config;

        let spam_window = self.any_window(now, Duration::minutes(cfg.spam_window_minutes))?;
        let mut known = HashMap::new();
        let keys: BTreeSet<_> = spam_window.iter().map(|r| r.reporter.reputation_key()).collect();
        for key in keys {
            if let Some(rep) = self.storage.get_reputation(&key)? {
                known.insert(key, rep.submission_count);
            }
        }
        let spam_identities = detectors::detect_spam(&spam_window, now, &known, cfg);

        let rapid = self.any_window(now, Duration::minutes(cfg.rapid_fire_window_minutes))?;
        let rapid_reports = detectors::detect_rapid_fire(&rapid, now, cfg);

        let weekly = self.any_window(now, Duration::days(cfg.low_trust_window_days))?;
        let low_trust_patterns = detectors::detect_low_trust(&weekly, now, cfg);

        Ok(Anomalies {
            spam_identities,
            rapid_reports,
            low_trust_patterns,
        })
    }

    /// Risk zones inside a box around `center`.
    pub fn risk_zones(
        &self,
        center: Coordinate,
        radius_km: f64,
        now: DateTime<Utc>,
    ) -> PulseResult<RiskZones> {
        let bbox = BoundingBox::around(center, radius_km)?;
        let window = Duration::hours(self.config.risk_zone_window_hours);
        let mut query = ReportQuery::active_since(now, now - window).within(bbox);
        query.limit = Some(MAX_SNAPSHOT_ROWS);
        let reports = self.storage.query_reports(&query)?;
        Ok(detectors::risk_zones(
            &reports,
            now,
            self.coarse_precision,
            &self.config,
        ))
    }

    /// Point-in-time risk for a caller at `location` during local `hour`.
    pub fn personalized_alert(
        &self,
        location: Coordinate,
        hour: u32,
        now: DateTime<Utc>,
    ) -> PulseResult<PersonalizedAlert> {
        if hour > 23 {
            return Err(PulseError::invalid(format!("hour {hour} outside [0, 23]")));
        }
        let cfg = &self.config;

        let bbox = BoundingBox::around(location, cfg.alert_radius_km)?;
        let mut nearby_query = ReportQuery::active_since(now, now - Duration::hours(24)).within(bbox);
        nearby_query.limit = Some(MAX_SNAPSHOT_ROWS);
        let nearby = self.storage.query_reports(&nearby_query)?;

        let tile = geo::encode(location, self.coarse_precision)?;
        let spike_since = now - Duration::minutes(cfg.spike_window_minutes);
        let mut tile_query = ReportQuery::active_since(now, spike_since).in_tile(tile);
        tile_query.limit = Some(MAX_SNAPSHOT_ROWS);
        let tile_recent = self.storage.query_reports(&tile_query)?.len();

        Ok(detectors::personalized_alert(&nearby, tile_recent, hour, cfg))
    }

    /// Smart-score safety summary for one tile.
    pub fn tile_safety(&self, tile_id: &str, now: DateTime<Utc>) -> PulseResult<TileSafety> {
        geo::decode(tile_id)?;
        let mut query = ReportQuery {
            active_at: Some(now),
            limit: Some(MAX_SNAPSHOT_ROWS),
            ..ReportQuery::default()
        };
        query.tile_prefix = Some(tile_id.to_string());
        let reports = self.storage.query_reports(&query)?;
        Ok(smart::tile_safety(tile_id, &reports, now, &self.config, &self.trust))
    }

    /// Read-only pass over every detector. Risk zones cover the whole store.
    #[instrument(skip(self))]
    pub fn full_analysis(&self, now: DateTime<Utc>) -> PulseResult<PatternAnalysis> {
        let spikes = self.spikes(now)?;
        let clusters = self.clusters(now)?;
        let anomalies = self.anomalies(now)?;

        let window = Duration::hours(self.config.risk_zone_window_hours);
        let reports = self.active_window(now, window)?;
        let risk_zones = detectors::risk_zones(&reports, now, self.coarse_precision, &self.config);

        debug!(
            spikes = spikes.len(),
            clusters = clusters.len(),
            spam = anomalies.spam_identities.len(),
            rapid = anomalies.rapid_reports.len(),
            zones = risk_zones.total_zones,
            "pattern analysis"
        );
        Ok(PatternAnalysis {
            analyzed_at: now,
            spikes,
            clusters,
            anomalies,
            risk_zones,
        })
    }

    /// Background analysis: detect, then persist strong spikes and clusters,
    /// high risk zones, and rapid-fire tiles; feed spam scores into existing
    /// reputations. Per-item failures are logged and counted.
    #[instrument(skip(self))]
    pub fn run_analysis(&self, now: DateTime<Utc>) -> PulseResult<AnalysisRun> {
        let analysis = self.full_analysis(now)?;
        let mut run = AnalysisRun {
            analysis,
            alerts_created: 0,
            patterns_created: 0,
            reputations_updated: 0,
            failed: 0,
        };
        let threshold = self.config.persist_intensity;

        for spike in run.analysis.spikes.iter().filter(|s| s.spike_intensity > threshold) {
            match self.persist_spike(spike, now) {
                Ok(true) => run.alerts_created += 1,
                Ok(false) => debug!(tile = %spike.tile_id, "spike alert already active"),
                Err(e) => {
                    run.failed += 1;
                    warn!(tile = %spike.tile_id, error = %e, "failed to persist spike");
                }
            }
        }

        for cluster in run.analysis.clusters.iter().filter(|c| c.intensity > threshold) {
            let stored = self.persist_pattern(
                PatternKind::Cluster,
                &cluster.tile_id,
                cluster.center,
                cluster.intensity,
                cluster,
                now,
            );
            match stored {
                Ok(true) => run.patterns_created += 1,
                Ok(false) => debug!(tile = %cluster.tile_id, "cluster already recorded"),
                Err(e) => {
                    run.failed += 1;
                    warn!(tile = %cluster.tile_id, error = %e, "failed to persist cluster");
                }
            }
        }

        for zone in &run.analysis.risk_zones.high_risk_zones {
            let stored = self.persist_pattern(
                PatternKind::RiskZone,
                &zone.tile_id,
                zone.center,
                zone.risk_score,
                zone,
                now,
            );
            match stored {
                Ok(true) => {
                    run.patterns_created += 1;
                    self.events.emit(
                        DomainEvent::new(EventKind::LocationAlert, zone.tile_id.clone(), now)
                            .with("risk_score", zone.risk_score)
                            .with("report_count", zone.report_count as f64),
                    );
                }
                Ok(false) => debug!(tile = %zone.tile_id, "risk zone already recorded"),
                Err(e) => {
                    run.failed += 1;
                    warn!(tile = %zone.tile_id, error = %e, "failed to persist risk zone");
                }
            }
        }

        for rapid in &run.analysis.anomalies.rapid_reports {
            match self.persist_rapid_fire(rapid, now) {
                Ok(true) => run.alerts_created += 1,
                Ok(false) => {}
                Err(e) => {
                    run.failed += 1;
                    warn!(tile = %rapid.tile_id, error = %e, "failed to persist rapid-fire alert");
                }
            }
        }

        for spam in &run.analysis.anomalies.spam_identities {
            match self.feed_spam_score(spam, now) {
                Ok(true) => run.reputations_updated += 1,
                Ok(false) => {}
                Err(e) => {
                    run.failed += 1;
                    warn!(identity = %spam.identity, error = %e, "failed to record spam score");
                }
            }
            self.events.emit(
                DomainEvent::new(EventKind::AnomalyAlert, spam.identity.clone(), now)
                    .with("spam_score", spam.spam_score)
                    .with("report_count", spam.report_count as f64)
                    .with_detail(AlertKind::SpamDevice.as_str()),
            );
        }

        for low in &run.analysis.anomalies.low_trust_patterns {
            self.events.emit(
                DomainEvent::new(EventKind::AnomalyAlert, low.identity.clone(), now)
                    .with("avg_trust_score", low.avg_trust_score)
                    .with("report_count", low.report_count as f64)
                    .with_detail(AlertKind::LowTrust.as_str()),
            );
        }

        info!(
            spikes = run.analysis.spikes.len(),
            clusters = run.analysis.clusters.len(),
            alerts = run.alerts_created,
            patterns = run.patterns_created,
            reputations = run.reputations_updated,
            failed = run.failed,
            "pattern analysis complete"
        );
        Ok(run)
    }

    /// Persisted patterns newer than `since`, strongest first.
    pub fn stored_patterns(&self, since: DateTime<Utc>) -> PulseResult<Vec<SafetyPattern>> {
        self.storage.list_patterns(since)
    }

    pub fn stored_alerts(&self, since: DateTime<Utc>, active_only: bool) -> PulseResult<Vec<AnomalyAlert>> {
        self.storage.list_alerts(since, active_only)
    }

    /// Returns whether a new alert was written.
    fn persist_spike(&self, spike: &Spike, now: DateTime<Utc>) -> PulseResult<bool> {
        if self.storage.has_active_alert(AlertKind::Spike, &spike.tile_id)? {
            return Ok(false);
        }
        let alert = AnomalyAlert {
            id: spike.id.clone(),
            kind: AlertKind::Spike,
            tile_id: Some(spike.tile_id.clone()),
            center: Some(spike.center),
            severity: spike.spike_intensity,
            message: spike.message.clone(),
            data: serde_json::to_value(spike)?,
            is_active: true,
            created_at: now,
        };
        self.storage.insert_alert(&alert)?;
        self.events.emit(
            DomainEvent::new(EventKind::SpikeDetected, spike.tile_id.clone(), now)
                .with("report_count", spike.report_count as f64)
                .with("spike_intensity", spike.spike_intensity)
                .with("lat", spike.center.lat)
                .with("lng", spike.center.lng),
        );
        Ok(true)
    }

    fn persist_rapid_fire(&self, rapid: &RapidFire, now: DateTime<Utc>) -> PulseResult<bool> {
        if self.storage.has_active_alert(AlertKind::RapidFire, &rapid.tile_id)? {
            return Ok(false);
        }
        let alert = AnomalyAlert {
            id: uuid::Uuid::new_v4().to_string(),
            kind: AlertKind::RapidFire,
            tile_id: Some(rapid.tile_id.clone()),
            center: Some(rapid.center),
            severity: (rapid.reports_per_minute / 10.0).min(1.0),
            message: format!(
                "{} reports in {} seconds",
                rapid.report_count, rapid.time_span_seconds
            ),
            data: serde_json::to_value(rapid)?,
            is_active: true,
            created_at: now,
        };
        self.storage.insert_alert(&alert)?;
        self.events.emit(
            DomainEvent::new(EventKind::AnomalyAlert, rapid.tile_id.clone(), now)
                .with("reports_per_minute", rapid.reports_per_minute)
                .with_detail(AlertKind::RapidFire.as_str()),
        );
        Ok(true)
    }

    /// At most one pattern per kind and tile within that kind's detection
    /// window. Returns whether a new pattern was written.
    fn persist_pattern<T: serde::Serialize>(
        &self,
        kind: PatternKind,
        tile_id: &str,
        center: Coordinate,
        intensity: f64,
        payload: &T,
        now: DateTime<Utc>,
    ) -> PulseResult<bool> {
        let window = match kind {
            PatternKind::Cluster => Duration::hours(self.config.cluster_window_hours),
            PatternKind::RiskZone => Duration::hours(self.config.risk_zone_window_hours),
        };
        if self.storage.has_pattern_since(kind, tile_id, now - window)? {
            return Ok(false);
        }
        let pattern = SafetyPattern {
            id: uuid::Uuid::new_v4().to_string(),
            kind,
            tile_id: tile_id.to_string(),
            center,
            intensity: intensity.clamp(0.0, 1.0),
            data: serde_json::to_value(payload)?,
            created_at: now,
        };
        self.storage.insert_pattern(&pattern)?;
        Ok(true)
    }

    /// Only identities with a reputation record are updated; detection never
    /// creates one.
    fn feed_spam_score(&self, spam: &SpamIdentity, now: DateTime<Utc>) -> PulseResult<bool> {
        if self.storage.get_reputation(&spam.key)?.is_none() {
            return Ok(false);
        }
        self.storage.update_reputation(&spam.key, now, &mut |rep| {
            reputation::apply_spam_score(rep, spam.spam_score, now);
            Ok(())
        })?;
        Ok(true)
    }
}
