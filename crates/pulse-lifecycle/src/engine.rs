//! LifecycleEngine: every report mutation outside aggregation.
//!
//! Each operation funnels through one closure-based storage transaction, so
//! tallies, trust, confidence, status, and the acting identity's reputation
//! move together or not at all. Events are emitted only after commit.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use pulse_core::config::{LifecycleConfig, PulseConfig};
use pulse_core::constants::{
    MAX_CONTEXT_ENTRIES, MAX_DELETE_REASON_LEN, MAX_SNAPSHOT_ROWS, MIN_SEVERITY_WEIGHT,
};
use pulse_core::errors::{PulseError, PulseResult};
use pulse_core::geo::{self, Coordinate};
use pulse_core::models::{
    AbuseFlags, DomainEvent, EventKind, Identity, NewReport, OwnerDeletion, ReportQuery,
    ReportStatus, SafetyReport, Vote, VoteTally,
};
use pulse_core::traits::{IEventSink, IPulseStorage, NoopEventSink};
use pulse_core::{Confidence, TrustScore};
use pulse_trust::reputation;
use pulse_trust::TrustScorer;

use crate::{confidence, permissions, transitions};

/// Tallies and scores after a vote is cast or removed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoteOutcome {
    pub report_id: String,
    pub votes: VoteTally,
    pub trust_score: TrustScore,
    pub confidence_score: Confidence,
    pub status: ReportStatus,
    /// Set when the vote moved the report to a new status.
    pub previous_status: Option<ReportStatus>,
}

impl VoteOutcome {
    fn from_report(report: &SafetyReport, before: Option<ReportStatus>) -> Self {
        Self {
            report_id: report.id.clone(),
            votes: report.votes,
            trust_score: report.trust_score,
            confidence_score: report.confidence_score,
            status: report.status,
            previous_status: before.filter(|b| *b != report.status),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpirationSummary {
    pub scanned: usize,
    pub expired: usize,
    pub failed: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshSummary {
    pub scanned: usize,
    pub rescored: usize,
    pub transitioned: usize,
    pub failed: usize,
}

pub struct LifecycleEngine {
    storage: Arc<dyn IPulseStorage>,
    trust: TrustScorer,
    config: LifecycleConfig,
    coarse_precision: usize,
    events: Arc<dyn IEventSink>,
}

impl LifecycleEngine {
    pub fn new(storage: Arc<dyn IPulseStorage>, config: &PulseConfig) -> Self {
        Self {
            storage,
            trust: TrustScorer::new(config.trust.clone()),
            config: config.lifecycle.clone(),
            coarse_precision: config.aggregation.coarse_precision,
            events: Arc::new(NoopEventSink),
        }
    }

    pub fn with_events(mut self, events: Arc<dyn IEventSink>) -> Self {
        self.events = events;
        self
    }

    pub fn config(&self) -> &LifecycleConfig {
        &self.config
    }

    pub fn trust(&self) -> &TrustScorer {
        &self.trust
    }

    /// Re-derive current trust and confidence from the stored base trust and
    /// tallies. Idempotent for a fixed `now`.
    pub fn rescore(&self, report: &mut SafetyReport, now: DateTime<Utc>) {
        report.trust_score = self.trust.report_trust(report.base_trust_score, &report.votes);
        let vote_term = self.trust.vote_term(&report.votes);
        report.confidence_score = confidence::compute(report, vote_term, now, &self.config);
    }

    /// Accept a new report: blur, tile, score, and persist as `pending`.
    #[instrument(skip_all, fields(category = %request.category, identity = %request.reporter.fingerprint()))]
    pub fn submit(&self, request: NewReport, now: DateTime<Utc>) -> PulseResult<SafetyReport> {
        request.reporter.validate()?;
        let raw = Coordinate::new(request.latitude, request.longitude)?;
        if request.context.len() > MAX_CONTEXT_ENTRIES {
            return Err(PulseError::invalid(format!(
                "context has {} entries, at most {MAX_CONTEXT_ENTRIES} allowed",
                request.context.len()
            )));
        }

        let blurred = self.trust.blur(raw);
        let tile_id = geo::encode(blurred, self.coarse_precision)?;
        let key = request.reporter.reputation_key();
        let recent = self
            .storage
            .query_reports(&ReportQuery {
                created_after: Some(now - Duration::hours(1)),
                reporter: Some(key),
                ..ReportQuery::default()
            })?
            .len();

        let authenticated = request.reporter.is_authenticated();
        let report = SafetyReport {
            id: uuid::Uuid::new_v4().to_string(),
            category: request.category,
            severity: request.severity,
            latitude: blurred.lat,
            longitude: blurred.lng,
            tile_id,
            created_at: now,
            reporter: request.reporter,
            context: request.context,
            trust_score: TrustScore::floor(),
            base_trust_score: TrustScore::floor(),
            confidence_score: Confidence::default(),
            severity_weight: request.severity.fraction().clamp(MIN_SEVERITY_WEIGHT, 1.0),
            votes: VoteTally::default(),
            status: ReportStatus::Pending,
            is_valid: true,
            vote_window_expires_at: now + Duration::hours(self.config.vote_window_hours),
            expires_at: now + Duration::hours(self.config.report_ttl_hours),
            last_activity_at: now,
            verified_at: None,
            disputed_at: None,
            deletion: None,
            abuse_flags: None,
        };

        let stored = self.storage.insert_report(report, &mut |report, rep| {
            let (trust, reasons) = self.trust.score_submission(rep, authenticated, recent, now);
            report.base_trust_score = trust;
            report.trust_score = trust;
            if !reasons.is_empty() {
                report.abuse_flags = Some(AbuseFlags {
                    reasons,
                    detected_at: now,
                });
            }
            self.rescore(report, now);
            Ok(())
        })?;

        if let Some(flags) = &stored.abuse_flags {
            warn!(report_id = %stored.id, reasons = ?flags.reasons, "report accepted with abuse flags");
        }
        info!(
            report_id = %stored.id,
            tile = %stored.tile_id,
            trust = stored.trust_score.value(),
            "report accepted"
        );
        self.events.emit(
            DomainEvent::new(EventKind::ReportAccepted, &stored.id, now)
                .with("severity", f64::from(stored.severity.value()))
                .with("trust_score", stored.trust_score.value())
                .with("latitude", stored.latitude)
                .with("longitude", stored.longitude)
                .with_detail(stored.category.as_str()),
        );
        Ok(stored)
    }

    /// Record one vote. Duplicate votes fail at the storage constraint before
    /// any other check runs.
    #[instrument(skip(self, voter), fields(voter = %voter.fingerprint()))]
    pub fn cast_vote(
        &self,
        report_id: &str,
        voter: &Identity,
        is_accurate: bool,
        now: DateTime<Utc>,
    ) -> PulseResult<VoteOutcome> {
        voter.validate()?;
        let vote = Vote {
            report_id: report_id.to_string(),
            voter: voter.reputation_key(),
            is_accurate,
            cast_at: now,
        };

        let mut before = None;
        let report = self.storage.record_vote(&vote, &mut |report, rep| {
            permissions::check_can_vote(report, voter, now)?;
            before = Some(report.status);
            report.votes.record(is_accurate);
            self.rescore(report, now);
            if let Some(next) = transitions::after_vote(report, &self.config) {
                transitions::apply(report, next, now);
            }
            report.last_activity_at = now;
            reputation::apply_vote_outcome(rep, is_accurate, now);
            Ok(())
        })?;

        let outcome = VoteOutcome::from_report(&report, before);
        debug!(
            true_count = outcome.votes.true_count,
            false_count = outcome.votes.false_count,
            confidence = outcome.confidence_score.value(),
            "vote recorded"
        );
        self.emit_vote_events(&outcome, now);
        Ok(outcome)
    }

    /// Withdraw the caller's vote and recompute. NotFound when there is none.
    #[instrument(skip(self, voter), fields(voter = %voter.fingerprint()))]
    pub fn remove_vote(
        &self,
        report_id: &str,
        voter: &Identity,
        now: DateTime<Utc>,
    ) -> PulseResult<VoteOutcome> {
        voter.validate()?;
        let mut before = None;
        let (_, report) = self.storage.remove_vote(
            report_id,
            &voter.reputation_key(),
            &mut |vote, report, rep| {
                if report.status == ReportStatus::Deleted {
                    return Err(PulseError::ReportTerminal {
                        report_id: report.id.clone(),
                        status: report.status,
                    });
                }
                before = Some(report.status);
                report.votes.retract(vote.is_accurate)?;
                self.rescore(report, now);
                if let Some(next) = transitions::after_removal(report, &self.config) {
                    transitions::apply(report, next, now);
                }
                report.last_activity_at = now;
                reputation::revert_vote_outcome(rep, vote.is_accurate, now);
                Ok(())
            },
        )?;

        let outcome = VoteOutcome::from_report(&report, before);
        debug!(total = outcome.votes.total(), "vote removed");
        self.emit_vote_events(&outcome, now);
        Ok(outcome)
    }

    /// Owner deletion. Cascades to the report's votes and starts the owner's
    /// cooldown. Returns the deletion instant.
    #[instrument(skip(self, owner, reason), fields(owner = %owner.fingerprint()))]
    pub fn delete_report(
        &self,
        report_id: &str,
        owner: &Identity,
        reason: Option<String>,
        now: DateTime<Utc>,
    ) -> PulseResult<DateTime<Utc>> {
        owner.validate()?;
        if let Some(reason) = &reason {
            if reason.chars().count() > MAX_DELETE_REASON_LEN {
                return Err(PulseError::invalid(format!(
                    "deletion reason longer than {MAX_DELETE_REASON_LEN} characters"
                )));
            }
        }
        let cooldown_until = now + Duration::minutes(self.config.delete_cooldown_minutes);

        let (report, removed_votes) = self.storage.soft_delete_report(
            report_id,
            &owner.reputation_key(),
            &mut |report, rep| {
                permissions::check_can_delete(report, owner, rep, now, &self.config)?;
                transitions::apply(report, ReportStatus::Deleted, now);
                report.votes = VoteTally::default();
                report.deletion = Some(OwnerDeletion {
                    deleted_at: now,
                    reason: reason.clone(),
                    cooldown_expires_at: cooldown_until,
                });
                rep.delete_cooldown_until = Some(cooldown_until);
                rep.updated_at = now;
                Ok(())
            },
        )?;

        info!(report_id = %report.id, removed_votes, "report deleted by owner");
        self.events.emit(
            DomainEvent::new(EventKind::ReportDeleted, &report.id, now)
                .with("removed_votes", removed_votes as f64),
        );
        Ok(now)
    }

    /// Expire every live report past `expires_at`, and pending reports whose
    /// vote window closed. Per-report failures are counted, not propagated.
    #[instrument(skip(self))]
    pub fn expire_due(&self, now: DateTime<Utc>) -> PulseResult<ExpirationSummary> {
        let candidates = self.storage.query_reports(&ReportQuery {
            statuses: Some(vec![
                ReportStatus::Pending,
                ReportStatus::Verified,
                ReportStatus::Disputed,
            ]),
            limit: Some(MAX_SNAPSHOT_ROWS),
            ..ReportQuery::default()
        })?;

        let mut summary = ExpirationSummary {
            scanned: candidates.len(),
            ..ExpirationSummary::default()
        };
        for candidate in candidates.iter().filter(|r| transitions::expiration_due(r, now)) {
            let mut before = candidate.status;
            let result = self.storage.update_report(&candidate.id, &mut |report| {
                before = report.status;
                if transitions::expiration_due(report, now) {
                    transitions::apply(report, ReportStatus::Expired, now);
                }
                Ok(())
            });
            match result {
                Ok(report) if report.status == ReportStatus::Expired && before != report.status => {
                    summary.expired += 1;
                    self.emit_status_change(&report, before, now);
                }
                Ok(_) => {}
                Err(e) => {
                    summary.failed += 1;
                    warn!(report_id = %candidate.id, error = %e, "failed to expire report");
                }
            }
        }

        info!(
            scanned = summary.scanned,
            expired = summary.expired,
            failed = summary.failed,
            "expiration sweep complete"
        );
        Ok(summary)
    }

    /// Re-evaluate pending, in-window reports: recompute confidence at `now`
    /// and apply any transition the current tallies allow.
    #[instrument(skip(self))]
    pub fn refresh_statuses(&self, now: DateTime<Utc>) -> PulseResult<RefreshSummary> {
        let pending = self.storage.query_reports(&ReportQuery {
            active_at: Some(now),
            statuses: Some(vec![ReportStatus::Pending]),
            limit: Some(MAX_SNAPSHOT_ROWS),
            ..ReportQuery::default()
        })?;

        let mut summary = RefreshSummary {
            scanned: pending.len(),
            ..RefreshSummary::default()
        };
        for candidate in pending.iter().filter(|r| now <= r.vote_window_expires_at) {
            let mut moved = false;
            let result = self.storage.update_report(&candidate.id, &mut |report| {
                if report.status == ReportStatus::Pending {
                    self.rescore(report, now);
                    if let Some(next) = transitions::after_vote(report, &self.config) {
                        moved = transitions::apply(report, next, now);
                    }
                }
                Ok(())
            });
            match result {
                Ok(report) => {
                    summary.rescored += 1;
                    if moved {
                        summary.transitioned += 1;
                        self.emit_status_change(&report, ReportStatus::Pending, now);
                    }
                }
                Err(e) => {
                    summary.failed += 1;
                    warn!(report_id = %candidate.id, error = %e, "failed to refresh report status");
                }
            }
        }

        info!(
            scanned = summary.scanned,
            rescored = summary.rescored,
            transitioned = summary.transitioned,
            "status refresh complete"
        );
        Ok(summary)
    }

    fn emit_vote_events(&self, outcome: &VoteOutcome, now: DateTime<Utc>) {
        self.events.emit(
            DomainEvent::new(EventKind::VoteTallyChanged, &outcome.report_id, now)
                .with("true_count", f64::from(outcome.votes.true_count))
                .with("false_count", f64::from(outcome.votes.false_count))
                .with("trust_score", outcome.trust_score.value())
                .with("confidence_score", outcome.confidence_score.value()),
        );
        if let Some(previous) = outcome.previous_status {
            info!(
                report_id = %outcome.report_id,
                from = %previous,
                to = %outcome.status,
                "report status changed"
            );
            self.events.emit(
                DomainEvent::new(EventKind::ReportStatusChanged, &outcome.report_id, now)
                    .with("confidence_score", outcome.confidence_score.value())
                    .with_detail(outcome.status.as_str()),
            );
        }
    }

    fn emit_status_change(&self, report: &SafetyReport, from: ReportStatus, now: DateTime<Utc>) {
        debug!(report_id = %report.id, from = %from, to = %report.status, "report status changed");
        self.events.emit(
            DomainEvent::new(EventKind::ReportStatusChanged, &report.id, now)
                .with("confidence_score", report.confidence_score.value())
                .with_detail(report.status.as_str()),
        );
    }
}
