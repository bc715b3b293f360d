use chrono::{DateTime, Utc};

use crate::errors::PulseResult;
use crate::geo::BoundingBox;
use crate::models::{
    AlertKind, AnomalyAlert, PatternKind, PulseTile, ReportQuery, Reputation, ReputationKey,
    SafetyPattern, SafetyReport, Vote,
};

/// Mutation applied to a report and an identity's reputation inside one
/// write transaction. Returning an error rolls the transaction back.
pub type ReportMutation<'a> =
    &'a mut dyn FnMut(&mut SafetyReport, &mut Reputation) -> PulseResult<()>;

/// Mutation applied while a vote is being deleted: the removed vote, the
/// report it belonged to, and the voter's reputation.
pub type VoteRemoval<'a> =
    &'a mut dyn FnMut(&Vote, &mut SafetyReport, &mut Reputation) -> PulseResult<()>;

/// Persistence collaborator for reports, votes, reputation, tiles, and
/// derived patterns. Every `*_with` style method is atomic: the closure runs
/// against freshly loaded rows, and its changes are written in the same
/// transaction or not at all.
pub trait IPulseStorage: Send + Sync {
    // --- Reports ---
    /// Insert a new report; the closure sees the submitter's reputation
    /// (created lazily) before either row is written.
    fn insert_report(
        &self,
        report: SafetyReport,
        apply: ReportMutation<'_>,
    ) -> PulseResult<SafetyReport>;
    fn get_report(&self, id: &str) -> PulseResult<Option<SafetyReport>>;
    fn query_reports(&self, query: &ReportQuery) -> PulseResult<Vec<SafetyReport>>;
    /// Load, mutate, and write back one report. NotFound if absent.
    fn update_report(
        &self,
        id: &str,
        apply: &mut dyn FnMut(&mut SafetyReport) -> PulseResult<()>,
    ) -> PulseResult<SafetyReport>;
    /// Owner deletion: the closure validates and marks the report; on success
    /// every vote on the report is removed in the same transaction.
    fn soft_delete_report(
        &self,
        id: &str,
        owner: &ReputationKey,
        apply: ReportMutation<'_>,
    ) -> PulseResult<(SafetyReport, usize)>;

    // --- Votes ---
    /// Insert-if-absent on (report, voter). Conflict when a vote exists.
    fn record_vote(&self, vote: &Vote, apply: ReportMutation<'_>) -> PulseResult<SafetyReport>;
    /// Delete the voter's vote. NotFound when there is none.
    fn remove_vote(
        &self,
        report_id: &str,
        voter: &ReputationKey,
        apply: VoteRemoval<'_>,
    ) -> PulseResult<(Vote, SafetyReport)>;
    fn get_vote(&self, report_id: &str, voter: &ReputationKey) -> PulseResult<Option<Vote>>;
    fn votes_for_report(&self, report_id: &str) -> PulseResult<Vec<Vote>>;

    // --- Reputation ---
    fn get_reputation(&self, key: &ReputationKey) -> PulseResult<Option<Reputation>>;
    /// Load or lazily create, mutate, and write back.
    fn update_reputation(
        &self,
        key: &ReputationKey,
        now: DateTime<Utc>,
        apply: &mut dyn FnMut(&mut Reputation) -> PulseResult<()>,
    ) -> PulseResult<Reputation>;

    // --- Pulse tiles ---
    fn upsert_tile(&self, tile: &PulseTile) -> PulseResult<()>;
    fn get_tile(&self, tile_id: &str) -> PulseResult<Option<PulseTile>>;
    /// Tiles still active at `active_at`, optionally restricted to a box.
    fn query_tiles(
        &self,
        bbox: Option<&BoundingBox>,
        active_at: Option<DateTime<Utc>>,
    ) -> PulseResult<Vec<PulseTile>>;
    /// Store a decayed tile's intensity, radius and expiry. Returns false
    /// without writing when the stored `last_updated` no longer matches.
    fn update_decayed_tile(&self, tile: &PulseTile) -> PulseResult<bool>;
    /// Delete a tile only if it was not refreshed after `last_updated`.
    fn delete_tile_if_unchanged(&self, tile_id: &str, last_updated: DateTime<Utc>) -> PulseResult<bool>;
    /// Remove tiles with no contributing signals untouched since `cutoff`.
    fn delete_empty_tiles(&self, cutoff: DateTime<Utc>) -> PulseResult<usize>;
    /// Remove tiles whose `expires_at` is at or before `now`.
    fn delete_expired_tiles(&self, now: DateTime<Utc>) -> PulseResult<Vec<String>>;

    // --- Patterns & alerts ---
    fn insert_pattern(&self, pattern: &SafetyPattern) -> PulseResult<()>;
    fn list_patterns(&self, since: DateTime<Utc>) -> PulseResult<Vec<SafetyPattern>>;
    /// Whether a pattern of `kind` was stored for `tile_id` at or after `since`.
    fn has_pattern_since(
        &self,
        kind: PatternKind,
        tile_id: &str,
        since: DateTime<Utc>,
    ) -> PulseResult<bool>;
    fn insert_alert(&self, alert: &AnomalyAlert) -> PulseResult<()>;
    fn list_alerts(&self, since: DateTime<Utc>, active_only: bool) -> PulseResult<Vec<AnomalyAlert>>;
    fn has_active_alert(&self, kind: AlertKind, tile_id: &str) -> PulseResult<bool>;
    fn purge_patterns_before(&self, cutoff: DateTime<Utc>) -> PulseResult<usize>;
    fn purge_alerts_before(&self, cutoff: DateTime<Utc>) -> PulseResult<usize>;
}
