//! StorageEngine: owns the connection pool and implements IPulseStorage.

use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::Connection;
use tracing::{debug, warn};

use pulse_core::config::StorageConfig;
use pulse_core::errors::{PulseError, PulseResult};
use pulse_core::geo::BoundingBox;
use pulse_core::models::{
    AlertKind, AnomalyAlert, PatternKind, PulseTile, ReportQuery, Reputation, ReputationKey,
    SafetyPattern, SafetyReport, Vote,
};
use pulse_core::traits::{IPulseStorage, ReportMutation, VoteRemoval};

use crate::migrations;
use crate::pool::{pragmas, ConnectionPool};
use crate::queries::{
    pattern_ops, report_ops, reputation_ops, tile_ops, vote_ops, with_transaction,
};

pub struct StorageEngine {
    pool: ConnectionPool,
}

impl StorageEngine {
    /// Open a file-backed engine with a read pool.
    pub fn open(path: &Path) -> PulseResult<Self> {
        Self::open_with_config(path, &StorageConfig::default())
    }

    pub fn open_with_config(path: &Path, config: &StorageConfig) -> PulseResult<Self> {
        let mut pool = ConnectionPool::open(path, config.busy_timeout_ms)?;
        pool.writer.with_conn_sync(|conn| {
            migrations::run_migrations(conn)?;
            Ok(())
        })?;
        if !pool.writer.with_conn_sync(pragmas::verify_wal_mode)? {
            warn!(path = %path.display(), "journal_mode is not WAL; readers may block the writer");
        }
        pool.attach_readers(config.read_pool_size, config.busy_timeout_ms)?;
        debug!(
            path = %path.display(),
            readers = pool.readers.as_ref().map_or(0, |r| r.size()),
            "storage opened"
        );
        Ok(Self { pool })
    }

    /// In-memory engine; all reads go through the writer.
    pub fn open_in_memory() -> PulseResult<Self> {
        let pool = ConnectionPool::open_in_memory()?;
        pool.writer.with_conn_sync(|conn| {
            migrations::run_migrations(conn)?;
            Ok(())
        })?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &ConnectionPool {
        &self.pool
    }

    fn with_reader<F, T>(&self, f: F) -> PulseResult<T>
    where
        F: FnOnce(&Connection) -> PulseResult<T>,
    {
        match &self.pool.readers {
            Some(readers) => readers.with_conn(f),
            None => self.pool.writer.with_conn_sync(f),
        }
    }

    fn with_writer<F, T>(&self, f: F) -> PulseResult<T>
    where
        F: FnOnce(&Connection) -> PulseResult<T>,
    {
        self.pool.writer.with_conn_sync(f)
    }
}

fn load_report(conn: &Connection, id: &str) -> PulseResult<SafetyReport> {
    report_ops::get_report(conn, id)?.ok_or_else(|| PulseError::not_found("report", id))
}

fn load_or_new_reputation(
    conn: &Connection,
    key: &ReputationKey,
    now: DateTime<Utc>,
) -> PulseResult<Reputation> {
    Ok(reputation_ops::get_reputation(conn, key)?.unwrap_or_else(|| Reputation::new(key.clone(), now)))
}

impl IPulseStorage for StorageEngine {
    // --- Reports ---

    fn insert_report(
        &self,
        mut report: SafetyReport,
        apply: ReportMutation<'_>,
    ) -> PulseResult<SafetyReport> {
        self.with_writer(|conn| {
            with_transaction(conn, "insert_report", |tx| {
                let key = report.reporter.reputation_key();
                let mut reputation = load_or_new_reputation(tx, &key, report.created_at)?;
                apply(&mut report, &mut reputation)?;
                report_ops::insert_report(tx, &report)?;
                reputation_ops::upsert_reputation(tx, &reputation)?;
                debug!(report_id = %report.id, tile = %report.tile_id, "report inserted");
                Ok(report)
            })
        })
    }

    fn get_report(&self, id: &str) -> PulseResult<Option<SafetyReport>> {
        self.with_reader(|conn| report_ops::get_report(conn, id))
    }

    fn query_reports(&self, query: &ReportQuery) -> PulseResult<Vec<SafetyReport>> {
        self.with_reader(|conn| report_ops::query_reports(conn, query))
    }

    fn update_report(
        &self,
        id: &str,
        apply: &mut dyn FnMut(&mut SafetyReport) -> PulseResult<()>,
    ) -> PulseResult<SafetyReport> {
        self.with_writer(|conn| {
            with_transaction(conn, "update_report", |tx| {
                let mut report = load_report(tx, id)?;
                apply(&mut report)?;
                report_ops::update_report(tx, &report)?;
                Ok(report)
            })
        })
    }

    fn soft_delete_report(
        &self,
        id: &str,
        owner: &ReputationKey,
        apply: ReportMutation<'_>,
    ) -> PulseResult<(SafetyReport, usize)> {
        self.with_writer(|conn| {
            with_transaction(conn, "soft_delete_report", |tx| {
                let mut report = load_report(tx, id)?;
                let mut reputation = load_or_new_reputation(tx, owner, report.last_activity_at)?;
                apply(&mut report, &mut reputation)?;
                let removed = vote_ops::delete_votes_for_report(tx, id)?;
                report_ops::update_report(tx, &report)?;
                reputation_ops::upsert_reputation(tx, &reputation)?;
                Ok((report, removed))
            })
        })
    }

    // --- Votes ---

    fn record_vote(&self, vote: &Vote, apply: ReportMutation<'_>) -> PulseResult<SafetyReport> {
        self.with_writer(|conn| {
            with_transaction(conn, "record_vote", |tx| {
                let mut report = load_report(tx, &vote.report_id)?;
                vote_ops::insert_vote(tx, vote)?;
                let mut reputation = load_or_new_reputation(tx, &vote.voter, vote.cast_at)?;
                apply(&mut report, &mut reputation)?;
                report_ops::update_report(tx, &report)?;
                reputation_ops::upsert_reputation(tx, &reputation)?;
                Ok(report)
            })
        })
    }

    fn remove_vote(
        &self,
        report_id: &str,
        voter: &ReputationKey,
        apply: VoteRemoval<'_>,
    ) -> PulseResult<(Vote, SafetyReport)> {
        self.with_writer(|conn| {
            with_transaction(conn, "remove_vote", |tx| {
                let mut report = load_report(tx, report_id)?;
                let vote = vote_ops::get_vote(tx, report_id, voter)?
                    .ok_or_else(|| PulseError::not_found("vote", report_id))?;
                vote_ops::delete_vote(tx, report_id, voter)?;
                let mut reputation = load_or_new_reputation(tx, voter, vote.cast_at)?;
                apply(&vote, &mut report, &mut reputation)?;
                report_ops::update_report(tx, &report)?;
                reputation_ops::upsert_reputation(tx, &reputation)?;
                Ok((vote, report))
            })
        })
    }

    fn get_vote(&self, report_id: &str, voter: &ReputationKey) -> PulseResult<Option<Vote>> {
        self.with_reader(|conn| vote_ops::get_vote(conn, report_id, voter))
    }

    fn votes_for_report(&self, report_id: &str) -> PulseResult<Vec<Vote>> {
        self.with_reader(|conn| vote_ops::votes_for_report(conn, report_id))
    }

    // --- Reputation ---

    fn get_reputation(&self, key: &ReputationKey) -> PulseResult<Option<Reputation>> {
        self.with_reader(|conn| reputation_ops::get_reputation(conn, key))
    }

    fn update_reputation(
        &self,
        key: &ReputationKey,
        now: DateTime<Utc>,
        apply: &mut dyn FnMut(&mut Reputation) -> PulseResult<()>,
    ) -> PulseResult<Reputation> {
        self.with_writer(|conn| {
            with_transaction(conn, "update_reputation", |tx| {
                let mut reputation = load_or_new_reputation(tx, key, now)?;
                apply(&mut reputation)?;
                reputation.updated_at = now;
                reputation_ops::upsert_reputation(tx, &reputation)?;
                Ok(reputation)
            })
        })
    }

    // --- Pulse tiles ---

    fn upsert_tile(&self, tile: &PulseTile) -> PulseResult<()> {
        self.with_writer(|conn| tile_ops::upsert_tile(conn, tile))
    }

    fn get_tile(&self, tile_id: &str) -> PulseResult<Option<PulseTile>> {
        self.with_reader(|conn| tile_ops::get_tile(conn, tile_id))
    }

    fn query_tiles(
        &self,
        bbox: Option<&BoundingBox>,
        active_at: Option<DateTime<Utc>>,
    ) -> PulseResult<Vec<PulseTile>> {
        self.with_reader(|conn| tile_ops::query_tiles(conn, bbox, active_at))
    }

    fn update_decayed_tile(&self, tile: &PulseTile) -> PulseResult<bool> {
        self.with_writer(|conn| tile_ops::update_decayed_tile(conn, tile))
    }

    fn delete_tile_if_unchanged(&self, tile_id: &str, last_updated: DateTime<Utc>) -> PulseResult<bool> {
        self.with_writer(|conn| tile_ops::delete_tile_if_unchanged(conn, tile_id, last_updated))
    }

    fn delete_empty_tiles(&self, cutoff: DateTime<Utc>) -> PulseResult<usize> {
        self.with_writer(|conn| tile_ops::delete_empty_tiles(conn, cutoff))
    }

    fn delete_expired_tiles(&self, now: DateTime<Utc>) -> PulseResult<Vec<String>> {
        self.with_writer(|conn| {
            with_transaction(conn, "delete_expired_tiles", |tx| {
                tile_ops::delete_expired_tiles(tx, now)
            })
        })
    }

    // --- Patterns & alerts ---

    fn insert_pattern(&self, pattern: &SafetyPattern) -> PulseResult<()> {
        self.with_writer(|conn| pattern_ops::insert_pattern(conn, pattern))
    }

    fn list_patterns(&self, since: DateTime<Utc>) -> PulseResult<Vec<SafetyPattern>> {
        self.with_reader(|conn| pattern_ops::list_patterns(conn, since))
    }

    fn has_pattern_since(
        &self,
        kind: PatternKind,
        tile_id: &str,
        since: DateTime<Utc>,
    ) -> PulseResult<bool> {
        self.with_reader(|conn| pattern_ops::has_pattern_since(conn, kind, tile_id, since))
    }

    fn insert_alert(&self, alert: &AnomalyAlert) -> PulseResult<()> {
        self.with_writer(|conn| pattern_ops::insert_alert(conn, alert))
    }

    fn list_alerts(
        &self,
        since: DateTime<Utc>,
        active_only: bool,
    ) -> PulseResult<Vec<AnomalyAlert>> {
        self.with_reader(|conn| pattern_ops::list_alerts(conn, since, active_only))
    }

    fn has_active_alert(&self, kind: AlertKind, tile_id: &str) -> PulseResult<bool> {
        self.with_reader(|conn| pattern_ops::has_active_alert(conn, kind, tile_id))
    }

    fn purge_patterns_before(&self, cutoff: DateTime<Utc>) -> PulseResult<usize> {
        self.with_writer(|conn| pattern_ops::purge_patterns_before(conn, cutoff))
    }

    fn purge_alerts_before(&self, cutoff: DateTime<Utc>) -> PulseResult<usize> {
        self.with_writer(|conn| pattern_ops::purge_alerts_before(conn, cutoff))
    }
}
