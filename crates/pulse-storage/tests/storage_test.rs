use chrono::Duration;

use pulse_core::errors::ErrorKind;
use pulse_core::geo::{BoundingBox, Coordinate};
use pulse_core::models::{
    AlertKind, AnomalyAlert, Identity, PatternKind, ReportQuery, ReportStatus, ReputationKey,
    SafetyPattern, Vote,
};
use pulse_core::traits::IPulseStorage;
use pulse_core::PulseError;
use pulse_storage::StorageEngine;
use test_fixtures::{base_tile, fixed_now, make_test_tile, offset, ReportBuilder};

fn engine() -> StorageEngine {
    StorageEngine::open_in_memory().unwrap()
}

fn vote(report_id: &str, voter: &str, is_accurate: bool) -> Vote {
    Vote {
        report_id: report_id.to_string(),
        voter: ReputationKey::Device(voter.to_string()),
        is_accurate,
        cast_at: fixed_now(),
    }
}

// ── Reports ──

#[test]
fn report_round_trips_through_storage() {
    let storage = engine();
    let now = fixed_now();
    let mut report = ReportBuilder::new(now).severity(4).trust(0.7).build();
    report.context.insert("lighting".into(), "dark".into());
    let inserted = storage.insert_report(report.clone(), &mut |_, _| Ok(())).unwrap();
    assert_eq!(inserted, report);
    assert_eq!(storage.get_report(&report.id).unwrap(), Some(report));
    assert!(storage.get_report("missing").unwrap().is_none());
}

#[test]
fn insert_creates_reputation_in_same_transaction() {
    let storage = engine();
    let now = fixed_now();
    let report = ReportBuilder::new(now)
        .reporter(Identity::device("d-1"))
        .build();
    storage
        .insert_report(report, &mut |_, rep| {
            rep.submission_count += 1;
            Ok(())
        })
        .unwrap();
    let rep = storage
        .get_reputation(&ReputationKey::Device("d-1".into()))
        .unwrap()
        .unwrap();
    assert_eq!(rep.submission_count, 1);
}

#[test]
fn failed_insert_mutation_writes_nothing() {
    let storage = engine();
    let report = ReportBuilder::new(fixed_now())
        .reporter(Identity::device("d-2"))
        .build();
    let id = report.id.clone();
    let err = storage
        .insert_report(report, &mut |_, _| Err(PulseError::invalid("nope")))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    assert!(storage.get_report(&id).unwrap().is_none());
    assert!(storage
        .get_reputation(&ReputationKey::Device("d-2".into()))
        .unwrap()
        .is_none());
}

#[test]
fn query_filters_active_window_and_area() {
    let storage = engine();
    let now = fixed_now();
    let fresh = ReportBuilder::new(now).minutes_ago(10).insert(&storage);
    let _old = ReportBuilder::new(now).hours_ago(20).insert(&storage);
    let _expired = ReportBuilder::new(now)
        .minutes_ago(5)
        .expires_at(now - Duration::minutes(1))
        .insert(&storage);
    let _deleted = ReportBuilder::new(now)
        .minutes_ago(5)
        .status(ReportStatus::Deleted)
        .insert(&storage);
    let far = ReportBuilder::new(now)
        .minutes_ago(5)
        .at(Coordinate::new(48.8566, 2.3522).unwrap())
        .insert(&storage);

    let active = storage
        .query_reports(&ReportQuery::active_since(now, now - Duration::hours(12)))
        .unwrap();
    let ids: Vec<_> = active.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids.len(), 2);
    assert!(ids.contains(&fresh.id.as_str()));
    assert!(ids.contains(&far.id.as_str()));

    let bbox = BoundingBox::around(offset(0.0, 0.0), 2.0).unwrap();
    let local = storage
        .query_reports(&ReportQuery::active_since(now, now - Duration::hours(12)).within(bbox))
        .unwrap();
    assert_eq!(local.len(), 1);
    assert_eq!(local[0].id, fresh.id);

    let in_tile = storage
        .query_reports(&ReportQuery::active_since(now, now - Duration::hours(12)).in_tile(base_tile()))
        .unwrap();
    assert_eq!(in_tile.len(), 1);
}

#[test]
fn update_report_missing_is_not_found() {
    let storage = engine();
    let err = storage.update_report("ghost", &mut |_| Ok(())).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

// ── Votes ──

#[test]
fn duplicate_vote_is_conflict_and_leaves_tally() {
    let storage = engine();
    let report = ReportBuilder::new(fixed_now()).insert(&storage);
    let v = vote(&report.id, "voter-1", true);

    let updated = storage
        .record_vote(&v, &mut |r, _| {
            r.votes.record(true);
            Ok(())
        })
        .unwrap();
    assert_eq!(updated.votes.true_count, 1);

    let err = storage
        .record_vote(&v, &mut |r, _| {
            r.votes.record(true);
            Ok(())
        })
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);
    let stored = storage.get_report(&report.id).unwrap().unwrap();
    assert_eq!(stored.votes.true_count, 1);
}

#[test]
fn rejected_vote_mutation_rolls_back_vote_row() {
    let storage = engine();
    let report = ReportBuilder::new(fixed_now()).insert(&storage);
    let v = vote(&report.id, "voter-2", false);
    let err = storage
        .record_vote(&v, &mut |r, _| {
            Err(PulseError::SelfVote {
                report_id: r.id.clone(),
            })
        })
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::PermissionDenied);
    assert!(storage.get_vote(&report.id, &v.voter).unwrap().is_none());
}

#[test]
fn vote_on_missing_report_is_not_found() {
    let storage = engine();
    let err = storage
        .record_vote(&vote("nope", "voter", true), &mut |_, _| Ok(()))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[test]
fn remove_vote_passes_removed_vote_to_closure() {
    let storage = engine();
    let report = ReportBuilder::new(fixed_now()).insert(&storage);
    let v = vote(&report.id, "voter-3", false);
    storage
        .record_vote(&v, &mut |r, _| {
            r.votes.record(false);
            Ok(())
        })
        .unwrap();

    let (removed, updated) = storage
        .remove_vote(&report.id, &v.voter, &mut |vote, r, _| r.votes.retract(vote.is_accurate))
        .unwrap();
    assert!(!removed.is_accurate);
    assert_eq!(updated.votes.total(), 0);

    let err = storage
        .remove_vote(&report.id, &v.voter, &mut |_, _, _| Ok(()))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[test]
fn soft_delete_cascades_votes() {
    let storage = engine();
    let owner = Identity::device("owner");
    let report = ReportBuilder::new(fixed_now())
        .reporter(owner.clone())
        .insert(&storage);
    for voter in ["a", "b"] {
        storage
            .record_vote(&vote(&report.id, voter, true), &mut |r, _| {
                r.votes.record(true);
                Ok(())
            })
            .unwrap();
    }
    let (deleted, removed) = storage
        .soft_delete_report(&report.id, &owner.reputation_key(), &mut |r, _| {
            r.status = ReportStatus::Deleted;
            r.is_valid = false;
            Ok(())
        })
        .unwrap();
    assert_eq!(removed, 2);
    assert_eq!(deleted.status, ReportStatus::Deleted);
    assert!(storage.votes_for_report(&report.id).unwrap().is_empty());
    assert!(storage.get_report(&report.id).unwrap().is_some());
}

// ── Tiles ──

#[test]
fn tiles_upsert_and_expire() {
    let storage = engine();
    let now = fixed_now();
    let tile_id = base_tile();
    let mut tile = make_test_tile(&tile_id, 0.4, now);
    storage.upsert_tile(&tile).unwrap();
    tile.intensity = 0.9;
    storage.upsert_tile(&tile).unwrap();
    assert_eq!(storage.get_tile(&tile_id).unwrap().unwrap().intensity, 0.9);

    assert_eq!(storage.query_tiles(None, Some(now)).unwrap().len(), 1);
    let later = now + Duration::hours(25);
    assert!(storage.query_tiles(None, Some(later)).unwrap().is_empty());
    assert_eq!(storage.delete_expired_tiles(later).unwrap(), vec![tile_id.clone()]);
    assert!(storage.get_tile(&tile_id).unwrap().is_none());
}

#[test]
fn empty_tiles_are_pruned_after_cutoff() {
    let storage = engine();
    let now = fixed_now();
    let mut tile = make_test_tile(&base_tile(), 0.3, now - Duration::days(8));
    tile.signal_count = 0;
    storage.upsert_tile(&tile).unwrap();
    assert_eq!(storage.delete_empty_tiles(now - Duration::days(7)).unwrap(), 1);
}

// ── Patterns & alerts ──

#[test]
fn alerts_dedupe_and_purge() {
    let storage = engine();
    let now = fixed_now();
    let tile_id = base_tile();
    let alert = AnomalyAlert {
        id: "alert-1".into(),
        kind: AlertKind::Spike,
        tile_id: Some(tile_id.clone()),
        center: Some(offset(0.0, 0.0)),
        severity: 0.8,
        message: "Spike detected: 12 reports in 20 minutes".into(),
        data: serde_json::json!({ "report_count": 12 }),
        is_active: true,
        created_at: now - Duration::hours(30),
    };
    storage.insert_alert(&alert).unwrap();
    assert!(storage.has_active_alert(AlertKind::Spike, &tile_id).unwrap());
    assert!(!storage.has_active_alert(AlertKind::RapidFire, &tile_id).unwrap());

    let pattern = SafetyPattern {
        id: "pattern-1".into(),
        kind: PatternKind::Cluster,
        tile_id: tile_id.clone(),
        center: offset(0.0, 0.0),
        intensity: 0.6,
        data: serde_json::json!({}),
        created_at: now - Duration::days(8),
    };
    storage.insert_pattern(&pattern).unwrap();

    assert_eq!(storage.purge_alerts_before(now - Duration::hours(24)).unwrap(), 1);
    assert_eq!(storage.purge_patterns_before(now - Duration::days(7)).unwrap(), 1);
    assert!(storage.list_alerts(now - Duration::days(30), false).unwrap().is_empty());
}

#[test]
fn file_backed_engine_runs_in_wal_with_read_pool() {
    let dir = tempfile::tempdir().unwrap();
    let config = pulse_core::config::StorageConfig {
        read_pool_size: 3,
        ..Default::default()
    };
    let storage = StorageEngine::open_with_config(&dir.path().join("pulse.db"), &config).unwrap();

    let wal = storage
        .pool()
        .writer
        .with_conn_sync(pulse_storage::pool::pragmas::verify_wal_mode)
        .unwrap();
    assert!(wal);
    assert_eq!(storage.pool().readers.as_ref().map(|r| r.size()), Some(3));

    let report = ReportBuilder::new(fixed_now()).insert(&storage);
    assert_eq!(storage.get_report(&report.id).unwrap().unwrap().id, report.id);
}
