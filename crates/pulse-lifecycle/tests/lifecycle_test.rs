//! Lifecycle integration tests against in-memory SQLite.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use chrono::Duration;

use pulse_core::config::PulseConfig;
use pulse_core::errors::{ErrorKind, PulseError};
use pulse_core::models::{
    DomainEvent, EventKind, Identity, NewReport, ReportStatus, Severity, SignalCategory,
};
use pulse_core::traits::{IEventSink, IPulseStorage};
use pulse_core::Confidence;
use pulse_lifecycle::LifecycleEngine;
use pulse_storage::StorageEngine;
use test_fixtures::{fixed_now, ReportBuilder, BASE_LAT, BASE_LNG};

#[derive(Default)]
struct RecordingSink(Mutex<Vec<DomainEvent>>);

impl IEventSink for RecordingSink {
    fn emit(&self, event: DomainEvent) {
        self.0.lock().unwrap().push(event);
    }
}

impl RecordingSink {
    fn kinds(&self) -> Vec<EventKind> {
        self.0.lock().unwrap().iter().map(|e| e.kind).collect()
    }
}

fn setup() -> (Arc<dyn IPulseStorage>, LifecycleEngine, Arc<RecordingSink>) {
    let storage: Arc<dyn IPulseStorage> = Arc::new(StorageEngine::open_in_memory().unwrap());
    let sink = Arc::new(RecordingSink::default());
    let engine = LifecycleEngine::new(storage.clone(), &PulseConfig::default())
        .with_events(sink.clone());
    (storage, engine, sink)
}

fn request(reporter: Identity) -> NewReport {
    NewReport {
        category: SignalCategory::Followed,
        severity: Severity::new(4).unwrap(),
        latitude: BASE_LAT,
        longitude: BASE_LNG,
        reporter,
        context: BTreeMap::new(),
    }
}

fn voter(n: usize) -> Identity {
    Identity::device(format!("voter-{n}"))
}

// ---------------------------------------------------------------------------
// Submission
// ---------------------------------------------------------------------------

#[test]
fn submission_blurs_and_scores_new_identities() {
    let (storage, engine, sink) = setup();
    let now = fixed_now();

    let anon = engine.submit(request(Identity::device("fresh")), now).unwrap();
    assert_eq!(anon.status, ReportStatus::Pending);
    assert_eq!(anon.trust_score.value(), 0.2);
    assert_eq!(anon.tile_id.len(), 6);
    assert_eq!(anon.vote_window_expires_at, now + Duration::hours(72));
    assert_eq!(anon.expires_at, now + Duration::hours(24));
    let raw = pulse_core::geo::Coordinate::new(BASE_LAT, BASE_LNG).unwrap();
    assert!(raw.distance_m(&anon.coordinate()) <= 50.01);

    let user = engine.submit(request(Identity::user("alice")), now).unwrap();
    assert!((user.trust_score.value() - 0.6).abs() < 1e-9);

    let rep = storage
        .get_reputation(&Identity::user("alice").reputation_key())
        .unwrap()
        .unwrap();
    assert_eq!(rep.submission_count, 1);
    assert_eq!(rep.last_submission, Some(now));
    assert_eq!(sink.kinds(), vec![EventKind::ReportAccepted, EventKind::ReportAccepted]);
}

#[test]
fn submission_rejects_bad_input() {
    let (_, engine, _) = setup();
    let now = fixed_now();

    let mut bad = request(Identity::device("d"));
    bad.latitude = 91.0;
    assert_eq!(engine.submit(bad, now).unwrap_err().kind(), ErrorKind::InvalidArgument);

    let anonymous = request(Identity::default());
    assert_eq!(
        engine.submit(anonymous, now).unwrap_err().kind(),
        ErrorKind::InvalidArgument
    );
}

#[test]
fn heavy_submitter_is_flagged_and_penalized() {
    let (storage, engine, _) = setup();
    let now = fixed_now();
    let heavy = Identity::user("heavy");
    for i in 0..21 {
        ReportBuilder::new(now)
            .reporter(heavy.clone())
            .minutes_ago(i + 1)
            .insert(storage.as_ref());
    }

    let report = engine.submit(request(heavy), now).unwrap();
    let flags = report.abuse_flags.expect("abuse flags recorded");
    assert!(flags.reasons[0].starts_with("high_frequency"));
    assert!((report.trust_score.value() - 0.48).abs() < 1e-9);
}

// ---------------------------------------------------------------------------
// Votes
// ---------------------------------------------------------------------------

#[test]
fn cast_then_remove_restores_scores() {
    let (storage, engine, _) = setup();
    let now = fixed_now();
    let submitted = engine.submit(request(Identity::device("owner")), now).unwrap();

    let cast = engine.cast_vote(&submitted.id, &voter(1), false, now).unwrap();
    assert_eq!(cast.votes.false_count, 1);
    assert_ne!(cast.confidence_score, submitted.confidence_score);

    let removed = engine.remove_vote(&submitted.id, &voter(1), now).unwrap();
    assert_eq!(removed.votes, submitted.votes);
    assert_eq!(removed.trust_score, submitted.trust_score);
    assert_eq!(removed.confidence_score, submitted.confidence_score);

    let stored = storage.get_report(&submitted.id).unwrap().unwrap();
    assert_eq!(stored.votes.total(), 0);
    assert!(storage.votes_for_report(&submitted.id).unwrap().is_empty());
}

#[test]
fn duplicate_vote_is_conflict_and_leaves_tally() {
    let (storage, engine, _) = setup();
    let now = fixed_now();
    let report = ReportBuilder::new(now).insert(storage.as_ref());

    engine.cast_vote(&report.id, &voter(1), true, now).unwrap();
    let err = engine.cast_vote(&report.id, &voter(1), false, now).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);

    let stored = storage.get_report(&report.id).unwrap().unwrap();
    assert_eq!(stored.votes.true_count, 1);
    assert_eq!(stored.votes.false_count, 0);
}

#[test]
fn self_vote_is_denied_without_side_effects() {
    let (storage, engine, _) = setup();
    let now = fixed_now();
    let owner = Identity::device("owner-device");
    let report = ReportBuilder::new(now).reporter(owner.clone()).insert(storage.as_ref());

    let err = engine.cast_vote(&report.id, &owner, true, now).unwrap_err();
    assert!(matches!(err, PulseError::SelfVote { .. }));
    assert_eq!(err.kind(), ErrorKind::PermissionDenied);

    // Same device signed in as a user is still the owner.
    let signed_in = Identity::user("u1").with_device("owner-device");
    assert!(engine.cast_vote(&report.id, &signed_in, true, now).is_err());

    assert_eq!(storage.get_report(&report.id).unwrap().unwrap().votes.total(), 0);
    assert!(storage.votes_for_report(&report.id).unwrap().is_empty());
}

#[test]
fn closed_window_and_unknown_report() {
    let (storage, engine, _) = setup();
    let now = fixed_now();
    let closed = ReportBuilder::new(now)
        .vote_window_expires_at(now - Duration::minutes(1))
        .insert(storage.as_ref());

    let err = engine.cast_vote(&closed.id, &voter(1), true, now).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::FailedPrecondition);

    let err = engine.cast_vote("missing", &voter(1), true, now).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    let err = engine.remove_vote(&closed.id, &voter(1), now).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[test]
fn three_confirmations_verify_and_removal_reverts() {
    let (storage, engine, sink) = setup();
    let now = fixed_now();
    let report = ReportBuilder::new(now).severity(5).trust(1.0).insert(storage.as_ref());

    for n in 0..2 {
        let outcome = engine.cast_vote(&report.id, &voter(n), true, now).unwrap();
        assert_eq!(outcome.status, ReportStatus::Pending);
    }
    let outcome = engine.cast_vote(&report.id, &voter(2), true, now).unwrap();
    // 0.4·0.56 + 0.3·0.824 + 0.2 + 0.1
    assert!((outcome.confidence_score.value() - 0.7712).abs() < 1e-9);
    assert_eq!(outcome.status, ReportStatus::Verified);
    assert_eq!(outcome.previous_status, Some(ReportStatus::Pending));
    assert!(sink.kinds().contains(&EventKind::ReportStatusChanged));

    let stored = storage.get_report(&report.id).unwrap().unwrap();
    assert!(stored.verified_at.is_some());

    let outcome = engine.remove_vote(&report.id, &voter(0), now).unwrap();
    assert_eq!(outcome.status, ReportStatus::Pending);
    let stored = storage.get_report(&report.id).unwrap().unwrap();
    assert!(stored.verified_at.is_none());
    assert_eq!(stored.votes.total(), 2);
}

#[test]
fn downvotes_dispute_a_low_trust_report() {
    let (storage, engine, _) = setup();
    let now = fixed_now();
    let report = ReportBuilder::new(now).trust(0.2).insert(storage.as_ref());

    engine.cast_vote(&report.id, &voter(0), true, now).unwrap();
    engine.cast_vote(&report.id, &voter(1), false, now).unwrap();
    let outcome = engine.cast_vote(&report.id, &voter(2), false, now).unwrap();
    assert!(outcome.confidence_score.value() < Confidence::VERIFIED);
    assert_eq!(outcome.status, ReportStatus::Disputed);
    assert!(storage.get_report(&report.id).unwrap().unwrap().disputed_at.is_some());
}

#[test]
fn authenticated_voter_reputation_moves() {
    let (storage, engine, _) = setup();
    let now = fixed_now();
    let report = ReportBuilder::new(now).insert(storage.as_ref());
    let bob = Identity::user("bob");

    engine.cast_vote(&report.id, &bob, true, now).unwrap();
    let rep = storage.get_reputation(&bob.reputation_key()).unwrap().unwrap();
    assert_eq!(rep.reports_confirmed, 1);
    assert!((rep.trust_score.unwrap().value() - 0.52).abs() < 1e-9);

    engine.remove_vote(&report.id, &bob, now).unwrap();
    let rep = storage.get_reputation(&bob.reputation_key()).unwrap().unwrap();
    assert_eq!(rep.reports_confirmed, 0);
    assert!((rep.trust_score.unwrap().value() - 0.51).abs() < 1e-9);
}

// ---------------------------------------------------------------------------
// Deletion
// ---------------------------------------------------------------------------

#[test]
fn owner_deletion_cascades_and_starts_cooldown() {
    let (storage, engine, sink) = setup();
    let now = fixed_now();
    let owner = Identity::device("owner");
    let first = ReportBuilder::new(now).reporter(owner.clone()).insert(storage.as_ref());
    let second = ReportBuilder::new(now).reporter(owner.clone()).insert(storage.as_ref());
    engine.cast_vote(&first.id, &voter(1), true, now).unwrap();

    let err = engine.delete_report(&first.id, &voter(1), None, now).unwrap_err();
    assert!(matches!(err, PulseError::NotOwner { .. }));

    let deleted_at = engine
        .delete_report(&first.id, &owner, Some("posted by mistake".into()), now)
        .unwrap();
    assert_eq!(deleted_at, now);
    let stored = storage.get_report(&first.id).unwrap().unwrap();
    assert_eq!(stored.status, ReportStatus::Deleted);
    assert!(!stored.is_valid);
    assert_eq!(stored.votes.total(), 0);
    assert_eq!(stored.deletion.unwrap().reason.as_deref(), Some("posted by mistake"));
    assert!(storage.votes_for_report(&first.id).unwrap().is_empty());
    assert!(sink.kinds().contains(&EventKind::ReportDeleted));

    let later = now + Duration::minutes(10);
    let err = engine.delete_report(&second.id, &owner, None, later).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::PermissionDenied);
    assert_eq!(
        err.to_string(),
        "please wait 50 minutes before deleting another report"
    );

    let after_cooldown = now + Duration::minutes(61);
    assert!(engine.delete_report(&second.id, &owner, None, after_cooldown).is_ok());

    let err = engine.delete_report(&first.id, &owner, None, after_cooldown).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::FailedPrecondition);
}

#[test]
fn verified_reports_are_protected() {
    let (storage, engine, _) = setup();
    let now = fixed_now();
    let owner = Identity::device("owner");
    let mut report = ReportBuilder::new(now)
        .reporter(owner.clone())
        .status(ReportStatus::Verified)
        .build();
    report.confidence_score = Confidence::new(0.85);
    let report = storage.insert_report(report, &mut |_, _| Ok(())).unwrap();

    let err = engine.delete_report(&report.id, &owner, None, now).unwrap_err();
    assert!(matches!(err, PulseError::ProtectedReport { .. }));
    assert_eq!(
        storage.get_report(&report.id).unwrap().unwrap().status,
        ReportStatus::Verified
    );
}

#[test]
fn overlong_reason_is_rejected() {
    let (storage, engine, _) = setup();
    let now = fixed_now();
    let owner = Identity::device("owner");
    let report = ReportBuilder::new(now).reporter(owner.clone()).insert(storage.as_ref());
    let reason = "x".repeat(501);
    let err = engine.delete_report(&report.id, &owner, Some(reason), now).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
}

// ---------------------------------------------------------------------------
// Sweeps
// ---------------------------------------------------------------------------

#[test]
fn expiration_sweep_marks_due_reports() {
    let (storage, engine, _) = setup();
    let now = fixed_now();
    let stale = ReportBuilder::new(now)
        .hours_ago(25)
        .insert(storage.as_ref());
    let window_closed = ReportBuilder::new(now)
        .vote_window_expires_at(now - Duration::minutes(5))
        .insert(storage.as_ref());
    let fresh = ReportBuilder::new(now).insert(storage.as_ref());

    let summary = engine.expire_due(now).unwrap();
    assert_eq!(summary.scanned, 3);
    assert_eq!(summary.expired, 2);
    assert_eq!(summary.failed, 0);

    for id in [&stale.id, &window_closed.id] {
        let r = storage.get_report(id).unwrap().unwrap();
        assert_eq!(r.status, ReportStatus::Expired);
        assert!(!r.is_valid);
    }
    assert_eq!(
        storage.get_report(&fresh.id).unwrap().unwrap().status,
        ReportStatus::Pending
    );

    // A second sweep finds nothing left to do.
    assert_eq!(engine.expire_due(now).unwrap().expired, 0);
}

#[test]
fn refresh_rescores_pending_reports() {
    let (storage, engine, _) = setup();
    let now = fixed_now();
    let report = ReportBuilder::new(now).severity(5).trust(1.0).insert(storage.as_ref());
    assert_eq!(report.confidence_score.value(), 0.5);

    let summary = engine.refresh_statuses(now).unwrap();
    assert_eq!(summary.rescored, 1);
    assert_eq!(summary.transitioned, 0);
    let stored = storage.get_report(&report.id).unwrap().unwrap();
    // 0.4·0.5 + 0.3 + 0.2 + 0.1
    assert!((stored.confidence_score.value() - 0.8).abs() < 1e-9);
}

#[test]
fn blank_user_ids_stay_anonymous_and_distinct() {
    let (_, engine, _) = setup();
    let now = fixed_now();
    let blank = |device: &str| Identity {
        device_id: Some(device.to_string()),
        user_id: Some(String::new()),
    };

    let report = engine.submit(request(blank("device-c")), now).unwrap();
    assert_eq!(report.trust_score.value(), 0.2);

    engine.cast_vote(&report.id, &blank("device-a"), true, now).unwrap();
    let second = engine.cast_vote(&report.id, &blank("device-b"), true, now).unwrap();
    assert_eq!(second.votes.true_count, 2);

    let own = engine.cast_vote(&report.id, &blank("device-c"), true, now).unwrap_err();
    assert!(matches!(own, PulseError::SelfVote { .. }));

    let third = engine.cast_vote(&report.id, &blank("device-d"), false, now).unwrap();
    assert_eq!(third.votes.total(), 3);
}
