//! PulseService end to end against in-memory and file-backed SQLite.

use std::collections::BTreeMap;

use chrono::Duration;

use pulse_core::config::{PulseConfig, RateLimitConfig};
use pulse_core::errors::ErrorKind;
use pulse_core::geo::BoundingBox;
use pulse_core::models::{EventKind, Identity, ReportStatus};
use pulse_observability::HealthStatus;
use pulse_runtime::{JobKind, JobReport, PulseService, SubmitReportRequest};
use test_fixtures::{fixed_now, BASE_LAT, BASE_LNG};

fn service() -> PulseService {
    PulseService::in_memory(PulseConfig::default())
        .unwrap()
        .with_clock(fixed_now)
}

fn request(identity: Identity, category: &str, severity: u8) -> SubmitReportRequest {
    SubmitReportRequest {
        category: category.to_string(),
        severity,
        latitude: BASE_LAT,
        longitude: BASE_LNG,
        identity,
        context: BTreeMap::new(),
    }
}

#[test]
fn submit_returns_receipt_and_stores_report() {
    let service = service();
    let now = fixed_now();
    let receipt = service
        .submit_report(request(Identity::user("alice"), "harassment", 4))
        .unwrap();

    assert_eq!(receipt.status, ReportStatus::Pending);
    assert!((receipt.trust_score - 0.6).abs() < 1e-9);
    assert_eq!(receipt.expires_at, now + Duration::hours(24));
    assert_eq!(receipt.vote_window_expires_at, now + Duration::hours(72));

    let stored = service.get_report(&receipt.report_id).unwrap();
    assert_eq!(stored.severity.value(), 4);
    assert_eq!(stored.category.as_str(), "harassment");

    let nearby = service.list_reports(BASE_LAT, BASE_LNG, 1.0, 24).unwrap();
    assert_eq!(nearby.len(), 1);
}

#[test]
fn submit_rejects_unknown_category_and_bad_severity() {
    let service = service();
    let err = service
        .submit_report(request(Identity::device("d1"), "ghosts", 3))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);

    let err = service
        .submit_report(request(Identity::device("d1"), "harassment", 6))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);

    let err = service.list_reports(BASE_LAT, BASE_LNG, 1.0, 0).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
}

#[test]
fn votes_flow_through_and_conflicts_surface() {
    let service = service();
    let owner = Identity::device("owner");
    let receipt = service
        .submit_report(request(owner.clone(), "followed", 3))
        .unwrap();

    let outcome = service
        .cast_vote(&receipt.report_id, &Identity::device("v1"), true)
        .unwrap();
    assert_eq!(outcome.votes.true_count, 1);

    let again = service
        .cast_vote(&receipt.report_id, &Identity::device("v1"), false)
        .unwrap_err();
    assert_eq!(again.kind(), ErrorKind::Conflict);

    let own = service.cast_vote(&receipt.report_id, &owner, true).unwrap_err();
    assert_eq!(own.kind(), ErrorKind::PermissionDenied);

    let summary = service.vote_summary(&receipt.report_id).unwrap();
    assert_eq!(summary.total_votes, 1);

    let removed = service
        .remove_vote(&receipt.report_id, &Identity::device("v1"))
        .unwrap();
    assert_eq!(removed.votes.total(), 0);
}

#[test]
fn owner_can_delete_and_missing_reports_are_not_found() {
    let service = service();
    let owner = Identity::device("owner");
    let receipt = service.submit_report(request(owner.clone(), "unsafe_area", 2)).unwrap();

    service
        .delete_report(&receipt.report_id, &owner, Some("posted by mistake".into()))
        .unwrap();
    assert_eq!(
        service.get_report(&receipt.report_id).unwrap().status,
        ReportStatus::Deleted
    );

    let missing = service.get_report("no-such-report").unwrap_err();
    assert_eq!(missing.kind(), ErrorKind::NotFound);

    let stranger = service.identity_summary(&Identity::device("stranger")).unwrap_err();
    assert_eq!(stranger.kind(), ErrorKind::NotFound);
    let known = service.identity_summary(&owner).unwrap();
    assert_eq!(known.submission_count, 1);
}

#[test]
fn rate_limit_exhausts_per_identity() {
    let mut config = PulseConfig::default();
    config.rate_limit = RateLimitConfig {
        anonymous_per_window: 2,
        ..RateLimitConfig::default()
    };
    let service = PulseService::in_memory(config).unwrap().with_clock(fixed_now);
    let spammer = Identity::device("spammer");

    service.submit_report(request(spammer.clone(), "harassment", 2)).unwrap();
    service.submit_report(request(spammer.clone(), "harassment", 2)).unwrap();
    let err = service
        .submit_report(request(spammer, "harassment", 2))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ResourceExhausted);

    service
        .submit_report(request(Identity::device("someone-else"), "harassment", 2))
        .unwrap();
}

#[test]
fn subscribers_see_domain_events() {
    let service = service();
    let mut events = service.subscribe();
    service
        .submit_report(request(Identity::user("bob"), "harassment", 5))
        .unwrap();
    service.run_aggregation().unwrap();

    let first = events.try_recv().unwrap();
    assert_eq!(first.kind, EventKind::ReportAccepted);
    let second = events.try_recv().unwrap();
    assert_eq!(second.kind, EventKind::PulseTileCreated);
}

#[test]
fn jobs_produce_pulses_and_health() {
    let service = service();
    service
        .submit_report(request(Identity::user("carol"), "harassment", 5))
        .unwrap();

    match service.run_aggregation().unwrap() {
        JobReport::Aggregation(summary) => assert_eq!(summary.tiles_created, 1),
        other => panic!("unexpected report {other:?}"),
    }
    let pulses = service.get_active_pulses(None).unwrap();
    assert_eq!(pulses.len(), 1);
    let bbox = BoundingBox::new(0.0, 0.0, 1.0, 1.0).unwrap();
    assert!(service.get_active_pulses(Some(bbox)).unwrap().is_empty());

    for kind in JobKind::ALL {
        service.execute(kind).unwrap();
    }
    let health = service.health();
    assert_eq!(health.overall_status, HealthStatus::Healthy);
    assert_eq!(health.jobs.len(), 4);
    let aggregation = service.jobs().job("aggregation").unwrap();
    assert_eq!(aggregation.total_runs, 2);

    let json = serde_json::to_value(service.run_decay().unwrap()).unwrap();
    assert_eq!(json["job"], "decay");
}

#[test]
fn updates_since_returns_recent_changes_nearby() {
    let service = service();
    let now = fixed_now();
    service
        .submit_report(request(Identity::user("dana"), "harassment", 5))
        .unwrap();
    service.run_aggregation().unwrap();

    let updates = service
        .updates_since(BASE_LAT, BASE_LNG, 2.0, now - Duration::minutes(5))
        .unwrap();
    assert_eq!(updates.new_reports.len(), 1);
    assert_eq!(updates.updated_tiles.len(), 1);
    assert!(updates.spikes.is_empty());
    assert_eq!(updates.server_time, now);

    let later = service.updates_since(BASE_LAT, BASE_LNG, 2.0, now).unwrap();
    assert!(later.updated_tiles.is_empty());
}

#[test]
fn read_surfaces_answer_on_empty_store() {
    let service = service();
    let zones = service.get_risk_zones(BASE_LAT, BASE_LNG, None).unwrap();
    assert_eq!(zones.total_zones, 0);
    assert_eq!(zones.message, "No recent data");

    let alert = service.get_personalized_alert(BASE_LAT, BASE_LNG, Some(14)).unwrap();
    assert_eq!(alert.nearby_reports, 0);

    let analysis = service.get_patterns().unwrap();
    assert!(analysis.spikes.is_empty());

    assert_eq!(
        service.tile_safety("not a tile").unwrap_err().kind(),
        ErrorKind::InvalidArgument
    );
}

#[test]
fn file_backed_service_persists_across_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = PulseConfig::default();
    config.storage.db_path = dir.path().join("pulse.db").to_string_lossy().into_owned();

    let report_id = {
        let service = PulseService::open(config.clone()).unwrap().with_clock(fixed_now);
        service
            .submit_report(request(Identity::user("erin"), "harassment", 3))
            .unwrap()
            .report_id
    };

    let reopened = PulseService::open(config).unwrap().with_clock(fixed_now);
    assert_eq!(reopened.get_report(&report_id).unwrap().id, report_id);
}
