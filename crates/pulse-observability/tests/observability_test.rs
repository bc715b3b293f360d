use chrono::{TimeZone, Utc};

use pulse_observability::tracing_setup::spans::names;
use pulse_observability::{
    aggregation_span, init_tracing_with_filter, submission_span, vote_span, HealthStatus,
    JobOutcome, JobRegistry,
};

#[test]
fn spans_carry_operation_names() {
    init_tracing_with_filter("debug");
    let span = aggregation_span!("scheduled");
    assert_eq!(span.metadata().map(|m| m.name()), Some(names::AGGREGATION));
    let span = vote_span!("report-1", true);
    assert_eq!(span.metadata().map(|m| m.name()), Some(names::VOTE));
    let span = submission_span!("harassment", 4u8);
    assert_eq!(span.metadata().map(|m| m.name()), Some(names::SUBMISSION));
}

#[test]
fn health_report_serializes_for_status_endpoints() {
    let registry = JobRegistry::new(3);
    let at = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
    registry.record("aggregation", at, 25, JobOutcome::Succeeded);
    registry.record("decay", at, 4, JobOutcome::Failed("database is locked".into()));

    let report = registry.report(at);
    assert_eq!(report.overall_status, HealthStatus::Degraded);

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["overall_status"], "degraded");
    assert_eq!(json["jobs"][1]["last_outcome"]["outcome"], "failed");
    assert_eq!(json["jobs"][1]["last_outcome"]["message"], "database is locked");
    assert_eq!(json["jobs"][0]["last_outcome"]["outcome"], "succeeded");
}
