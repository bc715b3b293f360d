use pulse_core::config::defaults;
use pulse_core::{ErrorKind, PulseConfig};

#[test]
fn empty_document_yields_defaults() {
    let config = PulseConfig::from_toml("").unwrap();
    assert_eq!(config.lifecycle.vote_window_hours, defaults::DEFAULT_VOTE_WINDOW_HOURS);
    assert_eq!(config.aggregation.coarse_precision, 6);
    assert_eq!(config.aggregation.fine_precision, 7);
    assert_eq!(config.scheduler.aggregation_interval_secs, 300);
    assert_eq!(config.rate_limit.anonymous_per_window, 60);
    assert_eq!(config.rate_limit.authenticated_per_window, 200);
    assert!((config.trust.blur_radius_m - 50.0).abs() < f64::EPSILON);
}

#[test]
fn partial_override_keeps_other_defaults() {
    let config = PulseConfig::from_toml(
        r#"
        [lifecycle]
        delete_cooldown_minutes = 5

        [patterns]
        spike_min_reports = 4
        "#,
    )
    .unwrap();
    assert_eq!(config.lifecycle.delete_cooldown_minutes, 5);
    assert_eq!(config.lifecycle.report_ttl_hours, 24);
    assert_eq!(config.patterns.spike_min_reports, 4);
    assert_eq!(config.patterns.spike_window_minutes, 30);
}

#[test]
fn invalid_values_are_rejected() {
    let err = PulseConfig::from_toml("[aggregation]\ndecay_half_life_hours = 0.0").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);

    let err = PulseConfig::from_toml("[trust]\nexisting_trust_share = 1.5").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);

    assert!(PulseConfig::from_toml("not = [valid").is_err());
}
