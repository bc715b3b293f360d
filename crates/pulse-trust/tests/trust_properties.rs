use chrono::Utc;
use proptest::prelude::*;

use pulse_core::config::TrustConfig;
use pulse_core::geo::Coordinate;
use pulse_core::models::{Reputation, ReputationKey, VoteTally};
use pulse_core::TrustScore;
use pulse_trust::{blur, TrustScorer};

proptest! {
    #[test]
    fn report_trust_stays_in_band(
        base in 0.0f64..2.0,
        t in 0u32..500,
        f in 0u32..500,
    ) {
        let scorer = TrustScorer::default();
        let tally = VoteTally { true_count: t, false_count: f };
        let trust = scorer.report_trust(TrustScore::new(base), &tally).value();
        prop_assert!((0.2..=1.0).contains(&trust));
    }

    #[test]
    fn base_trust_stays_in_band(
        submissions in 0u32..10_000,
        anomaly in -1.0f64..2.0,
        authenticated in any::<bool>(),
    ) {
        let mut rep = Reputation::new(ReputationKey::Device("d".into()), Utc::now());
        rep.submission_count = submissions;
        rep.anomaly_score = anomaly;
        let trust = TrustScorer::default().base_trust(Some(&rep), authenticated).value();
        prop_assert!((0.2..=1.0).contains(&trust));
    }

    #[test]
    fn vote_term_is_a_probability(t in 0u32..1000, f in 0u32..1000) {
        let term = TrustScorer::default().vote_term(&VoteTally { true_count: t, false_count: f });
        prop_assert!((0.0..=1.0).contains(&term));
    }

    #[test]
    fn blur_stays_inside_radius(
        lat in -80.0f64..80.0,
        lng in -179.0f64..179.0,
        radius in 1.0f64..500.0,
    ) {
        let origin = Coordinate::new(lat, lng).unwrap();
        let blurred = blur::blur(origin, radius);
        prop_assert!(Coordinate::new(blurred.lat, blurred.lng).is_ok());
        prop_assert!(origin.distance_m(&blurred) <= radius * 1.001 + 0.01);
    }
}

#[test]
fn more_accurate_votes_never_lower_trust() {
    let cfg = TrustConfig::default();
    let scorer = TrustScorer::new(cfg);
    let base = TrustScore::new(0.5);
    let mut last = scorer.report_trust(base, &VoteTally { true_count: 1, false_count: 0 });
    for n in 2..30 {
        let next = scorer.report_trust(base, &VoteTally { true_count: n, false_count: 0 });
        assert!(next >= last);
        last = next;
    }
}
