use proptest::prelude::*;

use pulse_core::config::DecayConfig;
use pulse_core::models::Severity;
use pulse_decay::curve::{severity_weight, tile_factor};

proptest! {
    #[test]
    fn tile_factor_is_bounded_and_non_increasing(a in 0.0f64..60.0, b in 0.0f64..60.0) {
        let cfg = DecayConfig::default();
        let (young, old) = if a <= b { (a, b) } else { (b, a) };
        match (tile_factor(young, &cfg), tile_factor(old, &cfg)) {
            (Some(fy), Some(fo)) => {
                prop_assert!((0.02..=1.0).contains(&fy));
                prop_assert!((0.02..=1.0).contains(&fo));
                prop_assert!(fo <= fy + 1e-12);
            }
            (Some(_), None) | (None, None) => {}
            (None, Some(_)) => prop_assert!(false, "older tile survived a younger one"),
        }
    }

    #[test]
    fn severity_weight_is_bounded(sev in 1u8..=5, age in 0.0f64..500.0) {
        let w = severity_weight(Severity::new(sev).unwrap(), age, &DecayConfig::default());
        prop_assert!((0.2..=1.0).contains(&w));
    }
}
