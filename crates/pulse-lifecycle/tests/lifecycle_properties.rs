//! Score bounds hold across arbitrary vote and removal sequences.

use std::sync::Arc;

use proptest::prelude::*;

use pulse_core::config::PulseConfig;
use pulse_core::models::Identity;
use pulse_core::traits::IPulseStorage;
use pulse_lifecycle::LifecycleEngine;
use pulse_storage::StorageEngine;
use test_fixtures::{fixed_now, ReportBuilder};

#[derive(Debug, Clone)]
enum Op {
    Cast { voter: u8, accurate: bool },
    Remove { voter: u8 },
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0u8..8, any::<bool>()).prop_map(|(voter, accurate)| Op::Cast { voter, accurate }),
        (0u8..8).prop_map(|voter| Op::Remove { voter }),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn scores_stay_bounded(
        base in 0.0f64..1.5,
        severity in 1u8..=5,
        ops in prop::collection::vec(op(), 1..24),
    ) {
        let storage: Arc<dyn IPulseStorage> = Arc::new(StorageEngine::open_in_memory().unwrap());
        let engine = LifecycleEngine::new(storage.clone(), &PulseConfig::default());
        let now = fixed_now();
        let report = ReportBuilder::new(now)
            .trust(base)
            .severity(severity)
            .insert(storage.as_ref());

        for op in ops {
            let result = match op {
                Op::Cast { voter, accurate } => {
                    engine.cast_vote(&report.id, &Identity::device(format!("v{voter}")), accurate, now)
                }
                Op::Remove { voter } => {
                    engine.remove_vote(&report.id, &Identity::device(format!("v{voter}")), now)
                }
            };
            if let Ok(outcome) = result {
                prop_assert!((0.2..=1.0).contains(&outcome.trust_score.value()));
                prop_assert!((0.0..=1.0).contains(&outcome.confidence_score.value()));
            }
            let stored = storage.get_report(&report.id).unwrap().unwrap();
            let rows = storage.votes_for_report(&report.id).unwrap();
            prop_assert_eq!(stored.votes.total() as usize, rows.len());
            prop_assert_eq!(
                stored.votes.true_count as usize,
                rows.iter().filter(|v| v.is_accurate).count()
            );
        }
    }
}
