//! Property-based tests for abtest-store
//!
//! Following ruchy/trueno/aprender pattern:
//! - Test mathematical invariants
//! - Test data integrity properties
//! - Run with ProptestConfig::with_cases(100)
//! - Must complete in <30 seconds for pre-commit hook

use abtest_store::experiment::{EventType, ExperimentDraft};
use abtest_store::AbTestStore;
use proptest::prelude::*;

// ============================================================================
// Property Test Generators (Strategies)
// ============================================================================

const LABELS: [&str; 4] = ["A", "B", "C", "D"];

/// Generate one event: (variant index, is_conversion, value)
fn arb_event() -> impl Strategy<Value = (usize, bool, f64)> {
    (0..LABELS.len(), any::<bool>(), 0.0f64..1000.0)
}

fn arb_events(max: usize) -> impl Strategy<Value = Vec<(usize, bool, f64)>> {
    proptest::collection::vec(arb_event(), 0..max)
}

fn replay(store: &AbTestStore, id: &str, events: &[(usize, bool, f64)]) {
    for &(variant, is_conversion, value) in events {
        let event_type = if is_conversion {
            EventType::Conversion
        } else {
            EventType::Impression
        };
        store
            .record_event(id, LABELS[variant], event_type, Some(value))
            .unwrap();
    }
}

fn fresh() -> (AbTestStore, String) {
    let store = AbTestStore::new();
    let id = store
        .create_experiment(ExperimentDraft::new("prop", LABELS))
        .unwrap()
        .id;
    (store, id)
}

// ============================================================================
// Property Tests
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Property: Counters equal the number of events of each kind
    #[test]
    fn prop_counters_match_events(events in arb_events(200)) {
        let (store, id) = fresh();
        replay(&store, &id, &events);
        let exp = store.get_experiment(&id).unwrap();

        for (i, label) in LABELS.iter().enumerate() {
            let impressions = events.iter().filter(|e| e.0 == i && !e.1).count() as u64;
            let conversions = events.iter().filter(|e| e.0 == i && e.1).count() as u64;
            let value_sum: f64 = events.iter().filter(|e| e.0 == i && e.1).map(|e| e.2).sum();

            let row = exp.variant(label).unwrap();
            prop_assert_eq!(row.impressions, impressions);
            prop_assert_eq!(row.conversions, conversions);
            prop_assert!((row.conversion_value_sum - value_sum).abs() <= 1e-6 * value_sum.max(1.0));
        }
    }

    /// Property: Variants are ranked by non-increasing conversion rate
    #[test]
    fn prop_ranking_non_increasing(events in arb_events(200)) {
        let (store, id) = fresh();
        replay(&store, &id, &events);
        let exp = store.get_experiment(&id).unwrap();

        prop_assert_eq!(exp.variants.len(), LABELS.len());
        for pair in exp.variants.windows(2) {
            prop_assert!(
                pair[0].conversion_rate >= pair[1].conversion_rate,
                "Not monotonic decreasing: {} < {}",
                pair[0].conversion_rate,
                pair[1].conversion_rate
            );
        }
    }

    /// Property: Equal rates keep declaration order
    #[test]
    fn prop_ties_keep_declaration_order(events in arb_events(50)) {
        let (store, id) = fresh();
        replay(&store, &id, &events);
        let exp = store.get_experiment(&id).unwrap();

        let position = |label: &str| LABELS.iter().position(|l| *l == label).unwrap();
        for pair in exp.variants.windows(2) {
            if pair[0].conversion_rate.total_cmp(&pair[1].conversion_rate).is_eq() {
                prop_assert!(position(pair[0].variant.as_str()) < position(pair[1].variant.as_str()));
            }
        }
    }

    /// Property: A finalized experiment is frozen
    #[test]
    fn prop_finalized_is_frozen(
        before in arb_events(50),
        after in arb_events(50),
        winner in 0..LABELS.len()
    ) {
        let (store, id) = fresh();
        replay(&store, &id, &before);
        let frozen = store.finalize_experiment(&id, LABELS[winner], "done").unwrap();

        replay(&store, &id, &after);

        prop_assert_eq!(store.get_experiment(&id).unwrap(), frozen);
    }
}
