//! Property-based tests for the Slicer boolean algebra and Indexer
//! forward/reverse coherence under arbitrary update sequences.

use proptest::prelude::*;
use std::collections::BTreeMap;
use wc_rules_matcher::indexer::Indexer;
use wc_rules_matcher::slicer::Slicer;
use wc_rules_matcher::value::Value;

fn slicer_from(default: bool, entries: &[(u32, bool)]) -> Slicer<u32> {
    let mut s = Slicer::new(default);
    s.update(entries.iter().cloned().collect::<BTreeMap<_, _>>());
    s
}

proptest! {
    #[test]
    fn demorgan_and_holds_for_arbitrary_slicers(
        default in any::<bool>(),
        a_entries in prop::collection::vec((0u32..12, any::<bool>()), 0..12),
        b_entries in prop::collection::vec((0u32..12, any::<bool>()), 0..12),
    ) {
        let a = slicer_from(default, &a_entries);
        let b = slicer_from(default, &b_entries);

        let lhs = a.and(&b).not();
        let rhs = a.not().or(&b.not());

        for k in 0u32..12 {
            prop_assert_eq!(lhs.get(&k), rhs.get(&k));
        }
    }

    #[test]
    fn demorgan_or_holds_for_arbitrary_slicers(
        default in any::<bool>(),
        a_entries in prop::collection::vec((0u32..12, any::<bool>()), 0..12),
        b_entries in prop::collection::vec((0u32..12, any::<bool>()), 0..12),
    ) {
        let a = slicer_from(default, &a_entries);
        let b = slicer_from(default, &b_entries);

        let lhs = a.or(&b).not();
        let rhs = a.not().and(&b.not());

        for k in 0u32..12 {
            prop_assert_eq!(lhs.get(&k), rhs.get(&k));
        }
    }

    #[test]
    fn double_negation_is_identity(
        default in any::<bool>(),
        entries in prop::collection::vec((0u32..12, any::<bool>()), 0..12),
    ) {
        let s = slicer_from(default, &entries);
        let back = s.not().not();
        for k in 0u32..12 {
            prop_assert_eq!(s.get(&k), back.get(&k));
        }
    }

    #[test]
    fn indexer_forward_and_value_cache_stay_coherent(
        ops in prop::collection::vec((0u32..6, 0i64..4), 0..40),
    ) {
        let mut idx: Indexer<u32> = Indexer::new();
        for (key, val) in &ops {
            idx.update(*key, Value::Int(*val)).unwrap();
        }

        for key in 0u32..6 {
            match idx.get(&key) {
                Some(Value::Int(v)) => {
                    prop_assert!(idx.value_slicer(&Value::Int(*v)).get(&key));
                    for other in 0i64..4 {
                        if other != *v {
                            prop_assert!(!idx.value_slicer(&Value::Int(other)).get(&key));
                        }
                    }
                }
                _ => {
                    for other in 0i64..4 {
                        prop_assert!(!idx.value_slicer(&Value::Int(other)).get(&key));
                    }
                }
            }
        }
    }

    #[test]
    fn indexer_remove_clears_forward_and_cache_membership(
        ops in prop::collection::vec((0u32..6, 0i64..4), 0..20),
        removals in prop::collection::vec(0u32..6, 0..10),
    ) {
        let mut idx: Indexer<u32> = Indexer::new();
        for (key, val) in &ops {
            idx.update(*key, Value::Int(*val)).unwrap();
        }
        for key in &removals {
            idx.remove(key);
        }

        for key in &removals {
            prop_assert!(idx.get(key).is_none());
            for v in 0i64..4 {
                prop_assert!(!idx.value_slicer(&Value::Int(v)).get(key));
            }
        }
    }
}
