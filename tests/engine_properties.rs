// ==============================================
// SELECTION ENGINE BEHAVIOUR (integration)
// ==============================================
//
// End-to-end scenarios and property tests for depletion, staleness,
// removal finality and compaction transparency.

use rand::RngCore;
use rand::SeedableRng;
use rand::rngs::SmallRng;
use shufflekit::clock::{Clock, ManualClock};
use shufflekit::engine::{Feedback, SelectionEngine};
use shufflekit::item::{Item, ItemId, Millis};
use shufflekit::weight::{FixedWeight, StandardWeight, WeightConfig, WeightFunction};

fn drain<W: WeightFunction, R: RngCore, C: Clock>(
    engine: &mut SelectionEngine<W, R, C>,
) -> Vec<ItemId> {
    std::iter::from_fn(|| engine.select_next().map(|item| item.id)).collect()
}

fn unjittered(seed: u64) -> SelectionEngine<StandardWeight, SmallRng, ManualClock> {
    SelectionEngine::new(
        StandardWeight::new(WeightConfig::default().without_jitter()),
        SmallRng::seed_from_u64(seed),
        ManualClock::new(1_700_000_000_000),
    )
}

// ==============================================
// Scenarios
// ==============================================

mod scenarios {
    use super::*;

    const A: ItemId = 1;
    const B: ItemId = 2;
    const C: ItemId = 3;

    fn a_and_b() -> SelectionEngine<StandardWeight, SmallRng, ManualClock> {
        let mut engine = unjittered(0);
        engine
            .initialize(vec![Item::new(A, "A", "x", 10.0), Item::new(B, "B", "y", 5.0)])
            .unwrap();
        engine
    }

    #[test]
    fn drains_by_popularity_then_empties() {
        let mut engine = a_and_b();
        assert_eq!(engine.select_next().map(|item| item.id), Some(A));
        assert_eq!(engine.select_next().map(|item| item.id), Some(B));
        assert!(engine.select_next().is_none());
    }

    #[test]
    fn add_after_exhaustion_is_selected_once() {
        let mut engine = a_and_b();
        drain(&mut engine);
        engine.add_item(Item::new(C, "C", "z", 20.0)).unwrap();
        assert_eq!(engine.select_next().map(|item| item.id), Some(C));
        assert!(engine.select_next().is_none());
    }

    #[test]
    fn removal_before_selection_excludes_item() {
        let mut engine = a_and_b();
        engine.add_item(Item::new(C, "C", "z", 20.0)).unwrap();
        assert!(engine.remove_item(B));
        assert_eq!(drain(&mut engine), vec![C, A]);
        assert!(engine.select_next().is_none());
    }

    #[test]
    fn skipped_item_falls_behind() {
        let mut engine = a_and_b();
        // 10 / (1 + 2) < 5
        engine.apply_feedback(A, Feedback::skip()).unwrap();
        engine.apply_feedback(A, Feedback::skip()).unwrap();
        assert_eq!(drain(&mut engine), vec![B, A]);
    }

    #[test]
    fn liked_item_overtakes_close_rival() {
        let mut engine = unjittered(0);
        engine
            .initialize(vec![Item::with_popularity(A, 5.0), Item::with_popularity(B, 5.5)])
            .unwrap();
        engine.apply_feedback(A, Feedback::like()).unwrap();
        assert_eq!(drain(&mut engine), vec![A, B]);
    }

    #[test]
    fn selection_resets_skip_count() {
        let mut engine = a_and_b();
        engine.apply_feedback(B, Feedback::skip()).unwrap();
        drain(&mut engine);
        assert_eq!(engine.item(B).unwrap().skip_count, 0);
        assert!(engine.item(B).unwrap().last_selected_at.is_some());
    }
}

// ==============================================
// Weight function
// ==============================================

mod weighting {
    use super::*;

    #[test]
    fn like_is_strictly_heavier_for_identical_draws() {
        let weight = StandardWeight::default();
        for seed in 0..64 {
            let plain = Item::with_popularity(1, 2.5)
                .with_skips((seed % 4) as u32)
                .with_last_selected_at(0);
            let liked = plain.clone().with_liked();
            let now: Millis = 50_000_000;
            let a = weight.compute_weight(&plain, now, &mut SmallRng::seed_from_u64(seed));
            let b = weight.compute_weight(&liked, now, &mut SmallRng::seed_from_u64(seed));
            assert!(b > a, "seed {seed}: liked {b} <= plain {a}");
        }
    }
}

// ==============================================
// Property tests
// ==============================================

mod properties {
    use proptest::prelude::*;

    use super::*;

    #[derive(Debug, Clone)]
    enum Op {
        Select,
        Feedback { id: ItemId, liked: bool, skipped: bool },
        Add { id: ItemId, popularity: f64 },
        Remove { id: ItemId },
        Advance { millis: u64 },
        Compact,
        Refresh,
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            4 => Just(Op::Select),
            3 => (0u64..12, any::<bool>(), any::<bool>())
                .prop_map(|(id, liked, skipped)| Op::Feedback { id, liked, skipped }),
            2 => (0u64..12, 0.0f64..50.0).prop_map(|(id, popularity)| Op::Add { id, popularity }),
            1 => (0u64..12).prop_map(|id| Op::Remove { id }),
            1 => (0u64..20_000_000).prop_map(|millis| Op::Advance { millis }),
            1 => Just(Op::Compact),
            1 => Just(Op::Refresh),
        ]
    }

    fn jittered(seed: u64, clock: ManualClock) -> SelectionEngine<StandardWeight, SmallRng, ManualClock> {
        SelectionEngine::new(StandardWeight::default(), SmallRng::seed_from_u64(seed), clock)
    }

    proptest! {
        #[test]
        fn depletion_is_descending_and_exhaustive(
            weights in prop::collection::vec(0.0f64..1_000.0, 0..40)
        ) {
            let mut engine = SelectionEngine::new(
                FixedWeight,
                SmallRng::seed_from_u64(0),
                ManualClock::new(0),
            );
            engine
                .initialize(weights.iter().enumerate().map(|(i, &w)| Item::with_popularity(i as ItemId, w)))
                .unwrap();

            let order = drain(&mut engine);
            prop_assert_eq!(order.len(), weights.len());
            let mut seen = order.clone();
            seen.sort_unstable();
            seen.dedup();
            prop_assert_eq!(seen.len(), weights.len());
            for pair in order.windows(2) {
                prop_assert!(weights[pair[0] as usize] >= weights[pair[1] as usize]);
            }
            prop_assert!(engine.select_next().is_none());
        }

        #[test]
        fn compaction_never_changes_selections(
            seed in any::<u64>(),
            ops in prop::collection::vec(op(), 1..120)
        ) {
            let clock_a = ManualClock::new(1_000);
            let clock_b = ManualClock::new(1_000);
            let mut plain = jittered(seed, clock_a.clone());
            let mut compacted = jittered(seed, clock_b.clone());

            for op in &ops {
                match *op {
                    Op::Select => {
                        let a = plain.select_next().map(|item| item.id);
                        let b = compacted.select_next().map(|item| item.id);
                        prop_assert_eq!(a, b);
                    },
                    Op::Feedback { id, liked, skipped } => {
                        let fb = Feedback::new(liked, skipped);
                        prop_assert_eq!(plain.apply_feedback(id, fb), compacted.apply_feedback(id, fb));
                    },
                    Op::Add { id, popularity } => {
                        let a = plain.add_item(Item::with_popularity(id, popularity));
                        let b = compacted.add_item(Item::with_popularity(id, popularity));
                        prop_assert_eq!(a, b);
                    },
                    Op::Remove { id } => {
                        prop_assert_eq!(plain.remove_item(id), compacted.remove_item(id));
                    },
                    Op::Advance { millis } => {
                        clock_a.advance(millis);
                        clock_b.advance(millis);
                    },
                    Op::Compact => {
                        compacted.compact();
                        prop_assert_eq!(compacted.stale_entries(), 0);
                    },
                    Op::Refresh => {
                        plain.refresh_all();
                        compacted.refresh_all();
                    },
                }
                prop_assert!(compacted.store_len() <= plain.store_len());
                prop_assert!(compacted.check_invariants().is_ok());
            }
            prop_assert_eq!(drain(&mut plain), drain(&mut compacted));
        }

        #[test]
        fn stale_and_removed_entries_are_never_selected(
            seed in any::<u64>(),
            ops in prop::collection::vec(op(), 1..120)
        ) {
            let clock = ManualClock::new(0);
            let mut engine = jittered(seed, clock.clone());
            let mut removed = std::collections::HashSet::new();

            for op in &ops {
                match *op {
                    Op::Select => {
                        if let Some(id) = engine.select_next().map(|item| item.id) {
                            prop_assert!(!removed.contains(&id));
                            // The selected item has no queued entry left.
                            prop_assert!(!engine.is_queued(id));
                        }
                    },
                    Op::Feedback { id, liked, skipped } => {
                        let _ = engine.apply_feedback(id, Feedback::new(liked, skipped));
                    },
                    Op::Add { id, popularity } => {
                        if engine.add_item(Item::with_popularity(id, popularity)).is_ok() {
                            removed.remove(&id);
                        }
                    },
                    Op::Remove { id } => {
                        if engine.remove_item(id) {
                            removed.insert(id);
                        }
                    },
                    Op::Advance { millis } => clock.advance(millis),
                    Op::Compact => {
                        engine.compact();
                    },
                    Op::Refresh => engine.refresh_all(),
                }
                prop_assert!(engine.check_invariants().is_ok());
            }

            let order = drain(&mut engine);
            let mut unique = order.clone();
            unique.sort_unstable();
            unique.dedup();
            prop_assert_eq!(unique.len(), order.len());
            prop_assert!(order.iter().all(|id| !removed.contains(id)));
        }
    }
}
