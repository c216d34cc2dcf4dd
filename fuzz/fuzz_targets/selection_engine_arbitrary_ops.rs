#![no_main]

use libfuzzer_sys::fuzz_target;
use shufflekit::clock::ManualClock;
use shufflekit::compaction::CompactionPolicy;
use shufflekit::engine::{Feedback, SelectionEngine};
use shufflekit::item::Item;

// Fuzz arbitrary operation sequences on SelectionEngine
//
// Tests random sequences of add, remove, feedback, select, peek, refresh,
// compact and clock advances, checking engine invariants after every step.
fuzz_target!(|data: &[u8]| {
    if data.len() < 2 {
        return;
    }

    let policy = match data[0] % 3 {
        0 => CompactionPolicy::Manual,
        1 => CompactionPolicy::AfterReweights(u64::from(data[1] % 16) + 1),
        _ => CompactionPolicy::StaleFraction((f64::from(data[1]) + 1.0) / 256.0),
    };
    let clock = ManualClock::new(0);
    let mut engine = SelectionEngine::builder()
        .with_seed(u64::from(data[1]))
        .with_compaction_policy(policy)
        .with_clock(clock.clone())
        .build();

    let mut idx = 2;
    while idx + 2 < data.len() {
        let op = data[idx] % 9;
        let id = u64::from(data[idx + 1] % 32);
        let arg = data[idx + 2];

        match op {
            0 => {
                // add_item
                let existed = engine.contains(id);
                let result = engine.add_item(Item::with_popularity(id, f64::from(arg)));
                assert_eq!(result.is_err(), existed);
                assert!(engine.is_queued(id) || existed);
            }
            1 => {
                // remove_item
                let existed = engine.contains(id);
                assert_eq!(engine.remove_item(id), existed);
                assert!(!engine.contains(id));
                assert!(!engine.is_queued(id));
            }
            2 => {
                // apply_feedback
                let known = engine.contains(id);
                let result = engine.apply_feedback(id, Feedback::new(arg & 1 == 1, arg & 2 == 2));
                assert_eq!(result.is_ok(), known);
                if known {
                    assert!(engine.is_queued(id));
                }
            }
            3 | 4 => {
                // select_next
                let queued = engine.queued_len();
                match engine.select_next().map(|item| item.id) {
                    Some(picked) => {
                        assert_eq!(engine.queued_len(), queued - 1);
                        assert!(!engine.is_queued(picked));
                        assert_eq!(engine.item(picked).map(|item| item.skip_count), Some(0));
                    }
                    None => assert_eq!(queued, 0),
                }
            }
            5 => {
                // peek_next agrees with the following select_next
                let peeked = engine.peek_next().map(|item| item.id);
                let picked = engine.select_next().map(|item| item.id);
                assert_eq!(peeked, picked);
            }
            6 => {
                // refresh_all
                engine.refresh_all();
                assert_eq!(engine.queued_len(), engine.len());
            }
            7 => {
                // compact / maybe_compact
                let queued = engine.queued_len();
                if arg & 1 == 0 {
                    engine.compact();
                    assert_eq!(engine.stale_entries(), 0);
                } else {
                    engine.maybe_compact();
                }
                assert_eq!(engine.queued_len(), queued);
            }
            8 => {
                // advance time
                clock.advance(u64::from(arg) * 100_000);
            }
            _ => unreachable!(),
        }

        assert!(engine.check_invariants().is_ok());
        assert_eq!(engine.store_len(), engine.queued_len() + engine.stale_entries());
        idx += 3;
    }

    // Drain: each queued item exactly once
    let queued = engine.queued_len();
    let mut seen = std::collections::HashSet::new();
    while let Some(item) = engine.select_next() {
        assert!(seen.insert(item.id));
    }
    assert_eq!(seen.len(), queued);
});
