//! Example sharing one engine between a feedback producer and a player thread.
//!
//! Run with: cargo run --example concurrent_feedback

use std::thread;

use shufflekit::prelude::*;
use tracing_subscriber::EnvFilter;

const ITEMS: u64 = 32;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut engine = SelectionEngine::builder()
        .with_seed(7)
        .with_compaction_policy(CompactionPolicy::AfterReweights(16))
        .build();
    let catalogue = (0..ITEMS).map(|id| {
        Item::new(id, format!("Track {id}"), format!("Artist {}", id % 5), 1.0 + (id % 9) as f64)
    });
    if let Err(err) = engine.initialize(catalogue) {
        eprintln!("failed to load catalogue: {err}");
        return;
    }
    let shared = ConcurrentSelectionEngine::new(engine);

    let listener = {
        let shared = shared.clone();
        thread::spawn(move || {
            for i in 0..ITEMS * 4 {
                let id = (i * 7) % ITEMS;
                let feedback = if i % 3 == 0 {
                    Feedback::like()
                } else {
                    Feedback::skip()
                };
                if let Err(err) = shared.apply_feedback(id, feedback) {
                    eprintln!("feedback failed: {err}");
                }
                shared.maybe_compact();
            }
        })
    };

    let player = {
        let shared = shared.clone();
        thread::spawn(move || {
            let mut played = Vec::new();
            while let Some(item) = shared.select_next() {
                played.push(item.id);
            }
            played
        })
    };

    if listener.join().is_err() {
        eprintln!("listener thread panicked");
    }
    let played = match player.join() {
        Ok(played) => played,
        Err(_) => {
            eprintln!("player thread panicked");
            return;
        },
    };

    println!("played {} items before the queue drained", played.len());
    println!("still queued after feedback: {}", shared.queued_len());

    let stats = shared.stats();
    println!(
        "items={} queued={} store_len={} stale={} compactions={}",
        stats.items, stats.queued, stats.store_len, stats.stale_entries, stats.compactions
    );
    match shared.with_read(|engine| engine.check_invariants()) {
        Ok(()) => println!("invariants hold"),
        Err(err) => eprintln!("invariant violated: {err}"),
    }
}
