//! Example walking a playlist through selection, feedback, adds and removals.
//!
//! Run with: cargo run --example basic_playlist
//! Set `RUST_LOG=shufflekit=debug` to see compaction events.

use shufflekit::prelude::*;
use tracing_subscriber::EnvFilter;

fn print_next<W, R, C>(playlist: &mut Playlist<W, R, C>, label: &str, count: usize)
where
    W: WeightFunction,
    R: rand::RngCore,
    C: Clock,
{
    for i in 0..count {
        match playlist.next_item() {
            Some(item) => println!("   {label} {}: {item}", i + 1),
            None => println!("   {label} {}: <exhausted>", i + 1),
        }
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("=== Weighted Playlist ===\n");

    let engine = SelectionEngine::builder()
        .with_seed(42)
        .with_compaction_policy(CompactionPolicy::StaleFraction(0.5))
        .build();
    let songs = vec![
        Item::new(1, "Song A", "Artist A", 5.0),
        Item::new(2, "Song B", "Artist B", 3.0),
        Item::new(3, "Song C", "Artist C", 1.0),
        Item::new(4, "Song D", "Artist D", 2.0),
    ];
    let mut playlist = match Playlist::with_items(engine, songs) {
        Ok(playlist) => playlist,
        Err(err) => {
            eprintln!("failed to build playlist: {err}");
            return;
        },
    };

    // Four items, six requests: the queue drains and stays empty.
    println!("1. First pass");
    print_next(&mut playlist, "next", 6);
    println!();

    // Adding is incremental; the new item joins the drained queue.
    println!("2. Adding Song E");
    if let Err(err) = playlist.add_item(Item::new(5, "Song E", "Artist E", 4.0)) {
        eprintln!("   {err}");
    }
    print_next(&mut playlist, "after add", 2);
    println!();

    println!("3. Reshuffle, then skip Song A twice and like Song C");
    playlist.reshuffle();
    for (id, liked, skipped) in [(1, false, true), (1, false, true), (3, true, false)] {
        if let Err(err) = playlist.feedback(id, liked, skipped) {
            eprintln!("   {err}");
        }
    }
    print_next(&mut playlist, "after feedback", 5);
    println!();

    println!("4. Removing Song B and reshuffling");
    println!("   removed? {}", playlist.remove_item(2));
    playlist.reshuffle();
    print_next(&mut playlist, "after remove", 5);
    println!();

    let stats = playlist.engine().stats();
    println!(
        "items={} queued={} store_len={} stale={} compactions={} last_version={}",
        stats.items,
        stats.queued,
        stats.store_len,
        stats.stale_entries,
        stats.compactions,
        stats.last_version
    );
}
