//! Owning collection driving a [`SelectionEngine`].
//!
//! A `Playlist` keeps items in insertion order for listing and forwards every
//! structural change to the engine's incremental operations, so adding or
//! removing one item never rebuilds the engine. A full re-weighting is still
//! available through [`reshuffle`](Playlist::reshuffle).
//!
//! The playlist also owns the compaction cadence: after each feedback call
//! it lets the engine's [`CompactionPolicy`](crate::compaction::CompactionPolicy)
//! decide whether to reclaim stale entries.
//!
//! ## Example Usage
//!
//! ```
//! use shufflekit::engine::SelectionEngine;
//! use shufflekit::item::Item;
//! use shufflekit::playlist::Playlist;
//! use shufflekit::weight::WeightConfig;
//!
//! let engine = SelectionEngine::builder()
//!     .with_weight_config(WeightConfig::default().without_jitter())
//!     .with_seed(1)
//!     .build();
//! let mut playlist = Playlist::new(engine);
//! playlist.add_item(Item::new(1, "Song A", "Artist A", 5.0)).unwrap();
//! playlist.add_item(Item::new(2, "Song B", "Artist B", 3.0)).unwrap();
//!
//! assert_eq!(playlist.next_item().map(|item| item.id), Some(1));
//! assert!(playlist.remove_item(2));
//! assert!(playlist.next_item().is_none());
//!
//! playlist.reshuffle();
//! assert_eq!(playlist.next_item().map(|item| item.id), Some(1));
//! ```

use rand::RngCore;
use rand::rngs::SmallRng;

use crate::clock::{Clock, SystemClock};
use crate::engine::{Feedback, SelectionEngine};
use crate::error::EngineError;
use crate::item::{Item, ItemId};
use crate::weight::{StandardWeight, WeightFunction};

/// Ordered item collection backed by a selection engine.
#[derive(Debug)]
pub struct Playlist<W = StandardWeight, R = SmallRng, C = SystemClock> {
    order: Vec<ItemId>,
    engine: SelectionEngine<W, R, C>,
}

impl<W, R, C> Playlist<W, R, C>
where
    W: WeightFunction,
    R: RngCore,
    C: Clock,
{
    /// Wraps an engine, adopting any items it already holds in id order.
    pub fn new(engine: SelectionEngine<W, R, C>) -> Self {
        let mut order: Vec<ItemId> = engine.items().map(|item| item.id).collect();
        order.sort_unstable();
        Self { order, engine }
    }

    /// Builds a playlist from an initial item list, preserving its order.
    pub fn with_items<I>(mut engine: SelectionEngine<W, R, C>, items: I) -> Result<Self, EngineError>
    where
        I: IntoIterator<Item = Item>,
    {
        let items: Vec<Item> = items.into_iter().collect();
        let order = items.iter().map(|item| item.id).collect();
        engine.initialize(items)?;
        Ok(Self { order, engine })
    }

    pub fn add_item(&mut self, item: Item) -> Result<(), EngineError> {
        let id = item.id;
        self.engine.add_item(item)?;
        self.order.push(id);
        Ok(())
    }

    pub fn remove_item(&mut self, id: ItemId) -> bool {
        if !self.engine.remove_item(id) {
            return false;
        }
        self.order.retain(|&other| other != id);
        true
    }

    /// Selects the next item, or `None` once the queue is drained.
    pub fn next_item(&mut self) -> Option<&Item> {
        self.engine.select_next()
    }

    /// Applies feedback, then compacts if the engine's policy asks for it.
    pub fn feedback(&mut self, id: ItemId, liked: bool, skipped: bool) -> Result<(), EngineError> {
        self.engine.apply_feedback(id, Feedback::new(liked, skipped))?;
        self.engine.maybe_compact();
        Ok(())
    }

    /// Re-weights every item at the current time and compacts.
    pub fn reshuffle(&mut self) {
        self.engine.refresh_all();
        self.engine.compact();
    }

    /// Items in insertion order.
    pub fn items(&self) -> impl Iterator<Item = &Item> + '_ {
        self.order.iter().filter_map(|id| self.engine.item(*id))
    }

    pub fn get(&self, id: ItemId) -> Option<&Item> {
        self.engine.item(id)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn engine(&self) -> &SelectionEngine<W, R, C> {
        &self.engine
    }

    /// Hands out the engine for operations the playlist doesn't wrap.
    ///
    /// Adding or removing items through it bypasses the insertion order.
    pub fn engine_mut(&mut self) -> &mut SelectionEngine<W, R, C> {
        &mut self.engine
    }
}
