//! Weighted selection engine.
//!
//! Repeatedly hands out the highest-weighted item from a working set whose
//! weights keep changing. Re-weighting never touches existing heap entries:
//! it pushes a new, higher-versioned entry and bumps the item's version in
//! the registry. Selection pops entries until it finds one whose version is
//! still the latest, silently discarding the stale ones on the way.
//!
//! ## Architecture
//!
//! ```text
//!   ┌──────────────────────────────────────────────────────────────────────────┐
//!   │                    SelectionEngine<W, R, C>                              │
//!   │                                                                          │
//!   │   items: FxHashMap<ItemId, Item>        item state (engine-owned)        │
//!   │                                                                          │
//!   │   registry: VersionRegistry             id → latest version (+queued)    │
//!   │                                                                          │
//!   │   store: PriorityStore                  max-heap of (weight, ver, id)    │
//!   │                                         may contain stale entries        │
//!   │                                                                          │
//!   │   compaction: CompactionManager         rebuild policy + counters        │
//!   │                                                                          │
//!   │   weight_fn: W    rng: R    clock: C    injected collaborators           │
//!   └──────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Flows
//!
//! ```text
//!   select_next():
//!     loop:
//!       entry = store.pop_max()            → None: exhausted, return None
//!       if entry.version < registry[id]    → stale, discard, continue
//!       if id not in registry              → removed, discard, continue
//!       item.last_selected_at = now
//!       item.skip_count = 0
//!       return item                        (entry is NOT pushed back)
//!
//!   apply_feedback(id, fb):
//!     item.liked |= fb.liked
//!     item.skip_count += fb.skipped
//!     v = registry.next_version()
//!     registry[id] = v ; store.push((weight(item), v, id))
//! ```
//!
//! Selection is depleting: without feedback, adds or a refresh, `n` items
//! yield exactly `n` selections and then `None`.
//!
//! ## Operations
//!
//! | Operation        | Complexity            | Notes                               |
//! |------------------|-----------------------|-------------------------------------|
//! | `initialize`     | O(n log n)            | Replaces the whole item set         |
//! | `select_next`    | Amortized O(log n)    | Discards stale entries on the way   |
//! | `peek_next`      | Amortized O(log n)    | Same, without selecting             |
//! | `apply_feedback` | O(log n)              | Pushes a new versioned entry        |
//! | `add_item`       | O(log n)              | Rejects duplicate ids               |
//! | `remove_item`    | O(1)                  | Entries left behind become stale    |
//! | `refresh_all`    | O(n log n)            | Re-weights every item at `now`      |
//! | `compact`        | O(n)                  | Drops stale entries, same order     |
//!
//! ## Example Usage
//!
//! ```
//! use shufflekit::engine::{Feedback, SelectionEngine};
//! use shufflekit::item::Item;
//! use shufflekit::weight::WeightConfig;
//!
//! let mut engine = SelectionEngine::builder()
//!     .with_weight_config(WeightConfig::default().without_jitter())
//!     .with_seed(42)
//!     .build();
//! engine
//!     .initialize(vec![Item::with_popularity(1, 10.0), Item::with_popularity(2, 5.0)])
//!     .unwrap();
//!
//! assert_eq!(engine.select_next().map(|item| item.id), Some(1));
//! assert_eq!(engine.select_next().map(|item| item.id), Some(2));
//! assert!(engine.select_next().is_none());
//!
//! // Feedback re-queues an item with a fresh weight.
//! engine.apply_feedback(2, Feedback::like()).unwrap();
//! engine.compact();
//! assert_eq!(engine.queued_len(), 1);
//! ```
//!
//! ## Thread Safety
//!
//! - [`SelectionEngine`]: single writer, not thread-safe
//! - [`ConcurrentSelectionEngine`]: wraps the engine in a
//!   `parking_lot::RwLock`; every mutating call holds the write lock for its
//!   full duration (feature `concurrency`)

use rand::RngCore;
use rand::rngs::SmallRng;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::builder::EngineBuilder;
use crate::clock::{Clock, SystemClock};
use crate::compaction::{CompactionManager, CompactionPolicy, CompactionReport};
use crate::ds::{Entry, PriorityStore, VersionRegistry};
use crate::error::{EngineError, InvariantError};
use crate::item::{Item, ItemId, Millis};
#[cfg(feature = "metrics")]
use crate::metrics::{
    EngineMetrics, EngineMetricsRecorder, EngineMetricsSnapshot, MetricsReset,
    MetricsSnapshotProvider,
};
use crate::weight::{StandardWeight, WeightFunction, sanitize_weight};

/// User feedback on an item.
///
/// `liked` is one-way: once an item is liked there is no way to unlike it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Feedback {
    pub liked: bool,
    pub skipped: bool,
}

impl Feedback {
    pub fn new(liked: bool, skipped: bool) -> Self {
        Self { liked, skipped }
    }

    pub fn like() -> Self {
        Self::new(true, false)
    }

    pub fn skip() -> Self {
        Self::new(false, true)
    }
}

/// Point-in-time counts describing the engine's memory and health.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EngineStats {
    /// Registered items.
    pub items: usize,
    /// Items whose latest entry is still in the store (selectable).
    pub queued: usize,
    /// Entries physically in the store, stale ones included.
    pub store_len: usize,
    pub stale_entries: usize,
    /// Computed weights that were clamped to zero.
    pub invalid_weights: u64,
    pub compactions: u64,
    pub last_version: u64,
}

/// Lazy-deletion, versioned max-priority selection over a mutable item set.
///
/// # Type Parameters
///
/// - `W`: weight function, see [`WeightFunction`]
/// - `R`: randomness source handed to the weight function
/// - `C`: time source, see [`Clock`]
pub struct SelectionEngine<W = StandardWeight, R = SmallRng, C = SystemClock> {
    items: FxHashMap<ItemId, Item>,
    registry: VersionRegistry,
    store: PriorityStore,
    compaction: CompactionManager,
    weight_fn: W,
    rng: R,
    clock: C,
    invalid_weights: u64,
    #[cfg(feature = "metrics")]
    metrics: EngineMetrics,
}

impl SelectionEngine {
    /// Starts configuring an engine with the standard weight function.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::new()
    }
}

impl<W, R, C> SelectionEngine<W, R, C>
where
    W: WeightFunction,
    R: RngCore,
    C: Clock,
{
    /// Creates an empty engine from its collaborators.
    pub fn new(weight_fn: W, rng: R, clock: C) -> Self {
        Self::with_capacity(weight_fn, rng, clock, 0)
    }

    pub fn with_capacity(weight_fn: W, rng: R, clock: C, capacity: usize) -> Self {
        Self {
            items: FxHashMap::with_capacity_and_hasher(capacity, Default::default()),
            registry: VersionRegistry::with_capacity(capacity),
            store: PriorityStore::with_capacity(capacity),
            compaction: CompactionManager::default(),
            weight_fn,
            rng,
            clock,
            invalid_weights: 0,
            #[cfg(feature = "metrics")]
            metrics: EngineMetrics::new(),
        }
    }

    /// Replaces the item set, weighting every item at the current time.
    ///
    /// Items keep whatever history they carry; fresh items have never been
    /// selected and weigh without a recency penalty. Items are weighted in
    /// the order given, which fixes the sequence of random draws.
    ///
    /// Fails with [`EngineError::DuplicateId`] if two items share an id; the
    /// engine is left untouched in that case.
    pub fn initialize<I>(&mut self, items: I) -> Result<(), EngineError>
    where
        I: IntoIterator<Item = Item>,
    {
        let items: Vec<Item> = items.into_iter().collect();
        let mut seen = FxHashSet::with_capacity_and_hasher(items.len(), Default::default());
        if let Some(dup) = items.iter().find(|item| !seen.insert(item.id)) {
            return Err(EngineError::DuplicateId(dup.id));
        }

        for id in self.items.keys() {
            self.registry.remove(*id);
        }
        self.items.clear();
        self.store.clear();
        self.items.reserve(items.len());
        self.store.reserve(items.len());

        let now = self.clock.now_millis();
        for item in items {
            let id = item.id;
            self.items.insert(id, item);
            self.reweigh(id, now);
        }
        tracing::debug!(items = self.items.len(), "initialized selection engine");
        Ok(())
    }

    /// Selects the highest-weighted live item.
    ///
    /// Marks it selected at the current time and resets its skip count. The
    /// winning entry is consumed; the item is not selectable again until
    /// feedback, a refresh or a re-add queues a new entry. Returns `None`
    /// once nothing live remains.
    pub fn select_next(&mut self) -> Option<&Item> {
        #[cfg(feature = "metrics")]
        self.metrics.record_select_call();

        let Some(id) = self.pop_live() else {
            #[cfg(feature = "metrics")]
            self.metrics.record_select_empty();
            return None;
        };
        self.registry.mark_consumed(id);

        #[cfg(feature = "metrics")]
        self.metrics.record_select_found();

        let now = self.clock.now_millis();
        let item = self.items.get_mut(&id)?;
        item.mark_selected(now);
        Some(item)
    }

    /// Returns the item [`select_next`](Self::select_next) would pick,
    /// without selecting it. Stale entries at the top are discarded.
    pub fn peek_next(&mut self) -> Option<&Item> {
        loop {
            let top = *self.store.peek_max()?;
            if self.registry.is_stale(top.id, top.version) {
                self.discard_stale();
                continue;
            }
            return self.items.get(&top.id);
        }
    }

    /// Applies user feedback and re-queues the item with a fresh weight.
    ///
    /// Any earlier entry for the item becomes stale.
    pub fn apply_feedback(&mut self, id: ItemId, feedback: Feedback) -> Result<(), EngineError> {
        #[cfg(feature = "metrics")]
        self.metrics.record_feedback_call();

        let Some(item) = self.items.get_mut(&id) else {
            #[cfg(feature = "metrics")]
            self.metrics.record_feedback_not_found();
            return Err(EngineError::NotFound(id));
        };
        if feedback.liked {
            item.liked = true;
        }
        if feedback.skipped {
            item.record_skip();
        }

        let now = self.clock.now_millis();
        self.reweigh(id, now);
        Ok(())
    }

    /// Registers a new item and queues it.
    ///
    /// Fails with [`EngineError::DuplicateId`] if the id is already
    /// registered; the existing item is left untouched.
    pub fn add_item(&mut self, item: Item) -> Result<(), EngineError> {
        #[cfg(feature = "metrics")]
        self.metrics.record_add_call();

        let id = item.id;
        if self.items.contains_key(&id) {
            #[cfg(feature = "metrics")]
            self.metrics.record_add_duplicate();
            return Err(EngineError::DuplicateId(id));
        }
        self.items.insert(id, item);

        let now = self.clock.now_millis();
        self.reweigh(id, now);
        tracing::trace!(id, "added item");
        Ok(())
    }

    /// Unregisters an item. Returns whether it existed.
    ///
    /// Entries for the item stay in the store until popped or compacted,
    /// but none of them can ever be selected again.
    pub fn remove_item(&mut self, id: ItemId) -> bool {
        self.take_item(id).is_some()
    }

    /// Unregisters an item and hands its state back.
    pub fn take_item(&mut self, id: ItemId) -> Option<Item> {
        #[cfg(feature = "metrics")]
        self.metrics.record_remove_call();

        let item = self.items.remove(&id)?;
        self.registry.remove(id);

        #[cfg(feature = "metrics")]
        self.metrics.record_remove_found();
        tracing::trace!(id, "removed item");
        Some(item)
    }

    /// Re-weights every registered item at the current time.
    ///
    /// Every item becomes selectable again; all previously queued entries go
    /// stale. Items are visited in ascending id order.
    pub fn refresh_all(&mut self) {
        let mut ids: Vec<ItemId> = self.items.keys().copied().collect();
        ids.sort_unstable();
        let now = self.clock.now_millis();
        for id in ids {
            self.reweigh(id, now);
        }
    }

    /// Drops every stale entry from the store and releases the space they
    /// occupied.
    ///
    /// Selection order is unaffected.
    pub fn compact(&mut self) -> CompactionReport {
        let store = std::mem::take(&mut self.store);
        let (store, report) = self.compaction.compact(store, &self.registry);
        self.store = store;

        #[cfg(feature = "metrics")]
        self.metrics.record_compaction(report.discarded);
        report
    }

    /// Compacts if the configured [`CompactionPolicy`] asks for it.
    pub fn maybe_compact(&mut self) -> Option<CompactionReport> {
        if self
            .compaction
            .should_compact(self.store.len(), self.stale_entries())
        {
            Some(self.compact())
        } else {
            None
        }
    }

    pub fn compaction_policy(&self) -> CompactionPolicy {
        self.compaction.policy()
    }

    pub fn set_compaction_policy(&mut self, policy: CompactionPolicy) {
        self.compaction.set_policy(policy);
    }

    pub fn item(&self, id: ItemId) -> Option<&Item> {
        self.items.get(&id)
    }

    /// Iterates registered items in unspecified order.
    pub fn items(&self) -> impl Iterator<Item = &Item> + '_ {
        self.items.values()
    }

    pub fn contains(&self, id: ItemId) -> bool {
        self.items.contains_key(&id)
    }

    /// Number of registered items, selectable or not.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Number of items a drain of `select_next` would currently return.
    pub fn queued_len(&self) -> usize {
        self.registry.queued_len()
    }

    /// `true` if `id` has a live entry waiting in the store.
    pub fn is_queued(&self, id: ItemId) -> bool {
        self.registry.is_queued(id)
    }

    /// Number of store entries, stale ones included.
    pub fn store_len(&self) -> usize {
        self.store.len()
    }

    pub fn stale_entries(&self) -> usize {
        self.store.len() - self.registry.queued_len()
    }

    /// The latest version recorded for `id`.
    pub fn version_of(&self, id: ItemId) -> Option<u64> {
        self.registry.latest_of(id)
    }

    pub fn stats(&self) -> EngineStats {
        EngineStats {
            items: self.items.len(),
            queued: self.registry.queued_len(),
            store_len: self.store.len(),
            stale_entries: self.stale_entries(),
            invalid_weights: self.invalid_weights,
            compactions: self.compaction.compactions(),
            last_version: self.registry.last_version(),
        }
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Approximate heap memory used by the store and item map, in bytes.
    pub fn approx_bytes(&self) -> usize {
        std::mem::size_of::<Self>()
            + self.store.approx_bytes()
            + self.items.capacity() * std::mem::size_of::<(ItemId, Item)>()
    }

    #[cfg(feature = "metrics")]
    pub fn metrics_snapshot(&self) -> EngineMetricsSnapshot {
        self.metrics
            .snapshot_with(self.items.len(), self.registry.queued_len(), self.store.len())
    }

    /// Verifies registry, item map and store agree.
    ///
    /// O(n) in store size; meant for tests and debugging.
    pub fn check_invariants(&self) -> Result<(), InvariantError> {
        if self.registry.len() != self.items.len() {
            return Err(InvariantError::new(format!(
                "registry tracks {} items but {} are registered",
                self.registry.len(),
                self.items.len()
            )));
        }
        if let Some(id) = self.items.keys().find(|id| !self.registry.contains(**id)) {
            return Err(InvariantError::new(format!("item {id} has no registry version")));
        }

        let mut live = FxHashSet::default();
        for entry in self.store.iter() {
            if entry.version > self.registry.last_version() {
                return Err(InvariantError::new(format!(
                    "entry for item {} carries unissued version {}",
                    entry.id, entry.version
                )));
            }
            if !(entry.weight.is_finite() && entry.weight >= 0.0) {
                return Err(InvariantError::new(format!(
                    "entry for item {} has invalid weight {}",
                    entry.id, entry.weight
                )));
            }
            if !self.registry.is_stale(entry.id, entry.version) && !live.insert(entry.id) {
                return Err(InvariantError::new(format!(
                    "item {} has more than one live entry",
                    entry.id
                )));
            }
        }
        for id in &live {
            if !self.registry.is_queued(*id) {
                return Err(InvariantError::new(format!(
                    "item {id} has a live entry but is not marked queued"
                )));
            }
        }
        if live.len() != self.registry.queued_len() {
            return Err(InvariantError::new(format!(
                "{} live entries but {} items marked queued",
                live.len(),
                self.registry.queued_len()
            )));
        }
        Ok(())
    }

    /// Pops until a live entry surfaces; returns its item id.
    fn pop_live(&mut self) -> Option<ItemId> {
        loop {
            let entry = self.store.pop_max()?;
            if self.registry.is_stale(entry.id, entry.version) {
                self.note_stale(&entry);
                continue;
            }
            return Some(entry.id);
        }
    }

    fn discard_stale(&mut self) {
        if let Some(entry) = self.store.pop_max() {
            self.note_stale(&entry);
        }
    }

    fn note_stale(&mut self, entry: &Entry) {
        #[cfg(feature = "metrics")]
        self.metrics.record_stale_skip();
        tracing::trace!(
            id = entry.id,
            version = entry.version,
            latest = ?self.registry.latest_of(entry.id),
            "discarded stale entry"
        );
    }

    /// Computes `id`'s weight and queues it under a fresh version.
    ///
    /// Registry bump and push happen together; no caller ever observes one
    /// without the other.
    fn reweigh(&mut self, id: ItemId, now: Millis) {
        let Some(item) = self.items.get(&id) else {
            return;
        };
        let raw = self.weight_fn.compute_weight(item, now, &mut self.rng);
        let (weight, invalid) = sanitize_weight(raw);
        if invalid {
            self.invalid_weights += 1;
            #[cfg(feature = "metrics")]
            self.metrics.record_invalid_weight();
            tracing::warn!(id, raw, "computed weight is not a finite non-negative number; clamped to 0");
        }

        let version = self.registry.next_version();
        self.registry.set_latest(id, version);
        self.store.push(Entry::new(id, weight, version));
        self.compaction.record_reweight();

        #[cfg(feature = "metrics")]
        self.metrics.record_reweight();
        tracing::trace!(id, weight, version, "queued entry");
    }
}

impl<W, R, C> std::fmt::Debug for SelectionEngine<W, R, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SelectionEngine")
            .field("items", &self.items.len())
            .field("queued", &self.registry.queued_len())
            .field("store_len", &self.store.len())
            .field("last_version", &self.registry.last_version())
            .finish_non_exhaustive()
    }
}

#[cfg(feature = "metrics")]
impl<W, R, C> MetricsSnapshotProvider<EngineMetricsSnapshot> for SelectionEngine<W, R, C>
where
    W: WeightFunction,
    R: RngCore,
    C: Clock,
{
    fn snapshot(&self) -> EngineMetricsSnapshot {
        self.metrics_snapshot()
    }
}

#[cfg(feature = "metrics")]
impl<W, R, C> MetricsReset for SelectionEngine<W, R, C> {
    fn reset_metrics(&mut self) {
        self.metrics.reset_metrics();
    }
}

// ---------------------------------------------------------------------------
// ConcurrentSelectionEngine
// ---------------------------------------------------------------------------

#[cfg(feature = "concurrency")]
pub use concurrent::ConcurrentSelectionEngine;

#[cfg(feature = "concurrency")]
mod concurrent {
    use std::fmt;
    use std::sync::Arc;

    use parking_lot::RwLock;
    use rand::RngCore;
    use rand::rngs::SmallRng;

    use super::{EngineStats, Feedback, SelectionEngine};
    use crate::clock::{Clock, SystemClock};
    use crate::compaction::CompactionReport;
    use crate::error::EngineError;
    use crate::item::{Item, ItemId};
    use crate::weight::{StandardWeight, WeightFunction};

    /// Thread-safe engine handle.
    ///
    /// Each mutating call runs under one write lock, so a selection's
    /// pop-validate-update sequence and a re-weighting's registry bump plus
    /// push are never interleaved with other operations. Clones share the
    /// same engine. Items are returned by value.
    ///
    /// ```
    /// use shufflekit::engine::{ConcurrentSelectionEngine, Feedback, SelectionEngine};
    /// use shufflekit::item::Item;
    ///
    /// let mut engine = SelectionEngine::builder().with_seed(1).build();
    /// engine.initialize(vec![Item::with_popularity(1, 3.0)]).unwrap();
    ///
    /// let shared = ConcurrentSelectionEngine::new(engine);
    /// let handle = shared.clone();
    /// std::thread::spawn(move || handle.apply_feedback(1, Feedback::like()))
    ///     .join()
    ///     .unwrap()
    ///     .unwrap();
    /// assert!(shared.item(1).unwrap().liked);
    /// ```
    pub struct ConcurrentSelectionEngine<W = StandardWeight, R = SmallRng, C = SystemClock> {
        inner: Arc<RwLock<SelectionEngine<W, R, C>>>,
    }

    impl<W, R, C> Clone for ConcurrentSelectionEngine<W, R, C> {
        fn clone(&self) -> Self {
            Self {
                inner: Arc::clone(&self.inner),
            }
        }
    }

    impl<W, R, C> fmt::Debug for ConcurrentSelectionEngine<W, R, C> {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.debug_struct("ConcurrentSelectionEngine")
                .field("inner", &*self.inner.read())
                .finish()
        }
    }

    impl<W, R, C> ConcurrentSelectionEngine<W, R, C>
    where
        W: WeightFunction,
        R: RngCore,
        C: Clock,
    {
        pub fn new(engine: SelectionEngine<W, R, C>) -> Self {
            Self {
                inner: Arc::new(RwLock::new(engine)),
            }
        }

        pub fn select_next(&self) -> Option<Item> {
            self.inner.write().select_next().cloned()
        }

        pub fn peek_next(&self) -> Option<Item> {
            self.inner.write().peek_next().cloned()
        }

        pub fn apply_feedback(&self, id: ItemId, feedback: Feedback) -> Result<(), EngineError> {
            self.inner.write().apply_feedback(id, feedback)
        }

        pub fn add_item(&self, item: Item) -> Result<(), EngineError> {
            self.inner.write().add_item(item)
        }

        pub fn remove_item(&self, id: ItemId) -> bool {
            self.inner.write().remove_item(id)
        }

        pub fn refresh_all(&self) {
            self.inner.write().refresh_all();
        }

        pub fn compact(&self) -> CompactionReport {
            self.inner.write().compact()
        }

        pub fn maybe_compact(&self) -> Option<CompactionReport> {
            self.inner.write().maybe_compact()
        }

        pub fn item(&self, id: ItemId) -> Option<Item> {
            self.inner.read().item(id).cloned()
        }

        pub fn contains(&self, id: ItemId) -> bool {
            self.inner.read().contains(id)
        }

        pub fn len(&self) -> usize {
            self.inner.read().len()
        }

        pub fn is_empty(&self) -> bool {
            self.inner.read().is_empty()
        }

        pub fn queued_len(&self) -> usize {
            self.inner.read().queued_len()
        }

        pub fn stats(&self) -> EngineStats {
            self.inner.read().stats()
        }

        /// Runs `f` under the read lock.
        pub fn with_read<T>(&self, f: impl FnOnce(&SelectionEngine<W, R, C>) -> T) -> T {
            f(&self.inner.read())
        }

        /// Runs `f` under the write lock, as one atomic step.
        pub fn with_write<T>(&self, f: impl FnOnce(&mut SelectionEngine<W, R, C>) -> T) -> T {
            f(&mut self.inner.write())
        }
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;

    use super::*;
    use crate::clock::ManualClock;
    use crate::weight::{FixedWeight, WeightConfig};

    type FixedEngine = SelectionEngine<FixedWeight, SmallRng, ManualClock>;

    fn fixed_engine(items: &[(ItemId, f64)]) -> FixedEngine {
        let mut engine = SelectionEngine::new(
            FixedWeight,
            SmallRng::seed_from_u64(3),
            ManualClock::new(1_000),
        );
        engine
            .initialize(items.iter().map(|&(id, w)| Item::with_popularity(id, w)))
            .unwrap();
        engine
    }

    fn drain<W: WeightFunction, R: RngCore, C: Clock>(
        engine: &mut SelectionEngine<W, R, C>,
    ) -> Vec<ItemId> {
        std::iter::from_fn(|| engine.select_next().map(|item| item.id)).collect()
    }

    #[test]
    fn selection_depletes_in_descending_weight() {
        let mut engine = fixed_engine(&[(1, 2.0), (2, 9.0), (3, 4.0)]);
        assert_eq!(drain(&mut engine), vec![2, 3, 1]);
        assert!(engine.select_next().is_none());
        assert!(engine.select_next().is_none());
        assert_eq!(engine.len(), 3);
        assert_eq!(engine.queued_len(), 0);
        engine.check_invariants().unwrap();
    }

    #[test]
    fn selection_updates_item_state() {
        let mut engine = fixed_engine(&[(1, 1.0)]);
        engine.apply_feedback(1, Feedback::skip()).unwrap();
        assert_eq!(engine.item(1).unwrap().skip_count, 1);

        engine.clock().set(5_000);
        let item = engine.select_next().unwrap();
        assert_eq!(item.last_selected_at, Some(5_000));
        assert_eq!(item.skip_count, 0);
    }

    #[test]
    fn feedback_supersedes_previous_entry() {
        let mut engine = fixed_engine(&[(1, 5.0), (2, 3.0)]);
        let before = engine.version_of(1).unwrap();
        engine.apply_feedback(1, Feedback::like()).unwrap();
        assert!(engine.version_of(1).unwrap() > before);
        assert_eq!(engine.store_len(), 3);
        assert_eq!(engine.stale_entries(), 1);

        assert_eq!(drain(&mut engine), vec![1, 2]);
        assert!(engine.item(1).unwrap().liked);
    }

    #[test]
    fn feedback_on_unknown_id_is_not_found() {
        let mut engine = fixed_engine(&[(1, 1.0)]);
        assert_eq!(
            engine.apply_feedback(42, Feedback::new(true, true)),
            Err(EngineError::NotFound(42))
        );
        assert_eq!(engine.store_len(), 1);
    }

    #[test]
    fn feedback_requeues_selected_item() {
        let mut engine = fixed_engine(&[(1, 1.0)]);
        assert_eq!(drain(&mut engine), vec![1]);
        engine.apply_feedback(1, Feedback::default()).unwrap();
        assert_eq!(drain(&mut engine), vec![1]);
    }

    #[test]
    fn add_rejects_duplicates_without_touching_existing() {
        let mut engine = fixed_engine(&[(1, 1.0)]);
        let err = engine.add_item(Item::with_popularity(1, 100.0));
        assert_eq!(err, Err(EngineError::DuplicateId(1)));
        assert_eq!(engine.item(1).unwrap().base_popularity, 1.0);
        assert_eq!(engine.store_len(), 1);
    }

    #[test]
    fn initialize_rejects_duplicates_atomically() {
        let mut engine = fixed_engine(&[(1, 1.0)]);
        let err = engine.initialize(vec![
            Item::with_popularity(2, 1.0),
            Item::with_popularity(2, 2.0),
        ]);
        assert_eq!(err, Err(EngineError::DuplicateId(2)));
        assert!(engine.contains(1));
        assert!(!engine.contains(2));
    }

    #[test]
    fn initialize_replaces_previous_items() {
        let mut engine = fixed_engine(&[(1, 1.0), (2, 2.0)]);
        let last = engine.stats().last_version;
        engine.initialize(vec![Item::with_popularity(3, 1.0)]).unwrap();
        assert!(!engine.contains(1));
        assert_eq!(engine.version_of(3), Some(last + 1));
        assert_eq!(drain(&mut engine), vec![3]);
        engine.check_invariants().unwrap();
    }

    #[test]
    fn removed_item_is_never_selected() {
        let mut engine = fixed_engine(&[(1, 1.0), (2, 2.0)]);
        engine.apply_feedback(2, Feedback::like()).unwrap();
        assert!(engine.remove_item(2));
        assert!(!engine.remove_item(2));
        assert_eq!(engine.stale_entries(), 2);
        assert_eq!(drain(&mut engine), vec![1]);
        engine.check_invariants().unwrap();
    }

    #[test]
    fn readding_removed_item_ignores_old_entries() {
        let mut engine = fixed_engine(&[(1, 10.0), (2, 5.0)]);
        engine.remove_item(1);
        engine.add_item(Item::with_popularity(1, 1.0)).unwrap();
        assert_eq!(drain(&mut engine), vec![2, 1]);
    }

    #[test]
    fn take_item_returns_state() {
        let mut engine = fixed_engine(&[(1, 1.0)]);
        engine.apply_feedback(1, Feedback::skip()).unwrap();
        let item = engine.take_item(1).unwrap();
        assert_eq!(item.skip_count, 1);
        assert!(engine.is_empty());
    }

    #[test]
    fn peek_matches_next_selection_and_discards_stale_tops() {
        let mut engine = fixed_engine(&[(1, 3.0), (2, 2.0)]);
        engine.remove_item(1);
        assert_eq!(engine.peek_next().map(|item| item.id), Some(2));
        assert_eq!(engine.store_len(), 1);
        assert_eq!(engine.select_next().map(|item| item.id), Some(2));
        assert!(engine.peek_next().is_none());
    }

    #[test]
    fn compaction_reclaims_memory_from_feedback_churn() {
        let mut engine = fixed_engine(&[(1, 4.0), (2, 3.0), (3, 2.0), (4, 1.0)]);
        for _ in 0..100_000 {
            engine.apply_feedback(1, Feedback::skip()).unwrap();
        }
        let before = engine.approx_bytes();

        let report = engine.compact();
        assert_eq!(report.discarded, 100_000);
        assert_eq!(engine.store_len(), 4);
        assert!(
            engine.approx_bytes() < before / 100,
            "after compaction {} of {} bytes still held",
            engine.approx_bytes(),
            before
        );
        assert_eq!(drain(&mut engine), vec![1, 2, 3, 4]);
    }

    #[test]
    fn compaction_keeps_selection_order() {
        let mut a = fixed_engine(&[(1, 1.0), (2, 2.0), (3, 3.0), (4, 3.0)]);
        let mut b = fixed_engine(&[(1, 1.0), (2, 2.0), (3, 3.0), (4, 3.0)]);
        for engine in [&mut a, &mut b] {
            engine.apply_feedback(1, Feedback::skip()).unwrap();
            engine.apply_feedback(3, Feedback::like()).unwrap();
            engine.remove_item(2);
        }
        let report = b.compact();
        assert_eq!(report.discarded, 3);
        assert_eq!(b.stale_entries(), 0);
        b.check_invariants().unwrap();
        assert_eq!(drain(&mut a), drain(&mut b));
    }

    #[test]
    fn maybe_compact_follows_policy() {
        let mut engine = fixed_engine(&[(1, 1.0), (2, 2.0)]);
        assert!(engine.maybe_compact().is_none());

        engine.set_compaction_policy(CompactionPolicy::StaleFraction(0.25));
        assert!(engine.maybe_compact().is_none());
        engine.apply_feedback(1, Feedback::skip()).unwrap();
        let report = engine.maybe_compact().unwrap();
        assert_eq!(report.discarded, 1);
        assert_eq!(engine.stats().compactions, 1);
    }

    #[test]
    fn refresh_all_requeues_everything() {
        let mut engine = fixed_engine(&[(1, 1.0), (2, 2.0)]);
        assert_eq!(drain(&mut engine), vec![2, 1]);
        engine.refresh_all();
        assert_eq!(engine.queued_len(), 2);
        assert_eq!(drain(&mut engine), vec![2, 1]);
    }

    #[test]
    fn invalid_weights_are_clamped_and_counted() {
        let weight = |item: &Item, _now: Millis, _rng: &mut dyn RngCore| {
            if item.id == 1 { f64::NAN } else { -item.base_popularity }
        };
        let mut engine = SelectionEngine::new(weight, SmallRng::seed_from_u64(0), ManualClock::new(0));
        engine
            .initialize(vec![Item::with_popularity(1, 1.0), Item::with_popularity(2, 1.0)])
            .unwrap();
        assert_eq!(engine.stats().invalid_weights, 2);
        // Both weigh zero: the older entry wins.
        assert_eq!(drain(&mut engine), vec![1, 2]);
        engine.check_invariants().unwrap();
    }

    #[test]
    fn recency_pushes_just_selected_items_down() {
        let clock = ManualClock::new(1_000_000);
        let weight = StandardWeight::new(WeightConfig::default().without_jitter());
        let mut engine = SelectionEngine::new(weight, SmallRng::seed_from_u64(9), clock.clone());
        engine
            .initialize(vec![Item::with_popularity(1, 10.0), Item::with_popularity(2, 1.0)])
            .unwrap();
        assert_eq!(engine.select_next().map(|item| item.id), Some(1));

        engine.apply_feedback(1, Feedback::default()).unwrap();
        assert_eq!(engine.select_next().map(|item| item.id), Some(2));

        clock.advance(1_000_000_000);
        engine.refresh_all();
        assert_eq!(engine.select_next().map(|item| item.id), Some(1));
    }

    #[test]
    fn stats_track_store_and_queue() {
        let mut engine = fixed_engine(&[(1, 1.0), (2, 2.0)]);
        engine.apply_feedback(1, Feedback::skip()).unwrap();
        engine.select_next();
        let stats = engine.stats();
        assert_eq!(
            stats,
            EngineStats {
                items: 2,
                queued: 1,
                store_len: 2,
                stale_entries: 1,
                invalid_weights: 0,
                compactions: 0,
                last_version: 3,
            }
        );
    }

    #[test]
    fn debug_output_is_summarised() {
        let engine = fixed_engine(&[(1, 1.0)]);
        let dbg = format!("{:?}", engine);
        assert!(dbg.contains("SelectionEngine"));
        assert!(dbg.contains("store_len: 1"));
    }

    #[cfg(feature = "metrics")]
    #[test]
    fn metrics_record_engine_activity() {
        let mut engine = fixed_engine(&[(1, 1.0), (2, 2.0)]);
        engine.apply_feedback(2, Feedback::skip()).unwrap();
        let _ = engine.apply_feedback(9, Feedback::skip());
        let _ = engine.add_item(Item::with_popularity(1, 1.0));
        drain(&mut engine);
        engine.compact();

        let snapshot = engine.metrics_snapshot();
        assert_eq!(snapshot.select_calls, 3);
        assert_eq!(snapshot.select_found, 2);
        assert_eq!(snapshot.select_empty, 1);
        assert_eq!(snapshot.stale_skips, 1);
        assert_eq!(snapshot.feedback_calls, 2);
        assert_eq!(snapshot.feedback_not_found, 1);
        assert_eq!(snapshot.add_duplicates, 1);
        assert_eq!(snapshot.reweights, 3);
        assert_eq!(snapshot.compactions, 1);
        assert_eq!(snapshot.store_len, 0);
    }

    #[cfg(feature = "metrics")]
    #[test]
    fn metrics_export_and_reset() {
        use crate::metrics::{MetricsExporter, PrometheusTextExporter};

        let mut engine = fixed_engine(&[(1, 1.0)]);
        engine.select_next();
        let exporter = PrometheusTextExporter::new("shufflekit", Vec::new());
        exporter.export(&MetricsSnapshotProvider::snapshot(&engine));
        let text = String::from_utf8(exporter.into_inner()).unwrap();
        assert!(text.contains("shufflekit_select_found_total 1\n"));
        assert!(text.contains("shufflekit_items 1\n"));

        engine.reset_metrics();
        let snapshot = engine.metrics_snapshot();
        assert_eq!(snapshot.select_calls, 0);
        assert_eq!(snapshot.items, 1);
    }
}
