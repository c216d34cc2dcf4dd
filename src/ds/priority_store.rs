//! Append-only max-heap of versioned weight entries.
//!
//! The store never updates an entry in place. Re-weighting an item pushes a
//! fresh [`Entry`] with a higher version; the old entry stays in the heap
//! until it is popped and discarded or a compaction drops it. Deciding which
//! entries are stale is the job of the
//! [`VersionRegistry`](crate::ds::VersionRegistry), not of this type.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────────┐
//! │                          PriorityStore Layout                               │
//! │                                                                             │
//! │   ┌───────────────────────────────────────────────────────────────────┐    │
//! │   │  heap: BinaryHeap<Entry>   (max-first, may hold stale entries)    │    │
//! │   │                                                                   │    │
//! │   │    ┌────────────────────────────────────────────────────────┐    │    │
//! │   │    │ (id=1, w=9.0, v=4)   ← current max                     │    │    │
//! │   │    │ (id=2, w=9.0, v=6)   ← same weight, newer version      │    │    │
//! │   │    │ (id=3, w=5.5, v=5)                                     │    │    │
//! │   │    │ (id=1, w=2.0, v=1)   ← superseded by v=4               │    │    │
//! │   │    └────────────────────────────────────────────────────────┘    │    │
//! │   │                                                                   │    │
//! │   │    len() = 4 (live + stale)                                       │    │
//! │   └───────────────────────────────────────────────────────────────────┘    │
//! └─────────────────────────────────────────────────────────────────────────────┘
//!
//! Ordering
//! ────────
//!   1. higher weight first
//!   2. equal weight: lower version first (older entry wins)
//!   3. equal weight and version: lower item id first
//! ```
//!
//! ## Operations
//!
//! | Operation     | Description                             | Complexity |
//! |---------------|-----------------------------------------|------------|
//! | `push`        | Append an entry                         | O(log n)   |
//! | `pop_max`     | Remove and return the max entry         | O(log n)   |
//! | `peek_max`    | Borrow the max entry                    | O(1)       |
//! | `iter`        | Visit all entries, arbitrary order      | O(n)       |
//! | `from_entries`| Heapify a batch of entries              | O(n)       |
//!
//! ## Example Usage
//!
//! ```
//! use shufflekit::ds::{Entry, PriorityStore};
//!
//! let mut store = PriorityStore::new();
//! store.push(Entry::new(1, 2.0, 1));
//! store.push(Entry::new(2, 7.5, 2));
//! store.push(Entry::new(1, 4.0, 3)); // re-weighting pushes, never updates
//!
//! assert_eq!(store.len(), 3);
//! assert_eq!(store.pop_max().map(|e| e.id), Some(2));
//! assert_eq!(store.pop_max().map(|e| e.version), Some(3));
//! ```
//!
//! ## Thread Safety
//!
//! `PriorityStore` is not thread-safe. The engine guards it together with the
//! registry under one lock.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::item::ItemId;

/// Immutable `(id, weight, version)` record.
///
/// Weights are expected to be finite and non-negative; ordering uses
/// [`f64::total_cmp`] so any value still has a total order.
#[derive(Debug, Clone, Copy)]
pub struct Entry {
    pub id: ItemId,
    pub weight: f64,
    pub version: u64,
}

impl Entry {
    #[inline]
    pub fn new(id: ItemId, weight: f64, version: u64) -> Self {
        Self {
            id,
            weight,
            version,
        }
    }
}

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Entry {}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Entry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.weight
            .total_cmp(&other.weight)
            .then_with(|| other.version.cmp(&self.version))
            .then_with(|| other.id.cmp(&self.id))
    }
}

/// Max-priority store over [`Entry`] values.
#[derive(Debug, Clone, Default)]
pub struct PriorityStore {
    heap: BinaryHeap<Entry>,
}

impl PriorityStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self {
            heap: BinaryHeap::new(),
        }
    }

    /// Creates an empty store with pre-allocated capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            heap: BinaryHeap::with_capacity(capacity),
        }
    }

    /// Builds a store from entries in O(n).
    ///
    /// ```
    /// use shufflekit::ds::{Entry, PriorityStore};
    ///
    /// let mut store = PriorityStore::from_entries(vec![
    ///     Entry::new(1, 1.0, 1),
    ///     Entry::new(2, 3.0, 2),
    /// ]);
    /// assert_eq!(store.pop_max().map(|e| e.id), Some(2));
    /// ```
    pub fn from_entries(entries: Vec<Entry>) -> Self {
        Self {
            heap: BinaryHeap::from(entries),
        }
    }

    /// Appends an entry.
    #[inline]
    pub fn push(&mut self, entry: Entry) {
        self.heap.push(entry);
    }

    /// Removes and returns the greatest entry.
    #[inline]
    pub fn pop_max(&mut self) -> Option<Entry> {
        self.heap.pop()
    }

    #[inline]
    pub fn peek_max(&self) -> Option<&Entry> {
        self.heap.peek()
    }

    /// Iterates every entry, stale ones included, in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = &Entry> + '_ {
        self.heap.iter()
    }

    /// Returns the number of entries, stale ones included.
    #[inline]
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    pub fn clear(&mut self) {
        self.heap.clear();
    }

    pub fn reserve(&mut self, additional: usize) {
        self.heap.reserve(additional);
    }

    pub fn shrink_to_fit(&mut self) {
        self.heap.shrink_to_fit();
    }

    /// Consumes the store, returning entries in unspecified order.
    pub fn into_entries(self) -> Vec<Entry> {
        self.heap.into_vec()
    }

    /// Returns an approximate memory footprint in bytes.
    pub fn approx_bytes(&self) -> usize {
        std::mem::size_of::<Self>() + self.heap.capacity() * std::mem::size_of::<Entry>()
    }

    #[cfg(any(test, debug_assertions))]
    /// Returns all entries sorted in pop order (debug/test builds only).
    pub fn debug_sorted(&self) -> Vec<Entry> {
        let mut entries = self.heap.clone().into_sorted_vec();
        entries.reverse();
        entries
    }
}

impl Extend<Entry> for PriorityStore {
    fn extend<I: IntoIterator<Item = Entry>>(&mut self, iter: I) {
        self.heap.extend(iter);
    }
}
