//! Authoritative item → latest-version index.
//!
//! Every re-weighting draws a fresh version from a process-wide monotonic
//! counter and records it as the item's latest. Any store entry carrying an
//! older version for that item is stale. Removing an item drops its mapping,
//! which turns every outstanding entry for it stale at once.
//!
//! The registry also remembers whether the latest entry of each item is still
//! sitting in the store (`queued`) or has already been consumed by a
//! selection. That lets the engine report how many entries are stale without
//! scanning the store.
//!
//! ```text
//!   slots: FxHashMap<ItemId, Slot>
//!
//!     id │ version │ queued
//!    ────┼─────────┼────────
//!      1 │    4    │  yes     entry (1, v4) is in the store
//!      2 │    6    │  no      (2, v6) was selected, nothing queued
//!      3 │    5    │  yes
//!
//!   last_version = 6, queued_len = 2
//! ```
//!
//! ## Example Usage
//!
//! ```
//! use shufflekit::ds::VersionRegistry;
//!
//! let mut registry = VersionRegistry::new();
//! let v1 = registry.next_version();
//! registry.set_latest(10, v1);
//! let v2 = registry.next_version();
//! registry.set_latest(10, v2);
//!
//! assert!(v2 > v1);
//! assert_eq!(registry.latest_of(10), Some(v2));
//! assert!(registry.is_stale(10, v1));
//!
//! registry.remove(10);
//! assert!(registry.is_stale(10, v2));
//! ```

use rustc_hash::FxHashMap;

use crate::item::ItemId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Slot {
    version: u64,
    queued: bool,
}

/// Maps each registered item to its single live version.
#[derive(Debug, Clone, Default)]
pub struct VersionRegistry {
    slots: FxHashMap<ItemId, Slot>,
    last_version: u64,
    queued: usize,
}

impl VersionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: FxHashMap::with_capacity_and_hasher(capacity, Default::default()),
            last_version: 0,
            queued: 0,
        }
    }

    /// Draws the next version. Versions start at 1 and strictly increase.
    ///
    /// # Panics
    ///
    /// Panics if the 64-bit counter is exhausted.
    pub fn next_version(&mut self) -> u64 {
        self.last_version = match self.last_version.checked_add(1) {
            Some(next) => next,
            None => panic!("version counter exhausted"),
        };
        self.last_version
    }

    /// Records `version` as `id`'s latest, with its entry queued in the store.
    ///
    /// Returns the version it replaced, if any.
    pub fn set_latest(&mut self, id: ItemId, version: u64) -> Option<u64> {
        let previous = self.slots.insert(
            id,
            Slot {
                version,
                queued: true,
            },
        );
        debug_assert!(
            previous.is_none_or(|slot| slot.version < version),
            "version must increase for item {id}"
        );
        match previous {
            Some(slot) if slot.queued => {},
            _ => self.queued += 1,
        }
        previous.map(|slot| slot.version)
    }

    #[inline]
    pub fn latest_of(&self, id: ItemId) -> Option<u64> {
        self.slots.get(&id).map(|slot| slot.version)
    }

    /// Drops `id`'s mapping, returning its last version.
    pub fn remove(&mut self, id: ItemId) -> Option<u64> {
        let slot = self.slots.remove(&id)?;
        if slot.queued {
            self.queued -= 1;
        }
        Some(slot.version)
    }

    /// `true` when `(id, version)` is not the live entry for `id`.
    #[inline]
    pub fn is_stale(&self, id: ItemId, version: u64) -> bool {
        self.latest_of(id).is_none_or(|latest| version < latest)
    }

    /// Records that the live entry for `id` left the store via selection.
    pub(crate) fn mark_consumed(&mut self, id: ItemId) {
        if let Some(slot) = self.slots.get_mut(&id)
            && slot.queued
        {
            slot.queued = false;
            self.queued -= 1;
        }
    }

    /// `true` if `id`'s latest entry is still in the store.
    pub fn is_queued(&self, id: ItemId) -> bool {
        self.slots.get(&id).is_some_and(|slot| slot.queued)
    }

    #[inline]
    pub fn contains(&self, id: ItemId) -> bool {
        self.slots.contains_key(&id)
    }

    /// Number of registered items.
    #[inline]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Number of items whose latest entry is still in the store.
    #[inline]
    pub fn queued_len(&self) -> usize {
        self.queued
    }

    /// The most recently issued version, or 0 if none was issued yet.
    #[inline]
    pub fn last_version(&self) -> u64 {
        self.last_version
    }

}
