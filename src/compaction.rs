//! Reclaiming space held by stale store entries.
//!
//! Every re-weighting leaves the superseded entry behind in the
//! [`PriorityStore`]. Compaction rebuilds the store from the entries the
//! [`VersionRegistry`] still recognises as live, dropping everything else.
//! Surviving entries keep their weight, version and id, so selection order is
//! identical before and after.
//!
//! Compaction never runs on its own. Callers either invoke it directly or ask
//! [`CompactionManager::should_compact`] whether the configured
//! [`CompactionPolicy`] wants a rebuild.
//!
//! ```text
//!   before                          after
//!   ┌───────────────────────┐       ┌───────────────────────┐
//!   │ (1, 9.0, v4)  live    │       │ (1, 9.0, v4)          │
//!   │ (2, 7.0, v2)  stale   │  ──►  │ (3, 5.5, v5)          │
//!   │ (3, 5.5, v5)  live    │       └───────────────────────┘
//!   │ (1, 2.0, v1)  stale   │
//!   └───────────────────────┘       discarded = 2
//! ```
//!
//! ## Example Usage
//!
//! ```
//! use shufflekit::compaction::{CompactionManager, CompactionPolicy};
//! use shufflekit::ds::{Entry, PriorityStore, VersionRegistry};
//!
//! let mut registry = VersionRegistry::new();
//! let mut store = PriorityStore::new();
//! for weight in [1.0, 2.0, 3.0] {
//!     let version = registry.next_version();
//!     registry.set_latest(7, version);
//!     store.push(Entry::new(7, weight, version));
//! }
//!
//! let mut manager = CompactionManager::new(CompactionPolicy::Manual);
//! let (store, report) = manager.compact(store, &registry);
//! assert_eq!(store.len(), 1);
//! assert_eq!(report.discarded, 2);
//! ```

use crate::ds::{Entry, PriorityStore, VersionRegistry};
use crate::error::ConfigError;

/// When [`CompactionManager::should_compact`] answers yes.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum CompactionPolicy {
    /// Only explicit `compact()` calls rebuild.
    #[default]
    Manual,
    /// After this many re-weightings (feedback, adds, refreshes) since the
    /// last compaction.
    AfterReweights(u64),
    /// When stale entries exceed this fraction of the store, in `(0, 1]`.
    StaleFraction(f64),
}

impl CompactionPolicy {
    pub fn validate(&self) -> Result<(), ConfigError> {
        match *self {
            CompactionPolicy::Manual => Ok(()),
            CompactionPolicy::AfterReweights(0) => Err(ConfigError::new(
                "AfterReweights interval must be > 0",
            )),
            CompactionPolicy::AfterReweights(_) => Ok(()),
            CompactionPolicy::StaleFraction(f) if f > 0.0 && f <= 1.0 => Ok(()),
            CompactionPolicy::StaleFraction(f) => Err(ConfigError::new(format!(
                "StaleFraction threshold must be in (0, 1], got {f}"
            ))),
        }
    }
}

/// Outcome of one compaction pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CompactionReport {
    pub before: usize,
    pub retained: usize,
    pub discarded: usize,
}

/// Rebuilds stores and tracks the state its policy needs.
#[derive(Debug, Clone, Default)]
pub struct CompactionManager {
    policy: CompactionPolicy,
    reweights_since: u64,
    compactions: u64,
    discarded_total: u64,
}

impl CompactionManager {
    pub fn new(policy: CompactionPolicy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    pub fn policy(&self) -> CompactionPolicy {
        self.policy
    }

    pub fn set_policy(&mut self, policy: CompactionPolicy) {
        self.policy = policy;
    }

    /// Counts one re-weighting towards [`CompactionPolicy::AfterReweights`].
    #[inline]
    pub fn record_reweight(&mut self) {
        self.reweights_since = self.reweights_since.saturating_add(1);
    }

    pub fn reweights_since_compaction(&self) -> u64 {
        self.reweights_since
    }

    /// Number of completed compactions.
    pub fn compactions(&self) -> u64 {
        self.compactions
    }

    /// Total stale entries discarded over the manager's lifetime.
    pub fn discarded_total(&self) -> u64 {
        self.discarded_total
    }

    /// Asks the policy whether a store with these counts should be rebuilt.
    pub fn should_compact(&self, store_len: usize, stale_entries: usize) -> bool {
        if stale_entries == 0 {
            return false;
        }
        match self.policy {
            CompactionPolicy::Manual => false,
            CompactionPolicy::AfterReweights(n) => self.reweights_since >= n,
            CompactionPolicy::StaleFraction(threshold) => {
                stale_entries as f64 > store_len as f64 * threshold
            },
        }
    }

    /// Keeps only entries that are `id`'s latest version, discarding the rest.
    ///
    /// The relative order of survivors is unchanged: they keep their exact
    /// `(weight, version, id)` keys. The rebuilt store is shrunk to fit, so
    /// the space stale entries occupied is released.
    pub fn compact(
        &mut self,
        store: PriorityStore,
        registry: &VersionRegistry,
    ) -> (PriorityStore, CompactionReport) {
        let before = store.len();
        let live: Vec<Entry> = store
            .into_entries()
            .into_iter()
            .filter(|entry| !registry.is_stale(entry.id, entry.version))
            .collect();
        let report = CompactionReport {
            before,
            retained: live.len(),
            discarded: before - live.len(),
        };

        self.reweights_since = 0;
        self.compactions += 1;
        self.discarded_total += report.discarded as u64;

        tracing::debug!(
            before = report.before,
            retained = report.retained,
            discarded = report.discarded,
            "compacted priority store"
        );
        let mut store = PriorityStore::from_entries(live);
        store.shrink_to_fit();
        (store, report)
    }
}
