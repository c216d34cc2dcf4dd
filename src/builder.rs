//! Engine configuration.
//!
//! Collects weight tuning, compaction policy, seeding and sizing, then builds
//! a [`SelectionEngine`] wired to the standard weight function and a
//! [`SmallRng`].
//!
//! ## Example
//!
//! ```rust
//! use shufflekit::builder::EngineBuilder;
//! use shufflekit::clock::ManualClock;
//! use shufflekit::compaction::CompactionPolicy;
//! use shufflekit::item::Item;
//! use shufflekit::weight::WeightConfig;
//!
//! let mut engine = EngineBuilder::new()
//!     .with_weight_config(WeightConfig::default().with_like_boost(1.5))
//!     .with_compaction_policy(CompactionPolicy::StaleFraction(0.5))
//!     .with_seed(7)
//!     .with_clock(ManualClock::new(0))
//!     .with_capacity(64)
//!     .try_build()
//!     .unwrap();
//!
//! engine.add_item(Item::with_popularity(1, 2.0)).unwrap();
//! assert_eq!(engine.select_next().map(|item| item.id), Some(1));
//! ```

use rand::SeedableRng;
use rand::rngs::SmallRng;

use crate::clock::{Clock, SystemClock};
use crate::compaction::CompactionPolicy;
use crate::engine::SelectionEngine;
use crate::error::ConfigError;
use crate::weight::{StandardWeight, WeightConfig, WeightFunction};

/// Builder for [`SelectionEngine`].
#[derive(Debug, Clone)]
pub struct EngineBuilder<C = SystemClock> {
    weight_config: WeightConfig,
    compaction_policy: CompactionPolicy,
    seed: Option<u64>,
    capacity: usize,
    clock: C,
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl EngineBuilder {
    pub fn new() -> Self {
        Self {
            weight_config: WeightConfig::default(),
            compaction_policy: CompactionPolicy::default(),
            seed: None,
            capacity: 0,
            clock: SystemClock,
        }
    }
}

impl<C: Clock> EngineBuilder<C> {
    pub fn with_weight_config(mut self, config: WeightConfig) -> Self {
        self.weight_config = config;
        self
    }

    pub fn with_compaction_policy(mut self, policy: CompactionPolicy) -> Self {
        self.compaction_policy = policy;
        self
    }

    /// Seeds the jitter generator. Unseeded engines draw a seed from the OS.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Pre-allocates for `capacity` items.
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    pub fn with_clock<C2: Clock>(self, clock: C2) -> EngineBuilder<C2> {
        EngineBuilder {
            weight_config: self.weight_config,
            compaction_policy: self.compaction_policy,
            seed: self.seed,
            capacity: self.capacity,
            clock,
        }
    }

    /// Validates the configuration and builds an empty engine.
    pub fn try_build(self) -> Result<SelectionEngine<StandardWeight, SmallRng, C>, ConfigError> {
        let weight = StandardWeight::try_new(self.weight_config)?;
        self.compaction_policy.validate()?;
        let rng = match self.seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_os_rng(),
        };
        let policy = self.compaction_policy;
        let mut engine = SelectionEngine::with_capacity(weight, rng, self.clock, self.capacity);
        engine.set_compaction_policy(policy);
        Ok(engine)
    }

    /// Builds an empty engine.
    ///
    /// # Panics
    ///
    /// Panics if the weight configuration or compaction policy is invalid.
    /// Use [`try_build`](Self::try_build) for user-supplied configuration.
    pub fn build(self) -> SelectionEngine<StandardWeight, SmallRng, C> {
        match self.try_build() {
            Ok(engine) => engine,
            Err(err) => panic!("invalid engine config: {err}"),
        }
    }

    /// Builds an engine around caller-supplied collaborators.
    ///
    /// Capacity and compaction policy are applied; weight config, seed and
    /// clock of this builder are ignored.
    pub fn build_with<W, R, C2>(
        self,
        weight_fn: W,
        rng: R,
        clock: C2,
    ) -> Result<SelectionEngine<W, R, C2>, ConfigError>
    where
        W: WeightFunction,
        R: rand::RngCore,
        C2: Clock,
    {
        self.compaction_policy.validate()?;
        let mut engine = SelectionEngine::with_capacity(weight_fn, rng, clock, self.capacity);
        engine.set_compaction_policy(self.compaction_policy);
        Ok(engine)
    }
}
