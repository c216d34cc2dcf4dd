//! Common re-exports: `use shufflekit::prelude::*;`.

pub use crate::builder::EngineBuilder;
pub use crate::clock::{Clock, ManualClock, SystemClock};
pub use crate::compaction::{CompactionPolicy, CompactionReport};
pub use crate::ds::{Entry, PriorityStore, VersionRegistry};
#[cfg(feature = "concurrency")]
pub use crate::engine::ConcurrentSelectionEngine;
pub use crate::engine::{EngineStats, Feedback, SelectionEngine};
pub use crate::error::{ConfigError, EngineError, InvariantError};
pub use crate::item::{Item, ItemId, Millis};
#[cfg(feature = "metrics")]
pub use crate::metrics::snapshot::EngineMetricsSnapshot;
pub use crate::playlist::Playlist;
pub use crate::weight::{FixedWeight, StandardWeight, WeightConfig, WeightFunction};
