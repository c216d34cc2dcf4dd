//! shufflekit: weighted selection over continuously re-weighted items.
//!
//! The core is [`engine::SelectionEngine`], a lazy-deletion max-priority
//! structure: re-weighting pushes a new versioned entry instead of updating
//! the old one, and selection discards entries whose version is no longer
//! current. See `DESIGN.md` for internal architecture and invariants.

pub mod builder;
pub mod clock;
pub mod compaction;
pub mod ds;
pub mod engine;
pub mod error;
pub mod item;
pub mod playlist;
pub mod weight;

#[cfg(feature = "metrics")]
pub mod metrics;

pub mod prelude;
