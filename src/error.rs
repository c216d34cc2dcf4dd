//! Error types for the shufflekit library.
//!
//! ## Key Components
//!
//! - [`EngineError`]: Recoverable outcomes of engine operations on a specific
//!   item (unknown id, duplicate id).
//! - [`ConfigError`]: Returned when weight or compaction parameters are
//!   invalid (e.g. non-positive decay, like boost ≤ 1, inverted jitter).
//! - [`InvariantError`]: Returned when internal registry/store invariants are
//!   violated (debug-oriented `check_invariants` methods).
//!
//! An exhausted engine is not an error: selection returns `None`. Invalid
//! computed weights are not errors either; they are clamped to zero and
//! counted.
//!
//! ## Example Usage
//!
//! ```
//! use shufflekit::engine::{Feedback, SelectionEngine};
//! use shufflekit::error::EngineError;
//! use shufflekit::item::Item;
//!
//! let mut engine = SelectionEngine::builder().with_seed(7).build();
//! engine.initialize(vec![Item::with_popularity(1, 1.0)]).unwrap();
//!
//! assert_eq!(
//!     engine.apply_feedback(99, Feedback::skip()),
//!     Err(EngineError::NotFound(99))
//! );
//! assert_eq!(
//!     engine.add_item(Item::with_popularity(1, 2.0)),
//!     Err(EngineError::DuplicateId(1))
//! );
//! ```

use std::fmt;

use crate::item::ItemId;

// ---------------------------------------------------------------------------
// EngineError
// ---------------------------------------------------------------------------

/// Error returned by engine operations addressed to a specific item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EngineError {
    /// No item with this id is registered.
    NotFound(ItemId),
    /// An item with this id is already registered.
    DuplicateId(ItemId),
}

impl EngineError {
    /// Returns the item id the error refers to.
    #[inline]
    pub fn id(&self) -> ItemId {
        match *self {
            EngineError::NotFound(id) | EngineError::DuplicateId(id) => id,
        }
    }
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::NotFound(id) => write!(f, "item {id} not found"),
            EngineError::DuplicateId(id) => write!(f, "item {id} already registered"),
        }
    }
}

impl std::error::Error for EngineError {}

// ---------------------------------------------------------------------------
// InvariantError
// ---------------------------------------------------------------------------

/// Error returned when internal engine invariants are violated.
///
/// Produced by [`SelectionEngine::check_invariants`](crate::engine::SelectionEngine::check_invariants).
/// Carries a human-readable description of which invariant failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvariantError(String);

impl InvariantError {
    /// Creates a new `InvariantError` with the given description.
    #[inline]
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }

    /// Returns the error description.
    #[inline]
    pub fn message(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InvariantError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for InvariantError {}

// ---------------------------------------------------------------------------
// ConfigError
// ---------------------------------------------------------------------------

/// Error returned when engine configuration parameters are invalid.
///
/// Produced by [`WeightConfig::validate`](crate::weight::WeightConfig::validate),
/// [`CompactionPolicy::validate`](crate::compaction::CompactionPolicy::validate)
/// and [`EngineBuilder::try_build`](crate::builder::EngineBuilder::try_build).
///
/// # Example
///
/// ```
/// use shufflekit::weight::WeightConfig;
///
/// let err = WeightConfig::default().with_decay_millis(0.0).validate().unwrap_err();
/// assert!(err.to_string().contains("decay_millis"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError(String);

impl ConfigError {
    /// Creates a new `ConfigError` with the given description.
    #[inline]
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }

    /// Returns the error description.
    #[inline]
    pub fn message(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for ConfigError {}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
