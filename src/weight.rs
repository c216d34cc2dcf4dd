//! Weight computation for selectable items.
//!
//! A [`WeightFunction`] maps an item's state, the current time and a
//! randomness source to a priority. Higher weights are selected first.
//!
//! ## Standard formula
//!
//! ```text
//!   weight = base_popularity
//!          × like_boost          (config.like_boost if liked, else 1)
//!          × skip_penalty        1 / (1 + skip_count)
//!          × jitter              uniform in [jitter_min, jitter_max]
//!          × (1 − recency)       recency = exp(−elapsed / decay_millis)
//!
//!   never selected → recency = 0
//!   just selected  → recency ≈ 1 → weight ≈ 0
//! ```
//!
//! The randomness source is always passed in; nothing here touches a global
//! RNG, so a seeded generator reproduces the same weights.
//!
//! ## Invalid weights
//!
//! Raw weights that are negative, NaN or infinite are clamped to `0.0` by
//! [`sanitize_weight`]. The engine applies it to every computed weight and
//! counts the clamps.
//!
//! ## Example Usage
//!
//! ```
//! use rand::SeedableRng;
//! use rand::rngs::SmallRng;
//! use shufflekit::item::Item;
//! use shufflekit::weight::{StandardWeight, WeightConfig, WeightFunction};
//!
//! let weight = StandardWeight::new(WeightConfig::default().without_jitter());
//! let mut rng = SmallRng::seed_from_u64(1);
//!
//! let item = Item::with_popularity(1, 10.0);
//! assert_eq!(weight.compute_weight(&item, 0, &mut rng), 10.0);
//!
//! let liked = item.clone().with_liked();
//! assert!(weight.compute_weight(&liked, 0, &mut rng) > 10.0);
//! ```

use rand::{Rng, RngCore};

use crate::error::ConfigError;
use crate::item::{Item, Millis};

pub const DEFAULT_DECAY_MILLIS: f64 = 1e7;
pub const DEFAULT_LIKE_BOOST: f64 = 1.2;
pub const DEFAULT_JITTER_MIN: f64 = 0.8;
pub const DEFAULT_JITTER_MAX: f64 = 1.2;

/// Computes an item's current priority.
///
/// Implementations may return any `f64`; callers sanitize the result.
pub trait WeightFunction {
    fn compute_weight(&self, item: &Item, now: Millis, rng: &mut dyn RngCore) -> f64;
}

impl<F> WeightFunction for F
where
    F: Fn(&Item, Millis, &mut dyn RngCore) -> f64,
{
    fn compute_weight(&self, item: &Item, now: Millis, rng: &mut dyn RngCore) -> f64 {
        self(item, now, rng)
    }
}

/// Clamps a raw weight into `[0, +inf)`.
///
/// Returns the usable weight and whether the raw value was invalid.
///
/// ```
/// use shufflekit::weight::sanitize_weight;
///
/// assert_eq!(sanitize_weight(2.5), (2.5, false));
/// assert_eq!(sanitize_weight(-1.0), (0.0, true));
/// assert_eq!(sanitize_weight(f64::NAN), (0.0, true));
/// assert_eq!(sanitize_weight(f64::INFINITY), (0.0, true));
/// ```
#[inline]
pub fn sanitize_weight(raw: f64) -> (f64, bool) {
    if raw.is_finite() && raw >= 0.0 {
        // Folds -0.0 into 0.0 so ordering never sees a signed zero.
        (raw + 0.0, false)
    } else {
        (0.0, true)
    }
}

/// Tuning knobs for [`StandardWeight`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeightConfig {
    /// Time constant of the recency decay, in milliseconds.
    pub decay_millis: f64,
    /// Multiplier applied to liked items. Must exceed 1.
    pub like_boost: f64,
    pub jitter_min: f64,
    pub jitter_max: f64,
}

impl Default for WeightConfig {
    fn default() -> Self {
        Self {
            decay_millis: DEFAULT_DECAY_MILLIS,
            like_boost: DEFAULT_LIKE_BOOST,
            jitter_min: DEFAULT_JITTER_MIN,
            jitter_max: DEFAULT_JITTER_MAX,
        }
    }
}

impl WeightConfig {
    pub fn with_decay_millis(mut self, decay_millis: f64) -> Self {
        self.decay_millis = decay_millis;
        self
    }

    pub fn with_like_boost(mut self, like_boost: f64) -> Self {
        self.like_boost = like_boost;
        self
    }

    pub fn with_jitter(mut self, min: f64, max: f64) -> Self {
        self.jitter_min = min;
        self.jitter_max = max;
        self
    }

    /// Pins jitter at exactly 1.0; no random draw is made.
    pub fn without_jitter(self) -> Self {
        self.with_jitter(1.0, 1.0)
    }

    /// Checks every parameter, reporting the first violation.
    ///
    /// ```
    /// use shufflekit::weight::WeightConfig;
    ///
    /// assert!(WeightConfig::default().validate().is_ok());
    /// let err = WeightConfig::default().with_like_boost(1.0).validate().unwrap_err();
    /// assert!(err.to_string().contains("like_boost"));
    /// ```
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.decay_millis.is_finite() && self.decay_millis > 0.0) {
            return Err(ConfigError::new(format!(
                "decay_millis must be finite and > 0, got {}",
                self.decay_millis
            )));
        }
        if !(self.like_boost.is_finite() && self.like_boost > 1.0) {
            return Err(ConfigError::new(format!(
                "like_boost must be finite and > 1, got {}",
                self.like_boost
            )));
        }
        if !(self.jitter_min.is_finite() && self.jitter_max.is_finite()) {
            return Err(ConfigError::new("jitter bounds must be finite"));
        }
        if self.jitter_min < 0.0 || self.jitter_min > self.jitter_max {
            return Err(ConfigError::new(format!(
                "jitter bounds must satisfy 0 <= min <= max, got [{}, {}]",
                self.jitter_min, self.jitter_max
            )));
        }
        Ok(())
    }
}

/// The popularity × like × skip × jitter × recency weighting.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardWeight {
    config: WeightConfig,
}

impl StandardWeight {
    /// Creates the weight function.
    ///
    /// # Panics
    ///
    /// Panics if `config` fails [`WeightConfig::validate`]. Use
    /// [`try_new`](Self::try_new) for user-supplied configuration.
    pub fn new(config: WeightConfig) -> Self {
        match Self::try_new(config) {
            Ok(weight) => weight,
            Err(err) => panic!("invalid weight config: {err}"),
        }
    }

    pub fn try_new(config: WeightConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &WeightConfig {
        &self.config
    }

    /// `exp(−elapsed / decay)`, or 0 for a never-selected item.
    pub fn recency_penalty(&self, last_selected_at: Option<Millis>, now: Millis) -> f64 {
        match last_selected_at {
            None => 0.0,
            Some(at) => {
                let elapsed = now.saturating_sub(at) as f64;
                (-elapsed / self.config.decay_millis).exp()
            },
        }
    }

    pub fn skip_penalty(skip_count: u32) -> f64 {
        1.0 / (1.0 + f64::from(skip_count))
    }

    pub fn like_boost(&self, liked: bool) -> f64 {
        if liked { self.config.like_boost } else { 1.0 }
    }

    /// Draws the diversity jitter. Equal bounds return the bound without
    /// consuming randomness.
    pub fn jitter(&self, rng: &mut dyn RngCore) -> f64 {
        let (min, max) = (self.config.jitter_min, self.config.jitter_max);
        if min == max {
            min
        } else {
            rng.random_range(min..=max)
        }
    }
}

impl WeightFunction for StandardWeight {
    fn compute_weight(&self, item: &Item, now: Millis, rng: &mut dyn RngCore) -> f64 {
        let recency = self.recency_penalty(item.last_selected_at, now);
        item.base_popularity
            * self.like_boost(item.liked)
            * Self::skip_penalty(item.skip_count)
            * self.jitter(rng)
            * (1.0 - recency)
    }
}

/// Ignores state and randomness; weight is `base_popularity` as-is.
///
/// Useful when selection order must follow popularity exactly.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedWeight;

impl WeightFunction for FixedWeight {
    fn compute_weight(&self, item: &Item, _now: Millis, _rng: &mut dyn RngCore) -> f64 {
        item.base_popularity
    }
}
