//! Time sources for weighting and selection.
//!
//! The engine never reads the wall clock directly. It asks its [`Clock`],
//! which makes recency behaviour reproducible in tests via [`ManualClock`].

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::item::Millis;

/// Source of "now" in milliseconds.
pub trait Clock {
    fn now_millis(&self) -> Millis;
}

/// Wall-clock milliseconds since the Unix epoch.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> Millis {
        // A clock set before 1970 reads as the epoch.
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as Millis)
            .unwrap_or(0)
    }
}

/// Settable clock. Clones share the same underlying time.
///
/// ```
/// use shufflekit::clock::{Clock, ManualClock};
///
/// let clock = ManualClock::new(100);
/// let handle = clock.clone();
/// handle.advance(50);
/// assert_eq!(clock.now_millis(), 150);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Arc<AtomicU64>,
}

impl ManualClock {
    pub fn new(start: Millis) -> Self {
        Self {
            now: Arc::new(AtomicU64::new(start)),
        }
    }

    pub fn set(&self, now: Millis) {
        self.now.store(now, Ordering::Relaxed);
    }

    pub fn advance(&self, by: Millis) {
        self.now.fetch_add(by, Ordering::Relaxed);
    }
}

impl Clock for ManualClock {
    fn now_millis(&self) -> Millis {
        self.now.load(Ordering::Relaxed)
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now_millis(&self) -> Millis {
        (**self).now_millis()
    }
}
