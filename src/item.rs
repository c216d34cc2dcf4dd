//! Selectable items and the per-item state the engine reads and updates.
//!
//! An [`Item`] carries display data (`title`, `artist`) that the engine never
//! inspects, a static `base_popularity`, and three pieces of mutable history:
//! when it was last selected, how often it was skipped since, and whether the
//! user liked it. The engine writes `last_selected_at`/`skip_count` on
//! selection and `liked`/`skip_count` on feedback; nothing else is touched.
//!
//! ## Example Usage
//!
//! ```
//! use shufflekit::item::Item;
//!
//! let item = Item::new(1, "Song A", "Artist A", 5.0);
//! assert_eq!(item.id, 1);
//! assert_eq!(item.last_selected_at, None);
//! assert_eq!(item.skip_count, 0);
//! assert!(!item.liked);
//! ```

use std::fmt;

/// Stable, unique item identity.
pub type ItemId = u64;

/// Milliseconds since the Unix epoch (or any monotonic origin the clock uses).
pub type Millis = u64;

/// A selectable unit with its weighting history.
#[derive(Debug, Clone, PartialEq)]
pub struct Item {
    pub id: ItemId,
    pub title: String,
    pub artist: String,
    /// Non-negative base score; negative or non-finite values weigh as zero.
    pub base_popularity: f64,
    /// `None` means the item has never been selected.
    pub last_selected_at: Option<Millis>,
    pub skip_count: u32,
    pub liked: bool,
}

impl Item {
    /// Creates an item with no selection history.
    pub fn new(
        id: ItemId,
        title: impl Into<String>,
        artist: impl Into<String>,
        base_popularity: f64,
    ) -> Self {
        Self {
            id,
            title: title.into(),
            artist: artist.into(),
            base_popularity,
            last_selected_at: None,
            skip_count: 0,
            liked: false,
        }
    }

    /// Shorthand for an item whose display fields don't matter.
    pub fn with_popularity(id: ItemId, base_popularity: f64) -> Self {
        Self::new(id, String::new(), String::new(), base_popularity)
    }

    /// Marks the item liked. There is no way back.
    pub fn with_liked(mut self) -> Self {
        self.liked = true;
        self
    }

    pub fn with_skips(mut self, skip_count: u32) -> Self {
        self.skip_count = skip_count;
        self
    }

    pub fn with_last_selected_at(mut self, at: Millis) -> Self {
        self.last_selected_at = Some(at);
        self
    }

    pub(crate) fn mark_selected(&mut self, now: Millis) {
        self.last_selected_at = Some(now);
        self.skip_count = 0;
    }

    pub(crate) fn record_skip(&mut self) {
        self.skip_count = self.skip_count.saturating_add(1);
    }
}

impl fmt::Display for Item {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Item{{id={}, title='{}', artist='{}', base_popularity={:.2}}}",
            self.id, self.title, self.artist, self.base_popularity
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mark_selected_resets_skips() {
        let mut item = Item::with_popularity(7, 1.0).with_skips(4);
        item.mark_selected(1_000);
        assert_eq!(item.last_selected_at, Some(1_000));
        assert_eq!(item.skip_count, 0);
    }

    #[test]
    fn record_skip_saturates() {
        let mut item = Item::with_popularity(1, 1.0).with_skips(u32::MAX);
        item.record_skip();
        assert_eq!(item.skip_count, u32::MAX);
    }

    #[test]
    fn display_formats_popularity_with_two_decimals() {
        let item = Item::new(3, "Song C", "Artist C", 1.0);
        assert_eq!(
            item.to_string(),
            "Item{id=3, title='Song C', artist='Artist C', base_popularity=1.00}"
        );
    }
}
