//! Per-visitor saved product lists: the wishlist and recently viewed.
//!
//! Both lists live in the visitor's session. There is no conflict
//! resolution across devices; the last write wins.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{Price, ProductId};

/// Maximum number of wishlist entries.
pub const WISHLIST_CAPACITY: usize = 50;

/// Maximum number of recently viewed entries.
pub const RECENTLY_VIEWED_CAPACITY: usize = 10;

/// Recently viewed entries older than this are dropped on load.
pub const RECENTLY_VIEWED_MAX_AGE_DAYS: i64 = 30;

/// Errors from wishlist mutations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WishlistError {
    #[error("wishlist is full ({max} items)")]
    Full { max: usize },
}

/// The product summary stored in saved lists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedProduct {
    pub id: ProductId,
    pub handle: String,
    pub title: String,
    pub image_url: Option<String>,
    pub price: Price,
}

/// Wishlist, unique by product id, newest first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Wishlist {
    items: Vec<SavedProduct>,
}

impl Wishlist {
    /// Build a wishlist from stored items, dropping duplicate ids.
    #[must_use]
    pub fn from_items(items: Vec<SavedProduct>) -> Self {
        let mut wishlist = Self::default();
        for item in items {
            if !wishlist.contains(&item.id) && wishlist.items.len() < WISHLIST_CAPACITY {
                wishlist.items.push(item);
            }
        }
        wishlist
    }

    #[must_use]
    pub fn items(&self) -> &[SavedProduct] {
        &self.items
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[must_use]
    pub fn contains(&self, id: &ProductId) -> bool {
        self.items.iter().any(|item| &item.id == id)
    }

    /// Add a product. Returns `false` if it was already present.
    ///
    /// # Errors
    ///
    /// Returns `Full` when the wishlist already holds the maximum.
    pub fn add(&mut self, product: SavedProduct) -> Result<bool, WishlistError> {
        if self.contains(&product.id) {
            return Ok(false);
        }
        if self.items.len() >= WISHLIST_CAPACITY {
            return Err(WishlistError::Full {
                max: WISHLIST_CAPACITY,
            });
        }
        self.items.insert(0, product);
        Ok(true)
    }

    /// Remove a product. Returns `false` if it was not present.
    pub fn remove(&mut self, id: &ProductId) -> bool {
        let before = self.items.len();
        self.items.retain(|item| &item.id != id);
        self.items.len() != before
    }

    /// Add the product if absent, remove it if present. Returns whether the
    /// product is wishlisted afterwards.
    ///
    /// # Errors
    ///
    /// Returns `Full` when adding to a full wishlist.
    pub fn toggle(&mut self, product: SavedProduct) -> Result<bool, WishlistError> {
        if self.remove(&product.id) {
            Ok(false)
        } else {
            self.add(product)
        }
    }
}

/// A recently viewed product with the time it was last viewed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecentlyViewedProduct {
    #[serde(flatten)]
    pub product: SavedProduct,
    pub viewed_at: DateTime<Utc>,
}

/// Recently viewed products, most recent first, capped at
/// [`RECENTLY_VIEWED_CAPACITY`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecentlyViewed {
    entries: Vec<RecentlyViewedProduct>,
}

impl RecentlyViewed {
    /// Load stored entries, pruning those older than 30 days.
    ///
    /// This is the only place expired entries are removed.
    #[must_use]
    pub fn load(mut entries: Vec<RecentlyViewedProduct>, now: DateTime<Utc>) -> Self {
        let cutoff = now - Duration::days(RECENTLY_VIEWED_MAX_AGE_DAYS);
        entries.retain(|e| e.viewed_at >= cutoff);
        entries.sort_by(|a, b| b.viewed_at.cmp(&a.viewed_at));

        let mut list = Self::default();
        for entry in entries {
            if !list.entries.iter().any(|e| e.product.id == entry.product.id) {
                list.entries.push(entry);
            }
        }
        list.entries.truncate(RECENTLY_VIEWED_CAPACITY);
        list
    }

    #[must_use]
    pub fn entries(&self) -> &[RecentlyViewedProduct] {
        &self.entries
    }

    /// Consume the list, returning the raw entries for storage.
    #[must_use]
    pub fn into_entries(self) -> Vec<RecentlyViewedProduct> {
        self.entries
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Record a view. An existing entry moves to the front with the new
    /// timestamp; the oldest entry is dropped past capacity.
    pub fn record(&mut self, product: SavedProduct, now: DateTime<Utc>) {
        self.entries.retain(|e| e.product.id != product.id);
        self.entries.insert(
            0,
            RecentlyViewedProduct {
                product,
                viewed_at: now,
            },
        );
        self.entries.truncate(RECENTLY_VIEWED_CAPACITY);
    }

    /// Products other than `id`, for "recently viewed" strips on a product
    /// page.
    #[must_use]
    pub fn excluding(&self, id: &ProductId) -> Vec<&SavedProduct> {
        self.entries
            .iter()
            .filter(|e| &e.product.id != id)
            .map(|e| &e.product)
            .collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;
    use crate::types::CurrencyCode;

    fn product(n: u64) -> SavedProduct {
        SavedProduct {
            id: ProductId::from_numeric(n),
            handle: format!("tee-{n}"),
            title: format!("Tee {n}"),
            image_url: None,
            price: Price::new(Decimal::new(2500, 2), CurrencyCode::USD),
        }
    }

    fn at(day: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).unwrap() + Duration::days(day)
    }

    #[test]
    fn test_wishlist_deduplicates_by_id() {
        let mut wishlist = Wishlist::default();
        assert!(wishlist.add(product(1)).unwrap());
        assert!(!wishlist.add(product(1)).unwrap());
        assert_eq!(wishlist.len(), 1);

        let loaded = Wishlist::from_items(vec![product(2), product(2), product(3)]);
        assert_eq!(loaded.len(), 2);
    }

    #[test]
    fn test_wishlist_toggle_and_remove() {
        let mut wishlist = Wishlist::default();
        assert!(wishlist.toggle(product(1)).unwrap());
        assert!(wishlist.contains(&ProductId::from_numeric(1)));
        assert!(!wishlist.toggle(product(1)).unwrap());
        assert!(wishlist.is_empty());
        assert!(!wishlist.remove(&ProductId::from_numeric(1)));
    }

    #[test]
    fn test_wishlist_newest_first_and_capacity() {
        let mut wishlist = Wishlist::default();
        for n in 0..WISHLIST_CAPACITY as u64 {
            wishlist.add(product(n)).unwrap();
        }
        assert_eq!(wishlist.items()[0].id, ProductId::from_numeric(49));
        assert_eq!(
            wishlist.add(product(999)),
            Err(WishlistError::Full {
                max: WISHLIST_CAPACITY
            })
        );
        // Re-adding an existing item on a full list is not an error
        assert_eq!(wishlist.add(product(3)), Ok(false));
    }

    #[test]
    fn test_recently_viewed_caps_at_ten() {
        let mut recent = RecentlyViewed::default();
        for n in 0..15 {
            recent.record(product(n), at(0));
        }
        assert_eq!(recent.len(), RECENTLY_VIEWED_CAPACITY);
        assert_eq!(recent.entries()[0].product.id, ProductId::from_numeric(14));
        assert!(
            !recent
                .entries()
                .iter()
                .any(|e| e.product.id == ProductId::from_numeric(4))
        );
    }

    #[test]
    fn test_recently_viewed_moves_repeat_to_front() {
        let mut recent = RecentlyViewed::default();
        recent.record(product(1), at(0));
        recent.record(product(2), at(1));
        recent.record(product(1), at(2));
        assert_eq!(recent.len(), 2);
        assert_eq!(recent.entries()[0].product.id, ProductId::from_numeric(1));
        assert_eq!(recent.entries()[0].viewed_at, at(2));
    }

    #[test]
    fn test_recently_viewed_prunes_old_entries_on_load() {
        let entries = vec![
            RecentlyViewedProduct {
                product: product(1),
                viewed_at: at(0),
            },
            RecentlyViewedProduct {
                product: product(2),
                viewed_at: at(20),
            },
        ];
        let loaded = RecentlyViewed::load(entries.clone(), at(31));
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded.entries()[0].product.id, ProductId::from_numeric(2));

        // Exactly 30 days old is kept
        let loaded = RecentlyViewed::load(entries, at(30));
        assert_eq!(loaded.len(), 2);
    }

    #[test]
    fn test_recording_does_not_prune() {
        let mut recent = RecentlyViewed::load(
            vec![RecentlyViewedProduct {
                product: product(1),
                viewed_at: at(0),
            }],
            at(1),
        );
        recent.record(product(2), at(90));
        assert_eq!(recent.len(), 2);
    }

    #[test]
    fn test_excluding_current_product() {
        let mut recent = RecentlyViewed::default();
        recent.record(product(1), at(0));
        recent.record(product(2), at(1));
        let others = recent.excluding(&ProductId::from_numeric(2));
        assert_eq!(others.len(), 1);
        assert_eq!(others[0].handle, "tee-1");
    }
}
