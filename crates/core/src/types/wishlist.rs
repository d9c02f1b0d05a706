//! Wishlist session types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::{ProductId, UserId, WishlistId};
use super::money::{CurrencyCode, Money};

/// A saved product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WishlistEntry {
    /// Catalog product reference.
    pub product_id: ProductId,
    /// Display title snapshotted at add-time.
    pub title: String,
    /// Price at the moment the shopper saved the product.
    pub unit_price: Money,
    /// When the product was saved.
    pub added_at: DateTime<Utc>,
}

/// A wishlist session.
///
/// Membership is unique per product: saving an already-present product is a
/// no-op. Absent means the shopper never saved anything (or cleared the
/// list, which collapses back to absent).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WishlistSession {
    /// Server-assigned id, or [`WishlistId::local`] until first persisted.
    pub id: WishlistId,
    /// Owning user, set by the server once the session is authenticated.
    pub owner: Option<UserId>,
    /// Saved products, unique by product id.
    pub entries: Vec<WishlistEntry>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last mutation timestamp.
    pub updated_at: DateTime<Utc>,
}

impl WishlistSession {
    /// Create an empty, locally originated wishlist.
    #[must_use]
    pub fn new_local() -> Self {
        let now = Utc::now();
        Self {
            id: WishlistId::local(),
            owner: None,
            entries: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether this wishlist has not been persisted remotely.
    #[must_use]
    pub fn is_local(&self) -> bool {
        self.id.is_local()
    }

    /// Whether a product is already saved.
    #[must_use]
    pub fn contains(&self, product_id: &ProductId) -> bool {
        self.entries
            .iter()
            .any(|entry| entry.product_id == *product_id)
    }

    /// Number of saved products.
    #[must_use]
    pub fn item_count(&self) -> usize {
        self.entries.len()
    }

    /// Whether the list is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sum of the saved products' snapshot prices.
    #[must_use]
    pub fn subtotal(&self, currency_code: CurrencyCode) -> Money {
        let amount: Decimal = self
            .entries
            .iter()
            .map(|entry| entry.unit_price.amount)
            .sum();
        Money::new(amount, currency_code)
    }

    /// Save a product. Returns `false` if it was already present.
    pub fn add_entry(&mut self, entry: WishlistEntry) -> bool {
        if self.contains(&entry.product_id) {
            return false;
        }
        self.entries.push(entry);
        self.updated_at = Utc::now();
        true
    }

    /// Remove a saved product. Returns `false` if it was not present.
    pub fn remove_entry(&mut self, product_id: &ProductId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|entry| entry.product_id != *product_id);
        let removed = self.entries.len() != before;
        if removed {
            self.updated_at = Utc::now();
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: &str) -> WishlistEntry {
        WishlistEntry {
            product_id: ProductId::new(id),
            title: format!("Product {id}"),
            unit_price: Money::new(Decimal::new(1500, 2), CurrencyCode::USD),
            added_at: Utc::now(),
        }
    }

    #[test]
    fn test_membership_is_unique() {
        let mut wishlist = WishlistSession::new_local();
        assert!(wishlist.add_entry(entry("p1")));
        assert!(!wishlist.add_entry(entry("p1")));
        assert_eq!(wishlist.item_count(), 1);
    }

    #[test]
    fn test_remove_entry() {
        let mut wishlist = WishlistSession::new_local();
        wishlist.add_entry(entry("p1"));
        assert!(wishlist.remove_entry(&ProductId::new("p1")));
        assert!(!wishlist.remove_entry(&ProductId::new("p1")));
        assert!(wishlist.is_empty());
    }

    #[test]
    fn test_subtotal_sums_prices() {
        let mut wishlist = WishlistSession::new_local();
        wishlist.add_entry(entry("p1"));
        wishlist.add_entry(entry("p2"));
        assert_eq!(
            wishlist.subtotal(CurrencyCode::USD).amount,
            Decimal::new(3000, 2)
        );
    }
}
