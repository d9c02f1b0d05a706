//! Cart session and line types.
//!
//! The cart's money fields are always *derived* from the line sequence.
//! Every mutating helper here recomputes them synchronously before it
//! returns, so a caller can never observe a snapshot whose subtotal
//! disagrees with its lines.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::{CartId, LineId, ProductId, VariantId};
use super::money::{CurrencyCode, Money};

/// The product details a caller captures at add-time.
///
/// The catalog owns the product; the cart only snapshots what it needs to
/// synthesize a line when the backend is unreachable. The unit price is the
/// price shown to the shopper at call time - it is never re-fetched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductSnapshot {
    /// Catalog product reference.
    pub product_id: ProductId,
    /// Selected variant, if the product has variants.
    pub variant_id: Option<VariantId>,
    /// Display title, carried so a degraded cart can still render.
    pub title: String,
    /// Price at the moment the shopper acted.
    pub unit_price: Money,
}

/// A single cart line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    /// Server-assigned line id, or a `local-` id for fallback lines.
    pub id: LineId,
    /// The product this line refers to.
    pub product_id: ProductId,
    /// The selected variant, if any.
    pub variant_id: Option<VariantId>,
    /// Display title snapshotted at add-time.
    pub title: String,
    /// Quantity, always >= 1. A mutation to 0 removes the line instead.
    pub quantity: u32,
    /// Unit price snapshotted at add-time.
    pub unit_price: Money,
    /// `unit_price * quantity`, recomputed on every mutation.
    pub line_subtotal: Money,
}

impl CartLine {
    /// Whether this line matches the merge identity (product + variant).
    #[must_use]
    pub fn matches(&self, product_id: &ProductId, variant_id: Option<&VariantId>) -> bool {
        self.product_id == *product_id && self.variant_id.as_ref() == variant_id
    }

    fn recompute_subtotal(&mut self) {
        self.line_subtotal = Money::new(
            self.unit_price.amount * Decimal::from(self.quantity),
            self.unit_price.currency_code,
        );
    }
}

/// A cart session.
///
/// Created lazily on the first add; absent means "never shopped" (or
/// emptied, which deliberately collapses back to absent). The id is either
/// server-assigned or the local sentinel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartSession {
    /// Server-assigned id, or [`CartId::local`] until first persisted.
    pub id: CartId,
    /// Ordered line sequence.
    pub lines: Vec<CartLine>,
    /// Sum of line subtotals. Derived, never independently mutated.
    pub subtotal: Money,
    /// Tax as last reported by the server (server-side business rules).
    pub tax: Money,
    /// Shipping as last reported by the server.
    pub shipping: Money,
    /// Discount as last reported by the server (coupons are remote-only).
    pub discount: Money,
    /// `subtotal + tax + shipping - discount`. Derived.
    pub total: Money,
    /// Currency of all money fields.
    pub currency_code: CurrencyCode,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last mutation timestamp.
    pub updated_at: DateTime<Utc>,
}

impl CartSession {
    /// Create an empty, locally originated cart.
    #[must_use]
    pub fn new_local(currency_code: CurrencyCode) -> Self {
        let now = Utc::now();
        Self {
            id: CartId::local(),
            lines: Vec::new(),
            subtotal: Money::zero(currency_code),
            tax: Money::zero(currency_code),
            shipping: Money::zero(currency_code),
            discount: Money::zero(currency_code),
            total: Money::zero(currency_code),
            currency_code,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether this cart has not been persisted remotely.
    #[must_use]
    pub fn is_local(&self) -> bool {
        self.id.is_local()
    }

    /// Sum of line quantities.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.lines.iter().map(|line| line.quantity).sum()
    }

    /// Whether the line sequence is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Recompute the derived money fields from the line sequence.
    ///
    /// Subtotal comes from the lines; tax, shipping and discount keep their
    /// last server-reported values until the next server snapshot replaces
    /// the whole cart.
    pub fn recompute_totals(&mut self) {
        for line in &mut self.lines {
            line.recompute_subtotal();
        }
        let subtotal: Decimal = self.lines.iter().map(|line| line.line_subtotal.amount).sum();
        self.subtotal = Money::new(subtotal, self.currency_code);
        self.total = Money::new(
            subtotal + self.tax.amount + self.shipping.amount - self.discount.amount,
            self.currency_code,
        );
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
        self.recompute_totals();
    }

    /// Merge an add into the line sequence.
    ///
    /// If a line with the same product + variant identity exists its
    /// quantity is incremented; otherwise a new line with a locally
    /// generated id is appended.
    pub fn merge_line(&mut self, product: &ProductSnapshot, quantity: u32) {
        if let Some(line) = self
            .lines
            .iter_mut()
            .find(|line| line.matches(&product.product_id, product.variant_id.as_ref()))
        {
            line.quantity += quantity;
        } else {
            self.lines.push(CartLine {
                id: LineId::local(),
                product_id: product.product_id.clone(),
                variant_id: product.variant_id.clone(),
                title: product.title.clone(),
                quantity,
                unit_price: product.unit_price,
                line_subtotal: product.unit_price,
            });
        }
        self.touch();
    }

    /// Set a line's quantity; 0 removes the line.
    ///
    /// Returns `false` if no line with the id exists.
    pub fn set_quantity(&mut self, line_id: &LineId, quantity: u32) -> bool {
        if quantity == 0 {
            return self.remove_line(line_id);
        }
        let Some(line) = self.lines.iter_mut().find(|line| line.id == *line_id) else {
            return false;
        };
        line.quantity = quantity;
        self.touch();
        true
    }

    /// Remove a line. Returns `false` if no line with the id exists.
    pub fn remove_line(&mut self, line_id: &LineId) -> bool {
        let before = self.lines.len();
        self.lines.retain(|line| line.id != *line_id);
        let removed = self.lines.len() != before;
        if removed {
            self.touch();
        }
        removed
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn product(id: &str, price: Decimal) -> ProductSnapshot {
        ProductSnapshot {
            product_id: ProductId::new(id),
            variant_id: None,
            title: format!("Product {id}"),
            unit_price: Money::new(price, CurrencyCode::USD),
        }
    }

    fn assert_totals_derived(cart: &CartSession) {
        let expected: Decimal = cart
            .lines
            .iter()
            .map(|line| line.unit_price.amount * Decimal::from(line.quantity))
            .sum();
        assert_eq!(cart.subtotal.amount, expected);
        assert_eq!(
            cart.total.amount,
            expected + cart.tax.amount + cart.shipping.amount - cart.discount.amount
        );
    }

    #[test]
    fn test_totals_hold_after_every_mutation() {
        let mut cart = CartSession::new_local(CurrencyCode::USD);
        assert_totals_derived(&cart);

        cart.merge_line(&product("p1", Decimal::new(1000, 2)), 2);
        assert_totals_derived(&cart);

        cart.merge_line(&product("p2", Decimal::new(550, 2)), 1);
        assert_totals_derived(&cart);

        let line_id = cart.lines.first().unwrap().id.clone();
        cart.set_quantity(&line_id, 5);
        assert_totals_derived(&cart);

        cart.remove_line(&line_id);
        assert_totals_derived(&cart);
    }

    #[test]
    fn test_merge_does_not_duplicate() {
        let mut cart = CartSession::new_local(CurrencyCode::USD);
        cart.merge_line(&product("p1", Decimal::new(1000, 2)), 2);
        cart.merge_line(&product("p1", Decimal::new(1000, 2)), 3);

        assert_eq!(cart.lines.len(), 1);
        assert_eq!(cart.lines.first().unwrap().quantity, 5);
        assert_eq!(cart.subtotal.amount, Decimal::new(5000, 2));
    }

    #[test]
    fn test_variants_are_distinct_lines() {
        let mut cart = CartSession::new_local(CurrencyCode::USD);
        let mut with_variant = product("p1", Decimal::new(1000, 2));
        with_variant.variant_id = Some(VariantId::new("v1"));

        cart.merge_line(&product("p1", Decimal::new(1000, 2)), 1);
        cart.merge_line(&with_variant, 1);

        assert_eq!(cart.lines.len(), 2);
    }

    #[test]
    fn test_zero_quantity_removes_line() {
        let mut cart = CartSession::new_local(CurrencyCode::USD);
        cart.merge_line(&product("p1", Decimal::new(1000, 2)), 2);
        let line_id = cart.lines.first().unwrap().id.clone();

        assert!(cart.set_quantity(&line_id, 0));
        assert!(cart.is_empty());
        assert!(cart.subtotal.is_zero());
    }

    #[test]
    fn test_item_count_sums_quantities() {
        let mut cart = CartSession::new_local(CurrencyCode::USD);
        cart.merge_line(&product("p1", Decimal::new(1000, 2)), 2);
        cart.merge_line(&product("p2", Decimal::new(500, 2)), 3);
        assert_eq!(cart.item_count(), 5);
    }

    #[test]
    fn test_local_lines_carry_sentinel_ids() {
        let mut cart = CartSession::new_local(CurrencyCode::USD);
        cart.merge_line(&product("p1", Decimal::new(1000, 2)), 1);
        assert!(cart.lines.first().unwrap().id.is_local());
        assert!(cart.is_local());
    }

    #[test]
    fn test_total_includes_carried_server_fields() {
        let mut cart = CartSession::new_local(CurrencyCode::USD);
        cart.merge_line(&product("p1", Decimal::new(1000, 2)), 1);
        cart.tax = Money::new(Decimal::new(80, 2), CurrencyCode::USD);
        cart.shipping = Money::new(Decimal::new(500, 2), CurrencyCode::USD);
        cart.discount = Money::new(Decimal::new(100, 2), CurrencyCode::USD);
        cart.recompute_totals();

        assert_eq!(cart.total.amount, Decimal::new(1480, 2));
    }
}
