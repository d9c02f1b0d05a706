//! Scripted in-memory backend shared by the store integration tests.

#![allow(clippy::unwrap_used, dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use tokio::sync::Mutex;

use verdant_client::{ApiError, CommerceApi};
use verdant_core::{
    CartId, CartLine, CartSession, CurrencyCode, LineId, Money, ProductId, ProductSnapshot,
    UserId, VariantId, WishlistEntry, WishlistId, WishlistSession,
};

/// The one coupon code the mock backend accepts: 5.00 off.
pub const VALID_COUPON: &str = "SAVE5";

/// An in-memory backend that can be flipped offline.
///
/// While online it behaves like the real service: it owns the canonical
/// cart/wishlist, assigns server ids, merges duplicate adds, and recomputes
/// totals. While offline every call fails with a network error.
pub struct MockCommerceApi {
    online: AtomicBool,
    pub cart_add_calls: AtomicUsize,
    pub wishlist_add_calls: AtomicUsize,
    cart: Mutex<Option<CartSession>>,
    wishlist: Mutex<Option<WishlistSession>>,
    next_line: AtomicUsize,
}

impl MockCommerceApi {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            online: AtomicBool::new(true),
            cart_add_calls: AtomicUsize::new(0),
            wishlist_add_calls: AtomicUsize::new(0),
            cart: Mutex::new(None),
            wishlist: Mutex::new(None),
            next_line: AtomicUsize::new(1),
        })
    }

    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }

    /// The canonical cart as the backend sees it.
    pub async fn server_cart(&self) -> Option<CartSession> {
        self.cart.lock().await.clone()
    }

    /// The canonical wishlist as the backend sees it.
    pub async fn server_wishlist(&self) -> Option<WishlistSession> {
        self.wishlist.lock().await.clone()
    }

    fn ensure_online(&self) -> Result<(), ApiError> {
        if self.online.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(ApiError::Network("connection refused".to_string()))
        }
    }

    fn empty_cart() -> CartSession {
        let now = Utc::now();
        CartSession {
            id: CartId::new("srv-cart-1"),
            lines: Vec::new(),
            subtotal: Money::zero(CurrencyCode::USD),
            tax: Money::zero(CurrencyCode::USD),
            shipping: Money::zero(CurrencyCode::USD),
            discount: Money::zero(CurrencyCode::USD),
            total: Money::zero(CurrencyCode::USD),
            currency_code: CurrencyCode::USD,
            created_at: now,
            updated_at: now,
        }
    }
}

#[async_trait]
impl CommerceApi for MockCommerceApi {
    async fn fetch_cart(&self) -> Result<Option<CartSession>, ApiError> {
        self.ensure_online()?;
        Ok(self.cart.lock().await.clone())
    }

    async fn add_cart_item(
        &self,
        product: &ProductSnapshot,
        quantity: u32,
    ) -> Result<CartSession, ApiError> {
        self.ensure_online()?;
        self.cart_add_calls.fetch_add(1, Ordering::SeqCst);

        let mut guard = self.cart.lock().await;
        let cart = guard.get_or_insert_with(Self::empty_cart);
        if let Some(line) = cart
            .lines
            .iter_mut()
            .find(|line| line.matches(&product.product_id, product.variant_id.as_ref()))
        {
            line.quantity += quantity;
        } else {
            let id = self.next_line.fetch_add(1, Ordering::SeqCst);
            cart.lines.push(CartLine {
                id: LineId::new(format!("srv-line-{id}")),
                product_id: product.product_id.clone(),
                variant_id: product.variant_id.clone(),
                title: product.title.clone(),
                quantity,
                unit_price: product.unit_price,
                line_subtotal: product.unit_price,
            });
        }
        cart.recompute_totals();
        Ok(cart.clone())
    }

    async fn update_cart_item(
        &self,
        line_id: &LineId,
        quantity: u32,
    ) -> Result<CartSession, ApiError> {
        self.ensure_online()?;
        let mut guard = self.cart.lock().await;
        let cart = guard
            .as_mut()
            .ok_or_else(|| ApiError::Validation("no cart".to_string()))?;
        if !cart.set_quantity(line_id, quantity) {
            return Err(ApiError::Validation("no such line".to_string()));
        }
        Ok(cart.clone())
    }

    async fn remove_cart_item(
        &self,
        line_id: &LineId,
    ) -> Result<Option<CartSession>, ApiError> {
        self.ensure_online()?;
        let mut guard = self.cart.lock().await;
        let Some(cart) = guard.as_mut() else {
            return Ok(None);
        };
        cart.remove_line(line_id);
        if cart.is_empty() {
            *guard = None;
            return Ok(None);
        }
        Ok(Some(cart.clone()))
    }

    async fn clear_cart(&self) -> Result<(), ApiError> {
        self.ensure_online()?;
        *self.cart.lock().await = None;
        Ok(())
    }

    async fn apply_coupon(&self, code: &str) -> Result<CartSession, ApiError> {
        self.ensure_online()?;
        if code != VALID_COUPON {
            return Err(ApiError::Validation(format!("invalid coupon: {code}")));
        }
        let mut guard = self.cart.lock().await;
        let cart = guard
            .as_mut()
            .ok_or_else(|| ApiError::Validation("no cart".to_string()))?;
        cart.discount = Money::new(Decimal::new(500, 2), CurrencyCode::USD);
        cart.recompute_totals();
        Ok(cart.clone())
    }

    async fn remove_coupon(&self) -> Result<CartSession, ApiError> {
        self.ensure_online()?;
        let mut guard = self.cart.lock().await;
        let cart = guard
            .as_mut()
            .ok_or_else(|| ApiError::Validation("no cart".to_string()))?;
        cart.discount = Money::zero(CurrencyCode::USD);
        cart.recompute_totals();
        Ok(cart.clone())
    }

    async fn fetch_wishlist(&self) -> Result<Option<WishlistSession>, ApiError> {
        self.ensure_online()?;
        Ok(self.wishlist.lock().await.clone())
    }

    async fn add_wishlist_item(
        &self,
        product: &ProductSnapshot,
    ) -> Result<WishlistSession, ApiError> {
        self.ensure_online()?;
        self.wishlist_add_calls.fetch_add(1, Ordering::SeqCst);

        let mut guard = self.wishlist.lock().await;
        let now = Utc::now();
        let wishlist = guard.get_or_insert_with(|| WishlistSession {
            id: WishlistId::new("srv-wl-1"),
            owner: Some(UserId::new("sub-1")),
            entries: Vec::new(),
            created_at: now,
            updated_at: now,
        });
        wishlist.add_entry(WishlistEntry {
            product_id: product.product_id.clone(),
            title: product.title.clone(),
            unit_price: product.unit_price,
            added_at: now,
        });
        Ok(wishlist.clone())
    }

    async fn remove_wishlist_item(
        &self,
        product_id: &ProductId,
    ) -> Result<Option<WishlistSession>, ApiError> {
        self.ensure_online()?;
        let mut guard = self.wishlist.lock().await;
        let Some(wishlist) = guard.as_mut() else {
            return Ok(None);
        };
        wishlist.remove_entry(product_id);
        if wishlist.is_empty() {
            *guard = None;
            return Ok(None);
        }
        Ok(Some(wishlist.clone()))
    }

    async fn clear_wishlist(&self) -> Result<(), ApiError> {
        self.ensure_online()?;
        *self.wishlist.lock().await = None;
        Ok(())
    }
}

/// A product snapshot as a UI would capture it from the catalog.
pub fn product(id: &str, cents: i64) -> ProductSnapshot {
    ProductSnapshot {
        product_id: ProductId::new(id),
        variant_id: None,
        title: format!("Product {id}"),
        unit_price: Money::new(Decimal::new(cents, 2), CurrencyCode::USD),
    }
}

/// Like [`product`], with a variant selected.
pub fn product_variant(id: &str, variant: &str, cents: i64) -> ProductSnapshot {
    ProductSnapshot {
        variant_id: Some(VariantId::new(variant)),
        ..product(id, cents)
    }
}
