//! Commerce API surface.
//!
//! [`CommerceApi`] is the seam between the state stores and the network:
//! the stores only know these operations, so tests can substitute a
//! scripted backend. [`HttpCommerceApi`] is the real implementation over
//! the request gateway.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Method;
use serde_json::json;
use verdant_core::{CartSession, LineId, ProductId, ProductSnapshot, WishlistSession};

use crate::error::ApiError;
use crate::gateway::RequestGateway;

/// The backend operations the commerce stores depend on.
///
/// Mutations return the server's snapshot verbatim - the server is
/// authoritative for pricing and totals, so stores adopt what comes back
/// rather than patching their local state.
#[async_trait]
pub trait CommerceApi: Send + Sync {
    /// Fetch the authoritative cart. `None` when the shopper has none.
    async fn fetch_cart(&self) -> Result<Option<CartSession>, ApiError>;
    /// Add a product to the cart.
    async fn add_cart_item(
        &self,
        product: &ProductSnapshot,
        quantity: u32,
    ) -> Result<CartSession, ApiError>;
    /// Update a line's quantity.
    async fn update_cart_item(
        &self,
        line_id: &LineId,
        quantity: u32,
    ) -> Result<CartSession, ApiError>;
    /// Remove a line. `None` when the cart collapsed to absent.
    async fn remove_cart_item(&self, line_id: &LineId)
    -> Result<Option<CartSession>, ApiError>;
    /// Clear the cart.
    async fn clear_cart(&self) -> Result<(), ApiError>;
    /// Apply a coupon code.
    async fn apply_coupon(&self, code: &str) -> Result<CartSession, ApiError>;
    /// Remove the applied coupon.
    async fn remove_coupon(&self) -> Result<CartSession, ApiError>;

    /// Fetch the authoritative wishlist. `None` when the shopper has none.
    async fn fetch_wishlist(&self) -> Result<Option<WishlistSession>, ApiError>;
    /// Save a product to the wishlist.
    async fn add_wishlist_item(
        &self,
        product: &ProductSnapshot,
    ) -> Result<WishlistSession, ApiError>;
    /// Remove a saved product. `None` when the wishlist collapsed to absent.
    async fn remove_wishlist_item(
        &self,
        product_id: &ProductId,
    ) -> Result<Option<WishlistSession>, ApiError>;
    /// Clear the wishlist.
    async fn clear_wishlist(&self) -> Result<(), ApiError>;
}

/// REST implementation of [`CommerceApi`] over the request gateway.
pub struct HttpCommerceApi {
    gateway: Arc<RequestGateway>,
}

impl HttpCommerceApi {
    /// Create the API client over `gateway`.
    #[must_use]
    pub fn new(gateway: Arc<RequestGateway>) -> Self {
        Self { gateway }
    }
}

#[async_trait]
impl CommerceApi for HttpCommerceApi {
    async fn fetch_cart(&self) -> Result<Option<CartSession>, ApiError> {
        self.gateway
            .send_optional_json(Method::GET, "/cart/", None)
            .await
    }

    async fn add_cart_item(
        &self,
        product: &ProductSnapshot,
        quantity: u32,
    ) -> Result<CartSession, ApiError> {
        let body = json!({
            "product_id": product.product_id,
            "variant_id": product.variant_id,
            "quantity": quantity,
        });
        self.gateway
            .send_json(Method::POST, "/cart/add/", Some(&body))
            .await
    }

    async fn update_cart_item(
        &self,
        line_id: &LineId,
        quantity: u32,
    ) -> Result<CartSession, ApiError> {
        let body = json!({ "quantity": quantity });
        self.gateway
            .send_json(
                Method::PATCH,
                &format!("/cart/items/{line_id}/"),
                Some(&body),
            )
            .await
    }

    async fn remove_cart_item(
        &self,
        line_id: &LineId,
    ) -> Result<Option<CartSession>, ApiError> {
        self.gateway
            .send_optional_json(Method::DELETE, &format!("/cart/items/{line_id}/"), None)
            .await
    }

    async fn clear_cart(&self) -> Result<(), ApiError> {
        self.gateway.send_unit(Method::POST, "/cart/clear/", None).await
    }

    async fn apply_coupon(&self, code: &str) -> Result<CartSession, ApiError> {
        let body = json!({ "code": code });
        self.gateway
            .send_json(Method::POST, "/cart/coupon/", Some(&body))
            .await
    }

    async fn remove_coupon(&self) -> Result<CartSession, ApiError> {
        self.gateway
            .send_json(Method::DELETE, "/cart/coupon/", None)
            .await
    }

    async fn fetch_wishlist(&self) -> Result<Option<WishlistSession>, ApiError> {
        self.gateway
            .send_optional_json(Method::GET, "/wishlist/", None)
            .await
    }

    async fn add_wishlist_item(
        &self,
        product: &ProductSnapshot,
    ) -> Result<WishlistSession, ApiError> {
        let body = json!({ "product_id": product.product_id });
        self.gateway
            .send_json(Method::POST, "/wishlist/", Some(&body))
            .await
    }

    async fn remove_wishlist_item(
        &self,
        product_id: &ProductId,
    ) -> Result<Option<WishlistSession>, ApiError> {
        self.gateway
            .send_optional_json(
                Method::DELETE,
                &format!("/wishlist/remove/{product_id}/"),
                None,
            )
            .await
    }

    async fn clear_wishlist(&self) -> Result<(), ApiError> {
        self.gateway
            .send_unit(Method::DELETE, "/wishlist/clear/", None)
            .await
    }
}
