//! CLI command implementations, one module per command family.

pub mod auth;
pub mod cart;
pub mod wishlist;

use std::sync::Arc;

use verdant_client::{
    AuthSessionManager, CartStore, ClientConfig, CommerceApi, FileStore, HttpCommerceApi,
    OidcClient, RequestGateway, StateStore, WishlistStore,
};
use verdant_core::CurrencyCode;

/// The wired engine a command runs against.
pub struct Engine {
    pub auth: Arc<AuthSessionManager>,
    pub cart: Arc<CartStore>,
    pub wishlist: Arc<WishlistStore>,
}

impl Engine {
    /// Wire the engine and run the explicit bootstrap sequence: load the
    /// boot cache, then rehydrate the session.
    ///
    /// The CLI is a one-shot process, so it drives reconciliation inline
    /// after a login instead of wiring the background reconciler a
    /// long-lived host would use.
    pub async fn bootstrap(config: &ClientConfig) -> Self {
        let store: Arc<dyn StateStore> = Arc::new(FileStore::new(config.state_dir.clone()));

        let auth = AuthSessionManager::new(OidcClient::new(config.oidc.clone()), store.clone());
        let gateway = Arc::new(RequestGateway::new(
            config.api_base_url.clone(),
            auth.clone(),
        ));
        let api: Arc<dyn CommerceApi> = Arc::new(HttpCommerceApi::new(gateway));

        let cart = Arc::new(CartStore::new(
            api.clone(),
            store.clone(),
            CurrencyCode::USD,
        ));
        let wishlist = Arc::new(WishlistStore::new(api, store));

        cart.load().await;
        wishlist.load().await;
        auth.check_status().await;

        Self {
            auth,
            cart,
            wishlist,
        }
    }
}
