//! Verdant client engine.
//!
//! The session and commerce-state engine behind the Verdant storefront:
//! cart and wishlist stores that stay usable when the backend is not,
//! an OpenID Connect session with proactive credential renewal, and a
//! request gateway that mediates every commerce API call.
//!
//! # Wiring
//!
//! Everything is a plain service object passed by reference - no globals.
//! A process wires the engine once at bootstrap:
//!
//! ```rust,ignore
//! let config = ClientConfig::from_env()?;
//! let store: Arc<dyn StateStore> = Arc::new(FileStore::new(&config.state_dir));
//!
//! let auth = AuthSessionManager::new(OidcClient::new(config.oidc.clone()), store.clone());
//! let gateway = Arc::new(RequestGateway::new(&config.api_base_url, auth.clone()));
//! let api: Arc<dyn CommerceApi> = Arc::new(HttpCommerceApi::new(gateway));
//!
//! let cart = Arc::new(CartStore::new(api.clone(), store.clone(), CurrencyCode::USD));
//! let wishlist = Arc::new(WishlistStore::new(api, store));
//!
//! // Explicit bootstrap: load the boot cache, rehydrate the session,
//! // and wire reconciliation to the authentication channel.
//! cart.load().await;
//! wishlist.load().await;
//! spawn_reconciler(auth.subscribe(), cart.clone(), wishlist.clone());
//! auth.check_status().await;
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod auth;
pub mod commerce;
pub mod config;
pub mod error;
pub mod gateway;
pub mod persist;

pub use api::{CommerceApi, HttpCommerceApi};
pub use auth::{AuthSessionManager, OidcClient};
pub use commerce::{CartStore, MutationOutcome, SyncState, WishlistStore, spawn_reconciler};
pub use config::{ClientConfig, OidcConfig};
pub use error::{ApiError, AuthError, PersistError};
pub use gateway::{CredentialSource, RequestGateway};
pub use persist::{FileStore, MemoryStore, StateStore};
