//! Core types for Verdant.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod cart;
pub mod credential;
pub mod id;
pub mod money;
pub mod user;
pub mod wishlist;

pub use cart::{CartLine, CartSession, ProductSnapshot};
pub use credential::CredentialBundle;
pub use id::*;
pub use money::{CurrencyCode, Money};
pub use user::UserProfile;
pub use wishlist::{WishlistEntry, WishlistSession};
