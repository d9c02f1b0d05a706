//! Newtype IDs for type-safe entity references.
//!
//! Use the `define_id!` macro to create type-safe ID wrappers that prevent
//! accidentally mixing IDs from different entity types.
//!
//! Every id here is an opaque string owned by the backend. The commerce
//! sessions additionally support a *local sentinel*: a well-known id marking
//! a session that exists only in this client and has not been persisted
//! remotely yet. Locally synthesized cart lines carry a `local-` prefixed
//! random id so they can be told apart from server-assigned lines until the
//! next server snapshot replaces them.

use uuid::Uuid;

/// The well-known id marking a session that only exists locally.
pub const LOCAL_SENTINEL: &str = "local";

/// Macro to define a type-safe ID wrapper.
///
/// Creates a newtype wrapper around `String` with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `PartialEq`, `Eq`, `Hash`
/// - Conversion methods: `new()`, `as_str()`
/// - `From<String>` and `From<&str>` implementations
///
/// # Example
///
/// ```rust
/// # use verdant_core::define_id;
/// define_id!(OrderId);
/// define_id!(InvoiceId);
///
/// let order_id = OrderId::new("ord-1");
/// let invoice_id = InvoiceId::new("inv-1");
///
/// // These are different types, so this won't compile:
/// // let _: OrderId = invoice_id;
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            PartialEq,
            Eq,
            Hash,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create a new ID from a string value.
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Get the id as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_string())
            }
        }
    };
}

// Define standard entity IDs
define_id!(ProductId);
define_id!(VariantId);
define_id!(LineId);
define_id!(CartId);
define_id!(WishlistId);
define_id!(UserId);

impl CartId {
    /// The sentinel id of a cart that has not been persisted remotely.
    #[must_use]
    pub fn local() -> Self {
        Self::new(LOCAL_SENTINEL)
    }

    /// Whether this cart only exists in the client.
    #[must_use]
    pub fn is_local(&self) -> bool {
        self.as_str() == LOCAL_SENTINEL
    }
}

impl WishlistId {
    /// The sentinel id of a wishlist that has not been persisted remotely.
    #[must_use]
    pub fn local() -> Self {
        Self::new(LOCAL_SENTINEL)
    }

    /// Whether this wishlist only exists in the client.
    #[must_use]
    pub fn is_local(&self) -> bool {
        self.as_str() == LOCAL_SENTINEL
    }
}

impl LineId {
    /// Synthesize an id for a line created by a local fallback mutation.
    ///
    /// Server snapshots never contain these; the next successful remote
    /// operation replaces them with server-assigned ids.
    #[must_use]
    pub fn local() -> Self {
        Self::new(format!("{}-{}", LOCAL_SENTINEL, Uuid::new_v4()))
    }

    /// Whether this line was synthesized locally.
    #[must_use]
    pub fn is_local(&self) -> bool {
        self.as_str().starts_with(LOCAL_SENTINEL)
    }
}
