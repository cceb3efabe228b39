//! Newtype wrappers for Shopify global IDs.
//!
//! Shopify identifies every object with a global ID of the form
//! `gid://shopify/<Type>/<number>` (cart and cart line IDs carry an extra
//! query string). The `define_gid!` macro creates string-backed wrappers so
//! product, variant, and cart line IDs cannot be mixed up.

/// Prefix shared by all Shopify global IDs.
pub const GID_PREFIX: &str = "gid://shopify/";

/// Macro to define a type-safe Shopify global ID wrapper.
///
/// Creates a newtype wrapper around `String` with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `PartialEq`, `Eq`, `Hash`
/// - `new()`, `as_str()`, `numeric()` accessors
/// - `From<String>`, `From<&str>` and `Display`
///
/// # Example
///
/// ```rust
/// # use indecisive_wear_core::define_gid;
/// define_gid!(ProductId, "Product");
///
/// let id = ProductId::new("gid://shopify/Product/42");
/// assert_eq!(id.numeric(), Some(42));
/// ```
#[macro_export]
macro_rules! define_gid {
    ($name:ident, $kind:literal) => {
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
            /// Shopify object type name used in the global ID.
            pub const KIND: &'static str = $kind;

            /// Wrap an existing global ID string.
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Build a global ID from its numeric part.
            #[must_use]
            pub fn from_numeric(id: u64) -> Self {
                Self(format!("{}{}/{}", $crate::types::id::GID_PREFIX, $kind, id))
            }

            /// Get the raw global ID string.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Extract the trailing numeric part of the global ID, if any.
            #[must_use]
            pub fn numeric(&self) -> Option<u64> {
                $crate::types::id::numeric_part(&self.0)
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_owned())
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

define_gid!(ProductId, "Product");
define_gid!(VariantId, "ProductVariant");
define_gid!(CartLineId, "CartLine");
define_gid!(CollectionId, "Collection");

/// Extract the numeric segment of a Shopify global ID.
///
/// Handles the `?key=...` suffix Shopify appends to cart and cart line IDs.
#[must_use]
pub fn numeric_part(gid: &str) -> Option<u64> {
    let without_query = gid.split('?').next().unwrap_or(gid);
    without_query.rsplit('/').next()?.parse().ok()
}

/// Returns the object type segment of a Shopify global ID.
#[must_use]
pub fn kind_of(gid: &str) -> Option<&str> {
    gid.strip_prefix(GID_PREFIX)?.split('/').next()
}
