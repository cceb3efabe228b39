//! Indecisive Wear Core - Shared domain types and storefront logic.
//!
//! This crate provides the pieces of the storefront that do not touch the
//! network or the session store:
//! - money, currencies, and market price conversion
//! - sale-price detection from compare-at prices and merchandising tags
//! - listing filters and Shopify search query building
//! - the session-side cart mirror, wishlist, and recently viewed lists
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no HTTP
//! clients. This keeps it lightweight and easy to test.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod listing;
pub mod sale;
pub mod saved;
pub mod types;

pub use cart::{CartError, CartMirror, MirrorLine};
pub use listing::{DiscountRange, ListingParams, SortOrder};
pub use sale::{SaleInfo, SaleSource, detect_sale};
pub use saved::{RecentlyViewed, RecentlyViewedProduct, SavedProduct, Wishlist, WishlistError};
pub use types::*;
