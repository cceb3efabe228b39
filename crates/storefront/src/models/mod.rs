//! Storefront state kept outside Shopify.

pub mod session;
