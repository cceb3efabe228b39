//! Cache types for Storefront API responses.

use indecisive_wear_core::SortOrder;

use crate::shopify::types::{Collection, CollectionConnection, Product, ProductConnection};

/// Cache key for catalog responses.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub enum CacheKey {
    Product(String),
    Products {
        first: i64,
        after: Option<String>,
        query: Option<String>,
        sort: SortOrder,
    },
    Recommendations(String),
    Collection {
        handle: String,
        first: i64,
        after: Option<String>,
        sort: SortOrder,
    },
    Collections {
        first: i64,
        after: Option<String>,
    },
}

/// Cached value types.
#[derive(Debug, Clone)]
pub enum CacheValue {
    Product(Box<Product>),
    Products(ProductConnection),
    Recommendations(Vec<Product>),
    Collection(Box<Collection>),
    Collections(CollectionConnection),
}
