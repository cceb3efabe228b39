//! Shopify Storefront API client implementation.
//!
//! Request bodies and response envelopes come from `graphql_client`; HTTP is
//! plain `reqwest`. Catalog reads are cached using `moka` (5-minute TTL).
//! Cart and customer calls always go to Shopify.

mod cache;
mod conversions;
mod customer;
pub mod queries;
mod responses;

use std::sync::Arc;
use std::time::Duration;

use graphql_client::{GraphQLQuery, Response};
use indecisive_wear_core::{CartLineId, SortOrder};
use moka::future::Cache;
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, instrument};

use crate::config::ShopifyStorefrontConfig;
use crate::shopify::types::{
    Cart, CartLineInput, CartLineUpdateInput, Collection, CollectionConnection, Product,
    ProductConnection, ProductRecommendationIntent,
};
use crate::shopify::{GraphQLError, GraphQLErrorLocation, ShopifyError};

use cache::{CacheKey, CacheValue};
use conversions::{
    convert_cart, convert_collection, convert_collection_connection, convert_product,
    convert_product_connection, convert_products,
};
use queries::{
    AddToCart, CreateCart, GetCart, GetCollectionByHandle, GetCollections, GetProductByHandle,
    GetProductRecommendations, GetProducts, GetShop, RemoveFromCart, UpdateCartBuyerIdentity,
    UpdateCartDiscountCodes, UpdateCartLines, add_to_cart, cart_inputs, create_cart, get_cart,
    get_collection_by_handle, get_collections, get_product_by_handle,
    get_product_recommendations, get_products, get_shop, remove_from_cart,
    update_cart_buyer_identity, update_cart_discount_codes, update_cart_lines,
};
use responses::{CartPayload, RawUserError};

const CACHE_CAPACITY: u64 = 1000;
const CACHE_TTL: Duration = Duration::from_secs(300);

// =============================================================================
// StorefrontClient
// =============================================================================

/// Client for the Shopify Storefront API.
///
/// Provides typed access to products, collections, carts and customer
/// accounts. Catalog reads are cached for 5 minutes.
#[derive(Clone)]
pub struct StorefrontClient {
    inner: Arc<StorefrontClientInner>,
}

struct StorefrontClientInner {
    client: reqwest::Client,
    endpoint: String,
    access_token: SecretString,
    cache: Cache<CacheKey, CacheValue>,
}

impl StorefrontClient {
    /// Create a new Storefront API client.
    #[must_use]
    pub fn new(config: &ShopifyStorefrontConfig) -> Self {
        let cache = Cache::builder()
            .max_capacity(CACHE_CAPACITY)
            .time_to_live(CACHE_TTL)
            .support_invalidation_closures()
            .build();

        Self {
            inner: Arc::new(StorefrontClientInner {
                client: reqwest::Client::new(),
                endpoint: config.endpoint(),
                access_token: config.storefront_private_token.clone(),
                cache,
            }),
        }
    }

    /// Execute a GraphQL operation.
    async fn execute<Q: GraphQLQuery>(
        &self,
        variables: Q::Variables,
    ) -> Result<Q::ResponseData, ShopifyError> {
        let request_body = Q::build_query(variables);

        let response = self
            .inner
            .client
            .post(&self.inner.endpoint)
            // Private access tokens use a different header than public tokens
            .header(
                "Shopify-Storefront-Private-Token",
                self.inner.access_token.expose_secret(),
            )
            .json(&request_body)
            .send()
            .await?;

        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.trim().parse::<u64>().ok())
                .unwrap_or(1);
            return Err(ShopifyError::RateLimited(retry_after));
        }

        // Body as text first for better error diagnostics
        let response_text = response.text().await?;

        if !status.is_success() {
            tracing::error!(
                status = %status,
                operation = request_body.operation_name,
                body = %truncate(&response_text, 500),
                "Shopify API returned non-success status"
            );
            return Err(ShopifyError::GraphQL(vec![GraphQLError::message(format!(
                "HTTP {status}: {}",
                truncate(&response_text, 200)
            ))]));
        }

        let response: Response<Q::ResponseData> = match serde_json::from_str(&response_text) {
            Ok(r) => r,
            Err(e) => {
                tracing::error!(
                    error = %e,
                    operation = request_body.operation_name,
                    body = %truncate(&response_text, 500),
                    "Failed to parse Shopify GraphQL response"
                );
                return Err(ShopifyError::Parse(e));
            }
        };

        if let Some(errors) = response.errors
            && !errors.is_empty()
        {
            debug!(errors = ?errors, "GraphQL errors in response");
            return Err(ShopifyError::GraphQL(
                errors.into_iter().map(convert_graphql_error).collect(),
            ));
        }

        response.data.ok_or_else(|| {
            tracing::error!(
                operation = request_body.operation_name,
                body = %truncate(&response_text, 500),
                "Shopify GraphQL response has no data and no errors"
            );
            ShopifyError::GraphQL(vec![GraphQLError::message("No data in response")])
        })
    }

    // =========================================================================
    // Shop
    // =========================================================================

    /// Fetch the shop name. Cheap query used by health checks.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn shop_name(&self) -> Result<String, ShopifyError> {
        let data = self.execute::<GetShop>(get_shop::Variables).await?;
        Ok(data.shop.name)
    }

    // =========================================================================
    // Product Methods
    // =========================================================================

    /// Get a product by its handle.
    ///
    /// # Errors
    ///
    /// Returns an error if the product is not found or the API request fails.
    #[instrument(skip(self), fields(handle = %handle))]
    pub async fn get_product_by_handle(&self, handle: &str) -> Result<Product, ShopifyError> {
        let cache_key = CacheKey::Product(handle.to_string());

        if let Some(CacheValue::Product(product)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for product");
            return Ok(*product);
        }

        let data = self
            .execute::<GetProductByHandle>(get_product_by_handle::Variables {
                handle: handle.to_string(),
            })
            .await?;

        let product_data = data
            .product
            .ok_or_else(|| ShopifyError::NotFound(format!("Product not found: {handle}")))?;
        let product = convert_product(product_data)?;

        self.inner
            .cache
            .insert(cache_key, CacheValue::Product(Box::new(product.clone())))
            .await;

        Ok(product)
    }

    /// Get a page of products, optionally filtered by a Shopify search query.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn get_products(
        &self,
        first: i64,
        after: Option<String>,
        query: Option<String>,
        sort: SortOrder,
    ) -> Result<ProductConnection, ShopifyError> {
        let cache_key = CacheKey::Products {
            first,
            after: after.clone(),
            query: query.clone(),
            sort,
        };

        if let Some(CacheValue::Products(products)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for products");
            return Ok(products);
        }

        // RELEVANCE is only valid alongside a search query
        let sort = if query.is_none() && sort == SortOrder::Relevance {
            SortOrder::Featured
        } else {
            sort
        };

        let data = self
            .execute::<GetProducts>(get_products::Variables {
                first,
                after,
                query,
                sort_key: Some(sort.product_sort_key()),
                reverse: Some(sort.reverse()),
            })
            .await?;

        let connection = convert_product_connection(data.products)?;

        self.inner
            .cache
            .insert(cache_key, CacheValue::Products(connection.clone()))
            .await;

        Ok(connection)
    }

    /// Get product recommendations.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn get_product_recommendations(
        &self,
        product_id: &str,
        intent: ProductRecommendationIntent,
    ) -> Result<Vec<Product>, ShopifyError> {
        let cache_key = CacheKey::Recommendations(format!("{product_id}:{}", intent.as_graphql()));

        if let Some(CacheValue::Recommendations(products)) = self.inner.cache.get(&cache_key).await
        {
            debug!("Cache hit for recommendations");
            return Ok(products);
        }

        let data = self
            .execute::<GetProductRecommendations>(get_product_recommendations::Variables {
                product_id: product_id.to_string(),
                intent: Some(intent.as_graphql()),
            })
            .await?;

        let products = convert_products(data.product_recommendations.unwrap_or_default())?;

        self.inner
            .cache
            .insert(cache_key, CacheValue::Recommendations(products.clone()))
            .await;

        Ok(products)
    }

    // =========================================================================
    // Collection Methods
    // =========================================================================

    /// Get a collection by its handle with one page of its products.
    ///
    /// # Errors
    ///
    /// Returns an error if the collection is not found or the API request fails.
    #[instrument(skip(self), fields(handle = %handle))]
    pub async fn get_collection_by_handle(
        &self,
        handle: &str,
        first: i64,
        after: Option<String>,
        sort: SortOrder,
    ) -> Result<Collection, ShopifyError> {
        let cache_key = CacheKey::Collection {
            handle: handle.to_string(),
            first,
            after: after.clone(),
            sort,
        };

        if let Some(CacheValue::Collection(collection)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for collection");
            return Ok(*collection);
        }

        let data = self
            .execute::<GetCollectionByHandle>(get_collection_by_handle::Variables {
                handle: handle.to_string(),
                first,
                after,
                sort_key: Some(sort.collection_sort_key()),
                reverse: Some(sort.reverse()),
            })
            .await?;

        let collection_data = data
            .collection
            .ok_or_else(|| ShopifyError::NotFound(format!("Collection not found: {handle}")))?;
        let collection = convert_collection(collection_data)?;

        self.inner
            .cache
            .insert(
                cache_key,
                CacheValue::Collection(Box::new(collection.clone())),
            )
            .await;

        Ok(collection)
    }

    /// Get a page of collections.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn get_collections(
        &self,
        first: i64,
        after: Option<String>,
    ) -> Result<CollectionConnection, ShopifyError> {
        let cache_key = CacheKey::Collections {
            first,
            after: after.clone(),
        };

        if let Some(CacheValue::Collections(collections)) = self.inner.cache.get(&cache_key).await
        {
            debug!("Cache hit for collections");
            return Ok(collections);
        }

        let data = self
            .execute::<GetCollections>(get_collections::Variables { first, after })
            .await?;

        let connection = convert_collection_connection(data.collections)?;

        self.inner
            .cache
            .insert(cache_key, CacheValue::Collections(connection.clone()))
            .await;

        Ok(connection)
    }

    // =========================================================================
    // Cart Methods (not cached - mutable state)
    // =========================================================================

    /// Create a new cart, optionally with lines and a buyer country.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart creation fails or user errors are returned.
    #[instrument(skip(self, lines))]
    pub async fn create_cart(
        &self,
        lines: Vec<CartLineInput>,
        country_code: Option<&str>,
    ) -> Result<Cart, ShopifyError> {
        let variables = create_cart::Variables {
            input: cart_inputs::CartInput {
                lines: lines.into_iter().map(line_input).collect(),
                buyer_identity: country_code.map(|code| cart_inputs::CartBuyerIdentityInput {
                    country_code: code.to_string(),
                }),
            },
        };

        let data = self.execute::<CreateCart>(variables).await?;
        cart_from_payload(data.cart_create, "Failed to create cart")
    }

    /// Get an existing cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart is not found or the API request fails.
    #[instrument(skip(self), fields(cart_id = %cart_id))]
    pub async fn get_cart(&self, cart_id: &str) -> Result<Cart, ShopifyError> {
        let data = self
            .execute::<GetCart>(get_cart::Variables {
                cart_id: cart_id.to_string(),
            })
            .await?;

        let cart = data
            .cart
            .ok_or_else(|| ShopifyError::NotFound(format!("Cart not found: {cart_id}")))?;
        Ok(convert_cart(cart)?)
    }

    /// Add lines to a cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart update fails or user errors are returned.
    #[instrument(skip(self, lines), fields(cart_id = %cart_id))]
    pub async fn add_to_cart(
        &self,
        cart_id: &str,
        lines: Vec<CartLineInput>,
    ) -> Result<Cart, ShopifyError> {
        let data = self
            .execute::<AddToCart>(add_to_cart::Variables {
                cart_id: cart_id.to_string(),
                lines: lines.into_iter().map(line_input).collect(),
            })
            .await?;
        cart_from_payload(data.cart_lines_add, "Failed to add to cart")
    }

    /// Update cart line quantities.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart update fails or user errors are returned.
    #[instrument(skip(self, lines), fields(cart_id = %cart_id))]
    pub async fn update_cart(
        &self,
        cart_id: &str,
        lines: Vec<CartLineUpdateInput>,
    ) -> Result<Cart, ShopifyError> {
        let data = self
            .execute::<UpdateCartLines>(update_cart_lines::Variables {
                cart_id: cart_id.to_string(),
                lines: lines
                    .into_iter()
                    .map(|line| cart_inputs::CartLineUpdateInput {
                        id: line.id.as_str().to_string(),
                        quantity: line.quantity,
                    })
                    .collect(),
            })
            .await?;
        cart_from_payload(data.cart_lines_update, "Failed to update cart")
    }

    /// Remove lines from a cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart update fails or user errors are returned.
    #[instrument(skip(self, line_ids), fields(cart_id = %cart_id))]
    pub async fn remove_from_cart(
        &self,
        cart_id: &str,
        line_ids: Vec<CartLineId>,
    ) -> Result<Cart, ShopifyError> {
        let data = self
            .execute::<RemoveFromCart>(remove_from_cart::Variables {
                cart_id: cart_id.to_string(),
                line_ids: line_ids
                    .into_iter()
                    .map(|id| id.as_str().to_string())
                    .collect(),
            })
            .await?;
        cart_from_payload(data.cart_lines_remove, "Failed to remove from cart")
    }

    /// Replace the discount codes on a cart. An empty list clears them.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart update fails or user errors are returned.
    #[instrument(skip(self, discount_codes), fields(cart_id = %cart_id))]
    pub async fn update_discount_codes(
        &self,
        cart_id: &str,
        discount_codes: Vec<String>,
    ) -> Result<Cart, ShopifyError> {
        let data = self
            .execute::<UpdateCartDiscountCodes>(update_cart_discount_codes::Variables {
                cart_id: cart_id.to_string(),
                discount_codes,
            })
            .await?;
        cart_from_payload(
            data.cart_discount_codes_update,
            "Failed to update discount codes",
        )
    }

    /// Set the buyer country on a cart so Shopify prices it for that market.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart update fails or user errors are returned.
    #[instrument(skip(self), fields(cart_id = %cart_id))]
    pub async fn update_buyer_identity(
        &self,
        cart_id: &str,
        country_code: &str,
    ) -> Result<Cart, ShopifyError> {
        let data = self
            .execute::<UpdateCartBuyerIdentity>(update_cart_buyer_identity::Variables {
                cart_id: cart_id.to_string(),
                buyer_identity: cart_inputs::CartBuyerIdentityInput {
                    country_code: country_code.to_string(),
                },
            })
            .await?;
        cart_from_payload(
            data.cart_buyer_identity_update,
            "Failed to update buyer identity",
        )
    }

    // =========================================================================
    // Cache Management
    // =========================================================================

    /// Invalidate a cached product page.
    pub async fn invalidate_product(&self, handle: &str) {
        self.inner
            .cache
            .invalidate(&CacheKey::Product(handle.to_string()))
            .await;
    }

    /// Invalidate every cached page of a collection.
    pub async fn invalidate_collection(&self, handle: &str) {
        let handle = handle.to_string();
        // Only fails when invalidation closures are disabled on the builder
        let _ = self.inner.cache.invalidate_entries_if(move |key, _| {
            matches!(key, CacheKey::Collection { handle: h, .. } if *h == handle)
        });
        self.inner.cache.run_pending_tasks().await;
    }

    /// Invalidate all cached data.
    pub async fn invalidate_all(&self) {
        self.inner.cache.invalidate_all();
        self.inner.cache.run_pending_tasks().await;
    }

    /// Number of cached entries.
    pub async fn cached_entries(&self) -> u64 {
        self.inner.cache.run_pending_tasks().await;
        self.inner.cache.entry_count()
    }
}

// =============================================================================
// Helpers
// =============================================================================

fn truncate(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

fn line_input(line: CartLineInput) -> cart_inputs::CartLineInput {
    cart_inputs::CartLineInput {
        merchandise_id: line.merchandise_id.as_str().to_string(),
        quantity: line.quantity,
    }
}

fn convert_graphql_error(error: graphql_client::Error) -> GraphQLError {
    GraphQLError {
        message: error.message,
        locations: error.locations.map_or_else(Vec::new, |locs| {
            locs.into_iter()
                .map(|l| GraphQLErrorLocation {
                    line: i64::from(l.line),
                    column: i64::from(l.column),
                })
                .collect()
        }),
        path: error.path.map_or_else(Vec::new, |p| {
            p.into_iter()
                .map(|fragment| match fragment {
                    graphql_client::PathFragment::Key(s) => serde_json::Value::String(s),
                    graphql_client::PathFragment::Index(i) => serde_json::Value::Number(i.into()),
                })
                .collect()
        }),
    }
}

/// Join mutation user errors into one message.
fn join_user_errors(errors: Vec<RawUserError>) -> String {
    errors
        .into_iter()
        .map(|e| e.message)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Unwrap a cart mutation payload.
fn cart_from_payload(payload: Option<CartPayload>, failure: &str) -> Result<Cart, ShopifyError> {
    if let Some(payload) = payload {
        if !payload.user_errors.is_empty() {
            return Err(ShopifyError::UserError(join_user_errors(
                payload.user_errors,
            )));
        }
        if let Some(cart) = payload.cart {
            return Ok(convert_cart(cart)?);
        }
    }

    Err(ShopifyError::GraphQL(vec![GraphQLError::message(failure)]))
}
