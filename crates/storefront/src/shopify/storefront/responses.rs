//! Raw response shapes for the Storefront API operations.
//!
//! These mirror the selection sets in `queries` field for field and are
//! converted into the domain types in `shopify::types` by `conversions`.

use chrono::{DateTime, Utc};
use serde::Deserialize;

/// Relay-style connection.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection<T> {
    pub edges: Vec<Edge<T>>,
    #[serde(default)]
    pub page_info: RawPageInfo,
}

impl<T> Connection<T> {
    /// Unwrap the edge nodes.
    pub fn into_nodes(self) -> Vec<T> {
        self.edges.into_iter().map(|edge| edge.node).collect()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Edge<T> {
    pub node: T,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawPageInfo {
    pub has_next_page: bool,
    pub end_cursor: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawMoney {
    pub amount: String,
    pub currency_code: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawImage {
    pub url: String,
    pub alt_text: Option<String>,
    pub width: Option<i64>,
    pub height: Option<i64>,
}

// =============================================================================
// Products
// =============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawPriceRange {
    pub min_variant_price: RawMoney,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawSelectedOption {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawOptionValue {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawProductOption {
    pub name: String,
    #[serde(default)]
    pub option_values: Vec<RawOptionValue>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawVariant {
    pub id: String,
    pub title: String,
    pub available_for_sale: bool,
    pub price: RawMoney,
    pub compare_at_price: Option<RawMoney>,
    #[serde(default)]
    pub selected_options: Vec<RawSelectedOption>,
    pub image: Option<RawImage>,
}

/// Product selection: the `ProductCard` fields, plus the `ProductDetail`
/// fields on product pages.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawProduct {
    pub id: String,
    pub handle: String,
    pub title: String,
    #[serde(default)]
    pub vendor: String,
    #[serde(default)]
    pub product_type: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub available_for_sale: bool,
    pub created_at: Option<DateTime<Utc>>,
    pub featured_image: Option<RawImage>,
    pub price_range: RawPriceRange,
    pub compare_at_price_range: Option<RawPriceRange>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub description_html: String,
    pub images: Option<Connection<RawImage>>,
    #[serde(default)]
    pub options: Vec<RawProductOption>,
    pub variants: Option<Connection<RawVariant>>,
}

// =============================================================================
// Collections
// =============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawCollection {
    pub id: String,
    pub handle: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub image: Option<RawImage>,
    pub products: Option<Connection<RawProduct>>,
}

// =============================================================================
// Cart
// =============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawCartCost {
    pub subtotal_amount: RawMoney,
    pub total_amount: RawMoney,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawCartLineCost {
    pub amount_per_quantity: RawMoney,
    pub total_amount: RawMoney,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawMerchandiseProduct {
    pub id: String,
    pub handle: String,
    pub title: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawMerchandise {
    pub id: String,
    pub title: String,
    pub image: Option<RawImage>,
    pub product: RawMerchandiseProduct,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawCartLine {
    pub id: String,
    pub quantity: u32,
    pub cost: RawCartLineCost,
    pub merchandise: RawMerchandise,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawDiscountCode {
    pub code: String,
    pub applicable: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawBuyerIdentity {
    pub country_code: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawCart {
    pub id: String,
    pub checkout_url: String,
    pub total_quantity: u32,
    pub buyer_identity: Option<RawBuyerIdentity>,
    pub cost: RawCartCost,
    #[serde(default)]
    pub discount_codes: Vec<RawDiscountCode>,
    pub lines: Connection<RawCartLine>,
}

/// User error from a mutation payload.
#[derive(Debug, Clone, Deserialize)]
pub struct RawUserError {
    pub message: String,
}

/// Payload shared by every cart mutation.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartPayload {
    pub cart: Option<RawCart>,
    #[serde(default)]
    pub user_errors: Vec<RawUserError>,
}

// =============================================================================
// Customers
// =============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct RawCustomerRef {
    pub id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawOrderLineItem {
    pub quantity: u32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawOrder {
    pub id: String,
    pub name: String,
    pub processed_at: Option<DateTime<Utc>>,
    pub financial_status: Option<String>,
    pub fulfillment_status: String,
    pub status_url: Option<String>,
    pub total_price: RawMoney,
    pub line_items: Connection<RawOrderLineItem>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawCustomer {
    pub id: String,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub display_name: String,
    pub orders: Connection<RawOrder>,
}
