//! Domain types for the Shopify Storefront API.
//!
//! These types provide a clean, ergonomic API separate from the raw
//! GraphQL response shapes in `storefront::responses`.

use chrono::{DateTime, Utc};
use indecisive_wear_core::{
    CartLineId, CartMirror, CurrencyCode, MirrorLine, Price, ProductId, SaleInfo, SavedProduct,
    VariantId, detect_sale,
};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;

// =============================================================================
// Image Types
// =============================================================================

/// Product or collection image.
#[derive(Debug, Clone, Serialize)]
pub struct Image {
    /// Image CDN URL
    pub url: String,
    /// Alt text for accessibility
    pub alt_text: Option<String>,
    pub width: Option<i64>,
    pub height: Option<i64>,
}

// =============================================================================
// Product Types
// =============================================================================

/// Selected option on a product variant.
#[derive(Debug, Clone, Serialize)]
pub struct SelectedOption {
    pub name: String,
    pub value: String,
}

/// Product option definition (e.g. Size: S, M, L).
#[derive(Debug, Clone, Serialize)]
pub struct ProductOption {
    pub name: String,
    pub values: Vec<String>,
}

/// A product variant (specific combination of options).
#[derive(Debug, Clone, Serialize)]
pub struct ProductVariant {
    pub id: VariantId,
    /// Variant title ("Default Title" for single-variant products)
    pub title: String,
    pub available_for_sale: bool,
    pub price: Price,
    pub compare_at_price: Option<Price>,
    pub selected_options: Vec<SelectedOption>,
    pub image: Option<Image>,
}

impl ProductVariant {
    /// Whether this is Shopify's placeholder variant.
    #[must_use]
    pub fn is_default(&self) -> bool {
        self.title == "Default Title"
    }
}

/// A product in the store.
///
/// Listing queries fetch a reduced field set, so `description_html`,
/// `images`, `options` and `variants` may be empty on listing results.
#[derive(Debug, Clone, Serialize)]
pub struct Product {
    pub id: ProductId,
    pub handle: String,
    pub title: String,
    pub description: String,
    pub description_html: String,
    pub available_for_sale: bool,
    /// Product type (Shirts, Hats, ...)
    pub product_type: String,
    pub vendor: String,
    pub tags: Vec<String>,
    pub created_at: Option<DateTime<Utc>>,
    /// Lowest variant price
    pub price: Price,
    /// Lowest variant compare-at price, when any variant has one
    pub compare_at_price: Option<Price>,
    pub featured_image: Option<Image>,
    pub images: Vec<Image>,
    pub options: Vec<ProductOption>,
    pub variants: Vec<ProductVariant>,
}

impl Product {
    /// Sale information from the compare-at price or `sale-NN` / `was-NN` tags.
    #[must_use]
    pub fn sale(&self) -> Option<SaleInfo> {
        detect_sale(
            self.price.amount,
            self.compare_at_price.map(|p| p.amount),
            &self.tags,
        )
    }

    /// First variant that can be purchased.
    #[must_use]
    pub fn first_available_variant(&self) -> Option<&ProductVariant> {
        self.variants.iter().find(|v| v.available_for_sale)
    }

    /// Summary stored in the wishlist and recently-viewed lists.
    #[must_use]
    pub fn saved_product(&self) -> SavedProduct {
        SavedProduct {
            id: self.id.clone(),
            handle: self.handle.clone(),
            title: self.title.clone(),
            image_url: self.featured_image.as_ref().map(|img| img.url.clone()),
            price: self.price,
        }
    }
}

// =============================================================================
// Collection Types
// =============================================================================

/// A collection of products.
#[derive(Debug, Clone, Serialize)]
pub struct Collection {
    pub id: String,
    pub handle: String,
    pub title: String,
    pub description: String,
    pub image: Option<Image>,
    /// First page of products (empty on collection listings)
    pub products: Vec<Product>,
    /// Pagination for `products`
    pub page_info: PageInfo,
}

// =============================================================================
// Pagination Types
// =============================================================================

/// Pagination information.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PageInfo {
    pub has_next_page: bool,
    pub end_cursor: Option<String>,
}

/// Paginated list of products.
#[derive(Debug, Clone, Serialize)]
pub struct ProductConnection {
    pub products: Vec<Product>,
    pub page_info: PageInfo,
}

/// Paginated list of collections.
#[derive(Debug, Clone, Serialize)]
pub struct CollectionConnection {
    pub collections: Vec<Collection>,
    pub page_info: PageInfo,
}

/// Recommendation intent for related products.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProductRecommendationIntent {
    #[default]
    Related,
    Complementary,
}

impl ProductRecommendationIntent {
    pub(crate) const fn as_graphql(self) -> &'static str {
        match self {
            Self::Related => "RELATED",
            Self::Complementary => "COMPLEMENTARY",
        }
    }
}

// =============================================================================
// Cart Types
// =============================================================================

/// Variant summary in a cart line.
#[derive(Debug, Clone, Serialize)]
pub struct CartMerchandise {
    pub id: VariantId,
    pub title: String,
    pub image: Option<Image>,
    pub product_id: ProductId,
    pub product_handle: String,
    pub product_title: String,
}

/// A line in a cart.
#[derive(Debug, Clone, Serialize)]
pub struct CartLine {
    pub id: CartLineId,
    pub quantity: u32,
    pub merchandise: CartMerchandise,
    /// Price per unit
    pub unit_price: Price,
    /// Line total after line-level discounts
    pub total: Price,
}

impl CartLine {
    /// Product title with the variant title appended when meaningful.
    #[must_use]
    pub fn display_name(&self) -> String {
        if self.merchandise.title == "Default Title" {
            self.merchandise.product_title.clone()
        } else {
            format!(
                "{} - {}",
                self.merchandise.product_title, self.merchandise.title
            )
        }
    }
}

/// Cart cost summary.
#[derive(Debug, Clone, Serialize)]
pub struct CartCost {
    pub subtotal: Price,
    pub total: Price,
}

/// Discount code applied to a cart.
#[derive(Debug, Clone, Serialize)]
pub struct CartDiscountCode {
    pub code: String,
    /// Whether the code applies to the current cart contents
    pub applicable: bool,
}

/// A Shopify cart.
#[derive(Debug, Clone, Serialize)]
pub struct Cart {
    pub id: String,
    /// Shopify-hosted checkout URL
    pub checkout_url: String,
    pub total_quantity: u32,
    pub lines: Vec<CartLine>,
    pub cost: CartCost,
    pub discount_codes: Vec<CartDiscountCode>,
    /// Buyer identity country code
    pub country_code: Option<String>,
}

impl Cart {
    /// Rebuild the session cart mirror from this cart.
    #[must_use]
    pub fn to_mirror(&self) -> CartMirror {
        let lines = self
            .lines
            .iter()
            .map(|line| MirrorLine {
                line_id: line.id.clone(),
                product_id: line.merchandise.product_id.clone(),
                variant_id: line.merchandise.id.clone(),
                name: line.display_name(),
                quantity: line.quantity,
                unit_price: line.unit_price.amount,
            })
            .collect();
        CartMirror::from_lines(lines, self.currency())
    }

    /// Cart currency.
    #[must_use]
    pub const fn currency(&self) -> CurrencyCode {
        self.cost.subtotal.currency_code
    }
}

/// Input for adding a line to a cart.
#[derive(Debug, Clone)]
pub struct CartLineInput {
    pub merchandise_id: VariantId,
    pub quantity: u32,
}

/// Input for updating a cart line.
#[derive(Debug, Clone)]
pub struct CartLineUpdateInput {
    pub id: CartLineId,
    pub quantity: u32,
}

// =============================================================================
// Customer Types
// =============================================================================

/// Customer access token issued by `customerAccessTokenCreate`.
///
/// Implements `Debug` manually to redact the token.
#[derive(Clone)]
pub struct CustomerAccessToken {
    pub access_token: SecretString,
    pub expires_at: DateTime<Utc>,
}

impl std::fmt::Debug for CustomerAccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CustomerAccessToken")
            .field("access_token", &"[REDACTED]")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

impl CustomerAccessToken {
    /// Whether the token has expired at `now`.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }

    /// Raw token for API calls.
    #[must_use]
    pub fn token(&self) -> &str {
        self.access_token.expose_secret()
    }
}

/// Input for `customerCreate`.
#[derive(Debug, Clone)]
pub struct CustomerCreateInput {
    pub email: String,
    pub password: SecretString,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub accepts_marketing: bool,
}

/// Customer profile.
#[derive(Debug, Clone, Serialize)]
pub struct Customer {
    pub id: String,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub display_name: String,
    pub orders: Vec<Order>,
}

/// A customer order summary.
#[derive(Debug, Clone, Serialize)]
pub struct Order {
    pub id: String,
    /// Order name (#1001)
    pub name: String,
    pub processed_at: Option<DateTime<Utc>>,
    pub financial_status: Option<String>,
    pub fulfillment_status: String,
    pub total: Price,
    pub item_count: u32,
    /// Order status page
    pub status_url: Option<String>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use indecisive_wear_core::SaleSource;
    use rust_decimal::Decimal;

    use super::*;

    fn usd(amount: &str) -> Price {
        Price::parse(amount, "USD").unwrap()
    }

    fn product(price: &str, compare_at: Option<&str>, tags: &[&str]) -> Product {
        Product {
            id: ProductId::from_numeric(1),
            handle: "linen-shirt".to_string(),
            title: "Linen Shirt".to_string(),
            description: String::new(),
            description_html: String::new(),
            available_for_sale: true,
            product_type: "Shirts".to_string(),
            vendor: "Indecisive Wear".to_string(),
            tags: tags.iter().map(ToString::to_string).collect(),
            created_at: None,
            price: usd(price),
            compare_at_price: compare_at.map(usd),
            featured_image: Some(Image {
                url: "https://cdn.shopify.com/shirt.jpg".to_string(),
                alt_text: None,
                width: None,
                height: None,
            }),
            images: Vec::new(),
            options: Vec::new(),
            variants: Vec::new(),
        }
    }

    #[test]
    fn test_product_sale_prefers_compare_at() {
        let sale = product("30.00", Some("40.00"), &["sale-50"]).sale().unwrap();
        assert_eq!(sale.percent_off, 25);
        assert_eq!(sale.source, SaleSource::CompareAtPrice);
    }

    #[test]
    fn test_product_sale_from_tag() {
        let sale = product("30.00", None, &["summer", "sale-25"]).sale().unwrap();
        assert_eq!(sale.percent_off, 25);
        assert_eq!(sale.original, Decimal::new(4000, 2));
    }

    #[test]
    fn test_saved_product() {
        let saved = product("30.00", None, &[]).saved_product();
        assert_eq!(saved.handle, "linen-shirt");
        assert_eq!(
            saved.image_url.as_deref(),
            Some("https://cdn.shopify.com/shirt.jpg")
        );
    }

    #[test]
    fn test_cart_to_mirror() {
        let line = |n: u64, title: &str, qty: u32, price: &str| CartLine {
            id: CartLineId::from_numeric(n),
            quantity: qty,
            merchandise: CartMerchandise {
                id: VariantId::from_numeric(n * 10),
                title: title.to_string(),
                image: None,
                product_id: ProductId::from_numeric(n * 100),
                product_handle: "tee".to_string(),
                product_title: "Tee".to_string(),
            },
            unit_price: usd(price),
            total: usd(price).times(qty),
        };
        let cart = Cart {
            id: "gid://shopify/Cart/abc".to_string(),
            checkout_url: "https://shop/checkout".to_string(),
            total_quantity: 3,
            lines: vec![line(1, "Default Title", 1, "20.00"), line(2, "Large", 2, "25.50")],
            cost: CartCost {
                subtotal: usd("71.00"),
                total: usd("71.00"),
            },
            discount_codes: Vec::new(),
            country_code: Some("US".to_string()),
        };

        let mirror = cart.to_mirror();
        assert_eq!(mirror.count(), 3);
        assert_eq!(mirror.total(), Decimal::new(7100, 2));
        assert_eq!(mirror.lines()[0].name, "Tee");
        assert_eq!(mirror.lines()[1].name, "Tee - Large");
    }

    #[test]
    fn test_access_token_debug_redacts() {
        let token = CustomerAccessToken {
            access_token: SecretString::from("tok_secret_value"),
            expires_at: Utc::now(),
        };
        let debug = format!("{token:?}");
        assert!(!debug.contains("tok_secret_value"));
        assert!(token.is_expired(Utc::now()));
    }
}
