//! View models shared by page templates.
//!
//! Handlers convert Shopify and session types into these structs so
//! templates only deal with display-ready strings and flags.

use axum::{
    extract::{FromRequestParts, OriginalUri},
    http::{Uri, request::Parts},
};
use chrono::Utc;
use indecisive_wear_core::{
    DiscountRange, DisplayPrice, ListingParams, Market, Price, SavedProduct, SortOrder, Wishlist,
};
use serde::Serialize;
use tower_sessions::Session;

use crate::models::session;
use crate::notifications::Toast;
use crate::shopify::types::{Cart, CartDiscountCode, Image, PageInfo, Product};
use crate::state::AppState;

// =============================================================================
// Page Context
// =============================================================================

/// Everything the base layout needs: market selector, header badges and
/// flash toasts.
#[derive(Debug, Clone)]
pub struct PageContext {
    /// Path and query of the current request.
    pub path: String,
    pub market: &'static Market,
    pub markets: &'static [Market],
    pub cart_count: u32,
    pub wishlist_count: usize,
    pub signed_in: bool,
    pub flash: Vec<Toast>,
}

impl PageContext {
    /// Load the context for a page render. Drains pending flash toasts.
    pub async fn load(state: &AppState, session: &Session, uri: &Uri) -> Self {
        let market = session::market(session, state.config().default_market).await;
        let cart_count = session::cart_mirror(session).await.count();
        let wishlist_count = session::wishlist(session).await.len();
        let signed_in = session::customer_token(session, Utc::now()).await.is_some();
        let flash = session::take_flash(session).await;

        Self {
            path: request_path(uri),
            market,
            markets: Market::all(),
            cart_count,
            wishlist_count,
            signed_in,
            flash,
        }
    }

    /// Context for a request without a session.
    #[must_use]
    pub fn anonymous(state: &AppState, uri: &Uri) -> Self {
        Self {
            path: request_path(uri),
            market: state.config().default_market,
            markets: Market::all(),
            cart_count: 0,
            wishlist_count: 0,
            signed_in: false,
            flash: Vec::new(),
        }
    }
}

fn request_path(uri: &Uri) -> String {
    uri.path_and_query()
        .map_or_else(|| uri.path().to_string(), ToString::to_string)
}

impl FromRequestParts<AppState> for PageContext {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        // Nested routers see a stripped URI
        let uri = parts
            .extensions
            .get::<OriginalUri>()
            .map_or_else(|| parts.uri.clone(), |OriginalUri(uri)| uri.clone());
        match parts.extensions.get::<Session>() {
            Some(session) => Ok(Self::load(state, session, &uri).await),
            None => Ok(Self::anonymous(state, &uri)),
        }
    }
}

// =============================================================================
// Products
// =============================================================================

/// Image display data for templates.
#[derive(Debug, Clone, Serialize)]
pub struct ImageView {
    pub url: String,
    pub alt: String,
}

impl ImageView {
    #[must_use]
    pub fn new(image: &Image, fallback_alt: &str) -> Self {
        Self {
            url: image.url.clone(),
            alt: image
                .alt_text
                .clone()
                .unwrap_or_else(|| fallback_alt.to_string()),
        }
    }
}

/// Product card for listings.
#[derive(Debug, Clone, Serialize)]
pub struct ProductCard {
    pub id: String,
    pub handle: String,
    pub title: String,
    pub vendor: String,
    pub image: Option<ImageView>,
    pub price: DisplayPrice,
    /// Pre-sale price, when on sale.
    pub original_price: Option<DisplayPrice>,
    pub percent_off: Option<u8>,
    pub available: bool,
    pub in_wishlist: bool,
}

impl ProductCard {
    #[must_use]
    pub fn new(product: &Product, market: &Market, wishlist: &Wishlist) -> Self {
        let sale = product.sale();
        Self {
            id: product.id.as_str().to_string(),
            handle: product.handle.clone(),
            title: product.title.clone(),
            vendor: product.vendor.clone(),
            image: product
                .featured_image
                .as_ref()
                .map(|img| ImageView::new(img, &product.title)),
            price: market.display_price(product.price),
            original_price: sale.map(|s| {
                market.display_price(Price::new(s.original, product.price.currency_code))
            }),
            percent_off: sale.map(|s| s.percent_off),
            available: product.available_for_sale,
            in_wishlist: wishlist.contains(&product.id),
        }
    }

    /// Cards for a page of products.
    #[must_use]
    pub fn list(products: &[Product], market: &Market, wishlist: &Wishlist) -> Vec<Self> {
        products
            .iter()
            .map(|p| Self::new(p, market, wishlist))
            .collect()
    }
}

/// A wishlist or recently-viewed entry.
#[derive(Debug, Clone, Serialize)]
pub struct SavedCard {
    pub id: String,
    pub handle: String,
    pub title: String,
    pub image_url: Option<String>,
    pub price: DisplayPrice,
}

impl SavedCard {
    #[must_use]
    pub fn new(product: &SavedProduct, market: &Market) -> Self {
        Self {
            id: product.id.as_str().to_string(),
            handle: product.handle.clone(),
            title: product.title.clone(),
            image_url: product.image_url.clone(),
            price: market.display_price(product.price),
        }
    }
}

// =============================================================================
// Cart
// =============================================================================

/// Cart line display data.
#[derive(Debug, Clone)]
pub struct CartLineView {
    pub id: String,
    pub handle: String,
    pub title: String,
    pub variant_title: Option<String>,
    pub quantity: u32,
    pub unit_price: DisplayPrice,
    pub line_total: DisplayPrice,
    pub image: Option<ImageView>,
}

/// Cart display data.
#[derive(Debug, Clone)]
pub struct CartView {
    pub lines: Vec<CartLineView>,
    pub subtotal: DisplayPrice,
    pub total: DisplayPrice,
    pub count: u32,
    pub discount_codes: Vec<CartDiscountCode>,
    /// Whether any figure was converted for display.
    pub approximate: bool,
}

impl CartView {
    #[must_use]
    pub fn new(cart: &Cart, market: &Market) -> Self {
        let lines: Vec<CartLineView> = cart
            .lines
            .iter()
            .map(|line| CartLineView {
                id: line.id.as_str().to_string(),
                handle: line.merchandise.product_handle.clone(),
                title: line.merchandise.product_title.clone(),
                variant_title: (line.merchandise.title != "Default Title")
                    .then(|| line.merchandise.title.clone()),
                quantity: line.quantity,
                unit_price: market.display_price(line.unit_price),
                line_total: market.display_price(line.total),
                image: line
                    .merchandise
                    .image
                    .as_ref()
                    .map(|img| ImageView::new(img, &line.merchandise.product_title)),
            })
            .collect();
        let subtotal = market.display_price(cart.cost.subtotal);
        let total = market.display_price(cart.cost.total);

        Self {
            approximate: total.approximate,
            lines,
            subtotal,
            total,
            count: cart.total_quantity,
            discount_codes: cart.discount_codes.clone(),
        }
    }

    #[must_use]
    pub fn empty(market: &Market) -> Self {
        let zero = market.display_price(Price::zero(market.currency));
        Self {
            lines: Vec::new(),
            subtotal: zero.clone(),
            total: zero,
            count: 0,
            discount_codes: Vec::new(),
            approximate: false,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

// =============================================================================
// Listing controls
// =============================================================================

/// An `<option>` in a select.
#[derive(Debug, Clone)]
pub struct SelectOption {
    pub value: String,
    pub label: String,
    pub selected: bool,
}

/// A filter carried through the listing form unchanged.
#[derive(Debug, Clone)]
pub struct HiddenField {
    pub name: &'static str,
    pub value: String,
}

/// Filter and sort form above a listing.
#[derive(Debug, Clone)]
pub struct ListingControls {
    /// Form action.
    pub action: String,
    pub show_search: bool,
    pub q: String,
    pub available: bool,
    pub sort_options: Vec<SelectOption>,
    pub discount_options: Vec<SelectOption>,
    pub hidden: Vec<HiddenField>,
}

impl ListingControls {
    /// Build the controls for `params`.
    ///
    /// `default_discount` is the range applied when the request has none,
    /// e.g. `any` on the sale page.
    #[must_use]
    pub fn new(
        action: &str,
        params: &ListingParams,
        show_search: bool,
        default_discount: Option<&str>,
    ) -> Self {
        let sort = params.sort_order();
        let sort_options = SortOrder::OPTIONS
            .iter()
            .map(|option| SelectOption {
                value: option.as_param().to_string(),
                label: option.label().to_string(),
                selected: *option == sort,
            })
            .collect();

        let current_discount = params
            .discount
            .as_deref()
            .map(str::trim)
            .filter(|d| DiscountRange::parse(d).is_some())
            .or(default_discount)
            .unwrap_or_default();
        let mut discount_options = Vec::with_capacity(DiscountRange::PRESETS.len() + 1);
        if default_discount.is_none() {
            discount_options.push(SelectOption {
                value: String::new(),
                label: "All prices".to_string(),
                selected: current_discount.is_empty(),
            });
        }
        discount_options.extend(DiscountRange::PRESETS.iter().map(|(value, label)| {
            SelectOption {
                value: (*value).to_string(),
                label: (*label).to_string(),
                selected: *value == current_discount,
            }
        }));

        let hidden = params
            .link_pairs()
            .into_iter()
            .filter(|(name, _)| {
                matches!(*name, "type" | "vendor" | "tag" | "min_price" | "max_price")
                    || (*name == "q" && !show_search)
            })
            .map(|(name, value)| HiddenField { name, value })
            .collect();

        Self {
            action: action.to_string(),
            show_search,
            q: params.search_text().unwrap_or_default().to_string(),
            available: params.only_available(),
            sort_options,
            discount_options,
            hidden,
        }
    }
}

/// Cursor pagination links. Shopify cursors only page forward.
#[derive(Debug, Clone, Default)]
pub struct Pagination {
    pub next_url: Option<String>,
    /// Back to the first page, when not already on it.
    pub first_url: Option<String>,
}

impl Pagination {
    #[must_use]
    pub fn new(base_path: &str, params: &ListingParams, page_info: &PageInfo) -> Self {
        let pairs = params.link_pairs();
        let next_url = page_info
            .end_cursor
            .as_deref()
            .filter(|_| page_info.has_next_page)
            .map(|cursor| listing_url(base_path, &pairs, Some(cursor)));
        let first_url = params
            .cursor()
            .map(|_| listing_url(base_path, &pairs, None));

        Self {
            next_url,
            first_url,
        }
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.next_url.is_none() && self.first_url.is_none()
    }
}

/// `base_path?key=value&...&after=cursor`.
#[must_use]
pub fn listing_url(base_path: &str, pairs: &[(&str, String)], after: Option<&str>) -> String {
    let mut query = url::form_urlencoded::Serializer::new(String::new());
    for (key, value) in pairs {
        query.append_pair(key, value);
    }
    if let Some(cursor) = after {
        query.append_pair("after", cursor);
    }
    let query = query.finish();

    if query.is_empty() {
        base_path.to_string()
    } else {
        format!("{base_path}?{query}")
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use indecisive_wear_core::{CurrencyCode, ProductId};
    use rust_decimal::Decimal;

    use super::*;

    fn params(pairs: &[(&str, &str)]) -> ListingParams {
        let query = pairs
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("&");
        let uri: Uri = format!("/products?{query}").parse().unwrap();
        axum::extract::Query::<ListingParams>::try_from_uri(&uri)
            .unwrap()
            .0
    }

    fn saved(n: u64, amount: i64) -> SavedProduct {
        SavedProduct {
            id: ProductId::from_numeric(n),
            handle: format!("product-{n}"),
            title: format!("Product {n}"),
            image_url: None,
            price: Price::new(Decimal::new(amount, 2), CurrencyCode::USD),
        }
    }

    #[test]
    fn test_listing_url() {
        assert_eq!(listing_url("/products", &[], None), "/products");
        assert_eq!(
            listing_url(
                "/search",
                &[("q", "linen shirt".to_string())],
                Some("abc=")
            ),
            "/search?q=linen+shirt&after=abc%3D"
        );
    }

    #[test]
    fn test_pagination_keeps_filters() {
        let params = params(&[("sort", "newest"), ("after", "c1")]);
        let page_info = PageInfo {
            has_next_page: true,
            end_cursor: Some("c2".to_string()),
        };
        let pagination = Pagination::new("/products", &params, &page_info);
        assert_eq!(
            pagination.next_url.as_deref(),
            Some("/products?sort=newest&after=c2")
        );
        assert_eq!(pagination.first_url.as_deref(), Some("/products?sort=newest"));
    }

    #[test]
    fn test_pagination_last_page() {
        let page_info = PageInfo {
            has_next_page: false,
            end_cursor: Some("c9".to_string()),
        };
        let pagination = Pagination::new("/products", &ListingParams::default(), &page_info);
        assert!(pagination.is_empty());
    }

    #[test]
    fn test_controls_select_current_values() {
        let params = params(&[("sort", "price-asc"), ("discount", "30-50"), ("tag", "summer")]);
        let controls = ListingControls::new("/products", &params, false, None);

        let selected: Vec<&str> = controls
            .sort_options
            .iter()
            .filter(|o| o.selected)
            .map(|o| o.value.as_str())
            .collect();
        assert_eq!(selected, vec!["price-asc"]);
        assert!(
            controls
                .discount_options
                .iter()
                .any(|o| o.selected && o.value == "30-50")
        );
        assert_eq!(controls.hidden.len(), 1);
        assert_eq!(controls.hidden[0].name, "tag");
    }

    #[test]
    fn test_sale_controls_default_to_any_discount() {
        let controls = ListingControls::new("/sale", &ListingParams::default(), false, Some("any"));
        assert_eq!(controls.discount_options.len(), DiscountRange::PRESETS.len());
        assert!(controls.discount_options[0].selected);
    }

    #[test]
    fn test_saved_card_converts_price() {
        let gb = Market::find("gb").unwrap();
        let card = SavedCard::new(&saved(1, 10000), gb);
        assert!(card.price.approximate);
        assert_eq!(card.price.currency, CurrencyCode::GBP);
    }

    #[test]
    fn test_empty_cart_view() {
        let market = Market::default_market();
        let cart = CartView::empty(market);
        assert!(cart.is_empty());
        assert_eq!(cart.total.text, "$0.00");
    }
}
