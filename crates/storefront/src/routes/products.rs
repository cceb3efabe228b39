//! Product route handlers: listing, search, sale and detail pages.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::{Path, Query, State};
use chrono::Utc;
use indecisive_wear_core::{DiscountRange, DisplayPrice, ListingParams};
use tower_sessions::Session;
use tracing::instrument;

use crate::error::Result;
use crate::filters;
use crate::models::session;
use crate::shopify::types::{Product, ProductConnection, ProductRecommendationIntent};
use crate::state::AppState;
use crate::views::{ImageView, ListingControls, PageContext, Pagination, ProductCard};

/// Products per listing page.
pub const PAGE_SIZE: i64 = 24;

/// Sale listings scan a larger page since most products are filtered out.
const SALE_PAGE_SIZE: i64 = 100;

const RELATED_LIMIT: usize = 4;

/// Product listing template, shared by products, sale, search and
/// collection pages.
#[derive(Template, WebTemplate)]
#[template(path = "products/index.html")]
pub struct ListingTemplate {
    pub ctx: PageContext,
    pub heading: String,
    pub description: Option<String>,
    pub products: Vec<ProductCard>,
    pub controls: ListingControls,
    pub pagination: Pagination,
    pub empty_message: &'static str,
}

/// Variant display data for templates.
#[derive(Debug, Clone)]
pub struct VariantView {
    pub id: String,
    pub title: String,
    pub price: DisplayPrice,
    pub available: bool,
}

/// Product detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/show.html")]
pub struct ProductShowTemplate {
    pub ctx: PageContext,
    pub card: ProductCard,
    pub product_type: String,
    pub description_html: String,
    pub images: Vec<ImageView>,
    pub variants: Vec<VariantView>,
    /// Hidden for products with only Shopify's placeholder variant.
    pub show_variants: bool,
    pub selected_variant: Option<String>,
    pub related: Vec<ProductCard>,
}

/// Keep products whose discount falls within `range`.
///
/// Shopify search cannot filter on discount, so this runs after fetching.
#[must_use]
pub fn filter_by_discount(products: Vec<Product>, range: Option<DiscountRange>) -> Vec<Product> {
    match range {
        Some(range) => products
            .into_iter()
            .filter(|p| range.matches(p.sale().as_ref()))
            .collect(),
        None => products,
    }
}

/// Fetch one listing page for `params`.
///
/// `default_discount` applies when the request carries no valid range.
///
/// # Errors
///
/// Returns an error if the Shopify request fails.
pub async fn fetch_listing(
    state: &AppState,
    params: &ListingParams,
    first: i64,
    default_discount: Option<DiscountRange>,
) -> Result<ProductConnection> {
    let connection = state
        .storefront()
        .get_products(
            first,
            params.cursor(),
            params.search_query(),
            params.sort_order(),
        )
        .await?;

    Ok(ProductConnection {
        products: filter_by_discount(
            connection.products,
            params.discount_range().or(default_discount),
        ),
        page_info: connection.page_info,
    })
}

/// Display product listing page.
#[instrument(skip(state, session, ctx))]
pub async fn index(
    State(state): State<AppState>,
    session: Session,
    ctx: PageContext,
    Query(params): Query<ListingParams>,
) -> Result<ListingTemplate> {
    let connection = fetch_listing(&state, &params, PAGE_SIZE, None).await?;
    let wishlist = session::wishlist(&session).await;

    Ok(ListingTemplate {
        heading: "Shop all".to_string(),
        description: None,
        products: ProductCard::list(&connection.products, ctx.market, &wishlist),
        controls: ListingControls::new("/products", &params, false, None),
        pagination: Pagination::new("/products", &params, &connection.page_info),
        empty_message: "No products match these filters.",
        ctx,
    })
}

/// Display products on sale.
#[instrument(skip(state, session, ctx))]
pub async fn sale(
    State(state): State<AppState>,
    session: Session,
    ctx: PageContext,
    Query(params): Query<ListingParams>,
) -> Result<ListingTemplate> {
    let mut connection =
        fetch_listing(&state, &params, SALE_PAGE_SIZE, DiscountRange::parse("any")).await?;
    // A requested range starting at 0 would otherwise admit full-price products
    connection.products.retain(|p| p.sale().is_some());
    let wishlist = session::wishlist(&session).await;

    Ok(ListingTemplate {
        heading: "Sale".to_string(),
        description: Some("Markdowns on pieces we couldn't decide about either.".to_string()),
        products: ProductCard::list(&connection.products, ctx.market, &wishlist),
        controls: ListingControls::new("/sale", &params, false, Some("any")),
        pagination: Pagination::new("/sale", &params, &connection.page_info),
        empty_message: "Nothing on sale in this range right now.",
        ctx,
    })
}

/// Display search results.
#[instrument(skip(state, session, ctx))]
pub async fn search(
    State(state): State<AppState>,
    session: Session,
    ctx: PageContext,
    Query(params): Query<ListingParams>,
) -> Result<ListingTemplate> {
    let controls = ListingControls::new("/search", &params, true, None);

    let Some(text) = params.search_text() else {
        return Ok(ListingTemplate {
            heading: "Search".to_string(),
            description: None,
            products: Vec::new(),
            controls,
            pagination: Pagination::default(),
            empty_message: "Type something to search the shop.",
            ctx,
        });
    };

    let connection = fetch_listing(&state, &params, PAGE_SIZE, None).await?;
    let wishlist = session::wishlist(&session).await;

    Ok(ListingTemplate {
        heading: format!("Results for \u{201c}{text}\u{201d}"),
        description: None,
        products: ProductCard::list(&connection.products, ctx.market, &wishlist),
        controls,
        pagination: Pagination::new("/search", &params, &connection.page_info),
        empty_message: "No products matched your search.",
        ctx,
    })
}

/// Display product detail page.
///
/// Records the product in the visitor's recently viewed list.
#[instrument(skip(state, session, ctx))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    ctx: PageContext,
    Path(handle): Path<String>,
) -> Result<ProductShowTemplate> {
    let product = state.storefront().get_product_by_handle(&handle).await?;

    let now = Utc::now();
    let mut viewed = session::recently_viewed(&session, now).await;
    viewed.record(product.saved_product(), now);
    session::set_recently_viewed(&session, &viewed).await;

    let related = match state
        .storefront()
        .get_product_recommendations(product.id.as_str(), ProductRecommendationIntent::Related)
        .await
    {
        Ok(products) => products,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to fetch recommendations");
            Vec::new()
        }
    };

    let wishlist = session::wishlist(&session).await;
    let market = ctx.market;

    let mut images: Vec<ImageView> = product
        .images
        .iter()
        .map(|img| ImageView::new(img, &product.title))
        .collect();
    if images.is_empty()
        && let Some(featured) = &product.featured_image
    {
        images.push(ImageView::new(featured, &product.title));
    }

    let variants = product
        .variants
        .iter()
        .map(|v| VariantView {
            id: v.id.as_str().to_string(),
            title: v.title.clone(),
            price: market.display_price(v.price),
            available: v.available_for_sale,
        })
        .collect();

    Ok(ProductShowTemplate {
        card: ProductCard::new(&product, market, &wishlist),
        product_type: product.product_type.clone(),
        description_html: product.description_html.clone(),
        images,
        variants,
        show_variants: !matches!(product.variants.as_slice(), [only] if only.is_default()),
        selected_variant: product
            .first_available_variant()
            .map(|v| v.id.as_str().to_string()),
        related: related
            .iter()
            .filter(|p| p.id != product.id)
            .take(RELATED_LIMIT)
            .map(|p| ProductCard::new(p, market, &wishlist))
            .collect(),
        ctx,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::StatusCode;
    use httpmock::prelude::*;
    use serde_json::json;

    use super::*;
    use crate::routes::test_support::*;
    use crate::shopify::test_fixtures::{product_card, product_detail, products_page};

    #[tokio::test]
    async fn test_index_renders_cards_and_next_link() {
        let server = MockServer::start();
        let mock = mock_operation(
            &server,
            "GetProducts",
            json!({ "products": products_page(
                vec![product_card(1, "linen-shirt", "48.0", &[]), product_card(2, "bucket-hat", "20.0", &["sale-25"])],
                Some("c2"),
            ) }),
        );
        let app = app_for(&server);

        let response = send(&app, get("/products?sort=newest")).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_text(response).await;
        assert!(body.contains("/products/linen-shirt"));
        assert!(body.contains("25% off"));
        assert!(body.contains("/products?sort=newest&#38;after=c2"));
        mock.assert();
    }

    #[tokio::test]
    async fn test_sale_only_lists_discounted_products() {
        let server = MockServer::start();
        mock_operation(
            &server,
            "GetProducts",
            json!({ "products": products_page(
                vec![product_card(1, "full-price", "48.0", &[]), product_card(2, "marked-down", "30.0", &["sale-40"])],
                None,
            ) }),
        );
        let app = app_for(&server);

        let body = body_text(send(&app, get("/sale")).await).await;
        assert!(body.contains("/products/marked-down"));
        assert!(!body.contains("/products/full-price"));
    }

    #[tokio::test]
    async fn test_sale_range_from_zero_excludes_full_price() {
        let server = MockServer::start();
        mock_operation(
            &server,
            "GetProducts",
            json!({ "products": products_page(
                vec![product_card(1, "full-price", "48.0", &[]), product_card(2, "marked-down", "30.0", &["sale-10"])],
                None,
            ) }),
        );
        let app = app_for(&server);

        let response = send(&app, get("/sale?discount=0-20")).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_text(response).await;
        assert!(body.contains("/products/marked-down"));
        assert!(!body.contains("/products/full-price"));
    }

    #[tokio::test]
    async fn test_index_filters_by_discount_range() {
        let server = MockServer::start();
        mock_operation(
            &server,
            "GetProducts",
            json!({ "products": products_page(
                vec![
                    product_card(1, "full-price", "48.0", &[]),
                    product_card(2, "light-markdown", "40.0", &["sale-10"]),
                    product_card(3, "deep-markdown", "20.0", &["sale-40"]),
                ],
                None,
            ) }),
        );
        let app = app_for(&server);

        let body = body_text(send(&app, get("/products?discount=30-50")).await).await;
        assert!(body.contains("/products/deep-markdown"));
        assert!(!body.contains("/products/light-markdown"));
        assert!(!body.contains("/products/full-price"));

        // Ranges from zero keep full-price products on the main listing
        let body = body_text(send(&app, get("/products?discount=0-20")).await).await;
        assert!(body.contains("/products/full-price"));
        assert!(body.contains("/products/light-markdown"));
        assert!(!body.contains("/products/deep-markdown"));
    }

    #[tokio::test]
    async fn test_empty_search_does_not_call_shopify() {
        let server = MockServer::start();
        let mock = mock_operation(&server, "GetProducts", json!({}));
        let app = app_for(&server);

        let response = send(&app, get("/search")).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_text(response).await.contains("Type something to search"));
        mock.assert_calls(0);
    }

    #[tokio::test]
    async fn test_show_records_recently_viewed() {
        let server = MockServer::start();
        mock_operation(
            &server,
            "GetProductByHandle",
            json!({ "product": product_detail(1, "linen-shirt", "48.0") }),
        );
        mock_operation(
            &server,
            "GetProductRecommendations",
            json!({ "productRecommendations": [] }),
        );
        let app = app_for(&server);

        let response = send(&app, get("/products/linen-shirt")).await;
        assert_eq!(response.status(), StatusCode::OK);
        let cookie = session_cookie(&response).unwrap();
        let body = body_text(response).await;
        assert!(body.contains("Soft linen."));
        assert!(body.contains("gid://shopify/ProductVariant/10"));

        // The product itself is excluded from its own strip
        let strip = body_text(
            send(
                &app,
                with_cookie(get("/recently-viewed?exclude=gid://shopify/Product/1"), &cookie),
            )
            .await,
        )
        .await;
        assert!(!strip.contains("/products/linen-shirt"));

        let strip = body_text(send(&app, with_cookie(get("/recently-viewed"), &cookie)).await).await;
        assert!(strip.contains("/products/linen-shirt"));
    }

    #[tokio::test]
    async fn test_missing_product_is_404_page() {
        let server = MockServer::start();
        mock_operation(&server, "GetProductByHandle", json!({ "product": null }));
        let app = app_for(&server);

        let response = send(&app, get("/products/nope")).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(body_text(response).await.contains("Page not found"));
    }
}
