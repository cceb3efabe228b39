//! Collection route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::{Path, Query, State};
use indecisive_wear_core::ListingParams;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::Result;
use crate::filters;
use crate::models::session;
use crate::routes::products::{ListingTemplate, PAGE_SIZE, filter_by_discount};
use crate::shopify::types::Collection;
use crate::state::AppState;
use crate::views::{ImageView, ListingControls, PageContext, Pagination, ProductCard, listing_url};

/// Collections per index page.
const COLLECTIONS_PAGE_SIZE: i64 = 24;

/// Collection display data for templates.
#[derive(Debug, Clone)]
pub struct CollectionView {
    pub handle: String,
    pub title: String,
    pub description: String,
    pub image: Option<ImageView>,
}

impl From<&Collection> for CollectionView {
    fn from(collection: &Collection) -> Self {
        Self {
            handle: collection.handle.clone(),
            title: collection.title.clone(),
            description: collection.description.clone(),
            image: collection
                .image
                .as_ref()
                .map(|img| ImageView::new(img, &collection.title)),
        }
    }
}

/// Cursor query for the collection index.
#[derive(Debug, Deserialize)]
pub struct CursorQuery {
    pub after: Option<String>,
}

/// Collection listing page template.
#[derive(Template, WebTemplate)]
#[template(path = "collections/index.html")]
pub struct CollectionsIndexTemplate {
    pub ctx: PageContext,
    pub collections: Vec<CollectionView>,
    pub next_url: Option<String>,
    pub first_url: Option<String>,
}

/// Display collection listing page.
#[instrument(skip(state, ctx))]
pub async fn index(
    State(state): State<AppState>,
    ctx: PageContext,
    Query(query): Query<CursorQuery>,
) -> Result<CollectionsIndexTemplate> {
    let after = query.after.filter(|a| !a.trim().is_empty());
    let connection = state
        .storefront()
        .get_collections(COLLECTIONS_PAGE_SIZE, after.clone())
        .await?;

    let next_url = connection
        .page_info
        .end_cursor
        .as_deref()
        .filter(|_| connection.page_info.has_next_page)
        .map(|cursor| listing_url("/collections", &[], Some(cursor)));

    Ok(CollectionsIndexTemplate {
        collections: connection.collections.iter().map(CollectionView::from).collect(),
        next_url,
        first_url: after.map(|_| "/collections".to_string()),
        ctx,
    })
}

/// Display collection detail page.
///
/// Sort and cursor are sent to Shopify; discount and availability
/// filters apply to the fetched page.
#[instrument(skip(state, session, ctx))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    ctx: PageContext,
    Path(handle): Path<String>,
    Query(params): Query<ListingParams>,
) -> Result<ListingTemplate> {
    let collection = state
        .storefront()
        .get_collection_by_handle(&handle, PAGE_SIZE, params.cursor(), params.sort_order())
        .await?;

    let mut products = filter_by_discount(collection.products, params.discount_range());
    if params.only_available() {
        products.retain(|p| p.available_for_sale);
    }

    let wishlist = session::wishlist(&session).await;
    let base_path = format!("/collections/{}", collection.handle);

    Ok(ListingTemplate {
        heading: collection.title,
        description: Some(collection.description).filter(|d| !d.trim().is_empty()),
        products: ProductCard::list(&products, ctx.market, &wishlist),
        controls: ListingControls::new(&base_path, &params, false, None),
        pagination: Pagination::new(&base_path, &params, &collection.page_info),
        empty_message: "Nothing in this collection matches these filters.",
        ctx,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::StatusCode;
    use httpmock::prelude::*;
    use serde_json::json;

    use crate::routes::test_support::*;
    use crate::shopify::test_fixtures::{product_card, products_page};

    #[tokio::test]
    async fn test_index_lists_collections() {
        let server = MockServer::start();
        mock_operation(
            &server,
            "GetCollections",
            json!({ "collections": {
                "edges": [{ "node": { "id": "gid://shopify/Collection/1", "handle": "summer", "title": "Summer Edit", "description": "", "image": null } }],
                "pageInfo": { "hasNextPage": false, "endCursor": null }
            } }),
        );
        let app = app_for(&server);

        let response = send(&app, get("/collections")).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_text(response).await;
        assert!(body.contains("Summer Edit"));
        assert!(body.contains("/collections/summer"));
    }

    #[tokio::test]
    async fn test_show_filters_by_discount() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path(GRAPHQL_PATH)
                .body_includes("\"operationName\":\"GetCollectionByHandle\"")
                .body_includes("\"sortKey\":\"PRICE\"");
            then.status(200).json_body(json!({ "data": { "collection": {
                "id": "gid://shopify/Collection/1",
                "handle": "summer",
                "title": "Summer Edit",
                "description": "Light layers.",
                "image": null,
                "products": products_page(
                    vec![product_card(1, "full-price", "48.0", &[]), product_card(2, "half-off", "20.0", &["sale-50"])],
                    None,
                )
            } } }));
        });
        let app = app_for(&server);

        let response = send(&app, get("/collections/summer?sort=price-asc&discount=50%2B")).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_text(response).await;
        assert!(body.contains("Light layers."));
        assert!(body.contains("/products/half-off"));
        assert!(!body.contains("/products/full-price"));
        mock.assert();
    }

    #[tokio::test]
    async fn test_missing_collection_is_404() {
        let server = MockServer::start();
        mock_operation(&server, "GetCollectionByHandle", json!({ "collection": null }));
        let app = app_for(&server);

        let response = send(&app, get("/collections/nope")).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
