//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                       - Home page
//!
//! # Catalog
//! GET  /products               - Product listing (filters, sort, cursor pagination)
//! GET  /products/{handle}      - Product detail
//! GET  /collections            - Collection listing
//! GET  /collections/{handle}   - Collection detail
//! GET  /sale                   - Products on sale
//! GET  /search                 - Search results
//!
//! # Cart (HTMX fragments)
//! GET  /cart                   - Cart page
//! POST /cart/add               - Add to cart (triggers cart-updated + toast)
//! POST /cart/update            - Update quantity (returns cart body fragment)
//! POST /cart/remove            - Remove line (returns cart body fragment)
//! POST /cart/discount          - Apply or clear a discount code
//! GET  /cart/count             - Cart count badge (fragment)
//! GET  /checkout               - Redirect to Shopify checkout
//!
//! # Saved products
//! GET  /wishlist               - Wishlist page
//! POST /wishlist/toggle        - Toggle product (returns button fragment)
//! POST /wishlist/remove        - Remove product
//! GET  /recently-viewed        - Recently viewed strip (fragment)
//! POST /market                 - Select market
//!
//! # Account
//! GET  /account                - Account overview (requires customer)
//! GET  /account/login          - Login form; POST signs in
//! GET  /account/register       - Register form; POST creates the customer
//! GET  /account/recover        - Password reset form; POST sends the email
//! POST /account/logout         - Sign out
//!
//! # Content
//! GET  /pages/{slug}           - Markdown marketing pages
//!
//! # JSON API
//! GET    /api/health                         - Liveness
//! GET    /api/cron/health-check              - Dependency probe
//! GET    /api/instagram/posts                - Instagram feed proxy
//! GET    /api/products                       - Product search
//! GET    /api/admin/rate-limits              - List rate limit buckets
//! DELETE /api/admin/rate-limits              - Clear all buckets
//! DELETE /api/admin/rate-limits/{key}        - Clear one client's buckets
//! DELETE /api/admin/cache                    - Drop all cached catalog data
//! DELETE /api/admin/cache/products/{handle}  - Drop one cached product
//! DELETE /api/admin/cache/collections/{handle} - Drop one cached collection
//! ```

pub mod account;
pub mod api;
pub mod cart;
pub mod collections;
pub mod home;
pub mod market;
pub mod pages;
pub mod products;
pub mod wishlist;

use axum::{
    Router,
    http::{HeaderMap, header::REFERER},
    middleware::from_fn_with_state,
    routing::{delete, get, post},
};

use crate::error::AppError;
use crate::middleware::customer::is_local_path;
use crate::middleware::{api_rate_limit, auth_rate_limit};
use crate::state::AppState;

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index))
        .route("/{handle}", get(products::show))
}

/// Create the collection routes router.
pub fn collection_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(collections::index))
        .route("/{handle}", get(collections::show))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/add", post(cart::add))
        .route("/update", post(cart::update))
        .route("/remove", post(cart::remove))
        .route("/discount", post(cart::discount))
        .route("/count", get(cart::count))
}

/// Create the wishlist routes router.
pub fn wishlist_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(wishlist::show))
        .route("/toggle", post(wishlist::toggle))
        .route("/remove", post(wishlist::remove))
}

/// Create the account routes router.
///
/// Credential forms sit behind the `auth` rate limit.
pub fn account_routes(state: &AppState) -> Router<AppState> {
    let credentials = Router::new()
        .route("/login", get(account::login_page).post(account::login))
        .route(
            "/register",
            get(account::register_page).post(account::register),
        )
        .route("/recover", get(account::recover_page).post(account::recover))
        .route_layer(from_fn_with_state(state.clone(), auth_rate_limit));

    Router::new()
        .route("/", get(account::index))
        .route("/logout", post(account::logout))
        .merge(credentials)
}

/// Create the admin API router.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/rate-limits",
            get(api::list_rate_limits).delete(api::clear_rate_limits),
        )
        .route("/rate-limits/{key}", delete(api::clear_rate_limit))
        .route("/cache", delete(api::clear_cache))
        .route("/cache/products/{handle}", delete(api::clear_cached_product))
        .route(
            "/cache/collections/{handle}",
            delete(api::clear_cached_collection),
        )
}

/// Create the JSON API router, rate limited per client.
pub fn api_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/health", get(api::health))
        .route("/cron/health-check", get(api::cron_health_check))
        .route("/instagram/posts", get(api::instagram_posts))
        .route("/products", get(api::products))
        .nest("/admin", admin_routes())
        .route_layer(from_fn_with_state(state.clone(), api_rate_limit))
}

/// Create all routes for the storefront.
pub fn routes(state: &AppState) -> Router<AppState> {
    Router::new()
        // Home page
        .route("/", get(home::home))
        // Catalog
        .nest("/products", product_routes())
        .nest("/collections", collection_routes())
        .route("/sale", get(products::sale))
        .route("/search", get(products::search))
        // Cart
        .nest("/cart", cart_routes())
        .route("/checkout", get(cart::checkout))
        // Saved products and market
        .nest("/wishlist", wishlist_routes())
        .route("/recently-viewed", get(wishlist::recently_viewed))
        .route("/market", post(market::select))
        // Account
        .nest("/account", account_routes(state))
        // Content
        .route("/pages/{slug}", get(pages::show))
        // JSON API
        .nest("/api", api_routes(state))
        .fallback(not_found)
}

/// Fallback for unknown routes.
async fn not_found() -> AppError {
    AppError::NotFound("page".to_string())
}

/// Path of the page that submitted a form, for non-HTMX redirects back.
///
/// Only the path and query of the `Referer` are used, so the redirect
/// always stays on this site.
#[must_use]
pub fn referer_path(headers: &HeaderMap) -> String {
    headers
        .get(REFERER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| url::Url::parse(v).ok())
        .map(|url| match url.query() {
            Some(query) => format!("{}?{query}", url.path()),
            None => url.path().to_string(),
        })
        .filter(|path| is_local_path(path))
        .unwrap_or_else(|| "/".to_string())
}

#[cfg(test)]
pub(crate) mod test_support {
    //! Router harness shared by the route tests.

    use axum::{
        Router,
        body::{Body, to_bytes},
        http::{Request, Response, header},
    };
    use httpmock::prelude::*;
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use crate::config::StorefrontConfig;
    use crate::config::test_support::config_with_shopify;
    use crate::content::ContentStore;
    use crate::state::AppState;

    pub const GRAPHQL_PATH: &str = "/api/2026-01/graphql.json";

    /// The full application pointed at a mock Shopify.
    pub fn app_for(server: &MockServer) -> Router {
        app_with_config(config_with_shopify(&server.base_url()))
    }

    /// The full application with a custom configuration.
    pub fn app_with_config(config: StorefrontConfig) -> Router {
        let content = ContentStore::load(&config.content_dir).unwrap_or_default();
        crate::app(AppState::with_content(config, content))
    }

    /// Mock a GraphQL operation by name.
    pub fn mock_operation<'a>(
        server: &'a MockServer,
        operation: &str,
        data: Value,
    ) -> httpmock::Mock<'a> {
        server.mock(|when, then| {
            when.method(POST)
                .path(GRAPHQL_PATH)
                .body_includes(format!("\"operationName\":\"{operation}\""));
            then.status(200).json_body(json!({ "data": data }));
        })
    }

    pub fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap_or_default()
    }

    pub fn form(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body.to_string()))
            .unwrap_or_default()
    }

    pub fn htmx(mut request: Request<Body>) -> Request<Body> {
        request
            .headers_mut()
            .insert("hx-request", header::HeaderValue::from_static("true"));
        request
    }

    pub fn with_cookie(mut request: Request<Body>, cookie: &str) -> Request<Body> {
        if let Ok(value) = header::HeaderValue::from_str(cookie) {
            request.headers_mut().insert(header::COOKIE, value);
        }
        request
    }

    /// The session cookie set by a response, as a `Cookie` header value.
    pub fn session_cookie(response: &Response<Body>) -> Option<String> {
        response
            .headers()
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .find(|v| v.starts_with(crate::middleware::session::SESSION_COOKIE_NAME))
            .and_then(|v| v.split(';').next())
            .map(str::to_string)
    }

    pub async fn send(app: &Router, request: Request<Body>) -> Response<Body> {
        app.clone()
            .oneshot(request)
            .await
            .unwrap_or_else(|never| match never {})
    }

    pub async fn body_text(response: Response<Body>) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap_or_default();
        String::from_utf8_lossy(&bytes).into_owned()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::{HeaderValue, StatusCode};
    use httpmock::prelude::*;

    use super::test_support::*;
    use super::*;
    use super::test_support::get;

    #[test]
    fn test_referer_path() {
        let mut headers = HeaderMap::new();
        assert_eq!(referer_path(&headers), "/");

        headers.insert(
            REFERER,
            HeaderValue::from_static("https://evil.example/products?sort=newest"),
        );
        assert_eq!(referer_path(&headers), "/products?sort=newest");

        headers.insert(
            REFERER,
            HeaderValue::from_static("https://indecisivewear.com//evil.example"),
        );
        assert_eq!(referer_path(&headers), "/");
    }

    #[tokio::test]
    async fn test_unknown_route_renders_404_page() {
        let server = MockServer::start();
        let app = app_for(&server);

        let response = send(&app, get("/no-such-page")).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(body_text(response).await.contains("Page not found"));
    }

    #[tokio::test]
    async fn test_unknown_api_route_is_json() {
        let server = MockServer::start();
        let app = app_for(&server);

        let response = send(&app, get("/api/nope")).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_text(response).await, r#"{"error":"Not found: page"}"#);
    }
}
