//! JSON API handlers: health, Instagram feed proxy, product search and the
//! admin endpoints.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use chrono::Utc;
use indecisive_wear_core::ListingParams;
use serde::Deserialize;
use serde_json::{Value, json};
use tower_sessions::Session;
use tracing::instrument;

use crate::config::secret_matches;
use crate::error::{AppError, Result};
use crate::middleware::RequireAdminToken;
use crate::middleware::admin::bearer_token;
use crate::models::session;
use crate::routes::products::{PAGE_SIZE, fetch_listing};
use crate::services::health::{VERSION, run_checks};
use crate::services::instagram::clamp_limit;
use crate::state::AppState;
use crate::views::ProductCard;

/// Instagram feed query.
#[derive(Debug, Deserialize)]
pub struct InstagramQuery {
    pub limit: Option<u32>,
}

// =============================================================================
// Health
// =============================================================================

/// Liveness probe. Never touches dependencies.
pub async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": VERSION,
        "timestamp": Utc::now(),
    }))
}

/// Probe Shopify and Instagram for the uptime cron.
///
/// When `CRON_SECRET` is set the caller must present it as a bearer token.
/// Responds 503 when any probe fails.
#[instrument(skip_all)]
pub async fn cron_health_check(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response> {
    if let Some(secret) = state.config().cron_secret.as_ref() {
        let authorized = bearer_token(&headers).is_some_and(|token| secret_matches(secret, token));
        if !authorized {
            return Err(AppError::Unauthorized("Invalid cron secret".to_string()));
        }
    }

    let report = run_checks(&state).await;
    let status = if report.is_healthy() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    Ok((status, Json(report)).into_response())
}

// =============================================================================
// Storefront data
// =============================================================================

/// Recent Instagram posts for the home page feed.
#[instrument(skip(state))]
pub async fn instagram_posts(
    State(state): State<AppState>,
    Query(query): Query<InstagramQuery>,
) -> Result<Json<Value>> {
    let client = state
        .instagram()
        .ok_or_else(|| AppError::Unavailable("Instagram feed is not configured".to_string()))?;

    let posts = client.recent_posts(clamp_limit(query.limit)).await?;
    Ok(Json(json!({ "posts": posts.as_slice() })))
}

/// Product listing as JSON, priced for the visitor's market.
#[instrument(skip(state, session))]
pub async fn products(
    State(state): State<AppState>,
    session: Session,
    Query(params): Query<ListingParams>,
) -> Result<Json<Value>> {
    let connection = fetch_listing(&state, &params, PAGE_SIZE, None).await?;
    let market = session::market(&session, state.config().default_market).await;
    let wishlist = session::wishlist(&session).await;

    Ok(Json(json!({
        "products": ProductCard::list(&connection.products, market, &wishlist),
        "page_info": connection.page_info,
    })))
}

// =============================================================================
// Admin
// =============================================================================

/// List live rate limit buckets.
#[instrument(skip_all)]
pub async fn list_rate_limits(
    _admin: RequireAdminToken,
    State(state): State<AppState>,
) -> Json<Value> {
    Json(json!({ "buckets": state.rate_limiter().snapshot() }))
}

/// Clear every rate limit bucket.
#[instrument(skip_all)]
pub async fn clear_rate_limits(
    _admin: RequireAdminToken,
    State(state): State<AppState>,
) -> Json<Value> {
    let cleared = state.rate_limiter().clear_all().await;
    tracing::info!(cleared, "Cleared all rate limit buckets");
    Json(json!({ "cleared": cleared }))
}

/// Clear the buckets of one client.
#[instrument(skip(_admin, state))]
pub async fn clear_rate_limit(
    _admin: RequireAdminToken,
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Json<Value> {
    let cleared = state.rate_limiter().clear(&key).await;
    tracing::info!(cleared, "Cleared rate limit buckets");
    Json(json!({ "cleared": cleared }))
}

/// Drop all cached catalog responses.
#[instrument(skip_all)]
pub async fn clear_cache(_admin: RequireAdminToken, State(state): State<AppState>) -> Json<Value> {
    let cleared = state.storefront().cached_entries().await;
    state.storefront().invalidate_all().await;
    tracing::info!(cleared, "Cleared catalog cache");
    Json(json!({ "cleared": cleared }))
}

/// Drop one cached product.
#[instrument(skip(_admin, state))]
pub async fn clear_cached_product(
    _admin: RequireAdminToken,
    State(state): State<AppState>,
    Path(handle): Path<String>,
) -> StatusCode {
    state.storefront().invalidate_product(&handle).await;
    StatusCode::NO_CONTENT
}

/// Drop every cached page of one collection.
#[instrument(skip(_admin, state))]
pub async fn clear_cached_collection(
    _admin: RequireAdminToken,
    State(state): State<AppState>,
    Path(handle): Path<String>,
) -> StatusCode {
    state.storefront().invalidate_collection(&handle).await;
    StatusCode::NO_CONTENT
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::{
        body::Body,
        http::{Request, header::AUTHORIZATION},
    };
    use httpmock::prelude::*;
    use serde_json::json;

    use super::*;
    use crate::config::test_support::{TEST_ADMIN_TOKEN, config_with_overrides};
    use crate::routes::test_support::*;
    use crate::shopify::test_fixtures::{product_card, product_detail, products_page};

    fn admin(method: &str, uri: &str, token: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(AUTHORIZATION, format!("Bearer {token}"))
            .body(Body::empty())
            .unwrap()
    }

    async fn json_body(response: Response) -> Value {
        serde_json::from_str(&body_text(response).await).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let server = MockServer::start();
        let app = app_for(&server);

        let response = send(&app, get("/api/health")).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["version"], VERSION);
    }

    #[tokio::test]
    async fn test_cron_health_check_reports_degraded_shopify() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path(GRAPHQL_PATH);
            then.status(500);
        });
        let app = app_for(&server);

        let response = send(&app, get("/api/cron/health-check")).await;
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        let body = json_body(response).await;
        assert_eq!(body["status"], "degraded");
        assert_eq!(body["checks"][0]["name"], "shopify");
        assert_eq!(body["checks"][0]["status"], "error");
        assert_eq!(body["checks"][1]["status"], "skipped");
    }

    #[tokio::test]
    async fn test_cron_health_check_ok() {
        let server = MockServer::start();
        mock_operation(&server, "GetShop", json!({ "shop": { "name": "Indecisive Wear" } }));
        let app = app_for(&server);

        let response = send(&app, get("/api/cron/health-check")).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["status"], "ok");
    }

    #[tokio::test]
    async fn test_instagram_unconfigured_is_503() {
        let server = MockServer::start();
        let app = app_for(&server);

        let response = send(&app, get("/api/instagram/posts")).await;
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(
            json_body(response).await["error"],
            "Instagram feed is not configured"
        );
    }

    #[tokio::test]
    async fn test_products_json() {
        let server = MockServer::start();
        mock_operation(
            &server,
            "GetProducts",
            json!({ "products": products_page(vec![product_card(1, "linen-shirt", "48.0", &["sale-25"])], Some("c1")) }),
        );
        let app = app_for(&server);

        let response = send(&app, get("/api/products?q=linen")).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["products"][0]["handle"], "linen-shirt");
        assert_eq!(body["products"][0]["percent_off"], 25);
        assert_eq!(body["page_info"]["end_cursor"], "c1");
    }

    #[tokio::test]
    async fn test_admin_requires_token() {
        let server = MockServer::start();
        let app = app_for(&server);

        let response = send(&app, get("/api/admin/rate-limits")).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = send(&app, admin("GET", "/api/admin/rate-limits", "wrong")).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_admin_hidden_without_configured_token() {
        let server = MockServer::start();
        let app = app_with_config(config_with_overrides(
            &server.base_url(),
            &[("ADMIN_API_TOKEN", None)],
        ));

        for (method, uri) in [
            ("GET", "/api/admin/rate-limits"),
            ("DELETE", "/api/admin/cache"),
        ] {
            let response = send(&app, admin(method, uri, TEST_ADMIN_TOKEN)).await;
            assert_eq!(response.status(), StatusCode::NOT_FOUND);
        }
    }

    #[tokio::test]
    async fn test_admin_lists_and_clears_rate_limits() {
        let server = MockServer::start();
        let app = app_for(&server);

        send(&app, get("/api/health")).await;

        let response = send(&app, admin("GET", "/api/admin/rate-limits", TEST_ADMIN_TOKEN)).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        let buckets = body["buckets"].as_array().unwrap();
        assert!(!buckets.is_empty());
        let key = buckets[0]["key"].as_str().unwrap().to_string();

        let response = send(
            &app,
            admin("DELETE", &format!("/api/admin/rate-limits/{key}"), TEST_ADMIN_TOKEN),
        )
        .await;
        assert!(json_body(response).await["cleared"].as_u64().unwrap() >= 1);

        let response = send(&app, admin("DELETE", "/api/admin/rate-limits", TEST_ADMIN_TOKEN)).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_admin_clears_cached_product() {
        let server = MockServer::start();
        let mock = mock_operation(
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

        send(&app, get("/products/linen-shirt")).await;
        send(&app, get("/products/linen-shirt")).await;
        mock.assert_calls(1);

        let response = send(
            &app,
            admin("DELETE", "/api/admin/cache/products/linen-shirt", TEST_ADMIN_TOKEN),
        )
        .await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        send(&app, get("/products/linen-shirt")).await;
        mock.assert_calls(2);
    }

    #[tokio::test]
    async fn test_admin_clears_whole_cache() {
        let server = MockServer::start();
        let app = app_for(&server);

        let response = send(&app, admin("DELETE", "/api/admin/cache", TEST_ADMIN_TOKEN)).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["cleared"], 0);
    }
}
