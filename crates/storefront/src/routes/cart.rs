//! Cart route handlers.
//!
//! Cart operations use HTMX for dynamic updates without full page reloads.
//! Shopify owns the cart; the session keeps its id plus a mirror of the
//! lines for the header badge. Every mutation response rebuilds the mirror.
//! Without JavaScript the forms post normally and redirect back to `/cart`.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Redirect, Response},
};
use indecisive_wear_core::{CartLineId, CartMirror, Market, VariantId, kind_of, numeric_part};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{AppError, Result, add_breadcrumb};
use crate::filters;
use crate::models::session;
use crate::notifications::{HxTrigger, Toast, is_htmx};
use crate::shopify::ShopifyError;
use crate::shopify::types::{Cart, CartLineInput, CartLineUpdateInput};
use crate::state::AppState;
use crate::views::{CartView, PageContext};

/// Largest quantity accepted for one line.
pub const MAX_LINE_QUANTITY: u32 = 99;

/// Add to cart form data.
#[derive(Debug, Deserialize)]
pub struct AddToCartForm {
    pub variant_id: String,
    pub quantity: Option<u32>,
}

/// Update cart form data.
#[derive(Debug, Deserialize)]
pub struct UpdateCartForm {
    pub line_id: String,
    pub quantity: u32,
}

/// Remove from cart form data.
#[derive(Debug, Deserialize)]
pub struct RemoveFromCartForm {
    pub line_id: String,
}

/// Discount code form data. An empty code clears applied codes.
#[derive(Debug, Deserialize)]
pub struct DiscountForm {
    #[serde(default)]
    pub code: String,
}

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart/show.html")]
pub struct CartShowTemplate {
    pub ctx: PageContext,
    pub cart: CartView,
}

/// Cart body fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_body.html")]
pub struct CartBodyTemplate {
    pub cart: CartView,
}

/// Cart count badge fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_count.html")]
pub struct CartCountTemplate {
    pub count: u32,
}

// =============================================================================
// Helpers
// =============================================================================

/// Accept a variant GID or a bare numeric id.
fn parse_variant_id(raw: &str) -> Result<VariantId> {
    let raw = raw.trim();
    if kind_of(raw) == Some(VariantId::KIND) && numeric_part(raw).is_some() {
        return Ok(VariantId::new(raw));
    }
    raw.parse::<u64>()
        .map(VariantId::from_numeric)
        .map_err(|_| AppError::BadRequest("Invalid product variant".to_string()))
}

fn parse_line_id(raw: &str) -> Result<CartLineId> {
    let raw = raw.trim();
    if kind_of(raw) == Some(CartLineId::KIND) {
        Ok(CartLineId::new(raw))
    } else {
        Err(AppError::BadRequest("Invalid cart line".to_string()))
    }
}

/// Whether Shopify no longer knows the stored cart (expired or completed).
fn is_missing_cart(error: &ShopifyError) -> bool {
    match error {
        ShopifyError::NotFound(_) => true,
        ShopifyError::UserError(message) => {
            let message = message.to_ascii_lowercase();
            message.contains("cart") && message.contains("not exist")
        }
        _ => false,
    }
}

/// Store the cart id and rebuild the session mirror.
async fn remember_cart(session: &Session, cart: &Cart) -> CartMirror {
    session::set_cart_id(session, &cart.id).await;
    let mirror = cart.to_mirror();
    session::set_cart_mirror(session, &mirror).await;
    mirror
}

async fn require_cart_id(session: &Session) -> Result<String> {
    session::cart_id(session)
        .await
        .ok_or_else(|| AppError::BadRequest("Your cart is empty".to_string()))
}

/// Respond to a cart mutation: the cart body fragment for HTMX, otherwise
/// a flash toast and a redirect to the cart page.
async fn cart_response(
    session: &Session,
    headers: &HeaderMap,
    cart: &Cart,
    market: &Market,
    toast: Toast,
) -> Response {
    let mirror = remember_cart(session, cart).await;

    if is_htmx(headers) {
        (
            HxTrigger::new().cart_updated(mirror.count()).toast(toast),
            CartBodyTemplate {
                cart: CartView::new(cart, market),
            },
        )
            .into_response()
    } else {
        session::push_flash(session, toast).await;
        Redirect::to("/cart").into_response()
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// Display cart page.
#[instrument(skip(state, session, ctx))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    mut ctx: PageContext,
) -> Result<CartShowTemplate> {
    let cart = match session::cart_id(&session).await {
        Some(cart_id) => match state.storefront().get_cart(&cart_id).await {
            Ok(cart) => {
                remember_cart(&session, &cart).await;
                CartView::new(&cart, ctx.market)
            }
            Err(e) if is_missing_cart(&e) => {
                tracing::info!(cart_id = %cart_id, "Stored cart no longer exists");
                session::clear_cart(&session).await;
                CartView::empty(ctx.market)
            }
            Err(e) => return Err(e.into()),
        },
        None => CartView::empty(ctx.market),
    };

    ctx.cart_count = cart.count;
    Ok(CartShowTemplate { ctx, cart })
}

/// Add item to cart.
///
/// Creates a new cart (priced for the visitor's market) if none exists or
/// the stored one has expired. HTMX requests get a `cart-updated` trigger
/// and a toast.
#[instrument(skip(state, session, headers))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    headers: HeaderMap,
    Form(form): Form<AddToCartForm>,
) -> Result<Response> {
    let variant_id = parse_variant_id(&form.variant_id)?;
    let line = CartLineInput {
        merchandise_id: variant_id.clone(),
        quantity: form.quantity.unwrap_or(1).clamp(1, MAX_LINE_QUANTITY),
    };
    let market = session::market(&session, state.config().default_market).await;

    let cart = match session::cart_id(&session).await {
        Some(cart_id) => {
            match state
                .storefront()
                .add_to_cart(&cart_id, vec![line.clone()])
                .await
            {
                Err(e) if is_missing_cart(&e) => {
                    tracing::info!(cart_id = %cart_id, "Stored cart is gone, starting a new one");
                    state
                        .storefront()
                        .create_cart(vec![line], Some(market.country_code))
                        .await?
                }
                result => result?,
            }
        }
        None => {
            state
                .storefront()
                .create_cart(vec![line], Some(market.country_code))
                .await?
        }
    };

    let mirror = remember_cart(&session, &cart).await;
    add_breadcrumb(
        "cart",
        "Added to cart",
        Some(&[("variant_id", variant_id.as_str())]),
    );

    let name = mirror
        .line_for_variant(&variant_id)
        .map_or("Item", |line| line.name.as_str());
    let toast = Toast::success(format!("Added {name} to your cart"));

    if is_htmx(&headers) {
        Ok((
            HxTrigger::new().cart_updated(mirror.count()).toast(toast),
            StatusCode::NO_CONTENT,
        )
            .into_response())
    } else {
        session::push_flash(&session, toast).await;
        Ok(Redirect::to("/cart").into_response())
    }
}

/// Update cart line quantity. Quantity 0 removes the line.
#[instrument(skip(state, session, headers))]
pub async fn update(
    State(state): State<AppState>,
    session: Session,
    headers: HeaderMap,
    Form(form): Form<UpdateCartForm>,
) -> Result<Response> {
    let line_id = parse_line_id(&form.line_id)?;
    let cart_id = require_cart_id(&session).await?;
    let market = session::market(&session, state.config().default_market).await;
    let quantity = form.quantity.min(MAX_LINE_QUANTITY);

    let (cart, toast) = if quantity == 0 {
        let cart = state
            .storefront()
            .remove_from_cart(&cart_id, vec![line_id])
            .await?;
        (cart, Toast::info("Removed from your cart"))
    } else {
        let cart = state
            .storefront()
            .update_cart(&cart_id, vec![CartLineUpdateInput { id: line_id, quantity }])
            .await?;
        (cart, Toast::success("Cart updated"))
    };

    Ok(cart_response(&session, &headers, &cart, market, toast).await)
}

/// Remove item from cart.
#[instrument(skip(state, session, headers))]
pub async fn remove(
    State(state): State<AppState>,
    session: Session,
    headers: HeaderMap,
    Form(form): Form<RemoveFromCartForm>,
) -> Result<Response> {
    let line_id = parse_line_id(&form.line_id)?;
    let cart_id = require_cart_id(&session).await?;
    let market = session::market(&session, state.config().default_market).await;

    let cart = state
        .storefront()
        .remove_from_cart(&cart_id, vec![line_id])
        .await?;

    Ok(cart_response(&session, &headers, &cart, market, Toast::info("Removed from your cart")).await)
}

/// Apply a discount code, or clear codes when the form is empty.
///
/// Shopify accepts unknown codes and marks them not applicable, so the
/// toast reports whether the code actually took effect.
#[instrument(skip(state, session, headers))]
pub async fn discount(
    State(state): State<AppState>,
    session: Session,
    headers: HeaderMap,
    Form(form): Form<DiscountForm>,
) -> Result<Response> {
    let cart_id = require_cart_id(&session).await?;
    let market = session::market(&session, state.config().default_market).await;
    let code = form.code.trim();
    let codes = if code.is_empty() {
        Vec::new()
    } else {
        vec![code.to_string()]
    };

    let cart = state
        .storefront()
        .update_discount_codes(&cart_id, codes)
        .await?;

    let toast = if code.is_empty() {
        Toast::info("Discount code removed")
    } else if cart
        .discount_codes
        .iter()
        .any(|d| d.applicable && d.code.eq_ignore_ascii_case(code))
    {
        Toast::success(format!("Discount code {code} applied"))
    } else {
        Toast::error(format!("Discount code {code} can't be used with this cart"))
    };

    Ok(cart_response(&session, &headers, &cart, market, toast).await)
}

/// Get cart count badge from the session mirror.
#[instrument(skip(session))]
pub async fn count(session: Session) -> CartCountTemplate {
    CartCountTemplate {
        count: session::cart_mirror(&session).await.count(),
    }
}

/// Redirect to Shopify checkout.
#[instrument(skip(state, session))]
pub async fn checkout(State(state): State<AppState>, session: Session) -> Result<Response> {
    let Some(cart_id) = session::cart_id(&session).await else {
        return Ok(Redirect::to("/cart").into_response());
    };

    match state.storefront().get_cart(&cart_id).await {
        Ok(cart) if cart.total_quantity > 0 => {
            add_breadcrumb("checkout", "Redirected to checkout", None);
            Ok(Redirect::to(&cart.checkout_url).into_response())
        }
        Ok(_) => {
            session::push_flash(&session, Toast::info("Your cart is empty")).await;
            Ok(Redirect::to("/cart").into_response())
        }
        Err(e) if is_missing_cart(&e) => {
            session::clear_cart(&session).await;
            session::push_flash(
                &session,
                Toast::info("Your cart expired. Add something to start a new one."),
            )
            .await;
            Ok(Redirect::to("/cart").into_response())
        }
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::{Router, http::header::LOCATION};
    use httpmock::prelude::*;
    use serde_json::{Value, json};

    use super::*;
    use crate::notifications::HX_TRIGGER;
    use crate::routes::test_support::*;
    use crate::shopify::test_fixtures::cart;

    #[test]
    fn test_parse_variant_id() {
        assert_eq!(
            parse_variant_id("gid://shopify/ProductVariant/42").unwrap(),
            VariantId::from_numeric(42)
        );
        assert_eq!(parse_variant_id(" 42 ").unwrap(), VariantId::from_numeric(42));
        assert!(parse_variant_id("gid://shopify/Product/42").is_err());
        assert!(parse_variant_id("abc").is_err());
    }

    #[test]
    fn test_parse_line_id() {
        assert!(parse_line_id("gid://shopify/CartLine/abc?cart=c1").is_ok());
        assert!(parse_line_id("gid://shopify/ProductVariant/1").is_err());
    }

    #[test]
    fn test_is_missing_cart() {
        assert!(is_missing_cart(&ShopifyError::NotFound("cart".to_string())));
        assert!(is_missing_cart(&ShopifyError::UserError(
            "The specified cart does not exist.".to_string()
        )));
        assert!(!is_missing_cart(&ShopifyError::UserError(
            "Variant is sold out".to_string()
        )));
    }

    fn trigger(response: &Response) -> Value {
        serde_json::from_str(response.headers()[HX_TRIGGER].to_str().unwrap()).unwrap()
    }

    #[tokio::test]
    async fn test_add_creates_cart_and_triggers_events() {
        let server = MockServer::start();
        let create = server.mock(|when, then| {
            when.method(POST)
                .path(GRAPHQL_PATH)
                .body_includes("\"operationName\":\"CreateCart\"")
                .body_includes("\"countryCode\":\"US\"");
            then.status(200).json_body(json!({ "data": { "cartCreate": {
                "cart": cart(&[(1, 10, 2, "25.0")]),
                "userErrors": []
            } } }));
        });
        let app = app_for(&server);

        let response = send(
            &app,
            htmx(form("/cart/add", "variant_id=gid%3A%2F%2Fshopify%2FProductVariant%2F10&quantity=2")),
        )
        .await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        let events = trigger(&response);
        assert_eq!(events["cart-updated"]["count"], 2);
        assert_eq!(events["toast"]["message"], "Added Linen Shirt - M to your cart");
        create.assert();

        // The badge reads the session mirror without calling Shopify
        let cookie = session_cookie(&response).unwrap();
        let badge = body_text(send(&app, with_cookie(get("/cart/count"), &cookie)).await).await;
        assert!(badge.contains('2'));
        create.assert_calls(1);
    }

    #[tokio::test]
    async fn test_add_without_htmx_redirects_to_cart() {
        let server = MockServer::start();
        mock_operation(
            &server,
            "CreateCart",
            json!({ "cartCreate": { "cart": cart(&[(1, 10, 1, "25.0")]), "userErrors": [] } }),
        );
        let app = app_for(&server);

        let response = send(&app, form("/cart/add", "variant_id=10")).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[LOCATION], "/cart");
    }

    #[tokio::test]
    async fn test_add_rejects_bad_variant() {
        let server = MockServer::start();
        let app = app_for(&server);

        let response = send(&app, htmx(form("/cart/add", "variant_id=nope"))).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_text(response).await,
            r#"{"error":"Invalid product variant"}"#
        );
    }

    #[tokio::test]
    async fn test_update_to_zero_removes_line() {
        let server = MockServer::start();
        mock_operation(
            &server,
            "CreateCart",
            json!({ "cartCreate": { "cart": cart(&[(1, 10, 1, "25.0")]), "userErrors": [] } }),
        );
        let remove = mock_operation(
            &server,
            "RemoveFromCart",
            json!({ "cartLinesRemove": { "cart": cart(&[]), "userErrors": [] } }),
        );
        let app = app_for(&server);

        let added = send(&app, htmx(form("/cart/add", "variant_id=10"))).await;
        let cookie = session_cookie(&added).unwrap();

        let response = send(
            &app,
            with_cookie(
                htmx(form("/cart/update", "line_id=gid%3A%2F%2Fshopify%2FCartLine%2F1&quantity=0")),
                &cookie,
            ),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(trigger(&response)["cart-updated"]["count"], 0);
        assert!(body_text(response).await.contains("Your cart is empty"));
        remove.assert();
    }

    /// Add one item so the session holds a cart; returns the session cookie.
    async fn session_with_cart(app: &Router, server: &MockServer) -> String {
        mock_operation(
            server,
            "CreateCart",
            json!({ "cartCreate": { "cart": cart(&[(1, 10, 1, "25.0")]), "userErrors": [] } }),
        );
        let added = send(app, htmx(form("/cart/add", "variant_id=10"))).await;
        session_cookie(&added).unwrap()
    }

    fn discounted_cart(code: &str, applicable: bool) -> Value {
        let mut body = cart(&[(1, 10, 1, "25.0")]);
        body["discountCodes"] = json!([{ "code": code, "applicable": applicable }]);
        body
    }

    #[tokio::test]
    async fn test_remove_returns_updated_cart_body() {
        let server = MockServer::start();
        let app = app_for(&server);
        let cookie = session_with_cart(&app, &server).await;
        let remove = server.mock(|when, then| {
            when.method(POST)
                .path(GRAPHQL_PATH)
                .body_includes("\"operationName\":\"RemoveFromCart\"")
                .body_includes("gid://shopify/CartLine/1");
            then.status(200).json_body(json!({ "data": { "cartLinesRemove": {
                "cart": cart(&[]),
                "userErrors": []
            } } }));
        });

        let response = send(
            &app,
            with_cookie(
                htmx(form("/cart/remove", "line_id=gid%3A%2F%2Fshopify%2FCartLine%2F1")),
                &cookie,
            ),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let events = trigger(&response);
        assert_eq!(events["cart-updated"]["count"], 0);
        assert_eq!(events["toast"]["message"], "Removed from your cart");
        assert!(body_text(response).await.contains("Your cart is empty"));
        remove.assert();

        let badge = body_text(send(&app, with_cookie(get("/cart/count"), &cookie)).await).await;
        assert!(badge.contains('0'));
    }

    #[tokio::test]
    async fn test_discount_code_applied() {
        let server = MockServer::start();
        let app = app_for(&server);
        let cookie = session_with_cart(&app, &server).await;
        let update = server.mock(|when, then| {
            when.method(POST)
                .path(GRAPHQL_PATH)
                .body_includes("\"operationName\":\"UpdateCartDiscountCodes\"")
                .body_includes("\"discountCodes\":[\"save10\"]");
            then.status(200).json_body(json!({ "data": { "cartDiscountCodesUpdate": {
                "cart": discounted_cart("SAVE10", true),
                "userErrors": []
            } } }));
        });

        let response = send(
            &app,
            with_cookie(htmx(form("/cart/discount", "code=+save10+")), &cookie),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let toast = &trigger(&response)["toast"];
        assert_eq!(toast["level"], "success");
        assert_eq!(toast["message"], "Discount code save10 applied");
        assert!(body_text(response).await.contains("SAVE10"));
        update.assert();
    }

    #[tokio::test]
    async fn test_discount_code_not_applicable() {
        let server = MockServer::start();
        let app = app_for(&server);
        let cookie = session_with_cart(&app, &server).await;
        mock_operation(
            &server,
            "UpdateCartDiscountCodes",
            json!({ "cartDiscountCodesUpdate": {
                "cart": discounted_cart("EXPIRED", false),
                "userErrors": []
            } }),
        );

        let response = send(
            &app,
            with_cookie(htmx(form("/cart/discount", "code=EXPIRED")), &cookie),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let toast = &trigger(&response)["toast"];
        assert_eq!(toast["level"], "error");
        assert_eq!(
            toast["message"],
            "Discount code EXPIRED can't be used with this cart"
        );
    }

    #[tokio::test]
    async fn test_empty_discount_code_clears_codes() {
        let server = MockServer::start();
        let app = app_for(&server);
        let cookie = session_with_cart(&app, &server).await;
        let clear = server.mock(|when, then| {
            when.method(POST)
                .path(GRAPHQL_PATH)
                .body_includes("\"operationName\":\"UpdateCartDiscountCodes\"")
                .body_includes("\"discountCodes\":[]");
            then.status(200).json_body(json!({ "data": { "cartDiscountCodesUpdate": {
                "cart": cart(&[(1, 10, 1, "25.0")]),
                "userErrors": []
            } } }));
        });

        // Without HTMX the toast is flashed and the visitor lands on the cart
        let response = send(&app, with_cookie(form("/cart/discount", "code="), &cookie)).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[LOCATION], "/cart");
        clear.assert();
    }

    #[tokio::test]
    async fn test_checkout_redirects_to_shopify() {
        let server = MockServer::start();
        let app = app_for(&server);
        let cookie = session_with_cart(&app, &server).await;
        mock_operation(&server, "GetCart", json!({ "cart": cart(&[(1, 10, 1, "25.0")]) }));

        let response = send(&app, with_cookie(get("/checkout"), &cookie)).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            response.headers()[LOCATION],
            "https://indecisive-wear.myshopify.com/cart/c/c1"
        );
    }

    #[tokio::test]
    async fn test_add_starts_new_cart_when_stored_cart_is_gone() {
        let server = MockServer::start();
        let create = mock_operation(
            &server,
            "CreateCart",
            json!({ "cartCreate": { "cart": cart(&[(1, 10, 1, "25.0")]), "userErrors": [] } }),
        );
        let add = mock_operation(
            &server,
            "AddToCart",
            json!({ "cartLinesAdd": {
                "cart": null,
                "userErrors": [{ "field": ["cartId"], "message": "The specified cart does not exist.", "code": "INVALID" }]
            } }),
        );
        let app = app_for(&server);

        let first = send(&app, htmx(form("/cart/add", "variant_id=10"))).await;
        let cookie = session_cookie(&first).unwrap();

        let response = send(
            &app,
            with_cookie(htmx(form("/cart/add", "variant_id=10")), &cookie),
        )
        .await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert_eq!(trigger(&response)["cart-updated"]["count"], 1);
        add.assert();
        create.assert_calls(2);
    }

    #[tokio::test]
    async fn test_update_without_cart_is_bad_request() {
        let server = MockServer::start();
        let app = app_for(&server);

        let response = send(
            &app,
            htmx(form("/cart/update", "line_id=gid%3A%2F%2Fshopify%2FCartLine%2F1&quantity=3")),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_checkout_without_cart_goes_to_cart_page() {
        let server = MockServer::start();
        let app = app_for(&server);

        let response = send(&app, get("/checkout")).await;
        assert_eq!(response.headers()[LOCATION], "/cart");
    }

    #[tokio::test]
    async fn test_empty_cart_page() {
        let server = MockServer::start();
        let app = app_for(&server);

        let response = send(&app, get("/cart")).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_text(response).await.contains("Your cart is empty"));
    }
}
