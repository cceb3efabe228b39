//! Wishlist and recently viewed route handlers.
//!
//! Both lists live in the session. The wishlist toggle fetches the product
//! so the saved entry carries a current title, image and price.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Redirect, Response},
};
use chrono::Utc;
use indecisive_wear_core::{ProductId, WishlistError};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{AppError, Result, add_breadcrumb};
use crate::filters;
use crate::models::session;
use crate::notifications::{HxTrigger, Toast, is_htmx};
use crate::routes::referer_path;
use crate::state::AppState;
use crate::views::{PageContext, SavedCard};

/// Products shown in the recently viewed strip.
const RECENTLY_VIEWED_STRIP: usize = 6;

/// Wishlist toggle form data.
#[derive(Debug, Deserialize)]
pub struct ToggleForm {
    pub handle: String,
}

/// Wishlist removal form data.
#[derive(Debug, Deserialize)]
pub struct RemoveForm {
    pub product_id: String,
}

/// Recently viewed strip query.
#[derive(Debug, Deserialize)]
pub struct RecentlyViewedQuery {
    /// Product to leave out, usually the one on the current page.
    pub exclude: Option<String>,
}

/// Wishlist page template.
#[derive(Template, WebTemplate)]
#[template(path = "wishlist/show.html")]
pub struct WishlistTemplate {
    pub ctx: PageContext,
    pub products: Vec<SavedCard>,
}

/// State of a wishlist button.
#[derive(Debug, Clone)]
pub struct WishlistButtonView {
    pub handle: String,
    pub title: String,
    pub in_wishlist: bool,
}

/// Wishlist button fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/wishlist_button.html")]
pub struct WishlistButtonTemplate {
    pub card: WishlistButtonView,
}

/// Recently viewed strip fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/recently_viewed.html")]
pub struct RecentlyViewedTemplate {
    pub products: Vec<SavedCard>,
}

/// Display the wishlist page.
#[instrument(skip(session, ctx))]
pub async fn show(session: Session, ctx: PageContext) -> WishlistTemplate {
    let wishlist = session::wishlist(&session).await;
    WishlistTemplate {
        products: wishlist
            .items()
            .iter()
            .map(|p| SavedCard::new(p, ctx.market))
            .collect(),
        ctx,
    }
}

/// Add a product to the wishlist, or remove it if already saved.
#[instrument(skip(state, session, headers))]
pub async fn toggle(
    State(state): State<AppState>,
    session: Session,
    headers: HeaderMap,
    Form(form): Form<ToggleForm>,
) -> Result<Response> {
    let product = state.storefront().get_product_by_handle(form.handle.trim()).await?;

    let mut wishlist = session::wishlist(&session).await;
    let saved = wishlist
        .toggle(product.saved_product())
        .map_err(|WishlistError::Full { max }| {
            AppError::BadRequest(format!(
                "Your wishlist is full ({max} items). Remove something first."
            ))
        })?;
    session::set_wishlist(&session, &wishlist).await;

    add_breadcrumb(
        "wishlist",
        if saved { "Saved product" } else { "Unsaved product" },
        Some(&[("handle", product.handle.as_str())]),
    );

    let toast = if saved {
        Toast::success(format!("Saved {} to your wishlist", product.title))
    } else {
        Toast::info(format!("Removed {} from your wishlist", product.title))
    };

    if is_htmx(&headers) {
        Ok((
            HxTrigger::new()
                .wishlist_updated(wishlist.len())
                .toast(toast),
            WishlistButtonTemplate {
                card: WishlistButtonView {
                    handle: product.handle,
                    title: product.title,
                    in_wishlist: saved,
                },
            },
        )
            .into_response())
    } else {
        session::push_flash(&session, toast).await;
        Ok(Redirect::to(&referer_path(&headers)).into_response())
    }
}

/// Remove a product from the wishlist page.
#[instrument(skip(session, headers))]
pub async fn remove(
    session: Session,
    headers: HeaderMap,
    Form(form): Form<RemoveForm>,
) -> Response {
    let mut wishlist = session::wishlist(&session).await;
    let removed = wishlist.remove(&ProductId::new(form.product_id.trim()));
    if removed {
        session::set_wishlist(&session, &wishlist).await;
    }

    if is_htmx(&headers) {
        let mut trigger = HxTrigger::new().wishlist_updated(wishlist.len());
        if removed {
            trigger = trigger.toast(Toast::info("Removed from your wishlist"));
        }
        // The client swaps the card out with an empty body
        (trigger, StatusCode::OK).into_response()
    } else {
        if removed {
            session::push_flash(&session, Toast::info("Removed from your wishlist")).await;
        }
        Redirect::to("/wishlist").into_response()
    }
}

/// Recently viewed strip, excluding the product being viewed.
#[instrument(skip(state, session))]
pub async fn recently_viewed(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<RecentlyViewedQuery>,
) -> RecentlyViewedTemplate {
    let market = session::market(&session, state.config().default_market).await;
    let viewed = session::recently_viewed(&session, Utc::now()).await;
    let exclude = ProductId::new(query.exclude.unwrap_or_default());

    RecentlyViewedTemplate {
        products: viewed
            .excluding(&exclude)
            .into_iter()
            .take(RECENTLY_VIEWED_STRIP)
            .map(|p| SavedCard::new(p, market))
            .collect(),
    }
}
