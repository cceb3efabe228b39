//! Market selection.

use axum::{
    Form,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Redirect, Response},
};
use indecisive_wear_core::Market;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::models::session;
use crate::notifications::{HX_REFRESH, Toast, is_htmx};
use crate::routes::referer_path;
use crate::state::AppState;

/// Market selector form data.
#[derive(Debug, Deserialize)]
pub struct MarketForm {
    pub market: String,
}

/// Switch the visitor's market.
///
/// An existing cart is moved to the new country so checkout prices match.
/// HTMX requests get `HX-Refresh` so every price on the page is redrawn.
#[instrument(skip(state, session, headers))]
pub async fn select(
    State(state): State<AppState>,
    session: Session,
    headers: HeaderMap,
    Form(form): Form<MarketForm>,
) -> Result<Response> {
    let market = Market::find(form.market.trim())
        .ok_or_else(|| AppError::BadRequest(format!("Unknown market '{}'", form.market)))?;
    session::set_market(&session, market).await;

    if let Some(cart_id) = session::cart_id(&session).await {
        match state
            .storefront()
            .update_buyer_identity(&cart_id, market.country_code)
            .await
        {
            Ok(cart) => session::set_cart_mirror(&session, &cart.to_mirror()).await,
            Err(e) => {
                tracing::warn!(cart_id = %cart_id, error = %e, "Failed to move cart to new market");
            }
        }
    }

    tracing::info!(market = market.id, "Market selected");
    session::push_flash(
        &session,
        Toast::info(format!("Prices now shown in {}", market.currency.code())),
    )
    .await;

    if is_htmx(&headers) {
        Ok(([(HX_REFRESH, "true")], StatusCode::NO_CONTENT).into_response())
    } else {
        Ok(Redirect::to(&referer_path(&headers)).into_response())
    }
}
