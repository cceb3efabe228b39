//! Indecisive Wear storefront library.
//!
//! Server-rendered storefront over the Shopify Storefront API: catalog
//! browsing, a Shopify-backed cart mirrored in the session, wishlist and
//! recently viewed lists, market-aware pricing and customer accounts.
//! The binary in `main.rs` only wires configuration, telemetry and the
//! listener around [`app`].

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod content;
pub mod error;
mod filters;
pub mod middleware;
pub mod models;
pub mod notifications;
pub mod routes;
pub mod services;
pub mod shopify;
pub mod state;
pub mod views;

use axum::{
    Router,
    middleware::{from_fn, from_fn_with_state},
};
use tower_http::{services::ServeDir, trace::TraceLayer};

use crate::state::AppState;

/// Build the application router with the full middleware stack.
pub fn app(state: AppState) -> Router {
    let session_layer = middleware::create_session_layer(state.config());
    let static_files = ServeDir::new(&state.config().static_dir);

    routes::routes(&state)
        .layer(from_fn_with_state(
            state.clone(),
            middleware::render_error_pages,
        ))
        .layer(session_layer)
        .nest_service("/static", static_files)
        .layer(from_fn(middleware::security_headers_middleware))
        .layer(from_fn(middleware::request_id_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
        // Sentry layers (outermost for full request coverage)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction())
}
