//! HTML error pages for page routes.
//!
//! Handlers return [`AppError`](crate::error::AppError), which always
//! renders JSON. For browser page loads this middleware replaces that body
//! with the error page: the layout, a short explanation, and for failed GETs
//! a "try again" link back to the same URL. API paths and htmx requests keep
//! the JSON so client code can show a toast instead.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Request, State},
    http::{Method, StatusCode, header::RETRY_AFTER},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tower_sessions::Session;

use crate::error::ErrorDetails;
use crate::filters;
use crate::notifications::is_htmx;
use crate::state::AppState;
use crate::views::PageContext;

/// Error page template.
#[derive(Template, WebTemplate)]
#[template(path = "error.html")]
pub struct ErrorTemplate {
    pub ctx: PageContext,
    pub status: u16,
    pub title: &'static str,
    pub message: String,
    pub retry_url: Option<String>,
}

impl ErrorTemplate {
    #[must_use]
    pub fn new(ctx: PageContext, details: &ErrorDetails, retryable: bool) -> Self {
        let status = details.status;
        let (title, message) = match status {
            StatusCode::NOT_FOUND => (
                "Page not found",
                "We couldn't find what you were looking for. It may have sold out or moved."
                    .to_string(),
            ),
            StatusCode::TOO_MANY_REQUESTS => (
                "Slow down",
                "You're going a little fast. Wait a moment and try again.".to_string(),
            ),
            s if s.is_client_error() => ("Something's not right", details.message.clone()),
            _ => (
                "Something went wrong",
                "We couldn't load this page just now. Please try again.".to_string(),
            ),
        };
        let retry_url = (retryable && status != StatusCode::NOT_FOUND).then(|| ctx.path.clone());

        Self {
            ctx,
            status: status.as_u16(),
            title,
            message,
            retry_url,
        }
    }
}

/// Render `AppError` responses on page routes as HTML.
pub async fn render_error_pages(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    if request.uri().path().starts_with("/api/") || is_htmx(request.headers()) {
        return next.run(request).await;
    }

    let uri = request.uri().clone();
    let retryable = request.method() == Method::GET;
    let session = request.extensions().get::<Session>().cloned();

    let response = next.run(request).await;
    let Some(details) = response.extensions().get::<ErrorDetails>().cloned() else {
        return response;
    };

    let ctx = match &session {
        Some(session) => PageContext::load(&state, session, &uri).await,
        None => PageContext::anonymous(&state, &uri),
    };

    let mut page = (details.status, ErrorTemplate::new(ctx, &details, retryable)).into_response();
    if let Some(retry_after) = response.headers().get(RETRY_AFTER) {
        page.headers_mut().insert(RETRY_AFTER, retry_after.clone());
    }
    page
}
