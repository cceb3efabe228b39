//! Markdown content pages (about, FAQ, shipping, policies).

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::{Path, State};
use tracing::instrument;

use crate::content::Page;
use crate::error::{AppError, Result};
use crate::filters;
use crate::state::AppState;
use crate::views::PageContext;

/// Content page template.
#[derive(Template, WebTemplate)]
#[template(path = "pages/show.html")]
pub struct PageTemplate {
    pub ctx: PageContext,
    pub page: Page,
}

/// Display a content page by slug.
#[instrument(skip(state, ctx))]
pub async fn show(
    State(state): State<AppState>,
    ctx: PageContext,
    Path(slug): Path<String>,
) -> Result<PageTemplate> {
    let page = state
        .content()
        .page(&slug)
        .cloned()
        .ok_or_else(|| AppError::NotFound(format!("page {slug}")))?;

    Ok(PageTemplate { ctx, page })
}
